use crate::classifier::Emission;
use crate::metrics_defs::METRICS_EMITTED;
use shared::counter;
use shared::statsd::MetricsClient;
use std::sync::Arc;

/// Destination of classified metrics. Calls are fire-and-forget.
pub trait MetricSink: Send + Sync {
    fn count(&self, name: &str, amount: i64);
    fn timing(&self, name: &str, duration_ms: u64);
    fn gauge(&self, name: &str, value: f64);
}

impl MetricSink for MetricsClient {
    fn count(&self, name: &str, amount: i64) {
        MetricsClient::count(self, name, amount)
    }

    fn timing(&self, name: &str, duration_ms: u64) {
        MetricsClient::timing(self, name, duration_ms)
    }

    fn gauge(&self, name: &str, value: f64) {
        MetricsClient::gauge(self, name, value)
    }
}

#[derive(Clone)]
pub struct Forwarder {
    sink: Arc<dyn MetricSink>,
}

impl Forwarder {
    pub fn new(sink: Arc<dyn MetricSink>) -> Self {
        Forwarder { sink }
    }

    pub fn emit_counter(&self, name: &str, amount: i64) {
        counter!(METRICS_EMITTED, "kind" => "counter").increment(1);
        self.sink.count(name, amount);
    }

    pub fn emit_timing(&self, name: &str, duration_ms: u64) {
        counter!(METRICS_EMITTED, "kind" => "timing").increment(1);
        self.sink.timing(name, duration_ms);
    }

    pub fn emit_gauge(&self, name: &str, value: f64) {
        counter!(METRICS_EMITTED, "kind" => "gauge").increment(1);
        self.sink.gauge(name, value);
    }

    pub fn forward(&self, emission: &Emission) {
        match emission {
            Emission::Counter { name, amount } => self.emit_counter(name, *amount),
            Emission::Timing { name, duration_ms } => self.emit_timing(name, *duration_ms),
            Emission::Gauge { name, value } => self.emit_gauge(name, *value),
        }
    }
}

//! Thin statsd client used to push counters, timers and gauges to a collector.
//!
//! Every send is fire-and-forget: transport errors are logged here and never
//! returned to the caller.

use cadence::prelude::*;
use cadence::{MetricError, MetricSink, StatsdClient, UdpMetricSink};
use std::net::UdpSocket;
use std::panic::RefUnwindSafe;
use std::sync::Arc;

#[derive(Clone)]
pub struct MetricsClient {
    client: Arc<StatsdClient>,
}

impl MetricsClient {
    /// Create a client that sends datagrams to `statsd_host:statsd_port`, prefixing
    /// every metric name with `prefix`.
    pub fn new(statsd_host: &str, statsd_port: u16, prefix: &str) -> Result<Self, MetricError> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;

        let addr = format!("{statsd_host}:{statsd_port}");
        let sink = UdpMetricSink::from(addr.as_str(), socket)?;

        tracing::info!(collector = %addr, prefix, "reporting metrics to statsd");
        Ok(Self::from_sink(prefix, sink))
    }

    /// Create a client on top of an arbitrary cadence sink.
    pub fn from_sink<T>(prefix: &str, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        MetricsClient {
            client: Arc::new(StatsdClient::from_sink(prefix, sink)),
        }
    }

    /// Add `amount` to a counter.
    pub fn count(&self, metric: &str, amount: i64) {
        report(metric, self.client.count(metric, amount).map(drop));
    }

    /// Record a timing in milliseconds.
    pub fn timing(&self, metric: &str, value_ms: u64) {
        report(metric, self.client.time(metric, value_ms).map(drop));
    }

    /// Set a gauge to a point-in-time value.
    pub fn gauge(&self, metric: &str, value: f64) {
        report(metric, self.client.gauge(metric, value).map(drop));
    }
}

fn report(metric: &str, result: Result<(), MetricError>) {
    if let Err(error) = result {
        tracing::warn!(metric, error = &error as &dyn std::error::Error, "failed to send metric");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence::SpyMetricSink;

    #[test]
    fn test_wire_format() {
        let (rx, sink) = SpyMetricSink::new();
        let client = MetricsClient::from_sink("galeb", sink);

        client.count("vh1.b1.httpCode200", 5);
        client.timing("vh1.b1.requestTime", 42);
        client.gauge("vh1.b1.activeConnections", 7.5);

        let sent: Vec<String> = rx
            .try_iter()
            .map(|bytes| String::from_utf8(bytes).unwrap())
            .collect();
        assert_eq!(
            sent,
            vec![
                "galeb.vh1.b1.httpCode200:5|c".to_string(),
                "galeb.vh1.b1.requestTime:42|ms".to_string(),
                "galeb.vh1.b1.activeConnections:7.5|g".to_string(),
            ]
        );
    }

    #[test]
    fn test_udp_client_delivers_datagram() {
        let collector = UdpSocket::bind("127.0.0.1:0").unwrap();
        collector
            .set_read_timeout(Some(std::time::Duration::from_secs(2)))
            .unwrap();
        let port = collector.local_addr().unwrap().port();

        let client = MetricsClient::new("127.0.0.1", port, "galeb").unwrap();
        client.count("vh1.b1.httpCode500", 1);

        let mut buf = [0u8; 512];
        let len = collector.recv(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"galeb.vh1.b1.httpCode500:1|c");
    }
}

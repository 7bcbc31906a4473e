//! Wires the classifier and forwarder onto the queue channels.

use crate::classifier::Classifier;
use crate::config::StatsdConfig;
use crate::errors::GatewayError;
use crate::forwarder::{Forwarder, MetricSink};
use crate::metrics_defs::MESSAGES_RECEIVED;
use crate::queue::{Channel, Inbound, QueueListener, QueueManager};
use crate::topology::VirtualHostResolver;
use parking_lot::Mutex;
use shared::counter;
use shared::statsd::MetricsClient;
use std::sync::Arc;

/// Classifies every message it receives and forwards the result.
pub struct MetricsListener {
    classifier: Classifier,
    forwarder: Forwarder,
}

impl MetricsListener {
    pub fn new(classifier: Classifier, forwarder: Forwarder) -> Self {
        MetricsListener {
            classifier,
            forwarder,
        }
    }
}

impl QueueListener for MetricsListener {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn on_message(&self, message: &Inbound) {
        let kind = match message {
            Inbound::Snapshot(_) => "snapshot",
            Inbound::Change(_) => "change",
            Inbound::Unknown => "unknown",
        };
        counter!(MESSAGES_RECEIVED, "kind" => kind).increment(1);

        for emission in self.classifier.classify(message) {
            self.forwarder.forward(&emission);
        }
    }
}

enum SinkSource {
    Collector(StatsdConfig),
    Provided(Arc<dyn MetricSink>),
}

pub struct MetricsGateway {
    source: SinkSource,
    resolver: Arc<dyn VirtualHostResolver>,
    listener: Mutex<Option<Arc<MetricsListener>>>,
}

impl MetricsGateway {
    /// Gateway that sends to the statsd collector described by `config`.
    pub fn new(config: StatsdConfig, resolver: Arc<dyn VirtualHostResolver>) -> Self {
        Self::from_source(SinkSource::Collector(config), resolver)
    }

    /// Gateway that forwards into an already configured sink.
    pub fn with_sink(sink: Arc<dyn MetricSink>, resolver: Arc<dyn VirtualHostResolver>) -> Self {
        Self::from_source(SinkSource::Provided(sink), resolver)
    }

    fn from_source(source: SinkSource, resolver: Arc<dyn VirtualHostResolver>) -> Self {
        MetricsGateway {
            source,
            resolver,
            listener: Mutex::new(None),
        }
    }

    /// Configures the statsd client on first call and registers the metrics
    /// listener on both channels. Later calls reuse the same client and
    /// listener, so nothing is registered twice.
    pub fn start(&self, queue: &QueueManager) -> Result<(), GatewayError> {
        let listener = {
            let mut guard = self.listener.lock();
            match guard.as_ref() {
                Some(listener) => listener.clone(),
                None => {
                    let listener = Arc::new(MetricsListener::new(
                        Classifier::new(self.resolver.clone()),
                        Forwarder::new(self.build_sink()?),
                    ));
                    *guard = Some(listener.clone());
                    listener
                }
            }
        };

        for channel in Channel::ALL {
            if !queue.register(channel, listener.clone()) {
                tracing::debug!(channel = channel.as_str(), "metrics listener already registered");
            }
        }

        tracing::debug!("metrics gateway ready");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.listener.lock().is_some()
    }

    fn build_sink(&self) -> Result<Arc<dyn MetricSink>, GatewayError> {
        match &self.source {
            SinkSource::Collector(config) => {
                let client = MetricsClient::new(&config.host, config.port, &config.prefix)?;
                Ok(Arc::new(client))
            }
            SinkSource::Provided(sink) => Ok(sink.clone()),
        }
    }
}

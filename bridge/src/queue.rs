//! In-process queue manager with the snapshot and event channels.
//!
//! Payloads are decoded into [`Inbound`] at the channel boundary, so listeners
//! dispatch with a plain `match` instead of inspecting raw bodies.

use crate::model::{EntityChangeEvent, MetricsSnapshot};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Aggregated traffic snapshots from the proxy.
    Snapshots,
    /// Entity lifecycle events.
    Events,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Snapshots, Channel::Events];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::Snapshots => "snapshots",
            Channel::Events => "events",
        }
    }

    /// Decodes a JSON body published on this channel.
    pub fn decode(&self, body: &[u8]) -> Inbound {
        let decoded = match self {
            Channel::Snapshots => serde_json::from_slice(body).map(Inbound::Snapshot),
            Channel::Events => serde_json::from_slice(body).map(Inbound::Change),
        };

        decoded.unwrap_or_else(|error| {
            tracing::debug!(channel = self.as_str(), %error, "undecodable payload");
            Inbound::Unknown
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Snapshot(MetricsSnapshot),
    Change(EntityChangeEvent),
    Unknown,
}

pub trait QueueListener: Send + Sync {
    /// Listener names are unique per channel.
    fn name(&self) -> &'static str;

    fn on_message(&self, message: &Inbound);
}

#[derive(Default)]
pub struct QueueManager {
    listeners: RwLock<Vec<(Channel, Arc<dyn QueueListener>)>>,
}

impl QueueManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` on `channel`. Returns `false` and keeps the existing
    /// registration if a listener with the same name is already there.
    pub fn register(&self, channel: Channel, listener: Arc<dyn QueueListener>) -> bool {
        let mut listeners = self.listeners.write();
        let name = listener.name();
        if listeners
            .iter()
            .any(|(c, l)| *c == channel && l.name() == name)
        {
            return false;
        }

        tracing::debug!(channel = channel.as_str(), listener = name, "registered listener");
        listeners.push((channel, listener));
        true
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|(c, _)| *c == channel)
            .count()
    }

    /// Delivers `message` to every listener of `channel` in registration order,
    /// on the caller's thread.
    pub fn publish(&self, channel: Channel, message: &Inbound) {
        let listeners: Vec<Arc<dyn QueueListener>> = self
            .listeners
            .read()
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, l)| l.clone())
            .collect();

        for listener in listeners {
            listener.on_message(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Action;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl QueueListener for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_message(&self, message: &Inbound) {
            let kind = match message {
                Inbound::Snapshot(_) => "snapshot",
                Inbound::Change(_) => "change",
                Inbound::Unknown => "unknown",
            };
            self.log.lock().push(format!("{}:{kind}", self.name));
        }
    }

    #[test]
    fn test_decode_at_channel_boundary() {
        let snapshot = Channel::Snapshots.decode(br#"{"id": "b1", "parentId": "vh1"}"#);
        assert!(matches!(snapshot, Inbound::Snapshot(ref s) if s.owner_id == "b1"));

        let change = Channel::Events
            .decode(br#"{"type": "REMOVE", "data": {"entityType": "rule", "id": "r1"}}"#);
        assert!(matches!(change, Inbound::Change(ref e) if e.action == Action::Remove));

        // A change event on the snapshot channel does not have the snapshot shape.
        assert_eq!(
            Channel::Snapshots.decode(br#"{"type": "CHANGE", "data": {}}"#),
            Inbound::Unknown
        );
        assert_eq!(Channel::Events.decode(b"not json"), Inbound::Unknown);
    }

    #[test]
    fn test_register_is_idempotent_per_channel() {
        let queue = QueueManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener = Arc::new(Recorder {
            name: "metrics",
            log: log.clone(),
        });

        assert!(queue.register(Channel::Events, listener.clone()));
        assert!(!queue.register(Channel::Events, listener.clone()));
        assert!(queue.register(Channel::Snapshots, listener));
        assert_eq!(queue.listener_count(Channel::Events), 1);
        assert_eq!(queue.listener_count(Channel::Snapshots), 1);

        queue.publish(Channel::Events, &Inbound::Unknown);
        assert_eq!(*log.lock(), vec!["metrics:unknown".to_string()]);
    }

    #[test]
    fn test_publish_in_registration_order() {
        let queue = QueueManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["farm", "metrics"] {
            queue.register(
                Channel::Events,
                Arc::new(Recorder {
                    name,
                    log: log.clone(),
                }),
            );
        }

        queue.publish(Channel::Snapshots, &Inbound::Unknown);
        assert!(log.lock().is_empty());

        let event = Channel::Events
            .decode(br#"{"type": "CHANGE", "data": {"entityType": "backend", "id": "b1"}}"#);
        queue.publish(Channel::Events, &event);
        assert_eq!(
            *log.lock(),
            vec!["farm:change".to_string(), "metrics:change".to_string()]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishers() {
        let queue = Arc::new(QueueManager::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        queue.register(
            Channel::Snapshots,
            Arc::new(Recorder {
                name: "metrics",
                log: log.clone(),
            }),
        );

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        queue.publish(Channel::Snapshots, &Inbound::Unknown);
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(log.lock().len(), 200);
    }
}

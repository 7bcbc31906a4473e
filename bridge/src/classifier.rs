//! Turns queue messages into statsd operations.

use crate::key::derive_prefix;
use crate::metrics_defs::{MESSAGES_IGNORED, SNAPSHOTS_MALFORMED};
use crate::model::{
    Action, EntityChangeEvent, EntityType, MetricsSnapshot, PROP_HTTP_CODE_PREFIX,
    PROP_REQUEST_TIME_AVG,
};
use crate::queue::Inbound;
use crate::topology::VirtualHostResolver;
use serde_json::Value;
use shared::counter;
use std::sync::Arc;

pub const REQUEST_TIME_SUFFIX: &str = "requestTime";
pub const ACTIVE_CONNECTIONS_SUFFIX: &str = "activeConnections";

/// A single statsd operation with its fully derived name (collector prefix excluded).
#[derive(Clone, Debug, PartialEq)]
pub enum Emission {
    Counter { name: String, amount: i64 },
    Timing { name: String, duration_ms: u64 },
    Gauge { name: String, value: f64 },
}

pub struct Classifier {
    resolver: Arc<dyn VirtualHostResolver>,
}

impl Classifier {
    pub fn new(resolver: Arc<dyn VirtualHostResolver>) -> Self {
        Classifier { resolver }
    }

    pub fn classify(&self, message: &Inbound) -> Vec<Emission> {
        match message {
            Inbound::Snapshot(snapshot) => self.classify_snapshot(snapshot),
            Inbound::Change(event) => self.classify_change(event).into_iter().collect(),
            Inbound::Unknown => {
                counter!(MESSAGES_IGNORED).increment(1);
                Vec::new()
            }
        }
    }

    /// One timing for the average request time plus one counter per status code
    /// property. A missing or non-integer request time only drops the timing.
    fn classify_snapshot(&self, snapshot: &MetricsSnapshot) -> Vec<Emission> {
        let prefix = derive_prefix(
            snapshot.parent_id.as_deref().unwrap_or_default(),
            &snapshot.owner_id,
        );
        let mut emissions = Vec::with_capacity(snapshot.properties.len());

        let request_time = snapshot.properties.get(PROP_REQUEST_TIME_AVG);
        match request_time.and_then(Value::as_u64) {
            Some(duration_ms) => emissions.push(Emission::Timing {
                name: format!("{prefix}.{REQUEST_TIME_SUFFIX}"),
                duration_ms,
            }),
            None => {
                tracing::warn!(
                    backend_id = %snapshot.owner_id,
                    value = ?request_time,
                    "snapshot has no usable {PROP_REQUEST_TIME_AVG}"
                );
                counter!(SNAPSHOTS_MALFORMED).increment(1);
            }
        }

        for (property, value) in &snapshot.properties {
            if !property.starts_with(PROP_HTTP_CODE_PREFIX) {
                continue;
            }
            match value.as_i64() {
                Some(amount) => emissions.push(Emission::Counter {
                    name: format!("{prefix}.{property}"),
                    amount,
                }),
                None => tracing::debug!(
                    backend_id = %snapshot.owner_id,
                    property = property.as_str(),
                    "skipping non-integer status code count"
                ),
            }
        }

        emissions
    }

    /// Backend `CHANGE` events become an active connections gauge under the
    /// virtual host resolved from the farm. The event's parent id is the pool.
    fn classify_change(&self, event: &EntityChangeEvent) -> Option<Emission> {
        let entity = &event.entity;
        if entity.entity_type != EntityType::Backend || event.action != Action::Change {
            counter!(MESSAGES_IGNORED).increment(1);
            return None;
        }

        // Unresolved topology is logged by the resolver.
        let virtual_host_id = self
            .resolver
            .resolve_virtual_host_id(&entity.id, entity.parent_id.as_deref())?;

        Some(Emission::Gauge {
            name: format!(
                "{}.{ACTIVE_CONNECTIONS_SUFFIX}",
                derive_prefix(&virtual_host_id, &entity.id)
            ),
            value: entity.active_connections() as f64,
        })
    }
}

//! Payloads published on the queue channels and the farm entities they refer to.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Average request time for the interval, in milliseconds.
pub const PROP_REQUEST_TIME_AVG: &str = "requestTimeAvg";
/// Prefix of the per-status-code request counters, e.g. `httpCode200`.
pub const PROP_HTTP_CODE_PREFIX: &str = "httpCode";
/// Current number of active connections on a backend.
pub const PROP_ACTIVE_CONNECTIONS: &str = "activeConnections";
/// Id of the backend pool a rule routes to.
pub const PROP_TARGET_ID: &str = "targetId";

/// Configuration entity kinds held by the farm.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Backend,
    BackendPool,
    Rule,
    VirtualHost,
    #[serde(other)]
    Other,
}

impl EntityType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityType::Backend => "backend",
            EntityType::BackendPool => "backendpool",
            EntityType::Rule => "rule",
            EntityType::VirtualHost => "virtualhost",
            EntityType::Other => "other",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Change,
    Remove,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A configuration entity as carried in change events and stored by the farm.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub entity_type: EntityType,
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Entity {
    pub fn new(entity_type: EntityType, id: impl Into<String>, parent_id: Option<&str>) -> Self {
        Entity {
            entity_type,
            id: id.into(),
            parent_id: parent_id.map(str::to_owned),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_owned(), value.into());
        self
    }

    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    /// Active connections of a backend. Missing or non-integer values count as zero.
    pub fn active_connections(&self) -> u64 {
        self.properties
            .get(PROP_ACTIVE_CONNECTIONS)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

/// State transition of a configuration entity.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct EntityChangeEvent {
    #[serde(rename = "type", default)]
    pub action: Action,
    #[serde(rename = "data")]
    pub entity: Entity,
}

impl EntityChangeEvent {
    pub fn new(action: Action, entity: Entity) -> Self {
        EntityChangeEvent { action, entity }
    }
}

/// One interval of aggregated traffic stats for a backend under a virtual host.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    #[serde(rename = "id")]
    pub owner_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

impl MetricsSnapshot {
    pub fn new(owner_id: impl Into<String>, parent_id: Option<&str>) -> Self {
        MetricsSnapshot {
            owner_id: owner_id.into(),
            parent_id: parent_id.map(str::to_owned),
            properties: IndexMap::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_owned(), value.into());
        self
    }
}

//! Self-metrics for the bridge.

use shared::metrics_defs::{MetricDef, MetricType};

pub const MESSAGES_RECEIVED: MetricDef = MetricDef {
    name: "messages.received",
    metric_type: MetricType::Counter,
    description: "Messages delivered to the metrics listener. Tagged with channel.",
};

pub const MESSAGES_IGNORED: MetricDef = MetricDef {
    name: "messages.ignored",
    metric_type: MetricType::Counter,
    description: "Messages that produced no metric: unknown shapes and non backend CHANGE events",
};

pub const SNAPSHOTS_MALFORMED: MetricDef = MetricDef {
    name: "snapshots.malformed",
    metric_type: MetricType::Counter,
    description: "Snapshots without a usable average request time",
};

pub const TOPOLOGY_UNRESOLVED: MetricDef = MetricDef {
    name: "topology.unresolved",
    metric_type: MetricType::Counter,
    description: "Backend change events whose virtual host could not be resolved",
};

pub const METRICS_EMITTED: MetricDef = MetricDef {
    name: "metrics.emitted",
    metric_type: MetricType::Counter,
    description: "Metrics handed to the statsd client. Tagged with kind.",
};

pub const FARM_ENTITIES: MetricDef = MetricDef {
    name: "farm.entities",
    metric_type: MetricType::Gauge,
    description: "Number of entities held by the in-memory farm",
};

pub const ALL_METRICS: &[MetricDef] = &[
    MESSAGES_RECEIVED,
    MESSAGES_IGNORED,
    SNAPSHOTS_MALFORMED,
    TOPOLOGY_UNRESOLVED,
    METRICS_EMITTED,
    FARM_ENTITIES,
];

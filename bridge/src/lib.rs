//! Forwards proxy traffic snapshots and backend changes to statsd.
//!
//! Messages arrive on two queue channels, are classified into statsd
//! operations named after the virtual host and backend they belong to, and are
//! sent to the collector without retries.

pub mod classifier;
pub mod config;
pub mod errors;
pub mod farm;
pub mod forwarder;
pub mod gateway;
pub mod ingest;
pub mod key;
pub mod metrics_defs;
pub mod model;
pub mod queue;
pub mod topology;

#[cfg(test)]
mod testutils;

use errors::BridgeError;
use farm::Farm;
use gateway::MetricsGateway;
use ingest::IngestService;
use queue::{Channel, QueueManager};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use topology::FarmResolver;

pub async fn run(config: config::Config) -> Result<(), BridgeError> {
    let farm = Arc::new(Farm::new());
    let queue = Arc::new(QueueManager::new());

    // The farm goes first so backend changes are visible to the resolver.
    queue.register(Channel::Events, farm.clone());

    let gateway = Arc::new(MetricsGateway::new(
        config.statsd.clone(),
        Arc::new(FarmResolver::new(farm)),
    ));
    gateway.start(&queue)?;

    let ingest_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        IngestService::new(queue),
    );

    let ready = gateway.clone();
    let admin_task = run_http_service::<_, BridgeError>(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::new(move || ready.is_started()),
    );

    tokio::try_join!(ingest_task, admin_task)?;
    Ok(())
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("could not configure statsd client: {0}")]
    Client(#[from] cadence::MetricError),
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("failed to read request body: {0}")]
    RequestBody(Box<dyn std::error::Error + Send + Sync>),
}

use crate::errors::BridgeError;
use crate::queue::{Channel, Inbound, QueueManager};
use http::{Method, StatusCode};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use shared::http::make_boxed_response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Largest request body accepted on the ingest endpoints.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Accepts snapshots on `POST /snapshots` and change events on `POST /events`
/// and publishes them on the matching queue channel.
pub struct IngestService {
    queue: Arc<QueueManager>,
}

impl IngestService {
    pub fn new(queue: Arc<QueueManager>) -> Self {
        IngestService { queue }
    }
}

fn route(method: &Method, path: &str) -> Result<Channel, StatusCode> {
    let channel = match path {
        "/snapshots" => Channel::Snapshots,
        "/events" => Channel::Events,
        _ => return Err(StatusCode::NOT_FOUND),
    };
    match *method {
        Method::POST => Ok(channel),
        _ => Err(StatusCode::METHOD_NOT_ALLOWED),
    }
}

/// Decodes and publishes one body, returning the response status.
fn ingest(queue: &QueueManager, channel: Channel, body: &[u8]) -> StatusCode {
    match channel.decode(body) {
        Inbound::Unknown => StatusCode::BAD_REQUEST,
        message => {
            queue.publish(channel, &message);
            StatusCode::ACCEPTED
        }
    }
}

/// Collects the body, or returns `None` once it grows past `limit` bytes.
async fn read_body<B>(body: B, limit: usize) -> Result<Option<Bytes>, BridgeError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(Some(collected.to_bytes())),
        Err(error) if error.is::<LengthLimitError>() => Ok(None),
        Err(error) => Err(BridgeError::RequestBody(error)),
    }
}

impl Service<Request<Incoming>> for IngestService {
    type Response = Response<BoxBody<Bytes, BridgeError>>;
    type Error = BridgeError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let queue = self.queue.clone();

        Box::pin(async move {
            let channel = match route(req.method(), req.uri().path()) {
                Ok(channel) => channel,
                Err(status) => return Ok(make_boxed_response(status)),
            };

            let Some(body) = read_body(req.into_body(), MAX_BODY_SIZE).await? else {
                tracing::debug!(channel = channel.as_str(), "request body too large");
                return Ok(make_boxed_response(StatusCode::PAYLOAD_TOO_LARGE));
            };
            let status = ingest(&queue, channel, &body);
            if status != StatusCode::ACCEPTED {
                tracing::debug!(channel = channel.as_str(), "rejected undecodable payload");
            }
            Ok(make_boxed_response(status))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Emission;
    use crate::farm::Farm;
    use crate::gateway::MetricsGateway;
    use crate::testutils::RecordingSink;
    use crate::topology::FarmResolver;
    use http_body_util::Full;

    #[test]
    fn test_routes() {
        assert_eq!(route(&Method::POST, "/snapshots"), Ok(Channel::Snapshots));
        assert_eq!(route(&Method::POST, "/events"), Ok(Channel::Events));
        assert_eq!(
            route(&Method::GET, "/events"),
            Err(StatusCode::METHOD_NOT_ALLOWED)
        );
        assert_eq!(route(&Method::POST, "/"), Err(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_ingest_publishes_decoded_payloads() {
        let queue = QueueManager::new();
        let sink = Arc::new(RecordingSink::default());
        let gateway = MetricsGateway::with_sink(
            sink.clone(),
            Arc::new(FarmResolver::new(Arc::new(Farm::new()))),
        );
        gateway.start(&queue).unwrap();

        let status = ingest(
            &queue,
            Channel::Snapshots,
            br#"{"id": "b1", "parentId": "vh1", "properties": {"requestTimeAvg": 12}}"#,
        );
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(
            sink.emissions(),
            vec![Emission::Timing {
                name: "vh1.b1.requestTime".into(),
                duration_ms: 12
            }]
        );

        assert_eq!(
            ingest(&queue, Channel::Events, b"{\"type\": \"CHANGE\"}"),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(sink.emissions().len(), 1);
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let body = || Full::new(Bytes::from(vec![b'x'; 16]));

        let read = read_body(body(), 16).await.unwrap();
        assert_eq!(read.map(|b| b.len()), Some(16));

        assert!(read_body(body(), 8).await.unwrap().is_none());
    }
}

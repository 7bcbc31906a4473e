use crate::http::make_boxed_response;
use http::{Method, StatusCode};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Health and readiness endpoints.
///
/// `/health` answers as long as the process serves requests, `/ready` reflects
/// the `is_ready` probe.
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }

    fn respond(&self, method: &Method, path: &str) -> Response<BoxBody<Bytes, E>>
    where
        E: 'static,
    {
        if *method != Method::GET {
            return make_boxed_response(StatusCode::METHOD_NOT_ALLOWED);
        }

        let ok_response = || -> Response<BoxBody<Bytes, E>> {
            Response::new(
                Full::new(Bytes::from("ok\n"))
                    .map_err(|e| match e {})
                    .boxed(),
            )
        };

        match path {
            "/health" => ok_response(),
            "/ready" => match (self.is_ready)() {
                true => ok_response(),
                false => make_boxed_response(StatusCode::SERVICE_UNAVAILABLE),
            },
            _ => make_boxed_response(StatusCode::NOT_FOUND),
        }
    }
}

impl<F, E> Service<Request<Incoming>> for AdminService<F, E>
where
    F: Fn() -> bool + Send + Sync + 'static,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, E>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let res = self.respond(req.method(), req.uri().path());
        Box::pin(async move { Ok(res) })
    }
}

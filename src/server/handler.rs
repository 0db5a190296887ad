// src/server/handler.rs
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::time::sleep;
use tower::Service;

use super::fault::FaultInjector;
use crate::config::MockServerConfig;

/// The only route the mock target serves.
pub const DATA_PATH: &str = "/api/data";

/// Stateless request handler for the mock target: fixed latency, then a
/// 200 or an injected 500.
#[derive(Clone)]
pub struct MockHandler {
    config: Arc<MockServerConfig>,
    faults: FaultInjector,
}

impl MockHandler {
    pub fn new(config: MockServerConfig) -> Self {
        let faults = FaultInjector::new(config.error_rate());
        Self {
            config: Arc::new(config),
            faults,
        }
    }

    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        if req.uri().path() != DATA_PATH {
            return json_response(StatusCode::NOT_FOUND, json!({ "error": "Not Found" }));
        }

        if req.method() != Method::GET && req.method() != Method::HEAD {
            let mut response = json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method Not Allowed" }),
            );
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }

        // Async sleep: other connections keep being served meanwhile.
        sleep(self.config.latency()).await;

        if self.faults.should_fail() {
            tracing::debug!(path = DATA_PATH, "Injecting server error");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error" }),
            )
        } else {
            json_response(
                StatusCode::OK,
                json!({ "message": "Data successfully retrieved!" }),
            )
        }
    }
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Body> {
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

impl Service<Request<Body>> for MockHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();
            let response = handler.handle(req).await;
            tracing::debug!(%method, %path, status = response.status().as_u16(), "served");
            Ok(response)
        })
    }
}

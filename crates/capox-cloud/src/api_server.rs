//! In-process Kubernetes API server for exercising the kube-backed stores

use http::{Method, Request, Response, StatusCode};
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tower_test::mock::{self, Handle};

pub type ApiHandle = Handle<Request<Body>, Response<Body>>;

/// What the server received
#[derive(Debug)]
pub struct Seen {
    pub method: Method,
    pub path: String,
}

/// Client wired to a mock service; answer its calls through the handle
pub fn mock_client() -> (Client, ApiHandle) {
    let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
    (Client::new(service, "default"), handle)
}

/// Answer the next request with `status` and a JSON `body`
pub fn serve_once(mut handle: ApiHandle, status: StatusCode, body: Value) -> JoinHandle<Seen> {
    tokio::spawn(async move {
        let (request, send) = handle
            .next_request()
            .await
            .expect("client should send a request");
        let seen = Seen {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
        };
        let bytes = serde_json::to_vec(&body).expect("body should serialize");
        send.send_response(
            Response::builder()
                .status(status)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(bytes))
                .expect("response should build"),
        );
        seen
    })
}

/// `Status` document the API server returns on failures
pub fn failure(code: u16, reason: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": format!("{} for test object", reason),
        "reason": reason,
        "code": code,
    })
}

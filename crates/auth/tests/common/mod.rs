//! In-process server that checks Nostr HTTP auth headers the way a
//! verifier would.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, post},
};
use http_body_util::BodyExt;
use nostr_http_auth::{
    HTTP_AUTH_KIND, Request, Response, SignedAssertion, Transport, TransportError,
    digest::payload_digest, token,
};
use serde_json::json;
use tower::ServiceExt;

pub const SECRET_HEX: &str = "6b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e";

pub fn verifying_router(base_url: &str) -> Router {
    Router::new()
        .route("/info", get(verify_handler))
        .route("/pay", post(verify_handler))
        .route("/fail", post(fail_handler))
        .route("/plain", get(|| async { (StatusCode::OK, "Ok") }))
        .with_state(Arc::new(base_url.to_string()))
}

async fn verify_handler(
    State(base_url): State<Arc<String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> AxumResponse {
    match check(&base_url, &method, &uri, &headers, &body) {
        Ok(assertion) => (
            StatusCode::OK,
            Json(json!({
                "id": assertion.id,
                "pubkey": assertion.pubkey.to_hex(),
                "u": assertion.url(),
            })),
        )
            .into_response(),
        Err(reason) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "unauthorized",
                "message": reason,
                "code": 401,
                "status_code": 401,
            })),
        )
            .into_response(),
    }
}

async fn fail_handler() -> AxumResponse {
    (
        StatusCode::PAYMENT_REQUIRED,
        Json(json!({
            "error": "insufficient_funds",
            "message": "Not enough\nbalance",
            "code": 1,
            "status_code": 402,
        })),
    )
        .into_response()
}

fn check(
    base_url: &str,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<SignedAssertion, String> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or("missing authorization")?
        .to_str()
        .map_err(|e| e.to_string())?;
    let assertion = token::parse_authorization(header).map_err(|e| e.to_string())?;
    assertion.verify().map_err(|e| e.to_string())?;

    if assertion.kind != HTTP_AUTH_KIND {
        return Err("wrong kind".into());
    }
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    if assertion.url() != Some(format!("{base_url}{path}").as_str()) {
        return Err("invalid url".into());
    }
    if assertion.method() != Some(method.as_str()) {
        return Err("invalid method".into());
    }
    match (body.is_empty(), assertion.payload_hash()) {
        (true, None) => {}
        (false, Some(hash)) if hash == payload_digest(body) => {}
        _ => return Err("invalid payload".into()),
    }
    Ok(assertion)
}

/// Transport that drives an axum router directly.
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

impl Transport for RouterTransport {
    async fn perform(&self, request: Request) -> Result<Response, TransportError> {
        let mut builder = axum::http::Request::builder()
            .method(request.method)
            .uri(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let body = request.body.map(Body::from).unwrap_or_else(Body::empty);
        let request = builder.body(body).map_err(TransportError::new)?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(TransportError::new)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(TransportError::new)?
            .to_bytes()
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

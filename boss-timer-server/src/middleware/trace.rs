use axum::{
    body::{self, Body, Bytes},
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ServerError;

pub static X_TRACE_ID: &str = "x-trace-id";

/// JSON bodies up to this size are written to the log verbatim.
const MAX_LOGGED_BODY: usize = 1024;

/// Request bodies are buffered here before any extractor runs, so larger ones
/// are refused while reading instead of after.
pub const MAX_REQUEST_BODY: usize = 64 * 1024;

/// Wrap each request in a span carrying a trace ID, log request/response
/// bodies, and echo the trace ID back in the `x-trace-id` response header.
pub async fn trace_middleware(req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    // Reuse a caller-supplied trace ID when it is a valid UUID.
    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");
        let header_value = HeaderValue::from_str(&trace_id.to_string()).ok();

        let (parts, body) = req.into_parts();
        let req_bytes = match read_request_body(body).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let mut response = err.into_response();
                if let Some(value) = header_value {
                    response.headers_mut().insert(X_TRACE_ID, value);
                }
                info!(
                    status = response.status().as_u16(),
                    latency_ms = start_time.elapsed().as_millis(),
                    "← request rejected"
                );
                return response;
            }
        };
        log_body("request", &parts.headers, &req_bytes);
        let mut req = Request::from_parts(parts, Body::from(req_bytes));
        if let Some(value) = header_value.clone() {
            req.headers_mut().insert(X_TRACE_ID, value);
        }

        let response = next.run(req).await;

        let (parts, body) = response.into_parts();
        let res_bytes = match body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "response body could not be read");
                Bytes::new()
            }
        };
        log_body("response", &parts.headers, &res_bytes);
        let mut response = Response::from_parts(parts, Body::from(res_bytes));
        if let Some(value) = header_value {
            response.headers_mut().insert(X_TRACE_ID, value);
        }

        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "← response finished"
        );
        response
    }
    .instrument(span)
    .await
}

/// Buffer a request body of at most [`MAX_REQUEST_BODY`] bytes.
async fn read_request_body(body: Body) -> Result<Bytes, ServerError> {
    body::to_bytes(body, MAX_REQUEST_BODY).await.map_err(|e| {
        let source = e.into_inner();
        if source.is::<LengthLimitError>() {
            warn!(limit = MAX_REQUEST_BODY, "request body exceeds limit");
            ServerError::PayloadTooLarge(format!("request body exceeds {MAX_REQUEST_BODY} bytes"))
        } else {
            warn!(error = %source, "request body could not be read");
            ServerError::Validation("request body could not be read".to_owned())
        }
    })
}

/// Log a buffered body when it is small JSON, otherwise just its size.
fn log_body(direction: &str, headers: &header::HeaderMap, bytes: &Bytes) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let is_json = content_type.contains("application/json");

    if is_json && bytes.len() < MAX_LOGGED_BODY {
        if let Ok(text) = std::str::from_utf8(bytes) {
            info!("{direction} body: {text}");
        }
    } else if !bytes.is_empty() {
        info!("{direction} body: [skipped: type={content_type}, size={}]", bytes.len());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::Request;
    use axum::http::StatusCode;
    use axum::{routing::{get, post}, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route("/echo", post(|body: Bytes| async move { body.len().to_string() }))
            .layer(axum::middleware::from_fn(trace_middleware))
    }

    #[tokio::test]
    async fn generates_trace_id_when_absent() {
        let resp = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = resp.headers().get(X_TRACE_ID).unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn echoes_valid_trace_id() {
        let id = Uuid::new_v4().to_string();
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(X_TRACE_ID, &id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers().get(X_TRACE_ID).unwrap(), id.as_str());
    }

    #[tokio::test]
    async fn replaces_malformed_trace_id() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(X_TRACE_ID, "not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let id = resp.headers().get(X_TRACE_ID).unwrap().to_str().unwrap();
        assert_ne!(id, "not-a-uuid");
        assert!(Uuid::parse_str(id).is_ok());
    }

    fn post_echo(len: usize) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(vec![b' '; len]))
            .unwrap()
    }

    #[tokio::test]
    async fn oversized_request_body_is_rejected() {
        let resp = app().oneshot(post_echo(MAX_REQUEST_BODY + 1)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(resp.headers().contains_key(X_TRACE_ID));
    }

    #[tokio::test]
    async fn body_at_limit_reaches_handler() {
        let resp = app().oneshot(post_echo(MAX_REQUEST_BODY)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, MAX_REQUEST_BODY.to_string().as_bytes());
    }
}

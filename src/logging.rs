//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_LENGTH, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// Bodies longer than this many bytes are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Request bodies larger than this many bytes are refused with 413 before
/// they are buffered.
pub const MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the response body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged at the `debug` level.
/// Session IDs in the `Authorization`, `Cookie` and `Set-Cookie` headers are
/// never logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    if declared_length(&parts.headers).is_some_and(|length| length > MAX_REQUEST_BODY_SIZE) {
        return Error::BodyTooLarge(MAX_REQUEST_BODY_SIZE).into_response();
    }

    let Some(body) = read_body(body, MAX_REQUEST_BODY_SIZE).await else {
        return Error::BodyTooLarge(MAX_REQUEST_BODY_SIZE).into_response();
    };

    log_body(
        &format!(
            "Received request: {} {}\nheaders: {:#?}",
            parts.method,
            parts.uri,
            redact_headers(&parts.headers)
        ),
        &String::from_utf8_lossy(&body),
    );

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;

    let (parts, body) = response.into_parts();
    let Some(body) = read_body(body, usize::MAX).await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    log_body(
        &format!(
            "Sending response: {}\nheaders: {:#?}",
            parts.status,
            redact_headers(&parts.headers)
        ),
        &String::from_utf8_lossy(&body),
    );

    Response::from_parts(parts, Body::from(body))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

async fn read_body(body: Body, limit: usize) -> Option<Bytes> {
    to_bytes(body, limit)
        .await
        .inspect_err(|error| tracing::error!("could not read body for logging: {error}"))
        .ok()
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in [AUTHORIZATION, COOKIE, SET_COOKIE] {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(REDACTED));
        }
    }

    headers
}

/// The longest prefix of `body` that fits in [LOG_BODY_LENGTH_LIMIT] bytes
/// without splitting a character.
fn truncate_body(body: &str) -> &str {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return body;
    }

    let end = (0..=LOG_BODY_LENGTH_LIMIT)
        .rev()
        .find(|&index| body.is_char_boundary(index))
        .unwrap_or(0);

    &body[..end]
}

fn log_body(message: &str, body: &str) {
    let truncated = truncate_body(body);

    if truncated.len() < body.len() {
        tracing::info!("{message}\nbody: {truncated}...");
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::{
        Router, body::Bytes,
        http::{
            HeaderMap, HeaderValue, StatusCode,
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        },
        middleware, routing::post,
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use super::{
        LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_SIZE, REDACTED, logging_middleware,
        redact_headers, truncate_body,
    };

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route("/echo", post(|body: Bytes| async move { body }))
            .layer(middleware::from_fn(logging_middleware));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn passes_request_body_through() {
        let server = get_test_server();

        let response = server.post("/echo").text("hello").await;

        response.assert_status_ok();
        response.assert_text("hello");
    }

    #[tokio::test]
    async fn refuses_oversized_body() {
        let server = get_test_server();

        let response = server
            .post("/echo")
            .bytes(Bytes::from(vec![b'a'; MAX_REQUEST_BODY_SIZE + 1]))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.json::<Value>(),
            json!({"message": "Request body is too large"})
        );
    }

    #[test]
    fn redacts_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert(COOKIE, HeaderValue::from_static("sid=secret"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted[AUTHORIZATION], REDACTED);
        assert_eq!(redacted[COOKIE], REDACTED);
        assert_eq!(redacted[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn short_body_is_not_truncated() {
        assert_eq!(truncate_body("{}"), "{}");
    }

    #[test]
    fn long_body_is_truncated_on_char_boundary() {
        let body = "é".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate_body(&body);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert_eq!(truncated, "é".repeat(LOG_BODY_LENGTH_LIMIT / 2));
    }
}

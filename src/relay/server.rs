// Relay router and handler.
// Forwards exactly one upstream call per inbound request, injecting the
// bearer credential and relaying status, body, and pagination headers
// back with permissive CORS. Holds no state between calls.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{
    HeaderMap, HeaderValue, Method, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LINK, VARY},
};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::{HomeroomError, Result};

use super::config::RelayConfig;

/// Header the caller supplies its LMS token under.
const TOKEN_HEADER: &str = "x-canvas-token";
/// Second name the pagination Link header is exposed under, so browser
/// code can read it despite default header-visibility restrictions.
const EXPOSED_LINK_HEADER: &str = "x-canvas-link";

#[derive(Clone)]
struct RelayState {
    http: reqwest::Client,
    base_re: Regex,
    api_prefix: String,
}

#[derive(Debug, Deserialize)]
struct RelayParams {
    #[serde(default)]
    base: String,
    #[serde(default)]
    path: String,
}

/// Build the relay router for the given config.
pub fn router(config: &RelayConfig) -> Result<Router> {
    let base_re = RegexBuilder::new(&config.base_pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| HomeroomError::Validation(format!("bad base pattern: {e}")))?;

    let state = RelayState {
        http: reqwest::Client::new(),
        base_re,
        api_prefix: config.api_prefix.clone(),
    };

    Ok(Router::new().route("/relay", any(relay)).with_state(state))
}

async fn relay(
    State(state): State<RelayState>,
    method: Method,
    Query(params): Query<RelayParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Preflight short-circuits before any validation.
    if method == Method::OPTIONS {
        return (StatusCode::NO_CONTENT, cors_headers()).into_response();
    }

    let base = params.base.trim_end_matches('/');
    let path = params.path.trim_start_matches('/');

    if base.is_empty() || !state.base_re.is_match(base) {
        return text_response(StatusCode::BAD_REQUEST, "Invalid base");
    }
    if !path.starts_with(&state.api_prefix) {
        return text_response(StatusCode::BAD_REQUEST, "Only /api/v1/* is allowed.");
    }
    let token = match headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty())
    {
        Some(token) => token,
        None => return text_response(StatusCode::UNAUTHORIZED, "Missing token"),
    };

    let url = format!("{base}/{path}");
    let upstream_method =
        reqwest::Method::from_bytes(method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET);
    let has_body = !matches!(method, Method::GET | Method::HEAD);

    let mut request = state
        .http
        .request(upstream_method, &url)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(ACCEPT, "application/json");
    if let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        request = request.header(CONTENT_TYPE, content_type);
    }
    if has_body {
        request = request.body(body.to_vec());
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%url, %err, "upstream request failed");
            return text_response(StatusCode::BAD_GATEWAY, "Upstream fetch failed.");
        }
    };

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let link = header_value(upstream.headers().get("link"));
    let content_type = header_value(upstream.headers().get("content-type"))
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    // Body relayed byte-for-byte; the upstream may return non-text payloads.
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%url, %err, "upstream body read failed");
            return text_response(StatusCode::BAD_GATEWAY, "Upstream fetch failed.");
        }
    };

    tracing::info!(method = %method, path, status = status.as_u16(), "relayed");

    let mut response_headers = cors_headers();
    response_headers.insert(CONTENT_TYPE, content_type);
    if let Some(link) = link {
        response_headers.insert(LINK, link.clone());
        response_headers.insert(EXPOSED_LINK_HEADER, link);
    }

    (status, response_headers, bytes.to_vec()).into_response()
}

/// Permissive cross-origin headers attached to every response.
fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type,X-Canvas-Token"),
    );
    headers.insert(
        "access-control-expose-headers",
        HeaderValue::from_static("Link,X-Canvas-Link,Content-Type"),
    );
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    headers
}

fn text_response(status: StatusCode, body: &'static str) -> Response {
    (status, cors_headers(), body).into_response()
}

/// Re-parse an upstream header value through the local http types.
fn header_value(value: Option<&reqwest::header::HeaderValue>) -> Option<HeaderValue> {
    value.and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
}

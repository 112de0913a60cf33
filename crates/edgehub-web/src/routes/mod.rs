//! Route table and helpers shared by the handlers.
//!
//! | Route | Methods | Handler |
//! |-------|---------|---------|
//! | `/api/crypto` | GET | [`data::crypto`] |
//! | `/api/joke` | GET | [`data::joke`] |
//! | `/api/rates` | GET | [`data::rates`] |
//! | `/api/weather/now` | GET | [`weather::now`] |
//! | `/api/weather/daily` | GET | [`weather::daily`] |
//! | `/api/media` | GET, HEAD | [`media::media`] |
//! | `/api/camera/stream` | GET, HEAD | [`camera::stream`] |
//! | `/api/camera/control` | POST, OPTIONS | [`camera::control`], [`camera::preflight`] |
//! | `/health` | GET | [`health::health`] |

pub mod camera;
pub mod data;
pub mod health;
pub mod media;
pub mod weather;

use std::collections::HashMap;
use std::future::Future;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::Response,
    routing::{get, post, MethodRouter},
    Router,
};
use bytes::Bytes;
use edgehub_core::{spawn_store, CacheKey, CacheTier, CachedResponse, FallbackOutcome, STREAM_METHODS};
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub type Params = HashMap<String, String>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/crypto", only_get(get(data::crypto)))
        .route("/api/joke", only_get(get(data::joke)))
        .route("/api/rates", only_get(get(data::rates)))
        .route("/api/weather/now", only_get(get(weather::now)))
        .route("/api/weather/daily", only_get(get(weather::daily)))
        .route(
            "/api/media",
            get(media::media)
                .head(media::media)
                .fallback(|| async { ApiError::MethodNotAllowed { allow: STREAM_METHODS } }),
        )
        .route(
            "/api/camera/stream",
            get(camera::stream)
                .head(camera::stream)
                .fallback(|| async { ApiError::MethodNotAllowed { allow: STREAM_METHODS } }),
        )
        .route(
            "/api/camera/control",
            post(camera::control)
                .options(camera::preflight)
                .fallback(|| async { ApiError::MethodNotAllowed { allow: camera::CONTROL_METHODS } }),
        )
        .route("/health", only_get(get(health::health)))
        .fallback(|| async { ApiError::NotFound })
        .with_state(state)
}

fn only_get(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(|| async { ApiError::MethodNotAllowed { allow: "GET" } })
}

pub(crate) fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

/// Cache key for the inbound request, derived from its `Host` and URI.
pub(crate) fn request_cache_key(headers: &HeaderMap, uri: &Uri) -> CacheKey {
    let host = uri
        .authority()
        .map(|authority| authority.as_str())
        .or_else(|| headers.get(header::HOST).and_then(|value| value.to_str().ok()))
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");
    CacheKey::new(scheme, host, uri.path(), uri.query())
}

/// Serve from the edge cache, or run `resolve` and cache its JSON body.
///
/// The chain behind `resolve` is never entered on a hit. On a miss the store
/// runs in the background and never delays or alters the response.
pub(crate) async fn read_through<F, Fut>(
    state: &AppState,
    key: CacheKey,
    tier: CacheTier,
    resolve: F,
) -> ApiResult<Response>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<Bytes>>,
{
    if let Some(cached) = state.cache.lookup(&key).await {
        debug!(key = %key, "cache hit");
        return Ok(cached_response(&cached));
    }
    debug!(key = %key, "cache miss");

    let body = resolve().await?;
    let cached = CachedResponse::json(StatusCode::OK.as_u16(), body, tier);
    let response = cached_response(&cached);
    spawn_store(state.cache.clone(), key, cached, tier.ttl());
    Ok(response)
}

pub(crate) fn json_bytes<T: Serialize>(payload: &T) -> ApiResult<Bytes> {
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(|error| ApiError::Internal(error.to_string()))
}

fn cached_response(cached: &CachedResponse) -> Response {
    let mut response = Response::new(Body::from(cached.body.clone()));
    *response.status_mut() = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    for (name, value) in &cached.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            response.headers_mut().append(name, value);
        }
    }
    response
}

/// How a route reports a chain where every provider failed transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exhausted {
    GatewayTimeout,
    BadGateway,
}

/// Turn a chain outcome into its payload or the route's error.
pub(crate) fn settle<T>(outcome: FallbackOutcome<T>, exhausted: Exhausted) -> ApiResult<(T, &'static str)> {
    match outcome {
        FallbackOutcome::Success { payload, provider } => Ok((payload, provider)),
        FallbackOutcome::UpstreamRejected { status, provider } => {
            Err(ApiError::UpstreamRejected { provider, status })
        }
        FallbackOutcome::AllFailed { attempts } => Err(match exhausted {
            Exhausted::GatewayTimeout => ApiError::AllProvidersFailed { attempts },
            Exhausted::BadGateway => ApiError::UpstreamUnavailable { attempts },
        }),
    }
}

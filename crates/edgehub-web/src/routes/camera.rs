//! Camera bridge: stream proxy and PTZ control.

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use edgehub_core::{BridgeConfig, CameraId, ControlCommand, ProxyTarget};
use tracing::{info, warn};

use super::{param, Params};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::stream::{relay, Redirects};

/// `Allow` value for the control route.
pub const CONTROL_METHODS: &str = "POST, OPTIONS";

fn bridge(state: &AppState) -> ApiResult<&BridgeConfig> {
    state.bridge.as_ref().ok_or(ApiError::NotConfigured {
        feature: "camera bridge",
    })
}

pub async fn stream(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<Params>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let camera = CameraId::from_param(param(&params, "cameraId"))?;
    let bridge = bridge(&state)?;
    let target = ProxyTarget::trusted(bridge.stream_url(&camera));

    relay(
        &state.stream_client,
        &method,
        target,
        &headers,
        Some(&bridge.authorization()),
        Redirects::Relay,
    )
    .await
}

/// Forward a PTZ command and relay the bridge's status and JSON body.
pub async fn control(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let command = ControlCommand::from_json(&body)?;
    let bridge = bridge(&state)?;
    let request = bridge.control_request(&command)?;

    let reply = state.http.execute(request).await.map_err(|error| {
        warn!(camera = %command.camera_id, %error, "camera bridge unreachable");
        ApiError::ProxyTransport {
            message: error.message().to_owned(),
        }
    })?;
    info!(
        camera = %command.camera_id,
        action = %command.action,
        status = reply.status,
        "camera command forwarded"
    );

    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    Ok(response)
}

/// CORS preflight for browser control panels.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, CONTROL_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_MAX_AGE, "86400"),
        ],
    )
}

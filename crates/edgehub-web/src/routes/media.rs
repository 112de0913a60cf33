use axum::{
    extract::{Query, State},
    http::{HeaderMap, Method},
    response::Response,
};
use edgehub_core::ProxyTarget;

use super::{param, Params};
use crate::error::ApiResult;
use crate::state::AppState;
use crate::stream::{relay, Redirects};

/// Range-preserving proxy for a user-supplied media `url`.
pub async fn media(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<Params>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let target = ProxyTarget::parse(param(&params, "url"), &state.media_hosts)?;
    relay(
        &state.stream_client,
        &method,
        target,
        &headers,
        None,
        Redirects::Follow(&state.media_hosts),
    )
    .await
}

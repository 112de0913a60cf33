//! Streaming relay shared by the media and camera proxy routes.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method},
    response::Response,
};
use edgehub_core::{HostAllowList, ProxyHeaderSet, ProxyTarget};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Upstream hops followed before a 3xx is relayed as-is.
pub const MAX_REDIRECTS: usize = 5;

/// What the relay does with an upstream 3xx.
#[derive(Debug, Clone, Copy)]
pub enum Redirects<'a> {
    /// Follow hops whose target passes the allow-list; refuse any other hop.
    Follow(&'a HostAllowList),
    /// Hand the 3xx and its `Location` back to the client.
    Relay,
}

/// Forward a GET or HEAD to `target` and relay the upstream response.
///
/// Only allow-listed headers cross in either direction. The upstream status
/// (206 included) is relayed as-is and the body is streamed without buffering.
/// `client` must not follow redirects on its own.
pub async fn relay(
    client: &reqwest::Client,
    method: &Method,
    target: ProxyTarget,
    inbound: &HeaderMap,
    authorization: Option<&str>,
    redirects: Redirects<'_>,
) -> ApiResult<Response> {
    let headers = ProxyHeaderSet::STREAM;
    let mut forwarded = headers.forward_request(inbound);
    if let Some(authorization) = authorization {
        let value = HeaderValue::from_str(authorization)
            .map_err(|error| ApiError::Internal(format!("invalid bridge credentials: {error}")))?;
        forwarded.insert(header::AUTHORIZATION, value);
    }

    let mut target = target;
    let mut hops = 0;
    let upstream = loop {
        let host = target.host().to_owned();
        let upstream = client
            .request(method.clone(), target.url().clone())
            .headers(forwarded.clone())
            .send()
            .await
            .map_err(|error| {
                warn!(%host, %error, "stream upstream unreachable");
                ApiError::ProxyTransport {
                    message: error.to_string(),
                }
            })?;

        let next = match redirects {
            Redirects::Follow(allow) if upstream.status().is_redirection() && hops < MAX_REDIRECTS => {
                upstream
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(|location| target.redirect(location, allow))
            }
            _ => None,
        };

        match next {
            None => break upstream,
            Some(Ok(next)) => {
                debug!(from = %host, to = %next.host(), "following upstream redirect");
                target = next;
                hops += 1;
            }
            Some(Err(error)) if error.is_forbidden() => {
                warn!(from = %host, %error, "upstream redirect left the allow-list");
                return Err(error.into());
            }
            Some(Err(error)) => {
                warn!(from = %host, %error, "upstream sent an unusable redirect");
                return Err(ApiError::ProxyTransport {
                    message: format!("invalid upstream redirect: {error}"),
                });
            }
        }
    };

    let status = upstream.status();
    debug!(host = %target.host(), status = status.as_u16(), hops, "relaying upstream stream");
    let relayed = headers.relay_response(upstream.headers());
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from_stream(upstream.bytes_stream())
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = relayed;
    Ok(response)
}

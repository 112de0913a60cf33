//! Behavior-driven tests for the streaming proxy routes
//!
//! These tests verify HOW media and camera streams are relayed: range
//! requests survive the hop, only allow-listed headers cross, and invalid
//! targets never reach the network. A local axum server plays the upstream.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::Path;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use edgehub_core::{BridgeConfig, HostAllowList, MemoryEdgeCache, ScriptedHttpClient};
use edgehub_web::{build_router, stream_client, AppState};
use reqwest::Url;
use tokio::net::TcpListener;
use tower::ServiceExt;

const VIDEO: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// =============================================================================
// Upstream fixture
// =============================================================================

/// Serves `VIDEO` with single-range support and a cookie the proxy must drop.
async fn serve_video(headers: HeaderMap) -> Response {
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("bytes="))
        .and_then(|value| value.split_once('-'))
        .and_then(|(start, end)| Some((start.parse::<usize>().ok()?, end.parse::<usize>().ok()?)));

    let common = [
        (header::CONTENT_TYPE, "video/mp4"),
        (header::ETAG, "\"v1\""),
        (header::SET_COOKIE, "session=secret"),
    ];
    match range {
        Some((start, end)) if start <= end && end < VIDEO.len() => (
            StatusCode::PARTIAL_CONTENT,
            common,
            [(
                header::CONTENT_RANGE,
                format!("bytes {start}-{end}/{}", VIDEO.len()),
            )],
            VIDEO[start..=end].to_vec(),
        )
            .into_response(),
        _ => (StatusCode::OK, common, VIDEO.to_vec()).into_response(),
    }
}

/// Reports which sensitive request headers made it through.
async fn echo_headers(headers: HeaderMap) -> String {
    format!(
        "cookie={} authorization={}",
        headers.contains_key(header::COOKIE),
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("none")
    )
}

/// Camera `moved` answers with a redirect to a host outside the bridge.
async fn camera_stream(Path(id): Path<String>, headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .is_some_and(|value| value == "Bearer bridge-token");
    match (authorized, id.as_str()) {
        (false, _) => StatusCode::UNAUTHORIZED.into_response(),
        (true, "moved") => found("https://relay.test/cam.mjpeg"),
        (true, _) => ([(header::CONTENT_TYPE, "multipart/x-mixed-replace")], "frame").into_response(),
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// `/hop-home` redirects within the same host, `/hop-away` to `localhost`.
async fn spawn_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
    let addr = listener.local_addr().expect("upstream address");
    let away = format!("http://localhost:{}/video.mp4", addr.port());
    let app = Router::new()
        .route("/video.mp4", get(serve_video))
        .route("/echo", get(echo_headers))
        .route("/hop-home", get(|| async { found("/video.mp4") }))
        .route(
            "/hop-away",
            get(move || {
                let away = away.clone();
                async move { found(&away) }
            }),
        )
        .route("/cameras/:id/stream", get(camera_stream));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("upstream serves");
    });
    addr
}

/// Port with nothing listening on it.
async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind closed port");
    let addr = listener.local_addr().expect("closed port address");
    drop(listener);
    addr
}

// =============================================================================
// Gateway helpers
// =============================================================================

fn state() -> AppState {
    AppState::new(
        Arc::new(ScriptedHttpClient::new()),
        Arc::new(MemoryEdgeCache::default()),
        stream_client().expect("stream client"),
    )
}

/// Gateway whose camera bridge is the local upstream.
fn bridge_state(upstream: SocketAddr) -> AppState {
    let base = format!("http://{upstream}/");
    let bridge = BridgeConfig::from_parts(Some(base.as_str()), Some("bridge-token")).expect("valid bridge url");
    state().with_bridge(bridge)
}

fn media_uri(target: &str) -> String {
    let mut url = Url::parse("http://edge.test/api/media").expect("static url");
    url.query_pairs_mut().append_pair("url", target);
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

async fn send(state: AppState, request: Request<Body>) -> Response {
    build_router(state)
        .oneshot(request)
        .await
        .expect("router is infallible")
}

fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body")
        .to_vec()
}

// =============================================================================
// Media proxy: relaying
// =============================================================================

#[tokio::test]
async fn when_client_requests_a_byte_range_system_relays_partial_content() {
    // Given: An upstream that honours Range
    let upstream = spawn_upstream().await;
    let uri = media_uri(&format!("http://{upstream}/video.mp4"));

    // When: The client asks for bytes 10-19 through the proxy
    let response = send(
        state(),
        request(Method::GET, &uri)
            .header(header::RANGE, "bytes=10-19")
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    // Then: The 206 and its Content-Range survive the hop
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        format!("bytes 10-19/{}", VIDEO.len())
    );
    assert_eq!(body_bytes(response).await, b"abcdefghij");
}

#[tokio::test]
async fn when_upstream_sets_cookies_system_strips_them_and_adds_stream_headers() {
    // Given: An upstream that sets a cookie and omits Accept-Ranges
    let upstream = spawn_upstream().await;
    let uri = media_uri(&format!("http://{upstream}/video.mp4"));

    // When: The full resource is proxied
    let response = send(
        state(),
        request(Method::GET, &uri).body(Body::empty()).expect("valid request"),
    )
    .await;

    // Then: Only allow-listed headers are relayed, plus CORS and range support
    let headers = response.headers();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::ETAG], "\"v1\"");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(body_bytes(response).await, VIDEO);
}

#[tokio::test]
async fn when_client_sends_cookies_system_does_not_forward_them() {
    // Given: A client request carrying cookie and authorization headers
    let upstream = spawn_upstream().await;
    let uri = media_uri(&format!("http://{upstream}/echo"));

    // When: It is proxied to the echo endpoint
    let response = send(
        state(),
        request(Method::GET, &uri)
            .header(header::COOKIE, "session=client")
            .header(header::AUTHORIZATION, "Bearer client-token")
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    // Then: Neither reached the upstream
    assert_eq!(
        body_bytes(response).await,
        b"cookie=false authorization=none"
    );
}

#[tokio::test]
async fn when_client_sends_head_system_relays_headers_with_empty_body() {
    let upstream = spawn_upstream().await;
    let uri = media_uri(&format!("http://{upstream}/video.mp4"));

    let response = send(
        state(),
        request(Method::HEAD, &uri).body(Body::empty()).expect("valid request"),
    )
    .await;

    let headers = response.headers();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::CONTENT_LENGTH], VIDEO.len().to_string());
    assert_eq!(headers[header::ETAG], "\"v1\"");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn when_upstream_redirects_within_allow_list_system_follows_it() {
    // Given: An allow-listed upstream that moves the video on the same host
    let upstream = spawn_upstream().await;
    let state = state().with_media_hosts(HostAllowList::parse("127.0.0.1"));

    // When: The moved URL is proxied
    let response = send(
        state,
        request(Method::GET, &media_uri(&format!("http://{upstream}/hop-home")))
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    // Then: The gateway followed the hop and relayed the video
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, VIDEO);
}

#[tokio::test]
async fn when_upstream_redirects_outside_allow_list_system_returns_403() {
    // Given: An allow-listed upstream that redirects to a host that is not listed
    let upstream = spawn_upstream().await;
    let state = state().with_media_hosts(HostAllowList::parse("127.0.0.1"));

    // When: The redirecting URL is proxied
    let response = send(
        state,
        request(Method::GET, &media_uri(&format!("http://{upstream}/hop-away")))
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    // Then: The unlisted hop is refused and nothing from it is relayed
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_ne!(body_bytes(response).await, VIDEO);
}

// =============================================================================
// Media proxy: rejection
// =============================================================================

#[tokio::test]
async fn when_media_url_uses_ftp_system_returns_400() {
    let response = send(
        state(),
        request(Method::GET, &media_uri("ftp://files.test/video.mp4"))
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn when_media_url_is_missing_system_returns_400() {
    let response = send(
        state(),
        request(Method::GET, "/api/media").body(Body::empty()).expect("valid request"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn when_media_host_is_outside_allow_list_system_returns_403_without_fetching() {
    // Given: An allow-list that does not include the upstream
    let upstream = spawn_upstream().await;
    let state = state().with_media_hosts(HostAllowList::parse("cdn.test"));

    // When: The upstream is requested anyway
    let response = send(
        state,
        request(Method::GET, &media_uri(&format!("http://{upstream}/video.mp4")))
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    // Then: The gateway forbids it
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn when_media_route_receives_post_system_returns_405_with_allow() {
    let response = send(
        state(),
        request(Method::POST, &media_uri("https://cdn.test/video.mp4"))
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
}

#[tokio::test]
async fn when_upstream_is_unreachable_system_returns_502() {
    let closed = closed_port().await;

    let response = send(
        state(),
        request(Method::GET, &media_uri(&format!("http://{closed}/video.mp4")))
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// =============================================================================
// Camera stream
// =============================================================================

#[tokio::test]
async fn when_bridge_is_configured_system_streams_camera_with_bridge_credentials() {
    // Given: A bridge served by the local upstream
    let upstream = spawn_upstream().await;

    // When: The client opens a camera stream without credentials of its own
    let response = send(
        bridge_state(upstream),
        request(Method::GET, "/api/camera/stream?cameraId=cam1")
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    // Then: The gateway authenticated upstream and relayed the frames
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("multipart/x-mixed-replace"))
    );
    assert_eq!(body_bytes(response).await, b"frame");
}

#[tokio::test]
async fn when_client_sends_head_to_camera_stream_system_relays_headers_with_empty_body() {
    let upstream = spawn_upstream().await;

    let response = send(
        bridge_state(upstream),
        request(Method::HEAD, "/api/camera/stream?cameraId=cam1")
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    let headers = response.headers();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "multipart/x-mixed-replace");
    assert_eq!(headers[header::CONTENT_LENGTH], "5");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn when_bridge_redirects_camera_stream_system_relays_the_redirect() {
    // Given: A bridge that moved the camera to another host
    let upstream = spawn_upstream().await;

    // When: The camera stream is opened
    let response = send(
        bridge_state(upstream),
        request(Method::GET, "/api/camera/stream?cameraId=moved")
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    // Then: The gateway hands the redirect to the client instead of following it
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "https://relay.test/cam.mjpeg");
}

#[tokio::test]
async fn when_bridge_is_missing_system_returns_501_for_camera_stream() {
    let response = send(
        state(),
        request(Method::GET, "/api/camera/stream?cameraId=cam1")
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn when_camera_id_is_malformed_system_returns_400() {
    let upstream = spawn_upstream().await;

    let response = send(
        bridge_state(upstream),
        request(Method::GET, "/api/camera/stream?cameraId=..%2Fadmin")
            .body(Body::empty())
            .expect("valid request"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

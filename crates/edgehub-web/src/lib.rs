//! # Edgehub Web
//!
//! axum gateway serving the aggregation routes and the streaming proxy.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cli`] | Command-line flags |
//! | [`config`] | Environment configuration |
//! | [`error`] | API error to HTTP response mapping |
//! | [`logging`] | Tracing subscriber bootstrap |
//! | [`routes`] | Route table and handlers |
//! | [`state`] | Shared request state |
//! | [`stream`] | Streaming relay for proxied routes |

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod stream;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{GatewayConfig, LogFormat, LoggingConfig};
pub use error::{ApiError, StartupError};
pub use state::{stream_client, upstream_client, AppState, Chains};

/// Full application router with request tracing.
pub fn build_router(state: AppState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}

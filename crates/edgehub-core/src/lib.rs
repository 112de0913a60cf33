//! # Edgehub Core
//!
//! Provider fallback, edge caching and proxy contracts for the edgehub gateway.
//!
//! ## Overview
//!
//! - **Provider chains** try public APIs in order under one shared deadline
//! - **Response transforms** map each provider's payload onto one normalized shape
//! - **Edge cache** holds successful aggregation responses for a short TTL
//! - **Proxy contracts** decide which headers and targets may cross the stream proxy
//! - **Camera bridge** validates PTZ commands and builds bridge URLs
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Camera identifiers, control commands, bridge URLs |
//! | [`cache`] | Cache keys, TTL tiers, `EdgeCache` trait and in-memory store |
//! | [`chain`] | Ordered provider fallback with a shared deadline |
//! | [`error`] | Validation and transform errors |
//! | [`http_client`] | HTTP transport abstraction (reqwest and scripted) |
//! | [`provider`] | Provider adapter trait |
//! | [`providers`] | Concrete adapters and the per-route chains |
//! | [`proxy`] | Header allow-lists and upstream target validation |
//! | [`query`] | Query parameter parsing and validation |
//! | [`transform`] | JSON accessors and timestamp helpers shared by adapters |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use edgehub_core::{crypto_chain, CryptoQuery, FallbackOutcome, ReqwestHttpClient};
//!
//! let client = ReqwestHttpClient::default();
//! let query = CryptoQuery { coin: "bitcoin".into(), currency: "usd".into() };
//! match crypto_chain().resolve(&client, &query).await {
//!     FallbackOutcome::Success { payload, provider } => println!("{provider}: {}", payload.price),
//!     other => eprintln!("no price: {other:?}"),
//! }
//! ```

pub mod bridge;
pub mod cache;
pub mod chain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod providers;
pub mod proxy;
pub mod query;
pub mod transform;

pub use bridge::{BridgeConfig, CameraId, ControlAction, ControlCommand, MAX_DURATION_MS};
pub use cache::{
    cache_control_value, spawn_store, CacheError, CacheKey, CacheTier, CachedResponse, EdgeCache,
    MemoryEdgeCache,
};
pub use chain::{
    classify_status, AttemptFailure, FailureReason, FallbackOutcome, ProviderChain, StatusClass,
    GENERIC_DEADLINE, SLOW_DEADLINE, WEATHER_NOW_DEADLINE,
};
pub use error::{CoreError, TransformError, ValidationError};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient, ScriptedReply,
};
pub use provider::{Provider, ProviderRef};
pub use providers::{
    crypto_chain, daily_chain, geocode_chain, joke_chain, rates_chain, weather_now_chain,
    CryptoPrice, CryptoQuery, DailyEntry, DailyForecast, DailyQuery, ExchangeRates, GeocodeQuery,
    Joke, Place, RatesQuery, WeatherNow, WeatherNowQuery,
};
pub use proxy::{HostAllowList, ProxyHeaderSet, ProxyTarget, STREAM_METHODS};
pub use query::{Coordinates, CurrencyCode, ForecastLocation};

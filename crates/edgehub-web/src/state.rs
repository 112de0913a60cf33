//! Shared request state.

use std::sync::Arc;
use std::time::Duration;

use edgehub_core::http_client::USER_AGENT;
use edgehub_core::providers::{
    crypto_chain, daily_chain, geocode_chain, joke_chain, rates_chain, weather_now_chain,
};
use edgehub_core::{
    BridgeConfig, CryptoPrice, CryptoQuery, DailyForecast, DailyQuery, EdgeCache, ExchangeRates,
    GeocodeQuery, HostAllowList, HttpClient, Joke, Place, ProviderChain, RatesQuery, WeatherNow,
    WeatherNowQuery,
};

use crate::config::GatewayConfig;

/// Connect and read ceiling for upstream traffic.
pub const UPSTREAM_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider chains, built once at startup.
pub struct Chains {
    pub crypto: ProviderChain<CryptoQuery, CryptoPrice>,
    pub joke: ProviderChain<(), Joke>,
    pub weather_now: ProviderChain<WeatherNowQuery, WeatherNow>,
    pub geocode: ProviderChain<GeocodeQuery, Option<Place>>,
    pub daily: ProviderChain<DailyQuery, DailyForecast>,
    pub rates: ProviderChain<RatesQuery, ExchangeRates>,
}

impl Default for Chains {
    fn default() -> Self {
        Self {
            crypto: crypto_chain(),
            joke: joke_chain(),
            weather_now: weather_now_chain(),
            geocode: geocode_chain(),
            daily: daily_chain(),
            rates: rates_chain(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    /// JSON transport used by provider chains and bridge control.
    pub http: Arc<dyn HttpClient>,
    pub cache: Arc<dyn EdgeCache>,
    /// Client for streamed proxy traffic; must not follow redirects itself.
    pub stream_client: reqwest::Client,
    pub chains: Arc<Chains>,
    pub bridge: Option<BridgeConfig>,
    pub media_hosts: HostAllowList,
}

impl AppState {
    pub fn new(http: Arc<dyn HttpClient>, cache: Arc<dyn EdgeCache>, stream_client: reqwest::Client) -> Self {
        Self {
            http,
            cache,
            stream_client,
            chains: Arc::new(Chains::default()),
            bridge: None,
            media_hosts: HostAllowList::default(),
        }
    }

    pub fn with_bridge(mut self, bridge: Option<BridgeConfig>) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn with_media_hosts(mut self, hosts: HostAllowList) -> Self {
        self.media_hosts = hosts;
        self
    }

    pub fn with_chains(mut self, chains: Chains) -> Self {
        self.chains = Arc::new(chains);
        self
    }

    /// State wired from configuration.
    pub fn from_config(
        config: &GatewayConfig,
        http: Arc<dyn HttpClient>,
        cache: Arc<dyn EdgeCache>,
        stream_client: reqwest::Client,
    ) -> Self {
        Self::new(http, cache, stream_client)
            .with_bridge(config.bridge.clone())
            .with_media_hosts(config.media_allowed_hosts.clone())
    }
}

fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(UPSTREAM_IO_TIMEOUT)
        .read_timeout(UPSTREAM_IO_TIMEOUT)
        .pool_idle_timeout(Duration::from_secs(90))
}

/// Pooled client for the JSON transport (provider fetches, bridge control).
pub fn upstream_client() -> Result<reqwest::Client, reqwest::Error> {
    client_builder().build()
}

/// Pooled client for the stream proxy.
///
/// Redirects are surfaced to [`crate::stream::relay`], which re-validates every
/// hop against the media host allow-list before following it.
pub fn stream_client() -> Result<reqwest::Client, reqwest::Error> {
    client_builder().redirect(reqwest::redirect::Policy::none()).build()
}

//! Generic aggregation routes: crypto price, joke, exchange rates.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    response::Response,
};
use edgehub_core::query::{parse_base_currency, parse_coin, parse_symbols, parse_vs_currency};
use edgehub_core::{CacheTier, CryptoQuery, RatesQuery};
use serde::Serialize;

use super::{json_bytes, param, read_through, request_cache_key, settle, Exhausted, Params};
use crate::error::ApiResult;
use crate::state::AppState;

/// `{provider, payload}` envelope used by the generic routes.
#[derive(Debug, Serialize)]
pub struct ProviderEnvelope<T> {
    pub provider: &'static str,
    pub payload: T,
}

pub async fn crypto(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Response> {
    let query = CryptoQuery {
        coin: parse_coin(param(&params, "coin"))?,
        currency: parse_vs_currency(param(&params, "vs"))?,
    };

    let (http, chain) = (state.http.as_ref(), &state.chains.crypto);
    let key = request_cache_key(&headers, &uri);
    read_through(&state, key, CacheTier::Generic, || async move {
        let (payload, provider) = settle(chain.resolve(http, &query).await, Exhausted::GatewayTimeout)?;
        json_bytes(&ProviderEnvelope { provider, payload })
    })
    .await
}

pub async fn joke(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> ApiResult<Response> {
    let (http, chain) = (state.http.as_ref(), &state.chains.joke);
    let key = request_cache_key(&headers, &uri);
    read_through(&state, key, CacheTier::Generic, || async move {
        let (payload, provider) = settle(chain.resolve(http, &()).await, Exhausted::GatewayTimeout)?;
        json_bytes(&ProviderEnvelope { provider, payload })
    })
    .await
}

#[derive(Debug, Serialize)]
struct RatesBody {
    provider: &'static str,
    base: String,
    date: Option<String>,
    rates: BTreeMap<String, f64>,
}

pub async fn rates(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Response> {
    let query = RatesQuery {
        base: parse_base_currency(param(&params, "base"))?,
        symbols: parse_symbols(param(&params, "symbols"))?,
    };

    let (http, chain) = (state.http.as_ref(), &state.chains.rates);
    let key = request_cache_key(&headers, &uri);
    read_through(&state, key, CacheTier::ExchangeRates, || async move {
        let (rates, provider) = settle(chain.resolve(http, &query).await, Exhausted::BadGateway)?;
        json_bytes(&RatesBody {
            provider,
            base: rates.base,
            date: rates.date,
            rates: rates.rates,
        })
    })
    .await
}

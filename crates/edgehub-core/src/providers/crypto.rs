use serde::Serialize;
use serde_json::Value;

use crate::error::TransformError;
use crate::http_client::HttpRequest;
use crate::provider::Provider;
use crate::transform::f64_at;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoQuery {
    /// CoinGecko/CoinCap asset id, e.g. `bitcoin`.
    pub coin: String,
    /// Lower-case quote currency, e.g. `usd`.
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoPrice {
    pub coin: String,
    pub currency: String,
    pub price: f64,
    pub change24h: Option<f64>,
}

/// CoinGecko `simple/price`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinGecko;

impl Provider for CoinGecko {
    type Query = CryptoQuery;
    type Output = CryptoPrice;

    fn name(&self) -> &'static str {
        "coingecko"
    }

    fn request(&self, query: &CryptoQuery) -> HttpRequest {
        HttpRequest::get(format!(
            "https://api.coingecko.com/api/v3/simple/price?ids={}&vs_currencies={}&include_24hr_change=true",
            urlencoding::encode(&query.coin),
            urlencoding::encode(&query.currency),
        ))
        .with_header("accept", "application/json")
    }

    fn transform(&self, body: Value, query: &CryptoQuery) -> Result<CryptoPrice, TransformError> {
        let entry = body
            .get(&query.coin)
            .ok_or(TransformError::MissingField { field: "coin" })?;
        let price = entry
            .get(&query.currency)
            .and_then(Value::as_f64)
            .ok_or(TransformError::MissingField { field: "price" })?;
        let change24h = entry
            .get(format!("{}_24h_change", query.currency))
            .and_then(Value::as_f64);

        Ok(CryptoPrice {
            coin: query.coin.clone(),
            currency: query.currency.clone(),
            price,
            change24h,
        })
    }
}

/// CoinCap `v2/assets/{id}`; quotes USD only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinCap;

impl Provider for CoinCap {
    type Query = CryptoQuery;
    type Output = CryptoPrice;

    fn name(&self) -> &'static str {
        "coincap"
    }

    fn supports(&self, query: &CryptoQuery) -> bool {
        query.currency == "usd"
    }

    fn request(&self, query: &CryptoQuery) -> HttpRequest {
        HttpRequest::get(format!(
            "https://api.coincap.io/v2/assets/{}",
            urlencoding::encode(&query.coin)
        ))
        .with_header("accept", "application/json")
    }

    fn transform(&self, body: Value, query: &CryptoQuery) -> Result<CryptoPrice, TransformError> {
        let price = f64_at(&body, "/data/priceUsd")
            .ok_or(TransformError::MissingField { field: "priceUsd" })?;

        Ok(CryptoPrice {
            coin: query.coin.clone(),
            currency: query.currency.clone(),
            price,
            change24h: f64_at(&body, "/data/changePercent24Hr"),
        })
    }
}

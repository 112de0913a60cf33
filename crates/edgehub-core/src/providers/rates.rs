use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::TransformError;
use crate::http_client::HttpRequest;
use crate::provider::Provider;
use crate::query::CurrencyCode;
use crate::transform::{date_stamp, i64_at, str_at, string_at};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatesQuery {
    pub base: CurrencyCode,
    /// Empty means every currency the provider knows.
    pub symbols: Vec<CurrencyCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRates {
    pub base: String,
    pub date: Option<String>,
    pub rates: BTreeMap<String, f64>,
}

fn collect_rates(rates: &serde_json::Map<String, Value>, query: &RatesQuery) -> BTreeMap<String, f64> {
    rates
        .iter()
        .filter(|(code, _)| code.as_str() != query.base.as_str())
        .filter(|(code, _)| {
            query.symbols.is_empty() || query.symbols.iter().any(|symbol| symbol.as_str() == code.as_str())
        })
        .filter_map(|(code, rate)| rate.as_f64().map(|rate| (code.clone(), rate)))
        .collect()
}

fn rates_object<'a>(body: &'a Value) -> Result<&'a serde_json::Map<String, Value>, TransformError> {
    match body.get("rates") {
        Some(Value::Object(rates)) => Ok(rates),
        Some(_) => Err(TransformError::UnexpectedType { field: "rates" }),
        None => Err(TransformError::MissingField { field: "rates" }),
    }
}

/// Frankfurter (ECB reference rates).
#[derive(Debug, Clone, Copy, Default)]
pub struct Frankfurter;

impl Provider for Frankfurter {
    type Query = RatesQuery;
    type Output = ExchangeRates;

    fn name(&self) -> &'static str {
        "frankfurter"
    }

    fn request(&self, query: &RatesQuery) -> HttpRequest {
        let mut url = format!("https://api.frankfurter.app/latest?from={}", query.base);
        if !query.symbols.is_empty() {
            let symbols = query
                .symbols
                .iter()
                .map(CurrencyCode::as_str)
                .collect::<Vec<_>>()
                .join(",");
            url.push_str("&to=");
            url.push_str(&symbols);
        }
        HttpRequest::get(url)
    }

    fn transform(&self, body: Value, query: &RatesQuery) -> Result<ExchangeRates, TransformError> {
        let rates = collect_rates(rates_object(&body)?, query);
        Ok(ExchangeRates {
            base: string_at(&body, "/base").unwrap_or_else(|| query.base.to_string()),
            date: string_at(&body, "/date"),
            rates,
        })
    }
}

/// open.er-api.com; returns every currency, filtered locally.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenErApi;

impl Provider for OpenErApi {
    type Query = RatesQuery;
    type Output = ExchangeRates;

    fn name(&self) -> &'static str {
        "open-er-api"
    }

    fn request(&self, query: &RatesQuery) -> HttpRequest {
        HttpRequest::get(format!("https://open.er-api.com/v6/latest/{}", query.base))
    }

    fn transform(&self, body: Value, query: &RatesQuery) -> Result<ExchangeRates, TransformError> {
        if str_at(&body, "/result").is_some_and(|result| result != "success") {
            return Err(TransformError::Empty);
        }
        let rates = collect_rates(rates_object(&body)?, query);
        let date = i64_at(&body, "/time_last_update_unix")
            .and_then(|unix| OffsetDateTime::from_unix_timestamp(unix).ok())
            .map(date_stamp);

        Ok(ExchangeRates {
            base: string_at(&body, "/base_code").unwrap_or_else(|| query.base.to_string()),
            date,
            rates,
        })
    }
}

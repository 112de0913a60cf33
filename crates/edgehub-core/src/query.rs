//! Query-string validation shared by the aggregation routes.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::error::ValidationError;

pub const MIN_FORECAST_DAYS: u8 = 1;
pub const MAX_FORECAST_DAYS: u8 = 16;

/// Validated WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::OutOfRange {
                name: "lat",
                min: -90,
                max: 90,
            });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::OutOfRange {
                name: "lon",
                min: -180,
                max: 180,
            });
        }
        Ok(Self { lat, lon })
    }

    pub fn parse(lat: Option<&str>, lon: Option<&str>) -> Result<Self, ValidationError> {
        let lat = parse_number("lat", lat)?;
        let lon = parse_number("lon", lon)?;
        Self::new(lat, lon)
    }
}

fn parse_number(name: &'static str, raw: Option<&str>) -> Result<f64, ValidationError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingParameter { name })?;
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            name,
            value: raw.to_owned(),
        })
}

/// Forecast length: clamped into [1, 16]; absent or non-numeric means 16.
pub fn parse_days(raw: Option<&str>) -> u8 {
    let Some(days) = raw
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
    else {
        return MAX_FORECAST_DAYS;
    };

    days.trunc()
        .clamp(f64::from(MIN_FORECAST_DAYS), f64::from(MAX_FORECAST_DAYS)) as u8
}

/// Where a daily forecast is requested for: a city name or explicit coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForecastLocation {
    City { q: String },
    Coordinates(Coordinates),
}

impl ForecastLocation {
    /// Exactly one of `q` or the `lat`/`lon` pair must be supplied.
    pub fn parse(
        q: Option<&str>,
        lat: Option<&str>,
        lon: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let present = |value: Option<&str>| value.is_some_and(|value| !value.trim().is_empty());

        match (q, present(lat) || present(lon)) {
            (Some(_), true) => Err(ValidationError::ConflictingLocation),
            (Some(q), false) => {
                let q = q.trim();
                if q.is_empty() {
                    return Err(ValidationError::EmptyCityQuery);
                }
                Ok(Self::City { q: q.to_owned() })
            }
            (None, true) => Coordinates::parse(lat, lon).map(Self::Coordinates),
            (None, false) => Err(ValidationError::MissingLocation),
        }
    }
}

/// Upper-cased ISO 4217 style currency code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let value = raw.trim();
        if value.len() != 3 || !value.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency {
                value: value.to_owned(),
            });
        }
        Ok(Self(value.to_ascii_uppercase()))
    }

    pub fn usd() -> Self {
        Self(String::from("USD"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `base` defaults to USD when absent or blank.
pub fn parse_base_currency(raw: Option<&str>) -> Result<CurrencyCode, ValidationError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => CurrencyCode::parse(value),
        None => Ok(CurrencyCode::usd()),
    }
}

/// Comma-separated currency list; blanks are skipped and duplicates dropped.
pub fn parse_symbols(raw: Option<&str>) -> Result<Vec<CurrencyCode>, ValidationError> {
    let mut symbols: Vec<CurrencyCode> = Vec::new();
    for part in raw.unwrap_or_default().split(',') {
        if part.trim().is_empty() {
            continue;
        }
        let code = CurrencyCode::parse(part)?;
        if !symbols.contains(&code) {
            symbols.push(code);
        }
    }
    Ok(symbols)
}

/// Coin identifier as used by CoinGecko/CoinCap (`bitcoin`, `ethereum`, `usd-coin`).
pub fn parse_coin(raw: Option<&str>) -> Result<String, ValidationError> {
    let value = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("bitcoin")
        .to_ascii_lowercase();
    let valid = value.len() <= 64
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
    if !valid {
        return Err(ValidationError::InvalidCoin { value });
    }
    Ok(value)
}

/// Quote currency for crypto prices (`usd`, `eur`, `btc`); lower-cased.
pub fn parse_vs_currency(raw: Option<&str>) -> Result<String, ValidationError> {
    let value = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("usd");
    if !(3..=5).contains(&value.len()) || !value.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidCurrency {
            value: value.to_owned(),
        });
    }
    Ok(value.to_ascii_lowercase())
}

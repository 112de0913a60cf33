//! Current conditions plus the next three hourly entries.
//!
//! Open-Meteo reports WMO weather codes directly. MET Norway reports textual
//! symbol codes, which are mapped to the closest WMO code so both providers
//! emit the same record.

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::TransformError;
use crate::http_client::HttpRequest;
use crate::provider::Provider;
use crate::query::Coordinates;
use crate::transform::{
    f64_at, f64_in, i64_at, i64_in, minute_stamp, require_array, second_stamp, str_at,
    strictly_after, string_at,
};

/// Number of upcoming hourly entries returned alongside current conditions.
pub const NEXT_HOURS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherNowQuery {
    pub coords: Coordinates,
    /// Instant the "strictly future" hourly entries are measured against.
    pub as_of: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub time: Option<String>,
    /// Air temperature, °C.
    pub temperature: Option<f64>,
    /// Precipitation, mm.
    pub precipitation: Option<f64>,
    /// WMO weather interpretation code.
    pub code: Option<i64>,
    /// Wind speed, km/h.
    pub wind: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPoint {
    pub time: String,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherNow {
    pub current: CurrentConditions,
    pub next3h: Vec<HourlyPoint>,
}

/// Open-Meteo `/v1/forecast` with `current` and `hourly` blocks in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMeteoCurrent;

impl Provider for OpenMeteoCurrent {
    type Query = WeatherNowQuery;
    type Output = WeatherNow;

    fn name(&self) -> &'static str {
        "open-meteo"
    }

    fn request(&self, query: &WeatherNowQuery) -> HttpRequest {
        HttpRequest::get(format!(
            "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}\
             &current=temperature_2m,precipitation,weather_code,wind_speed_10m\
             &hourly=temperature_2m,precipitation,weather_code\
             &forecast_days=2&timezone=UTC",
            query.coords.lat, query.coords.lon
        ))
    }

    fn transform(&self, body: Value, query: &WeatherNowQuery) -> Result<WeatherNow, TransformError> {
        if !body.get("current").is_some_and(Value::is_object) {
            return Err(TransformError::MissingField { field: "current" });
        }

        let current = CurrentConditions {
            time: string_at(&body, "/current/time"),
            temperature: f64_at(&body, "/current/temperature_2m"),
            precipitation: f64_at(&body, "/current/precipitation"),
            code: i64_at(&body, "/current/weather_code"),
            wind: f64_at(&body, "/current/wind_speed_10m"),
        };

        let next3h = match body.pointer("/hourly/time").and_then(Value::as_array) {
            Some(times) => {
                let temperature = body.pointer("/hourly/temperature_2m").and_then(Value::as_array);
                let precipitation = body.pointer("/hourly/precipitation").and_then(Value::as_array);
                let code = body.pointer("/hourly/weather_code").and_then(Value::as_array);

                strictly_after(times, &minute_stamp(query.as_of), NEXT_HOURS)
                    .into_iter()
                    .map(|index| HourlyPoint {
                        time: times[index].as_str().unwrap_or_default().to_owned(),
                        temperature: f64_in(temperature, index),
                        precipitation: f64_in(precipitation, index),
                        code: i64_in(code, index),
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        Ok(WeatherNow { current, next3h })
    }
}

/// MET Norway `locationforecast/2.0/compact`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetNorway;

impl MetNorway {
    fn point(entry: &Value) -> HourlyPoint {
        HourlyPoint {
            time: string_at(entry, "/time").unwrap_or_default(),
            temperature: f64_at(entry, "/data/instant/details/air_temperature"),
            precipitation: f64_at(entry, "/data/next_1_hours/details/precipitation_amount"),
            code: str_at(entry, "/data/next_1_hours/summary/symbol_code").and_then(symbol_to_wmo),
        }
    }
}

impl Provider for MetNorway {
    type Query = WeatherNowQuery;
    type Output = WeatherNow;

    fn name(&self) -> &'static str {
        "met-norway"
    }

    fn request(&self, query: &WeatherNowQuery) -> HttpRequest {
        // MET Norway rejects coordinates with more than four decimals.
        HttpRequest::get(format!(
            "https://api.met.no/weatherapi/locationforecast/2.0/compact?lat={:.4}&lon={:.4}",
            query.coords.lat, query.coords.lon
        ))
        .with_header("accept", "application/json")
    }

    fn transform(&self, body: Value, query: &WeatherNowQuery) -> Result<WeatherNow, TransformError> {
        let series = require_array(&body, "/properties/timeseries", "timeseries")?;
        let first = series.first().ok_or(TransformError::Empty)?;
        let head = Self::point(first);

        let current = CurrentConditions {
            time: Some(head.time).filter(|time| !time.is_empty()),
            temperature: head.temperature,
            precipitation: head.precipitation,
            code: head.code,
            // m/s upstream; normalized to km/h like Open-Meteo.
            wind: f64_at(first, "/data/instant/details/wind_speed").map(|speed| round1(speed * 3.6)),
        };

        let times = series
            .iter()
            .map(|entry| entry.get("time").cloned().unwrap_or(Value::Null))
            .collect::<Vec<_>>();
        let next3h = strictly_after(&times, &second_stamp(query.as_of), NEXT_HOURS)
            .into_iter()
            .map(|index| Self::point(&series[index]))
            .collect();

        Ok(WeatherNow { current, next3h })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Map a MET Norway symbol code (`lightrainshowers_day`) to a WMO weather code.
pub fn symbol_to_wmo(symbol: &str) -> Option<i64> {
    let base = symbol
        .split('_')
        .next()
        .unwrap_or(symbol)
        .to_ascii_lowercase();

    if base.contains("thunder") {
        return Some(95);
    }

    let code = match base.as_str() {
        "clearsky" => 0,
        "fair" => 1,
        "partlycloudy" => 2,
        "cloudy" => 3,
        "fog" => 45,
        "lightrain" => 61,
        "rain" => 63,
        "heavyrain" => 65,
        "lightsleet" | "sleet" => 66,
        "heavysleet" => 67,
        "lightsnow" => 71,
        "snow" => 73,
        "heavysnow" => 75,
        "lightrainshowers" => 80,
        "rainshowers" => 81,
        "heavyrainshowers" => 82,
        "lightsnowshowers" | "snowshowers" | "lightsleetshowers" | "sleetshowers" => 85,
        "heavysnowshowers" | "heavysleetshowers" => 86,
        _ => return None,
    };
    Some(code)
}

use serde::Serialize;
use serde_json::Value;

use crate::error::TransformError;
use crate::http_client::HttpRequest;
use crate::provider::Provider;
use crate::query::Coordinates;
use crate::transform::{f64_at, f64_in, i64_in, require_array, string_at};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeQuery {
    pub city: String,
}

/// Best geocoding match for a city query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: Option<String>,
    pub country: Option<String>,
    pub admin1: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
}

impl Place {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude, self.longitude).ok()
    }

    /// Location block for explicit coordinates; the timezone comes from the forecast.
    pub fn from_coordinates(coords: Coordinates, timezone: Option<String>) -> Self {
        Self {
            name: None,
            country: None,
            admin1: None,
            latitude: coords.lat,
            longitude: coords.lon,
            timezone,
        }
    }
}

/// Open-Meteo geocoding search. `Ok(None)` means the city is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMeteoGeocoder;

impl Provider for OpenMeteoGeocoder {
    type Query = GeocodeQuery;
    type Output = Option<Place>;

    fn name(&self) -> &'static str {
        "open-meteo-geocoding"
    }

    fn request(&self, query: &GeocodeQuery) -> HttpRequest {
        HttpRequest::get(format!(
            "https://geocoding-api.open-meteo.com/v1/search?name={}&count=1&language=en&format=json",
            urlencoding::encode(&query.city)
        ))
    }

    fn transform(&self, body: Value, _query: &GeocodeQuery) -> Result<Option<Place>, TransformError> {
        // Open-Meteo omits `results` entirely when nothing matches.
        let Some(first) = body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
        else {
            return Ok(None);
        };

        let latitude = f64_at(first, "/latitude").ok_or(TransformError::MissingField { field: "latitude" })?;
        let longitude =
            f64_at(first, "/longitude").ok_or(TransformError::MissingField { field: "longitude" })?;

        Ok(Some(Place {
            name: string_at(first, "/name"),
            country: string_at(first, "/country"),
            admin1: string_at(first, "/admin1"),
            latitude,
            longitude,
            timezone: string_at(first, "/timezone"),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyQuery {
    pub coords: Coordinates,
    pub days: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub date: String,
    pub code: Option<i64>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub timezone: Option<String>,
    pub daily: Vec<DailyEntry>,
}

/// Open-Meteo `/v1/forecast` daily aggregates in the location's own timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMeteoDaily;

impl Provider for OpenMeteoDaily {
    type Query = DailyQuery;
    type Output = DailyForecast;

    fn name(&self) -> &'static str {
        "open-meteo"
    }

    fn request(&self, query: &DailyQuery) -> HttpRequest {
        HttpRequest::get(format!(
            "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}\
             &daily=weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max\
             &forecast_days={}&timezone=auto",
            query.coords.lat, query.coords.lon, query.days
        ))
    }

    fn transform(&self, body: Value, query: &DailyQuery) -> Result<DailyForecast, TransformError> {
        let dates = require_array(&body, "/daily/time", "daily.time")?;
        let column = |name: &str| body.pointer(&format!("/daily/{name}")).and_then(Value::as_array);
        let code = column("weather_code");
        let temperature_max = column("temperature_2m_max");
        let temperature_min = column("temperature_2m_min");
        let precipitation = column("precipitation_sum");
        let wind_max = column("wind_speed_10m_max");

        let daily = dates
            .iter()
            .enumerate()
            .take(usize::from(query.days))
            .filter_map(|(index, date)| {
                date.as_str().map(|date| DailyEntry {
                    date: date.to_owned(),
                    code: i64_in(code, index),
                    temperature_max: f64_in(temperature_max, index),
                    temperature_min: f64_in(temperature_min, index),
                    precipitation: f64_in(precipitation, index),
                    wind_max: f64_in(wind_max, index),
                })
            })
            .collect();

        Ok(DailyForecast {
            timezone: string_at(&body, "/timezone"),
            daily,
        })
    }
}

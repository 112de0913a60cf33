use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    response::Response,
};
use edgehub_core::providers::{CurrentConditions, DailyEntry, HourlyPoint};
use edgehub_core::query::parse_days;
use edgehub_core::{
    CacheTier, Coordinates, DailyQuery, ForecastLocation, GeocodeQuery, Place, WeatherNowQuery,
};
use serde::Serialize;
use time::OffsetDateTime;

use super::{json_bytes, param, read_through, request_cache_key, settle, Exhausted, Params};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct WeatherNowBody {
    provider: &'static str,
    lat: f64,
    lon: f64,
    current: CurrentConditions,
    next3h: Vec<HourlyPoint>,
}

/// Current conditions plus the next three hourly entries.
pub async fn now(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Response> {
    let coords = Coordinates::parse(param(&params, "lat"), param(&params, "lon"))?;
    let query = WeatherNowQuery {
        coords,
        as_of: OffsetDateTime::now_utc(),
    };

    let (http, chain) = (state.http.as_ref(), &state.chains.weather_now);
    let key = request_cache_key(&headers, &uri);
    read_through(&state, key, CacheTier::WeatherNow, || async move {
        let (weather, provider) = settle(chain.resolve(http, &query).await, Exhausted::GatewayTimeout)?;
        json_bytes(&WeatherNowBody {
            provider,
            lat: coords.lat,
            lon: coords.lon,
            current: weather.current,
            next3h: weather.next3h,
        })
    })
    .await
}

#[derive(Debug, Serialize)]
struct DailyBody {
    provider: &'static str,
    query: ForecastLocation,
    location: Place,
    days: u8,
    daily: Vec<DailyEntry>,
}

/// Daily forecast for a city (`q`) or explicit coordinates.
///
/// City names are geocoded first; an unknown city is a client error.
pub async fn daily(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Response> {
    let location = ForecastLocation::parse(
        param(&params, "q"),
        param(&params, "lat"),
        param(&params, "lon"),
    )?;
    let days = parse_days(param(&params, "days"));

    let state_ref = &state;
    let key = request_cache_key(&headers, &uri);
    read_through(&state, key, CacheTier::DailyForecast, || async move {
        let (place, coords) = match &location {
            ForecastLocation::City { q } => {
                let query = GeocodeQuery { city: q.clone() };
                let outcome = state_ref
                    .chains
                    .geocode
                    .resolve(state_ref.http.as_ref(), &query)
                    .await;
                let (found, _) = settle(outcome, Exhausted::BadGateway)?;
                let place = found.ok_or_else(|| ApiError::CityNotFound { city: q.clone() })?;
                let coords = place
                    .coordinates()
                    .ok_or_else(|| ApiError::CityNotFound { city: q.clone() })?;
                (Some(place), coords)
            }
            ForecastLocation::Coordinates(coords) => (None, *coords),
        };

        let outcome = state_ref
            .chains
            .daily
            .resolve(state_ref.http.as_ref(), &DailyQuery { coords, days })
            .await;
        let (forecast, provider) = settle(outcome, Exhausted::BadGateway)?;
        let location_block = match place {
            Some(place) => Place {
                timezone: place.timezone.or(forecast.timezone),
                ..place
            },
            None => Place::from_coordinates(coords, forecast.timezone),
        };

        json_bytes(&DailyBody {
            provider,
            query: location,
            location: location_block,
            days,
            daily: forecast.daily,
        })
    })
    .await
}

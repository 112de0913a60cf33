//! Provider adapters and the chains the gateway routes resolve through.
//!
//! | Chain | Providers (in order) | Deadline |
//! |-------|----------------------|----------|
//! | [`crypto_chain`] | CoinGecko, CoinCap | 4.5 s |
//! | [`joke_chain`] | official-joke-api, icanhazdadjoke | 4.5 s |
//! | [`weather_now_chain`] | Open-Meteo, MET Norway | 6 s |
//! | [`geocode_chain`] | Open-Meteo geocoding | 8 s |
//! | [`daily_chain`] | Open-Meteo | 8 s |
//! | [`rates_chain`] | Frankfurter, open.er-api | 8 s |

pub mod crypto;
pub mod forecast;
pub mod joke;
pub mod rates;
pub mod weather;

pub use crypto::{CoinCap, CoinGecko, CryptoPrice, CryptoQuery};
pub use forecast::{
    DailyEntry, DailyForecast, DailyQuery, GeocodeQuery, OpenMeteoDaily, OpenMeteoGeocoder, Place,
};
pub use joke::{IcanhazDadJoke, Joke, OfficialJokeApi};
pub use rates::{ExchangeRates, Frankfurter, OpenErApi, RatesQuery};
pub use weather::{
    CurrentConditions, HourlyPoint, MetNorway, OpenMeteoCurrent, WeatherNow, WeatherNowQuery,
};

use crate::chain::{ProviderChain, GENERIC_DEADLINE, SLOW_DEADLINE, WEATHER_NOW_DEADLINE};

pub fn crypto_chain() -> ProviderChain<CryptoQuery, CryptoPrice> {
    ProviderChain::new("crypto", GENERIC_DEADLINE)
        .with_provider(CoinGecko)
        .with_provider(CoinCap)
}

pub fn joke_chain() -> ProviderChain<(), Joke> {
    ProviderChain::new("joke", GENERIC_DEADLINE)
        .with_provider(OfficialJokeApi)
        .with_provider(IcanhazDadJoke)
}

pub fn weather_now_chain() -> ProviderChain<WeatherNowQuery, WeatherNow> {
    ProviderChain::new("weather_now", WEATHER_NOW_DEADLINE)
        .with_provider(OpenMeteoCurrent)
        .with_provider(MetNorway)
}

pub fn geocode_chain() -> ProviderChain<GeocodeQuery, Option<Place>> {
    ProviderChain::new("geocode", SLOW_DEADLINE).with_provider(OpenMeteoGeocoder)
}

pub fn daily_chain() -> ProviderChain<DailyQuery, DailyForecast> {
    ProviderChain::new("daily_forecast", SLOW_DEADLINE).with_provider(OpenMeteoDaily)
}

pub fn rates_chain() -> ProviderChain<RatesQuery, ExchangeRates> {
    ProviderChain::new("exchange_rates", SLOW_DEADLINE)
        .with_provider(Frankfurter)
        .with_provider(OpenErApi)
}

//! Behavior-driven tests for the provider fallback chain
//!
//! These tests verify HOW the system walks an ordered provider list: which
//! failures fall through to the next provider, which stop the chain, and how
//! the shared deadline is spent.

use std::time::Duration;

use edgehub_core::providers::{MetNorway, OpenMeteoCurrent};
use edgehub_core::{
    crypto_chain, joke_chain, rates_chain, Coordinates, CryptoQuery, CurrencyCode, FailureReason,
    FallbackOutcome, ProviderChain, RatesQuery, ScriptedHttpClient, ScriptedReply, WeatherNowQuery,
};
use time::macros::datetime;

const COINGECKO: &str = "https://api.coingecko.com/";
const COINCAP: &str = "https://api.coincap.io/";
const OPEN_METEO: &str = "https://api.open-meteo.com/";
const MET_NORWAY: &str = "https://api.met.no/";

fn bitcoin_usd() -> CryptoQuery {
    CryptoQuery {
        coin: String::from("bitcoin"),
        currency: String::from("usd"),
    }
}

const COINCAP_BODY: &str = r#"{"data": {"id": "bitcoin", "priceUsd": "64000.5", "changePercent24Hr": "1.5"}}"#;

// =============================================================================
// Fallback: transient failures
// =============================================================================

#[tokio::test]
async fn when_first_provider_is_rate_limited_system_falls_back_to_second() {
    // Given: CoinGecko answers 429 and CoinCap answers with a valid price
    let client = ScriptedHttpClient::new()
        .respond(COINGECKO, 429, r#"{"status": {"error_code": 429}}"#)
        .respond(COINCAP, 200, COINCAP_BODY);

    // When: The crypto chain resolves
    let outcome = crypto_chain().resolve(&client, &bitcoin_usd()).await;

    // Then: The second provider's payload is returned and each provider was called once
    match outcome {
        FallbackOutcome::Success { payload, provider } => {
            assert_eq!(provider, "coincap");
            assert_eq!(payload.price, 64000.5);
            assert_eq!(payload.change24h, Some(1.5));
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(client.calls_to(COINGECKO), 1);
    assert_eq!(client.calls_to(COINCAP), 1);
}

#[tokio::test]
async fn when_every_provider_errors_with_5xx_system_reports_all_failed() {
    // Given: Both crypto providers answer 500
    let client = ScriptedHttpClient::new()
        .respond(COINGECKO, 500, "oops")
        .respond(COINCAP, 503, "down");

    // When: The crypto chain resolves
    let outcome = crypto_chain().resolve(&client, &bitcoin_usd()).await;

    // Then: Every attempt is recorded in order
    let FallbackOutcome::AllFailed { attempts } = outcome else {
        panic!("expected all providers to fail");
    };
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].provider, "coingecko");
    assert_eq!(attempts[0].reason, FailureReason::Status { status: 500 });
    assert_eq!(attempts[1].reason, FailureReason::Status { status: 503 });
}

#[tokio::test]
async fn when_quote_currency_is_not_usd_system_skips_coincap_without_calling_it() {
    // Given: CoinGecko is down and the quote is in EUR, which CoinCap cannot price
    let client = ScriptedHttpClient::new()
        .respond(COINGECKO, 500, "oops")
        .respond(COINCAP, 200, COINCAP_BODY);
    let query = CryptoQuery {
        coin: String::from("bitcoin"),
        currency: String::from("eur"),
    };

    // When: The crypto chain resolves
    let outcome = crypto_chain().resolve(&client, &query).await;

    // Then: CoinCap is reported as unsupported and never spends a request
    let FallbackOutcome::AllFailed { attempts } = outcome else {
        panic!("expected all providers to fail");
    };
    assert_eq!(attempts[1].provider, "coincap");
    assert_eq!(attempts[1].reason, FailureReason::Unsupported);
    assert_eq!(client.calls_to(COINCAP), 0);
}

#[tokio::test]
async fn when_transport_fails_system_tries_next_provider() {
    // Given: The first joke provider is unreachable
    let client = ScriptedHttpClient::new()
        .fail("https://official-joke-api.appspot.com/", "connection refused")
        .respond("https://icanhazdadjoke.com/", 200, r#"{"id": "x", "joke": "I'm reading a book on anti-gravity.", "status": 200}"#);

    // When: The joke chain resolves
    let outcome = joke_chain().resolve(&client, &()).await;

    // Then: The second provider answers
    assert_eq!(outcome.provider(), Some("icanhazdadjoke"));
    assert!(outcome.is_success());
}

#[tokio::test]
async fn when_first_provider_returns_malformed_payload_system_uses_next_provider() {
    // Given: Frankfurter answers 200 with a non-JSON body
    let client = ScriptedHttpClient::new()
        .respond("https://api.frankfurter.app/", 200, "<html>maintenance</html>")
        .respond(
            "https://open.er-api.com/",
            200,
            r#"{"result": "success", "base_code": "USD", "time_last_update_unix": 1714521600, "rates": {"USD": 1, "EUR": 0.93}}"#,
        );
    let query = RatesQuery {
        base: CurrencyCode::usd(),
        symbols: vec![CurrencyCode::parse("EUR").expect("valid code")],
    };

    // When: The rates chain resolves
    let outcome = rates_chain().resolve(&client, &query).await;

    // Then: The second provider's normalized rates are returned
    let FallbackOutcome::Success { payload, provider } = outcome else {
        panic!("expected success");
    };
    assert_eq!(provider, "open-er-api");
    assert_eq!(payload.rates.get("EUR"), Some(&0.93));
    assert!(!payload.rates.contains_key("USD"));
}

// =============================================================================
// Fallback: terminal rejection
// =============================================================================

#[tokio::test]
async fn when_provider_rejects_with_404_system_stops_without_calling_others() {
    // Given: CoinGecko answers 404 for an unknown coin
    let client = ScriptedHttpClient::new()
        .respond(COINGECKO, 404, "{}")
        .respond(COINCAP, 200, COINCAP_BODY);

    // When: The crypto chain resolves
    let outcome = crypto_chain().resolve(&client, &bitcoin_usd()).await;

    // Then: The chain stops with the upstream status and CoinCap is never called
    assert_eq!(
        outcome,
        FallbackOutcome::UpstreamRejected {
            status: 404,
            provider: "coingecko"
        }
    );
    assert_eq!(client.calls_to(COINCAP), 0);
}

#[tokio::test]
async fn when_provider_answers_403_system_treats_it_as_transient() {
    // Given: CoinGecko forbids the request (e.g. bot protection)
    let client = ScriptedHttpClient::new()
        .respond(COINGECKO, 403, "forbidden")
        .respond(COINCAP, 200, COINCAP_BODY);

    // When: The crypto chain resolves
    let outcome = crypto_chain().resolve(&client, &bitcoin_usd()).await;

    // Then: The fallback provider is used
    assert_eq!(outcome.provider(), Some("coincap"));
}

// =============================================================================
// Shared deadline
// =============================================================================

fn weather_query() -> WeatherNowQuery {
    WeatherNowQuery {
        coords: Coordinates::new(59.91, 10.75).expect("valid coordinates"),
        as_of: datetime!(2024-05-01 12:00:00 UTC),
    }
}

#[tokio::test]
async fn when_first_provider_exceeds_deadline_system_cancels_it_and_starves_the_rest() {
    // Given: A short chain deadline and a first provider that stalls past it
    let chain = ProviderChain::new("weather_now", Duration::from_millis(50))
        .with_provider(OpenMeteoCurrent)
        .with_provider(MetNorway);
    let client = ScriptedHttpClient::new()
        .with_reply(
            OPEN_METEO,
            ScriptedReply::Stall {
                delay: Duration::from_millis(500),
                status: 200,
                body: String::from(r#"{"current": {"temperature_2m": 1.0}}"#),
            },
        )
        .respond(MET_NORWAY, 200, r#"{"properties": {"timeseries": []}}"#);

    // When: The chain resolves
    let started = std::time::Instant::now();
    let outcome = chain.resolve(&client, &weather_query()).await;

    // Then: The stalled attempt is cancelled and the next provider is skipped
    assert!(started.elapsed() < Duration::from_millis(400));
    let FallbackOutcome::AllFailed { attempts } = outcome else {
        panic!("expected the deadline to exhaust the chain");
    };
    assert_eq!(attempts[0].reason, FailureReason::Timeout);
    assert_eq!(attempts[1].reason, FailureReason::DeadlineExhausted);
    assert_eq!(client.calls_to(MET_NORWAY), 0);
}

#[tokio::test]
async fn when_chain_starts_system_bounds_each_request_by_remaining_deadline() {
    // Given: The first provider fails fast
    let client = ScriptedHttpClient::new()
        .respond(COINGECKO, 500, "")
        .respond(COINCAP, 200, COINCAP_BODY);

    // When: The crypto chain resolves
    let _ = crypto_chain().resolve(&client, &bitcoin_usd()).await;

    // Then: No request was allowed longer than the 4.5 s chain deadline
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|request| request.timeout_ms <= 4_500));
    assert!(requests[1].timeout_ms <= requests[0].timeout_ms);
}

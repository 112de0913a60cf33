use serde::Serialize;
use serde_json::Value;

use crate::error::TransformError;
use crate::http_client::HttpRequest;
use crate::provider::Provider;
use crate::transform::string_at;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Joke {
    pub setup: Option<String>,
    pub punchline: Option<String>,
    /// Full joke text, present for every provider.
    #[serde(rename = "joke")]
    pub text: String,
}

/// official-joke-api `random_joke` (setup/punchline pairs).
#[derive(Debug, Clone, Copy, Default)]
pub struct OfficialJokeApi;

impl Provider for OfficialJokeApi {
    type Query = ();
    type Output = Joke;

    fn name(&self) -> &'static str {
        "official-joke-api"
    }

    fn request(&self, _query: &()) -> HttpRequest {
        HttpRequest::get("https://official-joke-api.appspot.com/random_joke")
    }

    fn transform(&self, body: Value, _query: &()) -> Result<Joke, TransformError> {
        let setup = string_at(&body, "/setup");
        let punchline = string_at(&body, "/punchline");
        let text = match (&setup, &punchline) {
            (Some(setup), Some(punchline)) => format!("{setup} {punchline}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => return Err(TransformError::MissingField { field: "setup" }),
        };

        Ok(Joke {
            setup,
            punchline,
            text,
        })
    }
}

/// icanhazdadjoke; single-line jokes, JSON only with an explicit Accept header.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcanhazDadJoke;

impl Provider for IcanhazDadJoke {
    type Query = ();
    type Output = Joke;

    fn name(&self) -> &'static str {
        "icanhazdadjoke"
    }

    fn request(&self, _query: &()) -> HttpRequest {
        HttpRequest::get("https://icanhazdadjoke.com/").with_header("accept", "application/json")
    }

    fn transform(&self, body: Value, _query: &()) -> Result<Joke, TransformError> {
        let text = string_at(&body, "/joke")
            .filter(|joke| !joke.trim().is_empty())
            .ok_or(TransformError::MissingField { field: "joke" })?;

        Ok(Joke {
            setup: None,
            punchline: None,
            text,
        })
    }
}

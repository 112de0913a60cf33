use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::http_client::HttpClient;
use crate::provider::{Provider, ProviderRef};

/// Chain deadline for generic aggregation routes (crypto, joke).
pub const GENERIC_DEADLINE: Duration = Duration::from_millis(4_500);
/// Chain deadline for current weather conditions.
pub const WEATHER_NOW_DEADLINE: Duration = Duration::from_secs(6);
/// Chain deadline for daily forecast and exchange rate lookups.
pub const SLOW_DEADLINE: Duration = Duration::from_secs(8);

/// Result of running a provider chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackOutcome<T> {
    Success {
        payload: T,
        provider: &'static str,
    },
    /// A provider answered with a definitive, non-retryable status.
    UpstreamRejected {
        status: u16,
        provider: &'static str,
    },
    AllFailed {
        attempts: Vec<AttemptFailure>,
    },
}

impl<T> FallbackOutcome<T> {
    pub fn provider(&self) -> Option<&'static str> {
        match self {
            Self::Success { provider, .. } | Self::UpstreamRejected { provider, .. } => Some(*provider),
            Self::AllFailed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// How an upstream HTTP status steers the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// Rate limited or overloaded; try the next provider.
    Transient,
    /// Client-side error the next provider would not fix.
    Terminal,
}

pub const fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        403 | 429 => StatusClass::Transient,
        500..=u16::MAX => StatusClass::Transient,
        _ => StatusClass::Terminal,
    }
}

/// Why a single provider attempt was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    Unsupported,
    Transport { message: String },
    Timeout,
    DeadlineExhausted,
    Status { status: u16 },
    Malformed { message: String },
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => f.write_str("provider cannot serve this query"),
            Self::Transport { message } => write!(f, "transport error: {message}"),
            Self::Timeout => f.write_str("deadline elapsed during attempt"),
            Self::DeadlineExhausted => f.write_str("deadline exhausted before attempt"),
            Self::Status { status } => write!(f, "upstream returned status {status}"),
            Self::Malformed { message } => write!(f, "malformed payload: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub provider: &'static str,
    pub reason: FailureReason,
}

/// Ordered list of interchangeable providers sharing one deadline.
pub struct ProviderChain<Q, T> {
    endpoint: &'static str,
    providers: Vec<ProviderRef<Q, T>>,
    deadline: Duration,
}

impl<Q, T> ProviderChain<Q, T>
where
    Q: Send + Sync,
    T: Send,
{
    pub fn new(endpoint: &'static str, deadline: Duration) -> Self {
        Self {
            endpoint,
            providers: Vec::new(),
            deadline,
        }
    }

    pub fn with_provider<P>(mut self, provider: P) -> Self
    where
        P: Provider<Query = Q, Output = T> + 'static,
    {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Try each provider once, in order, until one succeeds or rejects terminally.
    ///
    /// The deadline is computed once for the whole chain and is not reset
    /// between attempts, so a slow provider consumes time from the ones after it.
    pub async fn resolve(&self, client: &dyn HttpClient, query: &Q) -> FallbackOutcome<T> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.deadline;
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name();
            if !provider.supports(query) {
                debug!(endpoint = self.endpoint, provider = name, "provider skipped for query");
                attempts.push(AttemptFailure {
                    provider: name,
                    reason: FailureReason::Unsupported,
                });
                continue;
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                attempts.push(AttemptFailure {
                    provider: name,
                    reason: FailureReason::DeadlineExhausted,
                });
                continue;
            }

            let request = provider
                .request(query)
                .with_timeout_ms(duration_ms(remaining).max(1));
            let response = match tokio::time::timeout_at(deadline, client.execute(request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(error)) => {
                    debug!(endpoint = self.endpoint, provider = name, %error, "provider transport failed");
                    attempts.push(AttemptFailure {
                        provider: name,
                        reason: FailureReason::Transport {
                            message: error.message().to_owned(),
                        },
                    });
                    continue;
                }
                Err(_) => {
                    debug!(endpoint = self.endpoint, provider = name, "provider attempt cancelled by deadline");
                    attempts.push(AttemptFailure {
                        provider: name,
                        reason: FailureReason::Timeout,
                    });
                    continue;
                }
            };

            match classify_status(response.status) {
                StatusClass::Success => {}
                StatusClass::Transient => {
                    debug!(endpoint = self.endpoint, provider = name, status = response.status, "provider transiently unavailable");
                    attempts.push(AttemptFailure {
                        provider: name,
                        reason: FailureReason::Status {
                            status: response.status,
                        },
                    });
                    continue;
                }
                StatusClass::Terminal => {
                    warn!(endpoint = self.endpoint, provider = name, status = response.status, "provider rejected request");
                    return FallbackOutcome::UpstreamRejected {
                        status: response.status,
                        provider: name,
                    };
                }
            }

            let transformed = serde_json::from_str::<Value>(&response.body)
                .map_err(|error| error.to_string())
                .and_then(|body| {
                    provider
                        .transform(body, query)
                        .map_err(|error| error.to_string())
                });

            match transformed {
                Ok(payload) => {
                    if !attempts.is_empty() {
                        warn!(
                            endpoint = self.endpoint,
                            provider = name,
                            failed_attempts = attempts.len(),
                            "provider fallback succeeded"
                        );
                    }
                    debug!(endpoint = self.endpoint, provider = name, latency_ms = duration_ms(started.elapsed()), "provider chain resolved");
                    return FallbackOutcome::Success {
                        payload,
                        provider: name,
                    };
                }
                Err(message) => {
                    debug!(endpoint = self.endpoint, provider = name, %message, "provider payload rejected");
                    attempts.push(AttemptFailure {
                        provider: name,
                        reason: FailureReason::Malformed { message },
                    });
                }
            }
        }

        warn!(
            endpoint = self.endpoint,
            attempts = attempts.len(),
            latency_ms = duration_ms(started.elapsed()),
            "all providers failed"
        );
        FallbackOutcome::AllFailed { attempts }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

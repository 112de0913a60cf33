//! Provider adapter contract.
//!
//! A provider is one upstream API able to answer a logical endpoint. Providers
//! registered for the same endpoint are interchangeable: their transforms must
//! emit the same normalized type.

use std::sync::Arc;

use serde_json::Value;

use crate::error::TransformError;
use crate::http_client::HttpRequest;

/// Source adapter contract used by [`ProviderChain`](crate::chain::ProviderChain).
///
/// | Method | Description |
/// |--------|-------------|
/// | [`name`](Provider::name) | Stable identifier reported to clients |
/// | [`supports`](Provider::supports) | Whether the provider can answer a query at all |
/// | [`request`](Provider::request) | Builds the upstream request for a query |
/// | [`transform`](Provider::transform) | Maps a 2xx JSON body to the normalized shape |
pub trait Provider: Send + Sync {
    type Query;
    type Output;

    fn name(&self) -> &'static str;

    /// Unsupported queries are skipped without an upstream call.
    fn supports(&self, _query: &Self::Query) -> bool {
        true
    }

    fn request(&self, query: &Self::Query) -> HttpRequest;

    /// Missing optional fields must be coalesced, never reported as errors.
    fn transform(&self, body: Value, query: &Self::Query) -> Result<Self::Output, TransformError>;
}

pub type ProviderRef<Q, T> = Arc<dyn Provider<Query = Q, Output = T>>;

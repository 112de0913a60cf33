//! Header allow-lists and target validation for the streaming proxy.
//!
//! Only the headers named here cross the proxy, in either direction. Both
//! proxied routes (media and camera stream) share [`ProxyHeaderSet::STREAM`].

use http::header::{
    ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, DATE, ETAG, EXPIRES, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, LAST_MODIFIED,
    LOCATION, RANGE, VARY,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;

use crate::error::ValidationError;

/// Request headers forwarded upstream.
pub const FORWARDED_REQUEST_HEADERS: &[HeaderName] =
    &[RANGE, IF_RANGE, IF_NONE_MATCH, IF_MODIFIED_SINCE];

/// Response headers relayed back to the client.
pub const RELAYED_RESPONSE_HEADERS: &[HeaderName] = &[
    CONTENT_TYPE,
    CONTENT_LENGTH,
    ACCEPT_RANGES,
    CONTENT_RANGE,
    ETAG,
    LAST_MODIFIED,
    DATE,
    CACHE_CONTROL,
    EXPIRES,
    VARY,
    LOCATION,
];

/// `Allow` value for the streaming routes.
pub const STREAM_METHODS: &str = "GET, HEAD";

/// The two allow-lists applied by a proxied route.
#[derive(Debug, Clone, Copy)]
pub struct ProxyHeaderSet {
    request: &'static [HeaderName],
    response: &'static [HeaderName],
}

impl ProxyHeaderSet {
    pub const STREAM: Self = Self {
        request: FORWARDED_REQUEST_HEADERS,
        response: RELAYED_RESPONSE_HEADERS,
    };

    /// Headers for the upstream request: allow-listed inbound headers only.
    pub fn forward_request(&self, inbound: &HeaderMap) -> HeaderMap {
        copy_listed(inbound, self.request.iter())
    }

    /// Headers for the client response.
    ///
    /// Adds a permissive `Access-Control-Allow-Origin` and advertises byte
    /// ranges when upstream did not say either way.
    pub fn relay_response(&self, upstream: &HeaderMap) -> HeaderMap {
        let mut headers = copy_listed(upstream, self.response.iter());

        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        if !headers.contains_key(ACCEPT_RANGES) {
            headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        }
        headers
    }
}

fn copy_listed<'a>(source: &HeaderMap, names: impl Iterator<Item = &'a HeaderName>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in names {
        for value in source.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Hosts a user-supplied media URL may point at. Empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostAllowList(Vec<String>);

impl HostAllowList {
    /// Parse a comma-separated list; entries are trimmed and lower-cased.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|host| host.trim().to_ascii_lowercase())
                .filter(|host| !host.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn hosts(&self) -> &[String] {
        &self.0
    }

    pub fn permits(&self, host: &str) -> bool {
        self.0.is_empty() || self.0.iter().any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}

/// A validated absolute http(s) upstream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    url: Url,
}

impl ProxyTarget {
    /// Validate a user-supplied `url` parameter against the host allow-list.
    pub fn parse(raw: Option<&str>, allow: &HostAllowList) -> Result<Self, ValidationError> {
        let raw = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ValidationError::MissingParameter { name: "url" })?;
        let url = Url::parse(raw).map_err(|_| ValidationError::InvalidUrl {
            value: raw.to_owned(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedScheme {
                scheme: url.scheme().to_owned(),
            });
        }

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ValidationError::InvalidUrl {
                value: raw.to_owned(),
            })?;
        if !allow.permits(host) {
            return Err(ValidationError::HostNotAllowed {
                host: host.to_owned(),
            });
        }

        Ok(Self { url })
    }

    /// Resolve an upstream `Location` against this target and validate the
    /// next hop exactly like a user-supplied URL.
    pub fn redirect(&self, location: &str, allow: &HostAllowList) -> Result<Self, ValidationError> {
        let next = self
            .url
            .join(location.trim())
            .map_err(|_| ValidationError::InvalidUrl {
                value: location.to_owned(),
            })?;
        Self::parse(Some(next.as_str()), allow)
    }

    /// Build a target from a trusted, configured URL (the camera bridge).
    pub fn trusted(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

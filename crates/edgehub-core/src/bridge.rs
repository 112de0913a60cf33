//! Camera bridge: validated identifiers, PTZ commands and upstream URLs.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, ValidationError};
use crate::http_client::{HttpAuth, HttpRequest};

/// Upper bound for a timed pan/tilt movement.
pub const MAX_DURATION_MS: u64 = 10_000;

/// Closed set of pan/tilt actions accepted by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Up,
    Down,
    Left,
    Right,
    Stop,
}

impl ControlAction {
    pub const ALL: [Self; 5] = [Self::Up, Self::Down, Self::Left, Self::Right, Self::Stop];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Stop => "stop",
        }
    }

    /// Action names in declaration order, for error bodies.
    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(|action| action.as_str()).collect()
    }
}

impl Display for ControlAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlAction {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidAction {
                value: value.to_owned(),
            })
    }
}

/// Camera identifier safe to splice into a bridge URL path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let valid = !raw.is_empty()
            && raw
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_');
        if valid {
            Ok(Self(raw.to_owned()))
        } else {
            Err(ValidationError::InvalidCameraId)
        }
    }

    /// Parse the `cameraId` query parameter; absence is a missing parameter.
    pub fn from_param(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw {
            Some(raw) if !raw.is_empty() => Self::parse(raw),
            _ => Err(ValidationError::MissingParameter { name: "cameraId" }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CameraId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated `POST /api/camera/control` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlCommand {
    pub camera_id: CameraId,
    pub action: ControlAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ControlCommand {
    /// Parse and validate a raw JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body).map_err(|error| ValidationError::InvalidBody {
            message: error.to_string(),
        })?;
        let Value::Object(fields) = value else {
            return Err(ValidationError::InvalidBody {
                message: String::from("expected a JSON object"),
            });
        };

        let camera_id = match fields.get("cameraId") {
            Some(Value::String(raw)) => CameraId::from_param(Some(raw))?,
            Some(Value::Null) | None => {
                return Err(ValidationError::MissingParameter { name: "cameraId" })
            }
            Some(_) => return Err(ValidationError::InvalidCameraId),
        };

        let action = match fields.get("action") {
            Some(Value::String(raw)) => raw.parse()?,
            Some(other) => {
                return Err(ValidationError::InvalidAction {
                    value: other.to_string(),
                })
            }
            None => return Err(ValidationError::InvalidAction { value: String::new() }),
        };

        let duration_ms = match fields.get("durationMs") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                raw.as_u64()
                    .filter(|ms| (1..=MAX_DURATION_MS).contains(ms))
                    .ok_or(ValidationError::InvalidDuration {
                        max: MAX_DURATION_MS,
                    })?,
            ),
        };

        Ok(Self {
            camera_id,
            action,
            duration_ms,
        })
    }
}

/// Base URL and bearer token of the camera bridge.
#[derive(Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    base: Url,
    token: String,
}

impl BridgeConfig {
    /// `Ok(None)` unless both values are present and non-blank.
    ///
    /// The base URL is validated here so a misconfigured bridge fails at
    /// startup instead of on every camera request.
    pub fn from_parts(base_url: Option<&str>, token: Option<&str>) -> Result<Option<Self>, ValidationError> {
        let (Some(base_url), Some(token)) = (
            base_url.map(str::trim).filter(|url| !url.is_empty()),
            token.map(str::trim).filter(|token| !token.is_empty()),
        ) else {
            return Ok(None);
        };

        let base = Url::parse(base_url).map_err(|_| ValidationError::InvalidUrl {
            value: base_url.to_owned(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedScheme {
                scheme: base.scheme().to_owned(),
            });
        }

        Ok(Some(Self {
            base,
            token: token.to_owned(),
        }))
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    pub fn auth(&self) -> HttpAuth {
        HttpAuth::BearerToken(self.token.clone())
    }

    /// `Authorization` header value for streamed requests.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn stream_url(&self, camera: &CameraId) -> Url {
        self.camera_url(camera, "stream")
    }

    pub fn control_url(&self, camera: &CameraId) -> Url {
        self.camera_url(camera, "ptz")
    }

    /// JSON request forwarding `command` to the bridge.
    pub fn control_request(&self, command: &ControlCommand) -> Result<HttpRequest, CoreError> {
        let url = self.control_url(&command.camera_id);
        let body = serde_json::to_string(command)?;
        Ok(HttpRequest::post_json(url.as_str(), body).with_auth(&self.auth()))
    }

    fn camera_url(&self, camera: &CameraId, leaf: &str) -> Url {
        let mut url = self.base.clone();
        // http(s) URLs always have path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["cameras", camera.as_str(), leaf]);
        }
        url
    }
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("base_url", &self.base_url())
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> BridgeConfig {
        BridgeConfig::from_parts(Some("https://bridge.test/api/"), Some("s3cret"))
            .expect("valid url")
            .expect("configured")
    }

    #[test]
    fn actions_parse_exactly() {
        assert_eq!("left".parse::<ControlAction>(), Ok(ControlAction::Left));
        assert_eq!(
            "LEFT".parse::<ControlAction>(),
            Err(ValidationError::InvalidAction {
                value: String::from("LEFT")
            })
        );
        assert_eq!(ControlAction::allowed(), vec!["up", "down", "left", "right", "stop"]);
    }

    #[test]
    fn camera_ids_cannot_inject_path_segments() {
        assert!(CameraId::parse("front-door_2").is_ok());
        assert_eq!(CameraId::parse("../admin"), Err(ValidationError::InvalidCameraId));
        assert_eq!(CameraId::parse("a/b"), Err(ValidationError::InvalidCameraId));
        assert_eq!(
            CameraId::from_param(Some("")),
            Err(ValidationError::MissingParameter { name: "cameraId" })
        );
    }

    #[test]
    fn command_validates_body() {
        let command = ControlCommand::from_json(br#"{"cameraId":"cam1","action":"up","durationMs":500}"#)
            .expect("valid body");
        assert_eq!(command.action, ControlAction::Up);
        assert_eq!(command.duration_ms, Some(500));

        assert!(matches!(
            ControlCommand::from_json(b"{not json"),
            Err(ValidationError::InvalidBody { .. })
        ));
        assert!(matches!(
            ControlCommand::from_json(br#"{"cameraId":"cam1","action":"zoom"}"#),
            Err(ValidationError::InvalidAction { .. })
        ));
        assert_eq!(
            ControlCommand::from_json(br#"{"cameraId":"cam1","action":"up","durationMs":0}"#),
            Err(ValidationError::InvalidDuration { max: MAX_DURATION_MS })
        );
        assert_eq!(
            ControlCommand::from_json(br#"{"cameraId":"cam1","action":"up","durationMs":10001}"#),
            Err(ValidationError::InvalidDuration { max: MAX_DURATION_MS })
        );
    }

    #[test]
    fn bridge_requires_url_and_token() {
        assert_eq!(BridgeConfig::from_parts(Some("https://bridge.test"), None), Ok(None));
        assert_eq!(BridgeConfig::from_parts(Some("  "), Some("token")), Ok(None));
        assert_eq!(bridge().base_url(), "https://bridge.test/api");
    }

    #[test]
    fn bridge_rejects_malformed_base_url() {
        assert!(matches!(
            BridgeConfig::from_parts(Some("bridge.local:8554"), Some("token")),
            Err(ValidationError::InvalidUrl { .. }) | Err(ValidationError::UnsupportedScheme { .. })
        ));
        assert_eq!(
            BridgeConfig::from_parts(Some("rtsp://bridge.test"), Some("token")),
            Err(ValidationError::UnsupportedScheme {
                scheme: String::from("rtsp")
            })
        );
        assert!(matches!(
            BridgeConfig::from_parts(Some("not a url"), Some("token")),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn control_request_carries_bearer_token_and_command() {
        let command = ControlCommand::from_json(br#"{"cameraId":"cam1","action":"stop"}"#).expect("valid body");
        let request = bridge().control_request(&command).expect("valid url");

        assert_eq!(request.url, "https://bridge.test/api/cameras/cam1/ptz");
        assert_eq!(request.headers.get("authorization").map(String::as_str), Some("Bearer s3cret"));
        assert_eq!(request.body.as_deref(), Some(r#"{"cameraId":"cam1","action":"stop"}"#));
        assert_eq!(
            bridge().stream_url(&command.camera_id).as_str(),
            "https://bridge.test/api/cameras/cam1/stream"
        );
    }

    #[test]
    fn debug_output_redacts_token() {
        assert!(!format!("{:?}", bridge()).contains("s3cret"));
    }
}

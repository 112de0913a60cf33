//! Helpers shared by provider transforms.
//!
//! Upstream payloads are read through JSON pointers so that absent optional
//! fields coalesce to `None` instead of failing the whole transform.

use serde_json::Value;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::TransformError;

pub fn f64_at(value: &Value, pointer: &str) -> Option<f64> {
    value.pointer(pointer).and_then(|field| match field {
        Value::Number(number) => number.as_f64(),
        // CoinCap and a few others encode decimals as strings.
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

pub fn i64_at(value: &Value, pointer: &str) -> Option<i64> {
    value.pointer(pointer).and_then(Value::as_i64)
}

pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

pub fn string_at(value: &Value, pointer: &str) -> Option<String> {
    str_at(value, pointer).map(str::to_owned)
}

/// Array at `pointer`, or `MissingField` when the payload has none.
pub fn require_array<'a>(
    value: &'a Value,
    pointer: &str,
    field: &'static str,
) -> Result<&'a Vec<Value>, TransformError> {
    match value.pointer(pointer) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(TransformError::UnexpectedType { field }),
        None => Err(TransformError::MissingField { field }),
    }
}

/// Element `index` of a parallel hourly/daily array, coalescing gaps to `None`.
pub fn f64_in(items: Option<&Vec<Value>>, index: usize) -> Option<f64> {
    items.and_then(|items| items.get(index)).and_then(Value::as_f64)
}

pub fn i64_in(items: Option<&Vec<Value>>, index: usize) -> Option<i64> {
    items.and_then(|items| items.get(index)).and_then(Value::as_i64)
}

/// Indices of the first `limit` timestamps strictly after `now`, in upstream order.
///
/// Comparison is lexical, so `now` must be formatted exactly like the
/// provider's timestamps (see [`minute_stamp`] and [`second_stamp`]).
pub fn strictly_after(times: &[Value], now: &str, limit: usize) -> Vec<usize> {
    times
        .iter()
        .enumerate()
        .filter_map(|(index, time)| time.as_str().map(|time| (index, time)))
        .filter(|(_, time)| *time > now)
        .map(|(index, _)| index)
        .take(limit)
        .collect()
}

/// `2024-05-01T13:00`, the Open-Meteo `timezone=UTC` timestamp shape.
pub fn minute_stamp(now: OffsetDateTime) -> String {
    now.format(format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .unwrap_or_default()
}

/// `2024-05-01T13:00:00Z`, the MET Norway timestamp shape.
pub fn second_stamp(now: OffsetDateTime) -> String {
    now.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
    ))
    .unwrap_or_default()
}

/// `2024-05-01`.
pub fn date_stamp(now: OffsetDateTime) -> String {
    now.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn numeric_lookups_coalesce_missing_and_string_numbers() {
        let payload = json!({"a": {"n": 1.5, "s": "2.25", "x": null}});

        assert_eq!(f64_at(&payload, "/a/n"), Some(1.5));
        assert_eq!(f64_at(&payload, "/a/s"), Some(2.25));
        assert_eq!(f64_at(&payload, "/a/x"), None);
        assert_eq!(f64_at(&payload, "/missing"), None);
    }

    #[test]
    fn strictly_after_skips_equal_and_past_entries_and_keeps_order() {
        let times = json!([
            "2024-05-01T11:00",
            "2024-05-01T12:00",
            "2024-05-01T13:00",
            null,
            "2024-05-01T14:00",
            "2024-05-01T15:00",
            "2024-05-01T16:00"
        ]);
        let times = times.as_array().expect("array");

        let picked = strictly_after(times, "2024-05-01T12:00", 3);

        assert_eq!(picked, vec![2, 4, 5]);
    }

    #[test]
    fn strictly_after_returns_fewer_when_series_ends() {
        let times = json!(["2024-05-01T11:00", "2024-05-01T12:00"]);
        let picked = strictly_after(times.as_array().expect("array"), "2024-05-01T11:30", 3);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn stamps_match_provider_formats() {
        let now = datetime!(2024-05-01 09:05:07 UTC);
        assert_eq!(minute_stamp(now), "2024-05-01T09:05");
        assert_eq!(second_stamp(now), "2024-05-01T09:05:07Z");
        assert_eq!(date_stamp(now), "2024-05-01");
    }

    #[test]
    fn require_array_distinguishes_missing_from_wrong_type() {
        let payload = json!({"list": [1], "text": "x"});
        assert!(require_array(&payload, "/list", "list").is_ok());
        assert_eq!(
            require_array(&payload, "/text", "text"),
            Err(TransformError::UnexpectedType { field: "text" })
        );
        assert_eq!(
            require_array(&payload, "/nope", "nope"),
            Err(TransformError::MissingField { field: "nope" })
        );
    }
}

//! Lenient field decoders for segment data.
//!
//! CQ strings carry every value as text, while the JSON array form carries
//! native numbers and booleans. Fields wired through these helpers accept
//! either shape.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::{self, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr<T> {
    Native(T),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

fn parse<T, E>(text: &str) -> Result<T, E>
where
    T: FromStr,
    T::Err: fmt::Display,
    E: de::Error,
{
    text.trim().parse().map_err(E::custom)
}

/// A number given natively or as its decimal string.
pub(crate) fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    match Repr::<T>::deserialize(deserializer)? {
        Repr::Native(value) => Ok(value),
        Repr::Text(text) => parse(&text),
    }
}

/// Optional variant of [`number`]; an empty string counts as absent.
pub(crate) fn option_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    match Option::<Repr<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Native(value)) => Ok(Some(value)),
        Some(Repr::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Repr::Text(text)) => parse(&text).map(Some),
    }
}

/// A string, also accepting numbers and booleans in their textual form.
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
        Scalar::Bool(flag) => flag.to_string(),
    })
}

/// A boolean given natively, as `0`/`1`, or as `true`/`false`/`yes`/`no`.
pub(crate) fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Bool(flag) => Ok(flag),
        Scalar::Number(number) => Ok(number.as_f64().is_some_and(|n| n != 0.0)),
        Scalar::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Str(other),
                &"a boolean",
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::number")]
        id: i64,
        #[serde(default, deserialize_with = "super::option_number")]
        lat: Option<f64>,
        #[serde(default, deserialize_with = "super::boolean")]
        ignore: bool,
        #[serde(default, deserialize_with = "super::string")]
        qq: String,
    }

    #[test]
    fn test_accepts_text_forms() {
        let probe: Probe =
            serde_json::from_str(r#"{"id":"42","lat":"3.5","ignore":"1","qq":"all"}"#).unwrap();
        assert_eq!(probe.id, 42);
        assert_eq!(probe.lat, Some(3.5));
        assert!(probe.ignore);
        assert_eq!(probe.qq, "all");
    }

    #[test]
    fn test_accepts_native_forms() {
        let probe: Probe =
            serde_json::from_str(r#"{"id":42,"lat":1,"ignore":true,"qq":10001}"#).unwrap();
        assert_eq!(probe.id, 42);
        assert_eq!(probe.lat, Some(1.0));
        assert!(probe.ignore);
        assert_eq!(probe.qq, "10001");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Probe>(r#"{"id":"abc"}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"id":1,"ignore":"maybe"}"#).is_err());
    }
}

//! Serde support for `Option<Duration>` written as humantime strings
//! (`"90s"`, `"5m"`, `"1h 30m"`).

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  match value {
    Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
    None => serializer.serialize_none(),
  }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(deserializer)?;
  match raw.as_deref().map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => humantime::parse_duration(s).map(Some).map_err(serde::de::Error::custom),
  }
}

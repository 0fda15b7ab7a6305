//! Serialize a signed `chrono::Duration` as integer milliseconds.
//!
//! Use with `#[serde(with = "perftune_core::serde_millis")]`.

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize as milliseconds.
pub fn serialize<S>(duration: &chrono::Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(duration.num_milliseconds())
}

/// Deserialize from milliseconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<chrono::Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = i64::deserialize(deserializer)?;
    Ok(chrono::Duration::milliseconds(millis))
}

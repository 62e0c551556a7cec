use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    #[serde(deserialize_with = "wire_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub accuracy: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(f64),
    Text(String),
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Accepts epoch milliseconds, RFC 3339, or a naive ISO datetime (read as UTC).
fn wire_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match WireTimestamp::deserialize(deserializer)? {
        WireTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms as i64)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", ms))),
        WireTimestamp::Text(text) => parse_text_timestamp(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {}", text))),
    }
}

fn parse_text_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

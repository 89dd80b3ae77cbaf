use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

/// Settings key holding the last completed enrichment run
pub const LAST_SYNC_KEY: &str = "last_iucn_sync";

/// Time of the last completed enrichment walk, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncWatermark(Option<DateTime<Utc>>);

impl SyncWatermark {
    pub fn never() -> Self {
        Self(None)
    }

    pub fn at(time: DateTime<Utc>) -> Self {
        Self(Some(time))
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// Decode the persisted setting. Anything that is not an ISO-8601 string
    /// (or epoch milliseconds) reads as "never ran".
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|time| Self(Some(time.with_timezone(&Utc))))
                .unwrap_or_default(),
            Value::Number(millis) => millis
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|time| Self(Some(time)))
                .unwrap_or_default(),
            _ => Self::never(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self.0 {
            Some(time) => Value::String(time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => Value::Null,
        }
    }

    /// Still inside the cool-down window at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.0 {
            Some(last_run) => now - last_run < cooldown,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_iso_string() {
        let watermark = SyncWatermark::from_value(&json!("2024-05-01T12:00:00.000Z"));
        assert_eq!(
            watermark.last_run().unwrap().to_rfc3339(),
            "2024-05-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_garbage_reads_as_never() {
        assert_eq!(SyncWatermark::from_value(&json!("yesterday")), SyncWatermark::never());
        assert_eq!(SyncWatermark::from_value(&Value::Null), SyncWatermark::never());
        assert_eq!(SyncWatermark::from_value(&json!({"at": 1})), SyncWatermark::never());
    }

    #[test]
    fn test_value_round_trip() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        let watermark = SyncWatermark::at(now);
        assert_eq!(SyncWatermark::from_value(&watermark.to_value()), watermark);
    }

    #[test]
    fn test_freshness_window() {
        let now = Utc::now();
        let cooldown = Duration::days(30);
        assert!(SyncWatermark::at(now - Duration::days(29)).is_fresh(now, cooldown));
        assert!(!SyncWatermark::at(now - Duration::days(30)).is_fresh(now, cooldown));
        assert!(!SyncWatermark::at(now - Duration::days(31)).is_fresh(now, cooldown));
        assert!(!SyncWatermark::never().is_fresh(now, cooldown));
    }
}

//! Second-precision UTC timestamps in the board's fixed text format

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Persisted layout: `YYYY-MM-DDTHH:MM:SS`, UTC implied, no zone suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A UTC wall-clock instant truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Current time, truncated to seconds.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    #[must_use]
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.naive_utc().trunc_subsecs(0))
    }

    /// Build from Unix seconds. Returns `None` when out of range.
    #[must_use]
    pub fn from_unix(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(Self::from_datetime)
    }

    /// Parse the persisted format. Fractional seconds and a trailing `Z`
    /// are accepted and dropped.
    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        let value = value.trim();
        let value = value.strip_suffix('Z').unwrap_or(value);
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
            .map(|parsed| Self(parsed.trunc_subsecs(0)))
    }

    /// Parse either a full timestamp or a bare `YYYY-MM-DD` date (midnight).
    pub fn parse_date_or_timestamp(value: &str) -> Result<Self, chrono::ParseError> {
        Self::parse(value).or_else(|error| {
            chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(Self)
                .ok_or(error)
        })
    }

    /// Shift back by `duration`, saturating at the earliest representable instant.
    #[must_use]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        self.0
            .checked_sub_signed(duration)
            .map_or(Self(NaiveDateTime::MIN), Self)
    }

    #[must_use]
    pub fn unix_seconds(self) -> i64 {
        self.0.and_utc().timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .map_err(|error| de::Error::custom(format!("invalid timestamp '{raw}': {error}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip_fixed_format() {
        let ts: Timestamp = "2024-03-01T09:15:42".parse().unwrap();
        assert_eq!(ts.to_string(), "2024-03-01T09:15:42");
    }

    #[test]
    fn parse_drops_fraction_and_zone_suffix() {
        let ts = Timestamp::parse("2024-03-01T09:15:42.987Z").unwrap();
        assert_eq!(ts.to_string(), "2024-03-01T09:15:42");
    }

    #[test]
    fn parse_rejects_other_layouts() {
        assert!(Timestamp::parse("01/03/2024 09:15").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn parse_date_or_timestamp_accepts_bare_dates() {
        let ts = Timestamp::parse_date_or_timestamp("2024-03-01").unwrap();
        assert_eq!(ts.to_string(), "2024-03-01T00:00:00");
    }

    #[test]
    fn now_has_no_subsecond_part() {
        let now = Timestamp::now();
        assert_eq!(Timestamp::parse(&now.to_string()).unwrap(), now);
    }

    #[test]
    fn saturating_sub_moves_back_in_time() {
        let ts = Timestamp::parse("2024-03-02T00:00:00").unwrap();
        assert_eq!(
            ts.saturating_sub(Duration::hours(24)).to_string(),
            "2024-03-01T00:00:00"
        );
    }

    #[test]
    fn serde_uses_text_format() {
        let ts = Timestamp::from_unix(0).unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"1970-01-01T00:00:00\"");
        let back: Timestamp = serde_json::from_str("\"1970-01-01T00:00:00\"").unwrap();
        assert_eq!(back, ts);
    }
}

/// Backend-assigned job identifiers are opaque strings.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Lenient timestamp decoding for backend payloads.
///
/// Accepts RFC 3339 (any offset, converted to UTC) and naive ISO 8601
/// date-times without an offset, which are taken to be UTC. Serialization
/// stays RFC 3339.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    use super::Timestamp;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    /// Parse `raw`, or `None` if it matches no accepted form.
    pub fn parse(raw: &str) -> Option<Timestamp> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    /// Same as the parent module for optional fields (`null` or absent).
    pub mod option {
        use serde::de::Error as _;
        use serde::{Deserialize, Deserializer};

        use super::{parse, Timestamp};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'"))),
            }
        }
    }

}

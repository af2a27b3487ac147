//! Serde adapter that writes [`Duration`] values as floating-point seconds.
//!
//! Use with `#[serde(with = "lane_runner_core::seconds")]` so configuration
//! files can say `sample_interval = 5.0` instead of spelling out
//! `{ secs, nanos }` tables.

use std::time::Duration;

use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

/// Serializes a duration as seconds.
pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.as_secs_f64())
}

/// Deserializes a duration from non-negative seconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(seconds).map_err(D::Error::custom)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Timed {
        #[serde(with = "super")]
        delay: Duration,
    }

    #[test]
    fn duration_survives_bincode_as_seconds() {
        let value = Timed {
            delay: Duration::from_millis(250),
        };
        let bytes = bincode::serialize(&value).expect("serialize");
        assert_eq!(bytes.len(), 8, "seconds are encoded as a single f64");
        let restored: Timed = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, value);
    }

    #[test]
    fn negative_seconds_are_rejected() {
        let bytes = bincode::serialize(&-1.0_f64).expect("serialize");
        assert!(bincode::deserialize::<Timed>(&bytes).is_err());
    }
}

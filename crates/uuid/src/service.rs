//! Internal implementation of identifier services.
//!
//! This module contains the implementation details for random UUID handles and
//! time-derived subscriber identifiers.

use crate::{UuidError, UuidResult};
use chrono::{DateTime, Utc};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Prefix carried by every subscriber identifier.
pub const SUBSCRIBER_ID_PREFIX: &str = "SUB";

/// Canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// This wrapper type guarantees that once constructed, the contained UUID is in canonical
/// format. It is used for session handles that are echoed back by API clients, so the
/// textual form must be stable.
///
/// # Construction
/// - [`UuidService::new`] generates a new canonical UUID.
/// - [`UuidService::parse`] validates an externally supplied identifier.
///
/// # Display format
/// When displayed or converted to string, `UuidService` always produces the canonical
/// 32-character lowercase hex format without hyphens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UuidService(Uuid);

impl Default for UuidService {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidService {
    /// Generates a new UUID in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example, hyphenated or uppercase).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(e.to_string()))
    }

    /// Returns the UUID as a `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical UUID form.
    ///
    /// This is a purely syntactic check that validates:
    /// - Exactly 32 bytes long
    /// - Contains only lowercase hex characters (`0-9` and `a-f`)
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for UuidService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for UuidService {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UuidService::parse(s)
    }
}

/// A time-derived subscriber identifier.
///
/// Format:
/// `SUB<milliseconds since Unix epoch>`
///
/// Example:
/// `SUB1767225600000`
///
/// Ordering of ids follows the ordering of their timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId {
    millis: i64,
}

impl SubscriberId {
    /// Builds an id for the given instant, truncated to millisecond precision.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            millis: instant.timestamp_millis(),
        }
    }

    /// Milliseconds since the Unix epoch encoded in this id.
    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// The instant this id was allocated for.
    ///
    /// Returns `None` only when the encoded value is outside chrono's representable range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.millis)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SUBSCRIBER_ID_PREFIX, self.millis)
    }
}

impl FromStr for SubscriberId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(SUBSCRIBER_ID_PREFIX).ok_or_else(|| {
            UuidError::InvalidInput(format!(
                "Subscriber id must start with '{}': '{}'",
                SUBSCRIBER_ID_PREFIX, s
            ))
        })?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UuidError::InvalidInput(format!(
                "Subscriber id must end with decimal milliseconds: '{}'",
                s
            )));
        }

        // Leading zeros would not survive a Display round trip.
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(UuidError::InvalidInput(format!(
                "Subscriber id must not have leading zeros: '{}'",
                s
            )));
        }

        let millis = digits.parse::<i64>().map_err(|e| {
            UuidError::InvalidInput(format!("Subscriber id out of range '{}': {}", s, e))
        })?;

        Ok(Self { millis })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SubscriberId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SubscriberId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Allocates strictly increasing [`SubscriberId`]s.
///
/// If the clock has not advanced past the previously issued id (same millisecond, or the
/// clock stepped backwards), the next id is the previous one plus one millisecond.
#[derive(Clone, Debug, Default)]
pub struct SubscriberIdGenerator {
    last: Option<SubscriberId>,
}

impl SubscriberIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a generator that will never issue an id at or below `last`.
    ///
    /// Used when resuming after ids have already been persisted.
    pub fn resume_after(last: Option<SubscriberId>) -> Self {
        Self { last }
    }

    /// Allocates an id for the current time.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if the sequence is exhausted.
    pub fn next_id(&mut self) -> UuidResult<SubscriberId> {
        self.next_at(Utc::now())
    }

    /// Allocates an id for `now`, keeping the sequence strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if the last issued id is already the largest
    /// representable one.
    pub fn next_at(&mut self, now: DateTime<Utc>) -> UuidResult<SubscriberId> {
        let candidate = SubscriberId::at(now);
        let id = match self.last {
            Some(prev) if candidate <= prev => {
                let millis = prev.millis.checked_add(1).ok_or_else(|| {
                    UuidError::InvalidInput(format!(
                        "Subscriber id sequence exhausted after {}",
                        prev
                    ))
                })?;
                SubscriberId { millis }
            }
            _ => candidate,
        };
        self.last = Some(id);
        Ok(id)
    }

    /// The most recently issued id, if any.
    pub fn last(&self) -> Option<SubscriberId> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_generates_valid_uuid() {
        let uuid_service = UuidService::new();
        let canonical = uuid_service.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(UuidService::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_uuid() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let parsed = UuidService::parse(canonical).expect("canonical uuid should parse");

        assert_eq!(parsed.to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_hyphenated_uuid() {
        let result = UuidService::parse("550e8400-e29b-41d4-a716-446655440000");

        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_is_canonical_invalid() {
        assert!(!UuidService::is_canonical(
            "550E8400E29B41D4A716446655440000"
        ));
        assert!(!UuidService::is_canonical(
            "550e8400e29b41d4a71644665544000"
        ));
        assert!(!UuidService::is_canonical(
            "550e8400e29b41d4a716446655440zzz"
        ));
        assert!(!UuidService::is_canonical(""));
    }

    #[test]
    fn test_subscriber_id_display_and_parse() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let id = SubscriberId::at(instant);

        assert_eq!(id.to_string(), "SUB1767225600000");
        let parsed: SubscriberId = "SUB1767225600000".parse().expect("should parse");
        assert_eq!(parsed, id);
        assert_eq!(parsed.timestamp(), Some(instant));
    }

    #[test]
    fn test_subscriber_id_rejects_malformed_input() {
        assert!("1767225600000".parse::<SubscriberId>().is_err());
        assert!("SUB".parse::<SubscriberId>().is_err());
        assert!("SUB-12".parse::<SubscriberId>().is_err());
        assert!("SUB12a".parse::<SubscriberId>().is_err());
        assert!("sub12".parse::<SubscriberId>().is_err());
    }

    #[test]
    fn test_generator_is_strictly_increasing_within_same_millisecond() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut generator = SubscriberIdGenerator::new();

        let first = generator.next_at(instant).unwrap();
        let second = generator.next_at(instant).unwrap();
        let third = generator
            .next_at(instant - chrono::Duration::seconds(5))
            .unwrap();

        assert_eq!(first.millis() + 1, second.millis());
        assert_eq!(second.millis() + 1, third.millis());
        assert_eq!(generator.last(), Some(third));
    }

    #[test]
    fn test_generator_follows_clock_when_it_advances() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut generator = SubscriberIdGenerator::new();

        let first = generator.next_at(instant).unwrap();
        let later = generator
            .next_at(instant + chrono::Duration::seconds(1))
            .unwrap();

        assert_eq!(later.millis() - first.millis(), 1_000);
    }

    #[test]
    fn test_resume_after_skips_persisted_ids() {
        let persisted: SubscriberId = "SUB9999999999999".parse().unwrap();
        let mut generator = SubscriberIdGenerator::resume_after(Some(persisted));

        let next = generator.next_id().unwrap();
        assert!(next > persisted);
    }

    #[test]
    fn test_generator_reports_exhausted_sequence() {
        let max: SubscriberId = format!("SUB{}", i64::MAX).parse().unwrap();
        let mut generator = SubscriberIdGenerator::resume_after(Some(max));

        let err = generator.next_id().expect_err("no id above the maximum");
        assert!(matches!(err, UuidError::InvalidInput(_)));
        assert_eq!(generator.last(), Some(max));
    }

    #[test]
    fn test_subscriber_id_rejects_leading_zeros() {
        assert!("SUB0042".parse::<SubscriberId>().is_err());
        assert!("SUB00".parse::<SubscriberId>().is_err());

        let zero: SubscriberId = "SUB0".parse().expect("plain zero is canonical");
        assert_eq!(zero.to_string(), "SUB0");
    }

    #[test]
    fn test_subscriber_id_serde_uses_string_form() {
        let id: SubscriberId = "SUB42".parse().unwrap();
        let json = serde_json::to_string(&id).expect("should serialize");
        assert_eq!(json, "\"SUB42\"");

        let back: SubscriberId = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(back, id);
    }
}

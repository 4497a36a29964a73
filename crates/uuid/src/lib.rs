//! Identifier utilities.
//!
//! Two kinds of identifiers are used across the workspace:
//!
//! - [`UuidService`]: a *canonical* random UUID (32 lowercase hex characters, no hyphens).
//!   Used for short-lived handles such as onboarding sessions held by the REST server.
//! - [`SubscriberId`]: the permanent identifier handed out when an onboarding wizard is
//!   submitted. It is derived from the current time: `SUB` followed by the number of
//!   milliseconds since the Unix epoch, e.g. `SUB1767225600000`.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected by
//! [`UuidService::parse`].
//!
//! ## Time-derived subscriber ids
//! Two submissions in the same millisecond would collide if the id were a plain clock read,
//! so ids are allocated through a [`SubscriberIdGenerator`] which bumps the timestamp by
//! one millisecond whenever the clock has not moved past the last id it issued.

mod service;

// Re-export public types
pub use service::{SubscriberId, SubscriberIdGenerator, Uuid, UuidService, SUBSCRIBER_ID_PREFIX};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;

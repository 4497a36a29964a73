//! Finalized subscriber records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::draft::DraftRecord;
use crate::{NonEmptyText, SubscriberId};

/// Creation and last-update metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStamp {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: NonEmptyText,
    pub updated_by: NonEmptyText,
}

impl AuditStamp {
    /// Stamp for a record created by `actor` at `now`.
    pub fn created(actor: &Actor, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            created_by: actor.name.clone(),
            updated_by: actor.name.clone(),
        }
    }
}

/// A submitted subscriber: the draft plus its identifier and audit metadata.
///
/// Serialized flat, with the draft's camelCase keys beside `subscriberId` and the audit
/// keys, matching the shape kept in the record store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRecord {
    pub subscriber_id: SubscriberId,
    #[serde(flatten)]
    pub details: DraftRecord,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl SubscriberRecord {
    pub fn finalize(
        subscriber_id: SubscriberId,
        details: DraftRecord,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            subscriber_id,
            details,
            audit: AuditStamp::created(actor, now),
        }
    }

    pub fn full_name(&self) -> String {
        self.details.full_name()
    }
}

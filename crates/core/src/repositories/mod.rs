//! Subscriber record storage.
//!
//! The record store is a flat list of [`SubscriberRecord`]s with "last write wins, read on
//! mount" semantics: callers load the whole list, change it, and save the whole list back.
//! There is no schema versioning and no partial update.
//!
//! Two implementations are provided:
//! - [`json_file::JsonFileRepository`] keeps the list as a pretty-printed JSON array on disk.
//! - [`memory::InMemoryRepository`] keeps it in memory, for tests and ephemeral servers.

use crate::record::SubscriberRecord;
use crate::OnboardingResult;

pub mod json_file;
pub mod memory;

/// Load/save access to the full list of submitted subscribers.
pub trait SubscriberRepository: Send + Sync {
    /// Reads every stored record. An empty or missing store yields an empty list.
    fn load(&self) -> OnboardingResult<Vec<SubscriberRecord>>;

    /// Reads every stored record ahead of a read-modify-write.
    ///
    /// Stores that tolerate unreadable entries in [`load`](Self::load) must fail here
    /// instead, so that saving the list back cannot drop them.
    fn load_for_update(&self) -> OnboardingResult<Vec<SubscriberRecord>> {
        self.load()
    }

    /// Replaces the stored list with `records`.
    fn save(&self, records: &[SubscriberRecord]) -> OnboardingResult<()>;
}

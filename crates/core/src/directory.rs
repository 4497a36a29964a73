//! The subscriber directory: what the list screens read from and what completed
//! onboarding wizards write to.
//!
//! Storage goes through an injected [`SubscriberRepository`]. Every successful write is
//! announced on a [`ChangeNotifier`], so list views can re-read the store when something
//! changed instead of listening on a global event.

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::constants::CHANGE_CHANNEL_CAPACITY;
use crate::record::SubscriberRecord;
use crate::repositories::SubscriberRepository;
use crate::search::{SubscriberQuery, SubscriberStats};
use crate::wizard::OnboardingCallbacks;
use crate::{OnboardingError, OnboardingResult, SubscriberId};

/// A change to the record store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordsChanged {
    /// One subscriber was appended.
    Added(SubscriberId),
    /// The whole list was replaced.
    Saved { count: usize },
}

/// Broadcast channel announcing [`RecordsChanged`] events.
#[derive(Clone, Debug)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<RecordsChanged>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(CHANGE_CHANNEL_CAPACITY)
    }
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes `event`. Having nobody listening is not an error.
    pub fn notify(&self, event: RecordsChanged) {
        let listeners = self.sender.send(event).unwrap_or(0);
        tracing::debug!(listeners, "records change announced");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecordsChanged> {
        self.sender.subscribe()
    }
}

pub struct SubscriberDirectory {
    repository: Arc<dyn SubscriberRepository>,
    notifier: ChangeNotifier,
    write_lock: Mutex<()>,
}

impl SubscriberDirectory {
    pub fn new(repository: Arc<dyn SubscriberRepository>, notifier: ChangeNotifier) -> Self {
        Self {
            repository,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn list(&self) -> OnboardingResult<Vec<SubscriberRecord>> {
        self.repository.load()
    }

    pub fn get(&self, id: &SubscriberId) -> OnboardingResult<SubscriberRecord> {
        self.list()?
            .into_iter()
            .find(|r| &r.subscriber_id == id)
            .ok_or_else(|| OnboardingError::SubscriberNotFound(id.to_string()))
    }

    pub fn search(&self, query: &SubscriberQuery) -> OnboardingResult<Vec<SubscriberRecord>> {
        let mut records = self.list()?;
        records.retain(|r| query.matches(r));
        Ok(records)
    }

    pub fn stats(&self) -> OnboardingResult<SubscriberStats> {
        Ok(SubscriberStats::from_records(&self.list()?))
    }

    /// Highest subscriber id in the store, used to resume id generation after a restart.
    pub fn last_issued_id(&self) -> OnboardingResult<Option<SubscriberId>> {
        Ok(self.list()?.iter().map(|r| r.subscriber_id).max())
    }

    /// Appends a newly submitted record and announces it.
    ///
    /// # Errors
    ///
    /// - [`OnboardingError::DuplicateSubscriber`] if a record with the same id is stored already
    /// - [`OnboardingError::Deserialization`] if the store holds an entry it cannot read; the
    ///   store is left untouched
    /// - any other repository error
    pub fn append(&self, record: SubscriberRecord) -> OnboardingResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| OnboardingError::LockPoisoned("subscriber directory"))?;

        let mut records = self.repository.load_for_update()?;
        let id = record.subscriber_id;
        if records.iter().any(|r| r.subscriber_id == id) {
            return Err(OnboardingError::DuplicateSubscriber(id));
        }

        records.push(record);
        self.repository.save(&records)?;
        tracing::info!(subscriber_id = %id, total = records.len(), "subscriber stored");

        self.notifier.notify(RecordsChanged::Added(id));
        Ok(())
    }

    /// Replaces the stored list wholesale (last write wins).
    pub fn save_all(&self, records: &[SubscriberRecord]) -> OnboardingResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| OnboardingError::LockPoisoned("subscriber directory"))?;

        self.repository.save(records)?;
        self.notifier.notify(RecordsChanged::Saved {
            count: records.len(),
        });
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecordsChanged> {
        self.notifier.subscribe()
    }
}

/// A list screen's snapshot of the store.
///
/// Reads once when mounted and again whenever a change has been announced since.
pub struct SubscriberListView {
    directory: Arc<SubscriberDirectory>,
    changes: broadcast::Receiver<RecordsChanged>,
    records: Vec<SubscriberRecord>,
}

impl SubscriberListView {
    pub fn mount(directory: Arc<SubscriberDirectory>) -> OnboardingResult<Self> {
        // Subscribe before reading so a write landing in between is not missed.
        let changes = directory.subscribe();
        let records = directory.list()?;
        Ok(Self {
            directory,
            changes,
            records,
        })
    }

    pub fn records(&self) -> &[SubscriberRecord] {
        &self.records
    }

    pub fn filtered(&self, query: &SubscriberQuery) -> Vec<&SubscriberRecord> {
        query.filter(&self.records)
    }

    pub fn stats(&self) -> SubscriberStats {
        SubscriberStats::from_records(&self.records)
    }

    /// Re-reads the store if any change was announced. Returns whether it re-read.
    pub fn refresh_if_changed(&mut self) -> OnboardingResult<bool> {
        let mut changed = false;
        loop {
            match self.changes.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if changed {
            self.records = self.directory.list()?;
            tracing::debug!(count = self.records.len(), "list view refreshed");
        }
        Ok(changed)
    }
}

/// Completion callbacks that persist submitted records into a [`SubscriberDirectory`].
pub struct DirectoryCallbacks {
    directory: Arc<SubscriberDirectory>,
    completed: Option<SubscriberId>,
    cancelled: bool,
}

impl DirectoryCallbacks {
    pub fn new(directory: Arc<SubscriberDirectory>) -> Self {
        Self {
            directory,
            completed: None,
            cancelled: false,
        }
    }

    pub fn completed(&self) -> Option<SubscriberId> {
        self.completed
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

impl OnboardingCallbacks for DirectoryCallbacks {
    fn on_complete(&mut self, record: SubscriberRecord) -> OnboardingResult<()> {
        let id = record.subscriber_id;
        self.directory.append(record)?;
        self.completed = Some(id);
        Ok(())
    }

    fn on_cancel(&mut self) {
        self.cancelled = true;
    }
}

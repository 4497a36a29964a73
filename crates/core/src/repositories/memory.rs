use crate::error::{OnboardingError, OnboardingResult};
use crate::record::SubscriberRecord;
use crate::repositories::SubscriberRepository;
use std::sync::Mutex;

/// Record store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: Mutex<Vec<SubscriberRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SubscriberRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl SubscriberRepository for InMemoryRepository {
    fn load(&self) -> OnboardingResult<Vec<SubscriberRecord>> {
        self.records
            .lock()
            .map(|records| records.clone())
            .map_err(|_| OnboardingError::LockPoisoned("subscriber store"))
    }

    fn save(&self, records: &[SubscriberRecord]) -> OnboardingResult<()> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| OnboardingError::LockPoisoned("subscriber store"))?;
        *stored = records.to_vec();
        Ok(())
    }
}

//! JSON file backed record store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   subscribers.json       # JSON array of subscriber records
//!   subscribers.json.tmp   # transient, only present while a save is in flight
//! ```
//!
//! Saves write the temp file first and rename it over the store, so a reader never sees a
//! half-written array.

use crate::config::CoreConfig;
use crate::error::{OnboardingError, OnboardingResult};
use crate::record::SubscriberRecord;
use crate::repositories::SubscriberRepository;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Repository at the store path named by `cfg`.
    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.store_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Raw array entries of the store. A missing or blank file has none.
    fn read_entries(&self) -> OnboardingResult<Vec<serde_json::Value>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(OnboardingError::FileRead)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(OnboardingError::Deserialization)
    }
}

impl SubscriberRepository for JsonFileRepository {
    /// Reads the store.
    ///
    /// A missing file is an empty store. Entries that do not parse as a subscriber record
    /// are logged and skipped so one bad entry cannot hide the rest of the list.
    fn load(&self) -> OnboardingResult<Vec<SubscriberRecord>> {
        let entries = self.read_entries()?;

        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<SubscriberRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        "skipping unreadable subscriber entry {} in {}: {}",
                        index,
                        self.path.display(),
                        e
                    );
                }
            }
        }

        Ok(records)
    }

    /// Reads the store, failing on the first unreadable entry.
    fn load_for_update(&self) -> OnboardingResult<Vec<SubscriberRecord>> {
        self.read_entries()?
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value::<SubscriberRecord>(entry).map_err(|e| {
                    tracing::error!(
                        "refusing to rewrite {}: entry {} is unreadable: {}",
                        self.path.display(),
                        index,
                        e
                    );
                    OnboardingError::Deserialization(e)
                })
            })
            .collect()
    }

    fn save(&self, records: &[SubscriberRecord]) -> OnboardingResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| OnboardingError::LockPoisoned("subscriber store"))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(OnboardingError::StorageDirCreation)?;
        }

        let json = serde_json::to_string_pretty(records).map_err(OnboardingError::Serialization)?;
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(OnboardingError::FileWrite)?;
        fs::rename(&temp, &self.path).map_err(OnboardingError::FileWrite)?;

        tracing::debug!(count = records.len(), path = %self.path.display(), "subscriber store saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::draft::DraftRecord;
    use crate::{NonEmptyText, SubscriberId};
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(first_name: &str, millis: i64) -> SubscriberRecord {
        let actor = Actor::new(
            NonEmptyText::new("Test Actor").unwrap(),
            NonEmptyText::new("Agent").unwrap(),
        );
        let mut draft = DraftRecord::new();
        draft.first_name = first_name.to_string();
        let id: SubscriberId = format!("SUB{}", millis).parse().unwrap();
        SubscriberRecord::finalize(id, draft, &actor, Utc::now())
    }

    #[test]
    fn load_returns_empty_for_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = JsonFileRepository::new(temp_dir.path().join("subscribers.json"));

        let records = repo.load().expect("load should succeed");
        assert!(records.is_empty());
    }

    #[test]
    fn save_then_load_returns_records_in_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = JsonFileRepository::new(temp_dir.path().join("nested/subscribers.json"));

        let records = vec![record("Anita", 1), record("Bala", 2)];
        repo.save(&records).expect("save should succeed");

        assert!(repo.path().is_file(), "store file should exist");
        assert!(
            !repo.temp_path().exists(),
            "temp file should be renamed away"
        );

        let loaded = repo.load().expect("load should succeed");
        assert_eq!(loaded, records);
    }

    #[test]
    fn last_write_wins() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = JsonFileRepository::new(temp_dir.path().join("subscribers.json"));

        repo.save(&[record("Anita", 1), record("Bala", 2)]).unwrap();
        repo.save(&[record("Chitra", 3)]).unwrap();

        let loaded = repo.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].details.first_name, "Chitra");
    }

    #[test]
    fn load_skips_unreadable_entries() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = JsonFileRepository::new(temp_dir.path().join("subscribers.json"));
        repo.save(&[record("Valid", 7)]).unwrap();

        let mut entries: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(repo.path()).unwrap()).unwrap();
        entries.push(serde_json::json!({ "subscriberId": "not-an-id" }));
        fs::write(repo.path(), serde_json::to_string(&entries).unwrap()).unwrap();

        let loaded = repo.load().expect("load should skip the bad entry");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].details.first_name, "Valid");
    }

    #[test]
    fn load_for_update_fails_on_unreadable_entry() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = JsonFileRepository::new(temp_dir.path().join("subscribers.json"));
        fs::write(
            repo.path(),
            r#"[{"subscriberId":"SUB1","firstName":"Legacy","createdAt":"bad"}]"#,
        )
        .unwrap();

        assert!(repo.load().unwrap().is_empty());
        let err = repo
            .load_for_update()
            .expect_err("unreadable entry should block a rewrite");
        assert!(matches!(err, OnboardingError::Deserialization(_)));
    }

    #[test]
    fn load_rejects_non_array_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("subscribers.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileRepository::new(&path)
            .load()
            .expect_err("garbage store should fail");
        assert!(matches!(err, OnboardingError::Deserialization(_)));
    }
}

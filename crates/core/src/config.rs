//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Binaries read environment variables and hand the raw values to
//! the helpers below; nothing in the core reads the process environment while handling a
//! request.

use crate::actor::Actor;
use crate::constants::{DEFAULT_ACTOR_NAME, DEFAULT_ACTOR_ROLE, DEFAULT_DATA_DIR, DEFAULT_STORE_FILE};
use crate::{NonEmptyText, OnboardingError, OnboardingResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    store_file: NonEmptyText,
    default_actor: Actor,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `store_file` must be a bare file name; the store always lives directly inside
    /// `data_dir`.
    pub fn new(
        data_dir: PathBuf,
        store_file: NonEmptyText,
        default_actor: Actor,
    ) -> OnboardingResult<Self> {
        let name = store_file.as_str();
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(OnboardingError::InvalidInput(format!(
                "store file must be a plain file name, got '{}'",
                name
            )));
        }

        Ok(Self {
            data_dir,
            store_file,
            default_actor,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the subscriber record store.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(self.store_file.as_str())
    }

    pub fn default_actor(&self) -> &Actor {
        &self.default_actor
    }
}

/// Resolve the data directory from an optional override.
///
/// Blank values fall back to [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Resolve the store file name from an optional override.
pub fn store_file_from_env_value(value: Option<String>) -> OnboardingResult<NonEmptyText> {
    let value = value.filter(|v| NonEmptyText::is_present(v));
    Ok(NonEmptyText::new(
        value.as_deref().unwrap_or(DEFAULT_STORE_FILE),
    )?)
}

/// Resolve the default actor from optional name/role values.
///
/// Missing or blank values fall back to [`DEFAULT_ACTOR_NAME`] / [`DEFAULT_ACTOR_ROLE`].
pub fn actor_from_env_values(name: Option<String>, role: Option<String>) -> OnboardingResult<Actor> {
    let name = name.filter(|v| NonEmptyText::is_present(v));
    let role = role.filter(|v| NonEmptyText::is_present(v));

    Ok(Actor::new(
        NonEmptyText::new(name.as_deref().unwrap_or(DEFAULT_ACTOR_NAME))?,
        NonEmptyText::new(role.as_deref().unwrap_or(DEFAULT_ACTOR_ROLE))?,
    ))
}

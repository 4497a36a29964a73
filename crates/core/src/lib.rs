//! # Chit Fund Core
//!
//! Core business logic for chit fund subscriber onboarding.
//!
//! This crate contains pure data operations and record storage:
//! - The five-step onboarding wizard with per-step presence validation
//! - Subscriber records and the JSON file store they are persisted to
//! - The subscriber directory, with change notification for list views
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and `cli`.

pub mod actor;
pub mod answers;
pub mod config;
pub mod constants;
pub mod directory;
pub mod draft;
pub mod error;
pub mod record;
pub mod repositories;
pub mod search;
pub mod wizard;

pub use chitfund_types::{NonEmptyText, TextError};
pub use chitfund_uuid::{SubscriberId, SubscriberIdGenerator, UuidService};

pub use actor::{Actor, IdentityProvider, StaticIdentity};
pub use answers::AnswerSheet;
pub use config::CoreConfig;
pub use directory::{
    ChangeNotifier, DirectoryCallbacks, RecordsChanged, SubscriberDirectory, SubscriberListView,
};
pub use draft::{DraftField, DraftRecord, FieldKey, NestedField};
pub use error::{OnboardingError, OnboardingResult};
pub use record::SubscriberRecord;
pub use repositories::{
    json_file::JsonFileRepository, memory::InMemoryRepository, SubscriberRepository,
};
pub use search::{SubscriberQuery, SubscriberStats};
pub use wizard::{
    FieldErrors, OnboardingCallbacks, OnboardingContext, OnboardingWizard, StepOutcome,
    SubmitOutcome, WizardStatus, WizardStep,
};

//! The subscriber onboarding wizard.
//!
//! A linear five-step flow over a single [`DraftRecord`]:
//!
//! ```text
//! 1 PersonalInfo -> 2 Membership -> 3 ComplianceDocuments -> 4 NomineeEmergency -> 5 Preferences
//! ```
//!
//! - [`OnboardingWizard::next`] validates the current step and advances only if it passes.
//! - [`OnboardingWizard::previous`] always steps back (except at step 1) and keeps values and
//!   errors untouched.
//! - [`OnboardingWizard::submit`] is only available at step 5. It finalizes the draft into a
//!   [`SubscriberRecord`] and hands it to [`OnboardingCallbacks::on_complete`].
//! - [`OnboardingWizard::cancel`] calls [`OnboardingCallbacks::on_cancel`] and discards the draft.
//!
//! Validation is presence-only: a required field passes when it is non-empty after trimming.
//! A failed step is never an `Err`; it is reported as [`FieldErrors`] and the cursor stays put.
//! Editing a field clears that field's error entry and nothing else.
//!
//! Once submitted or cancelled the wizard is closed. Transitions then fail with
//! [`OnboardingError::WizardClosed`] and field edits are ignored.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::actor::IdentityProvider;
use crate::constants::WIZARD_STEP_COUNT;
use crate::draft::{DraftField, DraftRecord, FieldKey, NestedField};
use crate::record::SubscriberRecord;
use crate::{OnboardingError, OnboardingResult, SubscriberId, SubscriberIdGenerator};

// ============================================================================
// STEPS
// ============================================================================

/// Steps in the onboarding wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    PersonalInfo,
    Membership,
    ComplianceDocuments,
    NomineeEmergency,
    Preferences,
}

impl WizardStep {
    /// Get all steps in order
    pub fn all() -> &'static [WizardStep] {
        &[
            Self::PersonalInfo,
            Self::Membership,
            Self::ComplianceDocuments,
            Self::NomineeEmergency,
            Self::Preferences,
        ]
    }

    /// Get the step number (1-indexed)
    pub fn number(&self) -> u8 {
        match self {
            Self::PersonalInfo => 1,
            Self::Membership => 2,
            Self::ComplianceDocuments => 3,
            Self::NomineeEmergency => 4,
            Self::Preferences => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::all().get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::PersonalInfo => "Personal Info",
            Self::Membership => "Membership",
            Self::ComplianceDocuments => "Compliance & Documents",
            Self::NomineeEmergency => "Nominee & Emergency Contact",
            Self::Preferences => "Preferences",
        }
    }

    /// Fields that must be non-empty before leaving this step.
    pub fn required_fields(&self) -> &'static [FieldKey] {
        match self {
            Self::PersonalInfo => &[
                FieldKey::FirstName,
                FieldKey::LastName,
                FieldKey::Email,
                FieldKey::Phone,
                FieldKey::DateOfBirth,
            ],
            Self::Membership => &[FieldKey::MembershipType, FieldKey::Branch],
            // Compliance, nominee and preference pages show required-looking inputs but
            // have never enforced them.
            Self::ComplianceDocuments | Self::NomineeEmergency | Self::Preferences => &[],
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        Self::from_number(self.number().checked_sub(1)?)
    }

    pub fn is_final(&self) -> bool {
        self.number() == WIZARD_STEP_COUNT
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Field name to human-readable message for every field that failed validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FieldKey, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FieldKey, message: impl Into<String>) {
        self.0.insert(key, message.into());
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.0.contains_key(&key)
    }

    /// Removes the entry for `key`. Returns `true` if there was one.
    pub fn clear_field(&mut self, key: FieldKey) -> bool {
        self.0.remove(&key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Message recorded for a required field left empty.
pub fn required_message(key: FieldKey) -> String {
    format!("{} is required", key.label())
}

/// Presence check of `step`'s required fields against `draft`.
pub fn validate_step(step: WizardStep, draft: &DraftRecord) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for &key in step.required_fields() {
        let present = draft
            .text(key)
            .is_some_and(|value| !value.trim().is_empty());
        if !present {
            errors.insert(key, required_message(key));
        }
    }
    errors
}

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Callbacks invoked when the wizard finishes.
///
/// `on_complete` receives the finalized record and owns persistence. An error returned from
/// it is propagated out of [`OnboardingWizard::submit`] and the wizard stays open at the
/// final step.
pub trait OnboardingCallbacks {
    fn on_complete(&mut self, record: SubscriberRecord) -> OnboardingResult<()>;
    fn on_cancel(&mut self);
}

/// Shared collaborators every wizard needs: who is acting and where ids come from.
///
/// Clone it freely; all clones share one id generator so concurrently open wizards never
/// hand out the same subscriber id.
#[derive(Clone)]
pub struct OnboardingContext {
    identity: Arc<dyn IdentityProvider>,
    ids: Arc<Mutex<SubscriberIdGenerator>>,
}

impl OnboardingContext {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            identity,
            ids: Arc::new(Mutex::new(SubscriberIdGenerator::new())),
        }
    }

    /// Context whose ids will all be greater than `last_issued`.
    pub fn resuming_after(
        identity: Arc<dyn IdentityProvider>,
        last_issued: Option<SubscriberId>,
    ) -> Self {
        Self {
            identity,
            ids: Arc::new(Mutex::new(SubscriberIdGenerator::resume_after(last_issued))),
        }
    }

    fn allocate_id(&self) -> OnboardingResult<SubscriberId> {
        let mut ids = self
            .ids
            .lock()
            .map_err(|_| OnboardingError::LockPoisoned("subscriber id generator"))?;
        Ok(ids.next_id()?)
    }
}

impl fmt::Debug for OnboardingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnboardingContext")
            .field("actor", &self.identity.current_actor())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WIZARD
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStatus {
    Editing,
    Completed,
    Cancelled,
}

/// Result of [`OnboardingWizard::next`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Validation passed. At the final step `from == to`.
    Advanced { from: WizardStep, to: WizardStep },
    /// Validation failed; the cursor did not move.
    Blocked(FieldErrors),
}

/// Result of [`OnboardingWizard::submit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed(SubscriberId),
    Blocked(FieldErrors),
}

pub struct OnboardingWizard<C> {
    draft: DraftRecord,
    step: WizardStep,
    errors: FieldErrors,
    status: WizardStatus,
    context: OnboardingContext,
    callbacks: C,
}

impl<C: OnboardingCallbacks> OnboardingWizard<C> {
    /// Starts a wizard at step 1 over an empty draft.
    pub fn new(context: OnboardingContext, callbacks: C) -> Self {
        tracing::info!("onboarding wizard started");
        Self {
            draft: DraftRecord::new(),
            step: WizardStep::PersonalInfo,
            errors: FieldErrors::new(),
            status: WizardStatus::Editing,
            context,
            callbacks,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &DraftRecord {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == WizardStatus::Editing
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    fn ensure_open(&self) -> OnboardingResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(OnboardingError::WizardClosed)
        }
    }

    fn accepts_edits(&self, what: &str) -> bool {
        if !self.is_open() {
            tracing::warn!(status = ?self.status, "ignoring {} on closed wizard", what);
        }
        self.is_open()
    }

    /// Replaces one top-level field and clears its error entry.
    pub fn set_field(&mut self, update: DraftField) {
        if !self.accepts_edits("field edit") {
            return;
        }
        let key = update.key();
        self.draft.apply(update);
        self.errors.clear_field(key);
        tracing::debug!(field = %key, "draft field updated");
    }

    /// Replaces one key of a nested sub-record, keeping its siblings.
    pub fn set_nested_field(&mut self, update: NestedField) {
        if !self.accepts_edits("nested field edit") {
            return;
        }
        tracing::debug!(update = ?update, "draft nested field updated");
        self.draft.apply_nested(update);
    }

    /// Adds a tag if it is non-blank after trimming and not already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        self.accepts_edits("tag add") && self.draft.tags.insert(tag)
    }

    /// Removes an exact-match tag.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.accepts_edits("tag removal") && self.draft.tags.remove(tag)
    }

    /// Replaces the whole draft, for prefilling or restoring a saved draft.
    ///
    /// Clears all errors; the cursor stays where it is.
    pub fn replace_draft(&mut self, draft: DraftRecord) {
        if !self.accepts_edits("draft replacement") {
            return;
        }
        self.draft = draft;
        self.errors = FieldErrors::new();
    }

    /// Validates the current step and advances on success.
    pub fn next(&mut self) -> OnboardingResult<StepOutcome> {
        self.ensure_open()?;

        let from = self.step;
        self.errors = validate_step(from, &self.draft);
        if !self.errors.is_empty() {
            tracing::info!(step = %from, failing = self.errors.len(), "step validation failed");
            return Ok(StepOutcome::Blocked(self.errors.clone()));
        }

        let to = from.next().unwrap_or(from);
        self.step = to;
        tracing::info!(from = %from, to = %to, "advanced onboarding step");
        Ok(StepOutcome::Advanced { from, to })
    }

    /// Steps back one page. At step 1 this is a no-op.
    pub fn previous(&mut self) -> OnboardingResult<WizardStep> {
        self.ensure_open()?;

        if let Some(prev) = self.step.previous() {
            tracing::info!(from = %self.step, to = %prev, "returned to previous step");
            self.step = prev;
        }
        Ok(self.step)
    }

    /// Finalizes the draft and hands it to `on_complete`.
    ///
    /// # Errors
    ///
    /// - [`OnboardingError::NotAtFinalStep`] when called before step 5
    /// - [`OnboardingError::WizardClosed`] after submit or cancel
    /// - whatever `on_complete` returns; the wizard then remains open
    pub fn submit(&mut self) -> OnboardingResult<SubmitOutcome> {
        self.ensure_open()?;

        if !self.step.is_final() {
            return Err(OnboardingError::NotAtFinalStep { current: self.step });
        }

        self.errors = validate_step(self.step, &self.draft);
        if !self.errors.is_empty() {
            return Ok(SubmitOutcome::Blocked(self.errors.clone()));
        }

        let subscriber_id = self.context.allocate_id()?;
        let actor = self.context.identity.current_actor();
        let record =
            SubscriberRecord::finalize(subscriber_id, self.draft.clone(), &actor, Utc::now());

        self.callbacks.on_complete(record)?;
        self.status = WizardStatus::Completed;
        tracing::info!(%subscriber_id, actor = %actor.name, "onboarding submitted");

        Ok(SubmitOutcome::Completed(subscriber_id))
    }

    /// Aborts the wizard from any step and discards the draft.
    pub fn cancel(&mut self) -> OnboardingResult<()> {
        self.ensure_open()?;

        self.callbacks.on_cancel();
        self.status = WizardStatus::Cancelled;
        self.draft = DraftRecord::new();
        self.errors = FieldErrors::new();
        tracing::info!(step = %self.step, "onboarding cancelled");
        Ok(())
    }
}

impl<C> fmt::Debug for OnboardingWizard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnboardingWizard")
            .field("step", &self.step)
            .field("status", &self.status)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

//! Scripted onboarding from an answer sheet.
//!
//! An answer sheet is a YAML document holding a draft in the same camelCase keys the record
//! store uses. Missing keys take the draft defaults.
//!
//! ```yaml
//! firstName: Anita
//! lastName: Desai
//! email: anita@example.com
//! phone: "+911234567890"
//! dateOfBirth: "1992-12-05"
//! membershipType: Individual
//! branch: Bangalore Main
//! nominee:
//!   name: Ravi Desai
//!   relationship: Spouse
//! tags: [vip, referral]
//! ```

use std::fs;
use std::path::Path;

use crate::draft::DraftRecord;
use crate::wizard::{OnboardingCallbacks, OnboardingWizard, StepOutcome, SubmitOutcome};
use crate::{OnboardingError, OnboardingResult};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnswerSheet {
    draft: DraftRecord,
}

impl AnswerSheet {
    pub fn from_yaml_str(yaml: &str) -> OnboardingResult<Self> {
        let draft = if yaml.trim().is_empty() {
            DraftRecord::new()
        } else {
            serde_yaml::from_str(yaml).map_err(OnboardingError::YamlDeserialization)?
        };
        Ok(Self { draft })
    }

    pub fn from_path(path: &Path) -> OnboardingResult<Self> {
        let yaml = fs::read_to_string(path).map_err(OnboardingError::FileRead)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn draft(&self) -> &DraftRecord {
        &self.draft
    }

    /// Loads the sheet into `wizard`, walks every step and submits.
    ///
    /// Stops at the first step that fails validation and returns its errors as
    /// [`SubmitOutcome::Blocked`]; the wizard is left on that step.
    pub fn run<C: OnboardingCallbacks>(
        self,
        wizard: &mut OnboardingWizard<C>,
    ) -> OnboardingResult<SubmitOutcome> {
        wizard.replace_draft(self.draft);

        while !wizard.step().is_final() {
            if let StepOutcome::Blocked(errors) = wizard.next()? {
                return Ok(SubmitOutcome::Blocked(errors));
            }
        }

        wizard.submit()
    }
}

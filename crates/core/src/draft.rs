//! The in-progress subscriber record edited by the onboarding wizard.
//!
//! A [`DraftRecord`] is only ever changed through whole-field replacement
//! ([`DraftField`]) or replacement of one key inside a known sub-record ([`NestedField`]).
//! Both are closed enums, so an update can never name a field that does not exist.
//!
//! Values are kept as entered: text fields stay `String` (possibly empty) until a step
//! advance asks for them to be present.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::NonEmptyText;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    #[default]
    Pending,
    Active,
    Inactive,
    Suspended,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Low,
    Medium,
    High,
}

/// Nominee details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Nominee {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub date_of_birth: String,
}

/// Emergency contact details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

/// Channels the subscriber agreed to be contacted on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunicationPreferences {
    pub email: bool,
    pub sms: bool,
    pub whatsapp: bool,
    pub phone_call: bool,
}

impl Default for CommunicationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: true,
            whatsapp: false,
            phone_call: false,
        }
    }
}

/// An insertion-ordered set of tags.
///
/// Tags are trimmed on insert; blank tags and duplicates are ignored. Deserializing a list
/// that contains duplicates keeps the first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `tag` after trimming. Returns `true` if the set changed.
    pub fn insert(&mut self, tag: &str) -> bool {
        let Ok(tag) = NonEmptyText::new(tag) else {
            return false;
        };
        if self.contains(tag.as_str()) {
            return false;
        }
        self.0.push(tag.into_string());
        true
    }

    /// Removes an exact match. Returns `true` if the set changed.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        let mut tags = TagSet::new();
        for tag in &raw {
            tags.insert(tag);
        }
        Ok(tags)
    }
}

/// A partially populated subscriber.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftRecord {
    // identity
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,

    // classification
    pub membership_type: String,
    pub membership_tier: String,
    pub branch: String,
    pub assigned_agent: String,
    pub credit_score: Option<u32>,
    pub risk_profile: Option<RiskProfile>,

    // compliance
    pub kyc_status: KycStatus,
    pub pan_number: String,
    pub aadhaar_number: String,

    pub status: SubscriberStatus,

    // counters
    pub active_chits: u32,
    pub total_contributions: u64,
    pub outstanding_amount: u64,

    // relations
    pub nominee: Nominee,
    pub emergency_contact: EmergencyContact,

    // preferences
    pub communication_preferences: CommunicationPreferences,
    pub preferred_contact_time: String,
    pub language: String,

    // metadata
    pub tags: TagSet,
    pub notes: String,
}

impl DraftRecord {
    /// An empty draft with the fixed defaults: pending status, pending KYC, zero counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Text content of a top-level field, or `None` for fields that are not free text.
    pub fn text(&self, key: FieldKey) -> Option<&str> {
        let value = match key {
            FieldKey::FirstName => &self.first_name,
            FieldKey::LastName => &self.last_name,
            FieldKey::Email => &self.email,
            FieldKey::Phone => &self.phone,
            FieldKey::DateOfBirth => &self.date_of_birth,
            FieldKey::Address => &self.address,
            FieldKey::City => &self.city,
            FieldKey::State => &self.state,
            FieldKey::Pincode => &self.pincode,
            FieldKey::MembershipType => &self.membership_type,
            FieldKey::MembershipTier => &self.membership_tier,
            FieldKey::Branch => &self.branch,
            FieldKey::AssignedAgent => &self.assigned_agent,
            FieldKey::PanNumber => &self.pan_number,
            FieldKey::AadhaarNumber => &self.aadhaar_number,
            FieldKey::PreferredContactTime => &self.preferred_contact_time,
            FieldKey::Language => &self.language,
            FieldKey::Notes => &self.notes,
            FieldKey::CreditScore
            | FieldKey::RiskProfile
            | FieldKey::KycStatus
            | FieldKey::Status => return None,
        };
        Some(value.as_str())
    }

    /// Replaces one top-level field.
    pub fn apply(&mut self, update: DraftField) {
        match update {
            DraftField::FirstName(v) => self.first_name = v,
            DraftField::LastName(v) => self.last_name = v,
            DraftField::Email(v) => self.email = v,
            DraftField::Phone(v) => self.phone = v,
            DraftField::DateOfBirth(v) => self.date_of_birth = v,
            DraftField::Address(v) => self.address = v,
            DraftField::City(v) => self.city = v,
            DraftField::State(v) => self.state = v,
            DraftField::Pincode(v) => self.pincode = v,
            DraftField::MembershipType(v) => self.membership_type = v,
            DraftField::MembershipTier(v) => self.membership_tier = v,
            DraftField::Branch(v) => self.branch = v,
            DraftField::AssignedAgent(v) => self.assigned_agent = v,
            DraftField::CreditScore(v) => self.credit_score = v,
            DraftField::RiskProfile(v) => self.risk_profile = v,
            DraftField::KycStatus(v) => self.kyc_status = v,
            DraftField::PanNumber(v) => self.pan_number = v,
            DraftField::AadhaarNumber(v) => self.aadhaar_number = v,
            DraftField::Status(v) => self.status = v,
            DraftField::PreferredContactTime(v) => self.preferred_contact_time = v,
            DraftField::Language(v) => self.language = v,
            DraftField::Notes(v) => self.notes = v,
        }
    }

    /// Replaces one key inside a sub-record, leaving its siblings untouched.
    pub fn apply_nested(&mut self, update: NestedField) {
        match update {
            NestedField::Nominee(field) => {
                let nominee = &mut self.nominee;
                match field {
                    NomineeField::Name(v) => nominee.name = v,
                    NomineeField::Relationship(v) => nominee.relationship = v,
                    NomineeField::Phone(v) => nominee.phone = v,
                    NomineeField::DateOfBirth(v) => nominee.date_of_birth = v,
                }
            }
            NestedField::EmergencyContact(field) => {
                let contact = &mut self.emergency_contact;
                match field {
                    EmergencyContactField::Name(v) => contact.name = v,
                    EmergencyContactField::Relationship(v) => contact.relationship = v,
                    EmergencyContactField::Phone(v) => contact.phone = v,
                }
            }
            NestedField::CommunicationPreferences(field) => {
                let prefs = &mut self.communication_preferences;
                match field {
                    CommunicationField::Email(v) => prefs.email = v,
                    CommunicationField::Sms(v) => prefs.sms = v,
                    CommunicationField::Whatsapp(v) => prefs.whatsapp = v,
                    CommunicationField::PhoneCall(v) => prefs.phone_call = v,
                }
            }
        }
    }
}

/// Name of a top-level draft field, used as the key of validation errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    FirstName,
    LastName,
    Email,
    Phone,
    DateOfBirth,
    Address,
    City,
    State,
    Pincode,
    MembershipType,
    MembershipTier,
    Branch,
    AssignedAgent,
    CreditScore,
    RiskProfile,
    KycStatus,
    PanNumber,
    AadhaarNumber,
    Status,
    PreferredContactTime,
    Language,
    Notes,
}

impl FieldKey {
    /// Wire name of the field (camelCase, as serialized).
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::FirstName => "firstName",
            FieldKey::LastName => "lastName",
            FieldKey::Email => "email",
            FieldKey::Phone => "phone",
            FieldKey::DateOfBirth => "dateOfBirth",
            FieldKey::Address => "address",
            FieldKey::City => "city",
            FieldKey::State => "state",
            FieldKey::Pincode => "pincode",
            FieldKey::MembershipType => "membershipType",
            FieldKey::MembershipTier => "membershipTier",
            FieldKey::Branch => "branch",
            FieldKey::AssignedAgent => "assignedAgent",
            FieldKey::CreditScore => "creditScore",
            FieldKey::RiskProfile => "riskProfile",
            FieldKey::KycStatus => "kycStatus",
            FieldKey::PanNumber => "panNumber",
            FieldKey::AadhaarNumber => "aadhaarNumber",
            FieldKey::Status => "status",
            FieldKey::PreferredContactTime => "preferredContactTime",
            FieldKey::Language => "language",
            FieldKey::Notes => "notes",
        }
    }

    /// Label shown to operators next to the field.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKey::FirstName => "First name",
            FieldKey::LastName => "Last name",
            FieldKey::Email => "Email",
            FieldKey::Phone => "Phone",
            FieldKey::DateOfBirth => "Date of birth",
            FieldKey::Address => "Address",
            FieldKey::City => "City",
            FieldKey::State => "State",
            FieldKey::Pincode => "Pincode",
            FieldKey::MembershipType => "Membership type",
            FieldKey::MembershipTier => "Membership tier",
            FieldKey::Branch => "Branch",
            FieldKey::AssignedAgent => "Assigned agent",
            FieldKey::CreditScore => "Credit score",
            FieldKey::RiskProfile => "Risk profile",
            FieldKey::KycStatus => "KYC status",
            FieldKey::PanNumber => "PAN number",
            FieldKey::AadhaarNumber => "Aadhaar number",
            FieldKey::Status => "Status",
            FieldKey::PreferredContactTime => "Preferred contact time",
            FieldKey::Language => "Language",
            FieldKey::Notes => "Notes",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-field replacement of a top-level draft field.
///
/// Serialized as `{"field": "<camelCaseName>", "value": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum DraftField {
    FirstName(String),
    LastName(String),
    Email(String),
    Phone(String),
    DateOfBirth(String),
    Address(String),
    City(String),
    State(String),
    Pincode(String),
    MembershipType(String),
    MembershipTier(String),
    Branch(String),
    AssignedAgent(String),
    CreditScore(Option<u32>),
    RiskProfile(Option<RiskProfile>),
    KycStatus(KycStatus),
    PanNumber(String),
    AadhaarNumber(String),
    Status(SubscriberStatus),
    PreferredContactTime(String),
    Language(String),
    Notes(String),
}

impl DraftField {
    pub fn key(&self) -> FieldKey {
        match self {
            DraftField::FirstName(_) => FieldKey::FirstName,
            DraftField::LastName(_) => FieldKey::LastName,
            DraftField::Email(_) => FieldKey::Email,
            DraftField::Phone(_) => FieldKey::Phone,
            DraftField::DateOfBirth(_) => FieldKey::DateOfBirth,
            DraftField::Address(_) => FieldKey::Address,
            DraftField::City(_) => FieldKey::City,
            DraftField::State(_) => FieldKey::State,
            DraftField::Pincode(_) => FieldKey::Pincode,
            DraftField::MembershipType(_) => FieldKey::MembershipType,
            DraftField::MembershipTier(_) => FieldKey::MembershipTier,
            DraftField::Branch(_) => FieldKey::Branch,
            DraftField::AssignedAgent(_) => FieldKey::AssignedAgent,
            DraftField::CreditScore(_) => FieldKey::CreditScore,
            DraftField::RiskProfile(_) => FieldKey::RiskProfile,
            DraftField::KycStatus(_) => FieldKey::KycStatus,
            DraftField::PanNumber(_) => FieldKey::PanNumber,
            DraftField::AadhaarNumber(_) => FieldKey::AadhaarNumber,
            DraftField::Status(_) => FieldKey::Status,
            DraftField::PreferredContactTime(_) => FieldKey::PreferredContactTime,
            DraftField::Language(_) => FieldKey::Language,
            DraftField::Notes(_) => FieldKey::Notes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum NomineeField {
    Name(String),
    Relationship(String),
    Phone(String),
    DateOfBirth(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum EmergencyContactField {
    Name(String),
    Relationship(String),
    Phone(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum CommunicationField {
    Email(bool),
    Sms(bool),
    Whatsapp(bool),
    PhoneCall(bool),
}

/// Replacement of one key inside a named sub-record.
///
/// Serialized as `{"group": "nominee", "update": {"field": "name", "value": "..."}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "group", content = "update", rename_all = "camelCase")]
pub enum NestedField {
    Nominee(NomineeField),
    EmergencyContact(EmergencyContactField),
    CommunicationPreferences(CommunicationField),
}

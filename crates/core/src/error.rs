use crate::wizard::WizardStep;

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write subscriber store: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read subscriber store: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize subscribers: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize subscribers: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error("invalid text: {0}")]
    Text(#[from] chitfund_types::TextError),
    #[error("invalid identifier: {0}")]
    Id(#[from] chitfund_uuid::UuidError),

    #[error("submit is only available at the final step (current step: {current})")]
    NotAtFinalStep { current: WizardStep },
    #[error("onboarding wizard is already closed")]
    WizardClosed,
    #[error("subscriber {0} already exists")]
    DuplicateSubscriber(chitfund_uuid::SubscriberId),
    #[error("subscriber {0} not found")]
    SubscriberNotFound(String),
}

pub type OnboardingResult<T> = std::result::Result<T, OnboardingError>;

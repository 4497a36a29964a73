//! Constants used throughout the core crate.

/// Default directory for subscriber data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "chitfund_data";

/// Default file name of the subscriber record store inside the data directory.
pub const DEFAULT_STORE_FILE: &str = "subscribers.json";

/// Actor recorded on audit stamps when no identity has been configured.
pub const DEFAULT_ACTOR_NAME: &str = "system";

/// Role recorded alongside [`DEFAULT_ACTOR_NAME`].
pub const DEFAULT_ACTOR_ROLE: &str = "Administrator";

/// Capacity of the change-notification channel.
///
/// Slow listeners that fall further behind than this simply see a lagged receiver and
/// reload once, which is all a "data changed" signal needs.
pub const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Number of steps in the onboarding wizard.
pub const WIZARD_STEP_COUNT: u8 = 5;

//! Creation and scheduling defaults shared by the gateway, the settings
//! layer, and the CLI.

/// Model used when a submission does not name one.
pub const DEFAULT_MODEL: &str = "sora-2";

/// Clip length in seconds used when a submission does not name one.
pub const DEFAULT_DURATION_SECS: u32 = 4;

/// Output resolution used when a submission does not name one.
pub const DEFAULT_SIZE: &str = "720x1280";

/// Seconds between poll cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Page size for a full remote listing during reconciliation.
pub const LIST_PAGE_LIMIT: u32 = 100;

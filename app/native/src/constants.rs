//! Application-wide constants.

/// Application identifier, used for cache and configuration directory names.
pub const APP_ID: &str = "wallshow";

/// Prefix shared by every event emitted to subscribers.
pub const EVENT_PREFIX: &str = "wallshow://";

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "wallshow=info,wallshow_lib=info";

//! Default configuration values shared by the teardown crates
//!
//! These constants keep paging and waiting consistent across every stage.

/// Default page size when draining a listing endpoint
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Default per-resource wait timeout in seconds (5 minutes)
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 300;

/// Default initial delay between state polls in milliseconds
pub const DEFAULT_POLL_INITIAL_DELAY_MS: u64 = 2_000;

/// Default cap on the delay between state polls in milliseconds
pub const DEFAULT_POLL_MAX_DELAY_MS: u64 = 15_000;

// Serde default functions for struct field defaults

/// Returns the default page size
pub fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Returns the default wait timeout in seconds
pub fn default_wait_timeout_secs() -> u64 {
    DEFAULT_WAIT_TIMEOUT_SECS
}

/// Returns the default initial poll delay in milliseconds
pub fn default_poll_initial_delay_ms() -> u64 {
    DEFAULT_POLL_INITIAL_DELAY_MS
}

/// Returns the default maximum poll delay in milliseconds
pub fn default_poll_max_delay_ms() -> u64 {
    DEFAULT_POLL_MAX_DELAY_MS
}

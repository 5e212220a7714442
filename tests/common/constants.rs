//! Shared constants for end-to-end tests
//!
//! When fixture pages change, update only this file and `fixtures.rs`.

// ============================================================================
// Fixture Artists
// ============================================================================

/// Artist with a complete Korean page
pub const IU_NAME: &str = "아이유";

pub const IU_PAGE_URI: &str = "https://ko.wikipedia.org/wiki/%EC%95%84%EC%9D%B4%EC%9C%A0";

/// Name that lands on a disambiguation page
pub const AMBIGUOUS_PAGE_NAME: &str = "김민지";

/// Page the resolver should pick for `AMBIGUOUS_PAGE_NAME`
pub const DISAMBIGUATED_TITLE: &str = "김민지 (2006년)";

/// Name no provider knows about
pub const UNKNOWN_ARTIST: &str = "Nobody Knows Me";

/// Name whose lookups never finish within the upstream timeout
pub const SLOW_ARTIST: &str = "Slow Artist";

/// Name whose lookups fail with an upstream error
pub const FAILING_ARTIST: &str = "Broken Artist";

// ============================================================================
// Server Settings
// ============================================================================

/// Base URL written into generated automation scripts
pub const API_BASE_URL: &str = "http://registry.test";

/// Upstream timeout used by test servers
pub const UPSTREAM_TIMEOUT_MS: u64 = 300;

/// How long the slow fixture provider sleeps
pub const SLOW_PROVIDER_DELAY_MS: u64 = 3_000;

// ============================================================================
// Test Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;

/// Interval between readiness checks
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Default timeout for HTTP requests in tests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

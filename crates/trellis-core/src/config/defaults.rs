//! Default values for Trellis configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Timing Defaults
// ============================================================================

/// Time a test may take before it fails with a timeout (2 s).
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Duration above which a passing test is reported as slow (75 ms).
pub const DEFAULT_SLOW_MS: u64 = 75;

// ============================================================================
// Reporter Defaults
// ============================================================================

/// Whether the built-in tracing reporter logs passes at `info`.
pub const DEFAULT_SHOW_PASSES: bool = true;

/// Whether the built-in tracing reporter logs skips at `info`.
pub const DEFAULT_SHOW_SKIPPED: bool = false;

// ============================================================================
// Locations
// ============================================================================

/// Project-local config file.
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// Directory under the user config dir.
pub const CONFIG_DIR_NAME: &str = "trellis";

/// File name inside [`CONFIG_DIR_NAME`].
pub const USER_CONFIG_FILE_NAME: &str = "config.toml";

// ============================================================================
// Environment
// ============================================================================

pub const ENV_TIMEOUT: &str = "TRELLIS_TIMEOUT";
pub const ENV_SLOW: &str = "TRELLIS_SLOW";

//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, view, locked entry).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong PIN, no PIN set, folder still locked).
    pub const AUTH_FAILED: i32 = 5;
}

/// Environment variables read by the CLI.
pub mod env {
    /// Config file override.
    pub const CONFIG: &str = "CHATLOCK_CONFIG";

    /// Vault database override.
    pub const STORE: &str = "CHATLOCK_STORE";

    /// Non-interactive PIN entry.
    pub const PIN: &str = "CHATLOCK_PIN";

    /// Log filter directive.
    pub const LOG: &str = "CHATLOCK_LOG";
}

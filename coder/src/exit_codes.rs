//! Stable exit codes for the coder CLI.

/// Run completed and a response was produced.
pub const OK: i32 = 0;
/// Startup or control-logic failure (bad config, unusable working directory).
pub const INVALID: i32 = 1;

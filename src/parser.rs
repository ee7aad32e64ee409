//! Structured-output parsing hook.

use serde_json::Value;

use crate::error::Result;

/// Turns sanitized command output into structured data.
///
/// The parser is keyed by dialect name and command so one implementation
/// can dispatch to per-vendor templates. Attached per session via
/// [`ConnectionBuilder::parser`](crate::ConnectionBuilder::parser).
pub trait OutputParser: Send + Sync {
    /// Parse the output of one command.
    fn parse(&self, dialect: &str, command: &str, output: &str) -> Result<Value>;
}

//! Dialect definition carrying one vendor's CLI capability set.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use super::{DeviceMode, LoginHandler};
use crate::error::{DialectError, Result};

/// Capability set describing one vendor's CLI dialect.
///
/// Mode patterns are kept in an ordered map and checked in insertion
/// order; built-in dialects insert Config before Enable before User so
/// that a `(config)#` prompt is not misclassified by the broader `#`
/// enable pattern.
#[derive(Clone)]
pub struct Dialect {
    /// Dialect name (e.g. "generic", "ericsson_ipos").
    pub name: String,

    /// Pattern matching the terminal prompt in any mode.
    pub prompt_pattern: Regex,

    /// Per-mode prompt classification patterns, in match order.
    pub mode_patterns: IndexMap<DeviceMode, Regex>,

    /// Username prompt during inline (Telnet/Serial) login.
    pub username_prompt: Regex,

    /// Password prompt during inline login.
    pub password_prompt: Regex,

    /// Prompt the device shows after the enable command, asking for the
    /// enable secret.
    pub secret_prompt: Regex,

    /// Command entering enable mode.
    pub enable_command: String,

    /// Command leaving enable mode.
    pub exit_enable_command: String,

    /// Command entering config mode.
    pub config_command: String,

    /// Command leaving config mode.
    pub exit_config_command: String,

    /// Pattern terminating the read after a config-mode enter/exit.
    pub config_terminator: Regex,

    /// Command disabling output paging, run during session preparation.
    pub paging_disable_command: Option<String>,

    /// Substrings that mark command output as failed.
    pub error_patterns: Vec<String>,

    /// Commands sent best-effort before the connection closes.
    pub on_close_commands: Vec<String>,

    /// Terminal width requested for the PTY.
    pub terminal_width: u32,

    /// Terminal height requested for the PTY.
    pub terminal_height: u32,

    /// Optional login hook (not serializable).
    pub login_handler: Option<Arc<dyn LoginHandler>>,
}

impl Dialect {
    /// Create a dialect with the given terminal-prompt pattern and
    /// conventional defaults for everything else.
    pub fn new(name: impl Into<String>, prompt_pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            prompt_pattern: compile(prompt_pattern)?,
            mode_patterns: IndexMap::new(),
            username_prompt: compile(r"(?i)username|login")?,
            password_prompt: compile(r"(?i)password")?,
            secret_prompt: compile(r"(?i)password")?,
            enable_command: "enable".to_string(),
            exit_enable_command: "disable".to_string(),
            config_command: "configure terminal".to_string(),
            exit_config_command: "end".to_string(),
            config_terminator: compile(r"#\s*$")?,
            paging_disable_command: None,
            error_patterns: vec![],
            on_close_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
            login_handler: None,
        })
    }

    /// Add a mode classification pattern. Insertion order is match order.
    pub fn with_mode_pattern(mut self, mode: DeviceMode, pattern: &str) -> Result<Self> {
        self.mode_patterns.insert(mode, compile(pattern)?);
        Ok(self)
    }

    /// Set the enable/exit-enable command pair.
    pub fn with_enable_commands(
        mut self,
        enable: impl Into<String>,
        exit: impl Into<String>,
    ) -> Self {
        self.enable_command = enable.into();
        self.exit_enable_command = exit.into();
        self
    }

    /// Set the config-mode enter/exit command pair.
    pub fn with_config_commands(
        mut self,
        enter: impl Into<String>,
        exit: impl Into<String>,
    ) -> Self {
        self.config_command = enter.into();
        self.exit_config_command = exit.into();
        self
    }

    /// Set the pattern terminating config-mode transition reads.
    pub fn with_config_terminator(mut self, pattern: &str) -> Result<Self> {
        self.config_terminator = compile(pattern)?;
        Ok(self)
    }

    /// Set the enable-secret prompt pattern.
    pub fn with_secret_prompt(mut self, pattern: &str) -> Result<Self> {
        self.secret_prompt = compile(pattern)?;
        Ok(self)
    }

    /// Set the inline-login username and password prompt patterns.
    pub fn with_login_prompts(mut self, username: &str, password: &str) -> Result<Self> {
        self.username_prompt = compile(username)?;
        self.password_prompt = compile(password)?;
        Ok(self)
    }

    /// Set the paging-disable command.
    pub fn with_paging_disable(mut self, command: impl Into<String>) -> Self {
        self.paging_disable_command = Some(command.into());
        self
    }

    /// Add a failure marker substring.
    pub fn with_error_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.error_patterns.push(pattern.into());
        self
    }

    /// Add an on-close command.
    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the login hook.
    pub fn with_login_handler(mut self, handler: Arc<dyn LoginHandler>) -> Self {
        self.login_handler = Some(handler);
        self
    }

    /// Classify a prompt line into an operational mode.
    ///
    /// Patterns are tried in insertion order; `None` when no pattern
    /// matches (unknown prompt shape).
    pub fn classify_mode(&self, prompt: &str) -> Option<DeviceMode> {
        self.mode_patterns
            .iter()
            .find(|(_, pattern)| pattern.is_match(prompt))
            .map(|(mode, _)| *mode)
    }

    /// Scan output for this dialect's failure markers.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.error_patterns
            .iter()
            .find(|marker| output.contains(marker.as_str()))
            .map(|marker| format!("output matched failure pattern '{marker}'"))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        DialectError::InvalidDefinition {
            message: format!("bad pattern '{pattern}': {e}"),
        }
        .into()
    })
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("prompt_pattern", &self.prompt_pattern.as_str())
            .field("mode_patterns", &self.mode_patterns)
            .field("enable_command", &self.enable_command)
            .field("config_command", &self.config_command)
            .field("exit_config_command", &self.exit_config_command)
            .field("paging_disable_command", &self.paging_disable_command)
            .field("error_patterns", &self.error_patterns)
            .field("on_close_commands", &self.on_close_commands)
            .field(
                "login_handler",
                &self.login_handler.as_ref().map(|_| "<LoginHandler>"),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_patterns_match_in_insertion_order() {
        let dialect = Dialect::new("test", r"[>#]\s*$")
            .unwrap()
            .with_mode_pattern(DeviceMode::Config, r"\)#\s*$")
            .unwrap()
            .with_mode_pattern(DeviceMode::Enable, r"#\s*$")
            .unwrap()
            .with_mode_pattern(DeviceMode::User, r">\s*$")
            .unwrap();

        // The config prompt also ends in '#'; insertion order keeps it
        // from being classified as enable.
        assert_eq!(
            dialect.classify_mode("Router(config)#"),
            Some(DeviceMode::Config)
        );
        assert_eq!(dialect.classify_mode("Router#"), Some(DeviceMode::Enable));
        assert_eq!(dialect.classify_mode("Router>"), Some(DeviceMode::User));
        assert_eq!(dialect.classify_mode("login:"), None);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(Dialect::new("broken", r"[unclosed").is_err());
    }

    #[test]
    fn detect_failure_reports_the_marker() {
        let dialect = Dialect::new("test", r"#\s*$")
            .unwrap()
            .with_error_pattern("% Invalid input");

        let failure = dialect.detect_failure("% Invalid input detected at '^'");
        assert!(failure.unwrap().contains("% Invalid input"));
        assert!(dialect.detect_failure("all good").is_none());
    }
}

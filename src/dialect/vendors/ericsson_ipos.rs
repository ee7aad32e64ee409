//! Ericsson IPOS dialect.
//!
//! IPOS routers (SSR/SmartEdge lineage) present an IOS-like CLI with a
//! `[context]hostname#` prompt. Config mode is entered with a bare
//! `configure` and left with `end`; paging is disabled via
//! `terminal length 0`.

use crate::dialect::{DeviceMode, Dialect};

/// Create the Ericsson IPOS dialect definition.
pub fn dialect() -> Dialect {
    Dialect::new("ericsson_ipos", r"[>#]\s*$")
        .unwrap()
        .with_mode_pattern(DeviceMode::Config, r"\)#\s*$")
        .unwrap()
        .with_mode_pattern(DeviceMode::Enable, r"#\s*$")
        .unwrap()
        .with_mode_pattern(DeviceMode::User, r">\s*$")
        .unwrap()
        .with_enable_commands("enable", "disable")
        .with_config_commands("configure", "end")
        .with_config_terminator(r"[)#]\s*$")
        .unwrap()
        .with_secret_prompt(r"(?i)password[:\s]*$")
        .unwrap()
        .with_login_prompts(r"(?i)(username|login)[:\s]*$", r"(?i)password[:\s]*$")
        .unwrap()
        .with_paging_disable("terminal length 0")
        .with_error_pattern("% Invalid input")
        .with_error_pattern("% Incomplete command")
        .with_error_pattern("% Unrecognized command")
        .with_on_close_command("exit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipos_prompts_classify() {
        let dialect = dialect();
        assert_eq!(dialect.name, "ericsson_ipos");
        assert_eq!(
            dialect.classify_mode("[local]Router#"),
            Some(DeviceMode::Enable)
        );
        assert_eq!(
            dialect.classify_mode("[local]Router(config)#"),
            Some(DeviceMode::Config)
        );
        assert_eq!(dialect.classify_mode("[local]Router>"), Some(DeviceMode::User));
    }

    #[test]
    fn paging_and_failure_markers() {
        let dialect = dialect();
        assert_eq!(
            dialect.paging_disable_command.as_deref(),
            Some("terminal length 0")
        );
        assert!(dialect.detect_failure("% Invalid input at '^'").is_some());
    }
}

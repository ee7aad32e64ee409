//! Generic dialect.
//!
//! Conventional defaults for IOS-like CLIs: `>` user prompt, `#` enable
//! prompt, `(config)#` config prompt. A reasonable starting point for
//! devices without a dedicated dialect.

use crate::dialect::{DeviceMode, Dialect};

/// Create the generic dialect definition.
pub fn dialect() -> Dialect {
    Dialect::new("generic", r"[>#]\s*$")
        .unwrap()
        .with_mode_pattern(DeviceMode::Config, r"\)#\s*$")
        .unwrap()
        .with_mode_pattern(DeviceMode::Enable, r"#\s*$")
        .unwrap()
        .with_mode_pattern(DeviceMode::User, r">\s*$")
        .unwrap()
        .with_enable_commands("enable", "disable")
        .with_config_commands("configure terminal", "end")
        .with_secret_prompt(r"(?i)password[:\s]*$")
        .unwrap()
        .with_login_prompts(r"(?i)(username|login)[:\s]*$", r"(?i)password[:\s]*$")
        .unwrap()
        .with_on_close_command("exit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_shapes_classify() {
        let dialect = dialect();
        assert_eq!(dialect.name, "generic");
        assert_eq!(dialect.classify_mode("Router>"), Some(DeviceMode::User));
        assert_eq!(dialect.classify_mode("Router#"), Some(DeviceMode::Enable));
        assert_eq!(
            dialect.classify_mode("Router(config)#"),
            Some(DeviceMode::Config)
        );
        assert!(dialect.prompt_pattern.is_match("Router# "));
    }
}

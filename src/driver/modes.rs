//! Operational-mode control: enable, config mode, and batch config.

use log::debug;

use super::connection::Connection;
use crate::channel::ChunkWindow;
use crate::dialect::DeviceMode;
use crate::error::{DriverError, Result};

impl Connection {
    /// Re-discover the prompt and check whether the session is in
    /// enable (or deeper) mode.
    pub async fn check_enable_mode(&mut self) -> Result<bool> {
        let prompt = self.find_prompt().await?;
        Ok(matches!(
            self.dialect.classify_mode(&prompt),
            Some(DeviceMode::Enable | DeviceMode::Config)
        ))
    }

    /// Re-discover the prompt and check whether the session is in
    /// config mode.
    pub async fn check_config_mode(&mut self) -> Result<bool> {
        let prompt = self.find_prompt().await?;
        Ok(self.dialect.classify_mode(&prompt) == Some(DeviceMode::Config))
    }

    /// Enter enable mode.
    ///
    /// Sends the dialect's enable command, answers the secret prompt
    /// with the configured secret, and verifies the resulting prompt.
    /// Every failure along the way, including a timeout in the password
    /// exchange, maps to `EnableFailed` since the usual cause is a
    /// missing or wrong secret.
    pub async fn enable(&mut self) -> Result<()> {
        if self.check_enable_mode().await? {
            return Ok(());
        }

        let secret = self.config.secret.clone().unwrap_or_default();
        let enable_command = self.dialect.enable_command.clone();
        let secret_prompt = self.dialect.secret_prompt.clone();
        let prompt_pattern = self.dialect.prompt_pattern.clone();

        let exchange = async {
            self.channel_mut()?.write_line(&enable_command).await?;
            self.read_until_pattern(&secret_prompt).await?;
            self.channel_mut()?.write_line(&secret).await?;
            self.read_until_pattern(&prompt_pattern).await?;
            Ok::<(), crate::error::Error>(())
        };
        if let Err(e) = exchange.await {
            debug!("enable exchange failed: {e}");
            return Err(enable_failed());
        }

        if !self.check_enable_mode().await.unwrap_or(false) {
            return Err(enable_failed());
        }
        self.mode = DeviceMode::Enable;
        Ok(())
    }

    /// Leave enable mode, returning to user mode.
    pub async fn exit_enable_mode(&mut self) -> Result<()> {
        if !self.check_enable_mode().await? {
            return Ok(());
        }
        let command = self.dialect.exit_enable_command.clone();
        self.channel_mut()?.write_line(&command).await?;
        self.find_prompt().await?;
        Ok(())
    }

    /// Enter config mode.
    ///
    /// The entry command may be echoed and accepted without the device
    /// actually changing state (insufficient privilege, for one), so the
    /// transition is verified against the prompt afterwards.
    pub async fn config_mode(&mut self) -> Result<()> {
        if self.check_config_mode().await? {
            return Ok(());
        }

        let command = self.dialect.config_command.clone();
        let terminator = self.dialect.config_terminator.clone();
        self.channel_mut()?.write_line(&command).await?;
        self.read_until_pattern(&terminator).await?;

        if !self.check_config_mode().await? {
            return Err(DriverError::ModeTransitionFailed {
                target: "config".to_string(),
                message: format!("prompt still outside config mode after '{command}'"),
            }
            .into());
        }
        self.mode = DeviceMode::Config;
        Ok(())
    }

    /// Leave config mode, returning to enable mode.
    pub async fn exit_config_mode(&mut self) -> Result<()> {
        if !self.check_config_mode().await? {
            return Ok(());
        }

        let command = self.dialect.exit_config_command.clone();
        let terminator = self.dialect.config_terminator.clone();
        self.channel_mut()?.write_line(&command).await?;
        self.read_until_pattern(&terminator).await?;

        if self.check_config_mode().await? {
            return Err(DriverError::ModeTransitionFailed {
                target: "enable".to_string(),
                message: format!("prompt still in config mode after '{command}'"),
            }
            .into());
        }
        self.mode = DeviceMode::Enable;
        Ok(())
    }

    /// Apply a batch of configuration commands.
    ///
    /// Enters config mode once, writes each command in sequence, and
    /// exits config mode. Output is collected time-based since config
    /// commands rarely end with a distinctive prompt mid-batch. Unless
    /// `fast_cli` is set, a small delay spaces consecutive commands.
    pub async fn send_config_set(&mut self, commands: &[&str]) -> Result<String> {
        if commands.is_empty() {
            return Err(DriverError::InvalidArgument {
                message: "config command set is empty".to_string(),
            }
            .into());
        }

        let poll_interval = self.config.timing.poll_interval();
        self.config_mode().await?;

        let mut output = String::new();
        for command in commands {
            output.push_str(&self.send_command_timing(command).await?);
            output.push('\n');
            if !self.fast_cli {
                tokio::time::sleep(poll_interval).await;
            }
        }

        self.exit_config_mode().await?;
        Ok(output)
    }

    /// Poll the channel until a pattern appears within the chunk window.
    pub(super) async fn read_until_pattern(&mut self, pattern: &regex::Regex) -> Result<String> {
        let poll_interval = self.config.timing.poll_interval();
        let max_loops = self.config.timing.max_loops;
        let start = std::time::Instant::now();

        let mut window = ChunkWindow::default();
        let mut output = String::new();
        for _ in 0..max_loops {
            if let Some(chunk) = self.channel_mut()?.read_available()? {
                output.push_str(&chunk);
                window.push(chunk);
                if window.is_match(pattern) {
                    return Ok(output);
                }
            }
            tokio::time::sleep(poll_interval).await;
        }

        Err(crate::error::ChannelError::PatternTimeout {
            loops: max_loops,
            elapsed: start.elapsed(),
        }
        .into())
    }
}

fn enable_failed() -> crate::error::Error {
    DriverError::EnableFailed {
        message: "device did not reach enable mode; verify that the 'secret' \
                  argument is set and correct"
            .to_string(),
    }
    .into()
}

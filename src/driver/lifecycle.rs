//! Session establishment and teardown.

use log::{debug, warn};

use super::connection::Connection;
use crate::channel::{Channel, ChunkWindow, SessionLog, SessionLogConfig};
use crate::dialect::Dialect;
use crate::error::{Result, TransportError};
use crate::transport::{ConnectConfig, TransportHandle};

/// Options applied on top of the raw connection parameters.
pub(super) struct SessionOptions {
    pub strip_ansi: bool,
    pub session_log: Option<SessionLogConfig>,
    pub fast_cli: bool,
    pub normalize_commands: bool,
    pub parser: Option<std::sync::Arc<dyn crate::parser::OutputParser>>,
}

impl Connection {
    /// Establish a session: connect the transport, run the login
    /// sequence, discover the prompt, and prepare the terminal.
    pub(super) async fn establish(
        config: ConnectConfig,
        dialect: Dialect,
        options: SessionOptions,
    ) -> Result<Self> {
        let transport = TransportHandle::connect(&config).await?;
        let session_log = match options.session_log {
            Some(ref log_config) => Some(SessionLog::open(log_config)?),
            None => None,
        };
        let channel = Channel::new(transport, options.strip_ansi, session_log);

        let mut session = Self {
            channel: Some(channel),
            dialect,
            config,
            mode: crate::dialect::DeviceMode::User,
            base_prompt: String::new(),
            parser: options.parser,
            fast_cli: options.fast_cli,
            normalize_commands: options.normalize_commands,
        };

        if session.config.kind.inline_login() {
            session.inline_login().await?;
        }

        if let Some(handler) = session.dialect.login_handler.clone() {
            handler.on_login(&mut session).await?;
        }

        session.prepare_session().await?;
        Ok(session)
    }

    /// Username/password handshake on the byte stream itself.
    ///
    /// Telnet and serial consoles authenticate in-band: the device sends
    /// its login banner and prompts on the same channel the CLI will use.
    /// Answer the dialect's username and password prompts until the CLI
    /// prompt appears.
    async fn inline_login(&mut self) -> Result<()> {
        let username = self.config.username.clone();
        let password = match self.config.auth {
            crate::transport::AuthMethod::Password(ref password) => password.clone(),
            _ => String::new(),
        };
        let username_prompt = self.dialect.username_prompt.clone();
        let password_prompt = self.dialect.password_prompt.clone();
        let prompt_pattern = self.dialect.prompt_pattern.clone();

        let poll_interval = self.config.timing.poll_interval();
        let max_loops = self.config.timing.max_loops;

        let mut window = ChunkWindow::default();
        let mut sent_username = false;
        let mut sent_password = false;

        for _ in 0..max_loops {
            if let Some(chunk) = self.channel_mut()?.read_available()? {
                window.push(chunk);
                let tail = window.tail();

                if prompt_pattern.is_match(&tail) {
                    debug!("inline login complete");
                    return Ok(());
                }
                if !sent_username && username_prompt.is_match(&tail) {
                    self.channel_mut()?.write_line(&username).await?;
                    sent_username = true;
                    window.clear();
                } else if !sent_password && password_prompt.is_match(&tail) {
                    self.channel_mut()?.write_line(&password).await?;
                    sent_password = true;
                    window.clear();
                }
            }
            tokio::time::sleep(poll_interval).await;
        }

        Err(TransportError::AuthFailed {
            user: username,
            target: self.config.target(),
        }
        .into())
    }

    /// Prepare the terminal after login: discover the prompt and switch
    /// off output paging.
    async fn prepare_session(&mut self) -> Result<()> {
        self.find_prompt().await?;
        if let Some(command) = self.dialect.paging_disable_command.clone() {
            let output = self.send_command_timing(&command).await?;
            debug!("paging disable {command:?} answered {} chars", output.len());
        }
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Best-effort by design: the dialect's closing commands and hook
    /// run first, then the channel closes. Errors at any step are logged
    /// and swallowed since teardown races with the device dropping the
    /// line; the channel reference is cleared unconditionally. Safe to
    /// call repeatedly.
    pub async fn disconnect(&mut self) {
        if self.channel.is_none() {
            return;
        }

        if let Some(handler) = self.dialect.login_handler.clone() {
            if let Err(e) = handler.on_disconnect(self).await {
                debug!("on_disconnect hook failed: {e}");
            }
        }

        for command in self.dialect.on_close_commands.clone() {
            match self.channel_mut() {
                Ok(channel) => {
                    if let Err(e) = channel.write_line(&command).await {
                        debug!("close command {command:?} failed: {e}");
                        break;
                    }
                }
                Err(_) => break,
            }
        }

        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        self.base_prompt.clear();
        debug!("session to {} closed", self.config.target());
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.channel.is_some() {
            warn!(
                "session to {} dropped without disconnect()",
                self.config.target()
            );
        }
    }
}

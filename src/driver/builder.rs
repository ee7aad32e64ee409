//! Builder for establishing sessions.

use std::path::PathBuf;
use std::sync::Arc;

use super::connection::Connection;
use super::lifecycle::SessionOptions;
use crate::channel::SessionLogConfig;
use crate::dialect::{Dialect, DialectRegistry};
use crate::error::Result;
use crate::parser::OutputParser;
use crate::timing::TimingProfile;
use crate::transport::{
    AuthMethod, ConnectConfig, HostKeyVerification, SerialSettings, TransportKind,
};

/// Builder for establishing a device session.
///
/// Connect-on-construct: `connect()` returns a session that is already
/// logged in, prompt-discovered, and prepared.
///
/// # Example
///
/// ```rust,no_run
/// use scrapline::ConnectionBuilder;
///
/// # async fn example() -> Result<(), scrapline::Error> {
/// let mut session = ConnectionBuilder::new("192.0.2.1")
///     .username("admin")
///     .password("secret")
///     .dialect("ericsson_ipos")
///     .connect()
///     .await?;
/// let response = session.send_command("show version").await?;
/// println!("{response}");
/// session.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionBuilder {
    kind: TransportKind,
    host: String,
    port: Option<u16>,
    username: String,
    auth: AuthMethod,
    secret: Option<String>,
    dialect_name: Option<String>,
    custom_dialect: Option<Dialect>,
    timing: TimingProfile,
    serial: Option<SerialSettings>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    strip_ansi: bool,
    session_log: Option<SessionLogConfig>,
    fast_cli: bool,
    normalize_commands: bool,
    parser: Option<Arc<dyn OutputParser>>,
}

impl ConnectionBuilder {
    /// Create a builder for an SSH session to the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::Ssh,
            host: host.into(),
            port: None,
            username: String::new(),
            auth: AuthMethod::None,
            secret: None,
            dialect_name: None,
            custom_dialect: None,
            timing: TimingProfile::default(),
            serial: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            strip_ansi: true,
            session_log: None,
            fast_cli: false,
            normalize_commands: true,
            parser: None,
        }
    }

    /// Create a builder for a serial console session.
    pub fn serial(settings: SerialSettings) -> Self {
        let mut builder = Self::new("");
        builder.kind = TransportKind::Serial;
        builder.serial = Some(settings);
        builder
    }

    /// Use Telnet instead of SSH.
    pub fn telnet(mut self) -> Self {
        self.kind = TransportKind::Telnet;
        self
    }

    /// Set the port (defaults: SSH 22, Telnet 23).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Use password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(password.into());
        self
    }

    /// Use private key authentication (SSH only).
    pub fn private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: path.into(),
            passphrase: None,
        };
        self
    }

    /// Use private key authentication with a passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: path.into(),
            passphrase: Some(passphrase.into()),
        };
        self
    }

    /// Set the enable-mode secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Select a registered dialect by name.
    pub fn dialect(mut self, name: impl Into<String>) -> Self {
        self.dialect_name = Some(name.into());
        self
    }

    /// Use a custom dialect definition.
    pub fn custom_dialect(mut self, dialect: Dialect) -> Self {
        self.custom_dialect = Some(dialect);
        self
    }

    /// Set the timing profile.
    pub fn timing(mut self, timing: TimingProfile) -> Self {
        self.timing = timing;
        self
    }

    /// Set the host key verification mode (SSH only).
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Set a non-default known_hosts path (SSH only).
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Control ANSI escape stripping (default: on).
    pub fn strip_ansi(mut self, strip_ansi: bool) -> Self {
        self.strip_ansi = strip_ansi;
        self
    }

    /// Record a session transcript.
    pub fn session_log(mut self, config: SessionLogConfig) -> Self {
        self.session_log = Some(config);
        self
    }

    /// Skip inter-command delays in batch operations.
    pub fn fast_cli(mut self, fast_cli: bool) -> Self {
        self.fast_cli = fast_cli;
        self
    }

    /// Control command normalization (default: append the line
    /// terminator to every command before sending).
    pub fn normalize_commands(mut self, normalize: bool) -> Self {
        self.normalize_commands = normalize;
        self
    }

    /// Attach a structured-output parser.
    pub fn parser(mut self, parser: Arc<dyn OutputParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Establish the session.
    pub async fn connect(self) -> Result<Connection> {
        let dialect = match self.custom_dialect {
            Some(dialect) => dialect,
            None => DialectRegistry::lookup(self.dialect_name.as_deref().unwrap_or("generic"))?,
        };

        let port = self.port.unwrap_or(match self.kind {
            TransportKind::Telnet => 23,
            _ => 22,
        });

        let config = ConnectConfig {
            kind: self.kind,
            host: self.host,
            port,
            username: self.username,
            auth: self.auth,
            secret: self.secret,
            timing: self.timing,
            terminal_width: dialect.terminal_width,
            terminal_height: dialect.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
            serial: self.serial,
        };

        let options = SessionOptions {
            strip_ansi: self.strip_ansi,
            session_log: self.session_log,
            fast_cli: self.fast_cli,
            normalize_commands: self.normalize_commands,
            parser: self.parser,
        };

        Connection::establish(config, dialect, options).await
    }
}

//! Connection configuration.
//!
//! All connection parameters live in explicit immutable value objects
//! constructed per session; there are no shared mutable defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio_serial::{DataBits, FlowControl, Parity, StopBits};

use crate::timing::TimingProfile;

/// Which raw byte channel carries the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// SSH shell channel over a PTY.
    Ssh,
    /// Plain TCP socket with an inline login handshake.
    Telnet,
    /// Local serial port with an inline login handshake.
    Serial,
    /// In-process byte channel for tests and offline simulation.
    Loopback,
}

impl TransportKind {
    /// Whether login happens inline on the byte stream (as opposed to the
    /// transport protocol authenticating before the shell opens).
    pub fn inline_login(self) -> bool {
        matches!(self, TransportKind::Telnet | TransportKind::Serial)
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransportKind::Ssh => "ssh",
            TransportKind::Telnet => "telnet",
            TransportKind::Serial => "serial",
            TransportKind::Loopback => "loopback",
        };
        f.write_str(name)
    }
}

/// Host key verification mode, analogous to OpenSSH's
/// `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    /// This is the default and matches common SSH client behavior.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

/// Authentication material for the session.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// No authentication (loopback and pre-authenticated consoles).
    None,

    /// Password authentication.
    Password(String),

    /// Private key authentication (SSH only).
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<String>,
    },
}

/// Serial line settings.
#[derive(Debug, Clone)]
pub struct SerialSettings {
    /// Port path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,

    /// Baud rate.
    pub baud_rate: u32,

    /// Data bits per character.
    pub data_bits: DataBits,

    /// Parity checking mode.
    pub parity: Parity,

    /// Stop bits.
    pub stop_bits: StopBits,

    /// Flow control mode.
    pub flow_control: FlowControl,
}

impl SerialSettings {
    /// Conventional console settings (9600 8N1, no flow control).
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Full connection configuration for one session.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Transport protocol.
    pub kind: TransportKind,

    /// Target host (hostname or IP address). Unused for serial.
    pub host: String,

    /// Target port (SSH default 22, Telnet default 23).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication material.
    pub auth: AuthMethod,

    /// Enable-mode secret, when the device gates privileged mode.
    pub secret: Option<String>,

    /// Polling and timeout knobs.
    pub timing: TimingProfile,

    /// Terminal width for the PTY. Some vendors page output based on the
    /// negotiated terminal size.
    pub terminal_width: u32,

    /// Terminal height for the PTY.
    pub terminal_height: u32,

    /// Host key verification mode (SSH only).
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file (SSH only).
    pub known_hosts_path: Option<PathBuf>,

    /// Serial line settings (serial only).
    pub serial: Option<SerialSettings>,
}

impl ConnectConfig {
    /// Human-readable connection target for error context.
    pub fn target(&self) -> String {
        match self.kind {
            TransportKind::Serial => self
                .serial
                .as_ref()
                .map(|s| s.port.clone())
                .unwrap_or_else(|| "<serial>".to_string()),
            _ => format!("{}:{}", self.host, self.port),
        }
    }
}

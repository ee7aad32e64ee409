//! Error types for scrapline.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for scrapline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (connect, authenticate, raw I/O)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors (pattern matching, session log)
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors (command execution, mode transitions)
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Dialect definition/registry errors
    #[error("Dialect error: {0}")]
    Dialect(#[from] DialectError),
}

/// Transport layer errors (connection establishment, authentication, raw I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection attempt did not complete within the configured timeout
    #[error("Connection to {target} timed out after {timeout:?}")]
    ConnectTimeout { target: String, timeout: Duration },

    /// The remote side rejected the supplied credentials
    #[error("Authentication failed for user '{user}' at {target}")]
    AuthFailed { user: String, target: String },

    /// The byte channel went away mid-session
    #[error("Connection lost")]
    ConnectionLost,

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key was rejected by the verification policy
    #[error("Host key for {host}:{port} changed (known_hosts line {line}) - possible MITM")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not present in known_hosts under strict verification
    #[error("Unknown host key for {host}:{port} under strict verification")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts file could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Serial port error
    #[error("Serial error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt discovery, pattern matching, transcript log).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The completion pattern never appeared within the poll budget.
    ///
    /// Fatal for the command that was in flight, but the session itself
    /// stays usable - a later command may still succeed.
    #[error("Pattern not detected within {loops} polls ({elapsed:?})")]
    PatternTimeout { loops: u32, elapsed: Duration },

    /// The device produced no output during prompt discovery.
    ///
    /// Recoverable: `send_command` falls back to the cached base prompt.
    #[error("Unable to discover prompt from device output")]
    PromptNotFound,

    /// Invalid regex pattern supplied by the caller
    #[error("Invalid expect pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Session log file error
    #[error("Session log error: {0}")]
    SessionLog(io::Error),
}

/// Driver layer errors (command execution, mode control).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Session not connected
    #[error("Session not connected - connection already torn down")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// Enable-mode entry did not succeed
    #[error("Failed to enter enable mode: {message}")]
    EnableFailed { message: String },

    /// A config-mode enter/exit was accepted by the device but the prompt
    /// check afterwards still reports the old mode
    #[error("Mode transition to '{target}' failed: {message}")]
    ModeTransitionFailed { target: String, message: String },

    /// Malformed argument (e.g. an empty config command set)
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The structured-output parser collaborator rejected the output
    #[error("Output parsing failed: {message}")]
    ParseFailed { message: String },
}

/// Dialect definition and registry errors.
#[derive(Error, Debug)]
pub enum DialectError {
    /// Requested dialect is not registered
    #[error("Unknown dialect '{name}'")]
    UnknownDialect { name: String },

    /// Invalid dialect definition
    #[error("Invalid dialect definition: {message}")]
    InvalidDefinition { message: String },

    /// Dialect name collision in the registry
    #[error("Dialect '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Result type alias using scrapline's Error.
pub type Result<T> = std::result::Result<T, Error>;

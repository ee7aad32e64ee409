//! The session type and its raw channel surface.

use std::sync::Arc;

use crate::channel::Channel;
use crate::dialect::{DeviceMode, Dialect};
use crate::error::{DriverError, Result};
use crate::parser::OutputParser;
use crate::transport::{ConnectConfig, TransportHandle};

/// An interactive session with one device.
///
/// One logical session per transport; operations take `&mut self` and
/// therefore serialize naturally. Built through [`ConnectionBuilder`]
/// (connect-on-construct) or attached to an already-established
/// transport with [`Connection::attach`].
///
/// [`ConnectionBuilder`]: super::ConnectionBuilder
pub struct Connection {
    /// Text channel (None once disconnected).
    pub(super) channel: Option<Channel>,

    /// The vendor capability set driving this session.
    pub(super) dialect: Dialect,

    /// Connection parameters, kept for credentials and timing.
    pub(super) config: ConnectConfig,

    /// Current operational mode.
    pub(super) mode: DeviceMode,

    /// Cached prompt from the last discovery; `send_command` falls back
    /// to this when automatic prompt detection comes up empty.
    pub(super) base_prompt: String,

    /// Optional structured-output parser.
    pub(super) parser: Option<Arc<dyn OutputParser>>,

    /// Skip inter-command delays in batch operations.
    pub(super) fast_cli: bool,

    /// Append the line terminator to commands before sending (default).
    /// Off, commands are written byte-for-byte as supplied.
    pub(super) normalize_commands: bool,
}

impl Connection {
    /// Wrap an already-established transport without running the login
    /// and session-preparation sequence.
    ///
    /// Useful for loopback simulation and for consoles that are already
    /// sitting at a CLI prompt.
    pub fn attach(
        transport: TransportHandle,
        dialect: Dialect,
        config: ConnectConfig,
    ) -> Self {
        let channel = Channel::new(transport, true, None);
        Self {
            channel: Some(channel),
            dialect,
            config,
            mode: DeviceMode::User,
            base_prompt: String::new(),
            parser: None,
            fast_cli: false,
            normalize_commands: true,
        }
    }

    /// The dialect this session speaks.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Current operational mode.
    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// The cached base prompt, empty before the first discovery.
    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    /// Whether the session still holds a channel.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Whether the underlying transport is still live.
    pub fn is_alive(&self) -> bool {
        self.channel.as_ref().is_some_and(Channel::is_open)
    }

    /// Set the structured-output parser.
    pub fn set_parser(&mut self, parser: Arc<dyn OutputParser>) {
        self.parser = Some(parser);
    }

    /// Control command normalization.
    ///
    /// On (the default), every command gets the line terminator appended
    /// before it is written. Off, commands go out exactly as supplied;
    /// useful for devices that need bare control sequences.
    pub fn set_normalize_commands(&mut self, normalize: bool) {
        self.normalize_commands = normalize;
    }

    pub(super) fn channel_mut(&mut self) -> Result<&mut Channel> {
        self.channel
            .as_mut()
            .ok_or_else(|| DriverError::NotConnected.into())
    }

    /// Write raw text to the device, without a line terminator.
    ///
    /// Advanced use; normal interaction goes through `send_command`.
    pub async fn write_channel(&mut self, data: &str) -> Result<()> {
        self.channel_mut()?.write(data).await
    }

    /// Drain whatever the device has emitted so far.
    ///
    /// Returns an empty string when nothing is pending.
    pub fn read_channel(&mut self) -> Result<String> {
        Ok(self.channel_mut()?.read_available()?.unwrap_or_default())
    }
}

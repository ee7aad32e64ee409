//! The text channel.

use log::trace;

use super::session_log::SessionLog;
use super::text;
use crate::error::Result;
use crate::transport::{TransportHandle, TransportKind};

/// Text-oriented channel over an established transport.
///
/// Reads arrive as cleaned chunks: decoded lossily, optionally stripped
/// of ANSI escape sequences, with linefeed variants collapsed to `\n`.
/// Raw bytes are recorded to the session transcript before cleaning.
pub struct Channel {
    transport: TransportHandle,
    session_log: Option<SessionLog>,
    strip_ansi: bool,
    enter: String,
}

impl Channel {
    pub fn new(transport: TransportHandle, strip_ansi: bool, session_log: Option<SessionLog>) -> Self {
        Self {
            transport,
            session_log,
            strip_ansi,
            enter: "\n".to_string(),
        }
    }

    /// Transport protocol underneath this channel.
    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Whether the underlying transport is still live.
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// The line terminator written after commands.
    pub fn enter(&self) -> &str {
        &self.enter
    }

    /// Write raw text to the device.
    pub async fn write(&mut self, data: &str) -> Result<()> {
        trace!("write: {data:?}");
        if let Some(ref mut log) = self.session_log {
            log.record_write(data.as_bytes())?;
        }
        self.transport.send(data.as_bytes()).await
    }

    /// Write a command followed by the line terminator.
    pub async fn write_line(&mut self, command: &str) -> Result<()> {
        let line = format!("{}{}", command, self.enter);
        self.write(&line).await
    }

    /// Drain everything the device has emitted so far, cleaned.
    ///
    /// Returns `Ok(None)` when no input is pending. Multiple transport
    /// chunks available at once are concatenated into a single read.
    pub fn read_available(&mut self) -> Result<Option<String>> {
        let mut raw: Vec<u8> = Vec::new();
        while let Some(chunk) = self.transport.try_recv()? {
            raw.extend_from_slice(&chunk);
        }
        if raw.is_empty() {
            return Ok(None);
        }

        if let Some(ref mut log) = self.session_log {
            log.record_read(&raw)?;
        }

        let bytes = if self.strip_ansi {
            text::strip_ansi(&raw)
        } else {
            raw
        };
        let cleaned = text::normalize_linefeeds(&String::from_utf8_lossy(&bytes));
        trace!("read: {cleaned:?}");
        Ok(Some(cleaned))
    }

    /// Discard any input buffered ahead of the next command.
    ///
    /// Stale output left over from a previous exchange would otherwise be
    /// attributed to the next command. The discarded bytes still land in
    /// the session transcript.
    pub fn clear_buffer(&mut self) -> Result<()> {
        while let Some(discarded) = self.read_available()? {
            trace!("clear_buffer discarded {} chars", discarded.len());
        }
        Ok(())
    }

    /// Close the channel and flush the transcript. Idempotent.
    pub fn close(&mut self) {
        self.transport.close();
        if let Some(ref mut log) = self.session_log {
            log.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_are_cleaned_and_concatenated() {
        let (transport, mut peer) = TransportHandle::loopback();
        let mut channel = Channel::new(transport, true, None);

        peer.tx.send(b"\x1b[1mRouter".to_vec()).await.unwrap();
        peer.tx.send(b"#\r\n".to_vec()).await.unwrap();

        let chunk = channel.read_available().unwrap().unwrap();
        assert_eq!(chunk, "Router#\n");
        assert!(channel.read_available().unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_buffer_discards_stale_output() {
        let (transport, mut peer) = TransportHandle::loopback();
        let mut channel = Channel::new(transport, false, None);

        peer.tx.send(b"stale output\r\nRouter#".to_vec()).await.unwrap();
        channel.clear_buffer().unwrap();
        assert!(channel.read_available().unwrap().is_none());

        channel.write_line("show clock").await.unwrap();
        assert_eq!(peer.drain_written(), "show clock\n");
    }
}

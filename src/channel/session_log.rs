//! Session transcript log.
//!
//! When configured, every byte read from the channel (and optionally every
//! byte written to it) is appended verbatim to a transcript file for
//! diagnostics. The log is a raw byte-for-byte record, not a structured
//! format.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{ChannelError, Result};

/// File open mode for the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionLogMode {
    /// Truncate any existing transcript.
    #[default]
    Write,
    /// Append to an existing transcript.
    Append,
}

/// Configuration for a session transcript.
#[derive(Debug, Clone)]
pub struct SessionLogConfig {
    /// Transcript file path.
    pub path: PathBuf,

    /// Open mode.
    pub mode: SessionLogMode,

    /// Record channel writes in addition to reads.
    pub record_writes: bool,
}

impl SessionLogConfig {
    /// Transcript at `path` with default mode (truncate, reads only).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: SessionLogMode::default(),
            record_writes: false,
        }
    }

    /// Set the open mode.
    pub fn with_mode(mut self, mode: SessionLogMode) -> Self {
        self.mode = mode;
        self
    }

    /// Also record channel writes.
    pub fn with_record_writes(mut self, record_writes: bool) -> Self {
        self.record_writes = record_writes;
        self
    }
}

/// An open session transcript.
#[derive(Debug)]
pub struct SessionLog {
    file: File,
    path: PathBuf,
    record_writes: bool,
}

impl SessionLog {
    /// Open the transcript file per the configuration.
    pub fn open(config: &SessionLogConfig) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true);
        match config.mode {
            SessionLogMode::Write => options.write(true).truncate(true),
            SessionLogMode::Append => options.append(true),
        };

        let file = options
            .open(&config.path)
            .map_err(ChannelError::SessionLog)?;

        Ok(Self {
            file,
            path: config.path.clone(),
            record_writes: config.record_writes,
        })
    }

    /// Transcript file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record bytes read from the channel.
    pub fn record_read(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data).map_err(ChannelError::SessionLog)?;
        Ok(())
    }

    /// Record bytes written to the channel, when write recording is on.
    pub fn record_write(&mut self, data: &[u8]) -> Result<()> {
        if !self.record_writes {
            return Ok(());
        }
        self.file.write_all(data).map_err(ChannelError::SessionLog)?;
        Ok(())
    }

    /// Flush the transcript. Errors are reported but teardown paths
    /// swallow them.
    pub fn close(&mut self) {
        if let Err(e) = self.file.flush() {
            debug!("session log flush failed for {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_reads_and_optionally_writes() {
        let dir = std::env::temp_dir().join("scrapline-log-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("transcript.log");

        let config = SessionLogConfig::new(&path).with_record_writes(false);
        let mut log = SessionLog::open(&config).unwrap();
        log.record_read(b"from-device").unwrap();
        log.record_write(b"to-device").unwrap();
        log.close();

        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"from-device");

        let config = SessionLogConfig::new(&path)
            .with_mode(SessionLogMode::Append)
            .with_record_writes(true);
        let mut log = SessionLog::open(&config).unwrap();
        log.record_write(b"to-device").unwrap();
        log.close();

        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"from-deviceto-device");
        std::fs::remove_file(&path).ok();
    }
}

//! Command execution: prompt discovery and the pattern-matched read loop.

use std::time::Instant;

use log::{debug, trace};
use regex::Regex;

use super::connection::Connection;
use super::response::Response;
use crate::channel::{ChunkWindow, text};
use crate::error::{ChannelError, DriverError, Error, Result};

/// Silent read retries allowed during prompt discovery.
const PROMPT_ATTEMPTS: u32 = 10;

/// Quiet polls that end a time-based collection.
const IDLE_POLLS: u32 = 3;

impl Connection {
    /// Discover the current prompt by sending a bare line terminator.
    ///
    /// The device answers a blank line by re-printing its prompt; the
    /// last line of whatever arrives is taken as the prompt. Updates the
    /// cached base prompt and re-classifies the operational mode.
    ///
    /// Blank reads (repaints, echoed newlines) do not consume the retry
    /// budget; each one re-sends the line terminator and polling
    /// continues. Only consecutive silent reads count, and one final
    /// read follows the last retry. Fails with `PromptNotFound` when the
    /// budget is exhausted without any non-blank output.
    pub async fn find_prompt(&mut self) -> Result<String> {
        let poll_interval = self.config.timing.poll_interval();
        let max_polls = self.config.timing.max_loops.max(PROMPT_ATTEMPTS + 1);
        let channel = self.channel_mut()?;
        channel.clear_buffer()?;
        let enter = channel.enter().to_string();
        channel.write(&enter).await?;

        let mut output = String::new();
        let mut silent = 0u32;
        for _ in 0..max_polls {
            tokio::time::sleep(poll_interval).await;
            match self.channel_mut()?.read_available()? {
                Some(chunk) if !chunk.trim().is_empty() => {
                    output = chunk;
                    break;
                }
                Some(_) => {
                    trace!("find_prompt: blank read, nudging again");
                    silent = 0;
                    self.channel_mut()?.write(&enter).await?;
                }
                None => {
                    silent += 1;
                    if silent > PROMPT_ATTEMPTS {
                        break;
                    }
                }
            }
        }

        let prompt = output
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim_end()
            .to_string();

        if prompt.is_empty() {
            return Err(ChannelError::PromptNotFound.into());
        }

        self.base_prompt = prompt.clone();
        if let Some(mode) = self.dialect.classify_mode(&prompt) {
            self.mode = mode;
        }
        debug!("discovered prompt {prompt:?}, mode {}", self.mode);
        Ok(prompt)
    }

    /// Send a command and wait for the prompt to return.
    ///
    /// The completion pattern is the current prompt, captured via
    /// [`find_prompt`](Self::find_prompt) and regex-escaped. When
    /// discovery fails but an earlier prompt is cached, the cached value
    /// is used instead; only a session that never saw a prompt fails
    /// here with `PromptNotFound`.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let prompt = match self.find_prompt().await {
            Ok(prompt) => prompt,
            Err(Error::Channel(ChannelError::PromptNotFound))
                if !self.base_prompt.is_empty() =>
            {
                debug!("prompt discovery failed, falling back to cached prompt");
                self.base_prompt.clone()
            }
            Err(e) => return Err(e),
        };
        let pattern = Regex::new(&regex::escape(&prompt)).map_err(ChannelError::InvalidPattern)?;
        self.run_command(command, &pattern).await
    }

    /// Send a command and wait for a caller-supplied completion pattern.
    ///
    /// The pattern is used verbatim; no prompt discovery happens.
    pub async fn send_command_expect(&mut self, command: &str, expect: &str) -> Result<Response> {
        let pattern = Regex::new(expect).map_err(ChannelError::InvalidPattern)?;
        self.run_command(command, &pattern).await
    }

    /// Send several commands in sequence, collecting all responses.
    pub async fn send_commands(&mut self, commands: &[&str]) -> Result<Vec<Response>> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.send_command(command).await?);
        }
        Ok(responses)
    }

    /// Send a command and run the configured parser over the output.
    pub async fn send_command_parsed(&mut self, command: &str) -> Result<serde_json::Value> {
        let parser = self
            .parser
            .clone()
            .ok_or_else(|| DriverError::ParseFailed {
                message: "no output parser configured for this session".to_string(),
            })?;
        let response = self.send_command(command).await?;
        parser.parse(&self.dialect.name, command, &response.result)
    }

    /// Send a command and collect output by time rather than pattern.
    ///
    /// Reads until the channel stays quiet for a few polls. Used where no
    /// distinctive completion prompt is expected, such as mid-batch
    /// config commands.
    pub async fn send_command_timing(&mut self, command: &str) -> Result<String> {
        let poll_interval = self.config.timing.poll_interval();
        let max_loops = self.config.timing.max_loops;

        let normalize = self.normalize_commands;
        let channel = self.channel_mut()?;
        channel.clear_buffer()?;
        if normalize {
            channel.write_line(command).await?;
        } else {
            channel.write(command).await?;
        }

        let mut output = String::new();
        let mut idle = 0u32;
        for _ in 0..max_loops {
            tokio::time::sleep(poll_interval).await;
            match self.channel_mut()?.read_available()? {
                Some(chunk) => {
                    output.push_str(&chunk);
                    idle = 0;
                }
                None => {
                    if !output.is_empty() {
                        idle += 1;
                        if idle >= IDLE_POLLS {
                            break;
                        }
                    }
                }
            }
        }

        Ok(text::strip_command(command, &output))
    }

    /// The bounded poll loop at the heart of command execution.
    async fn run_command(&mut self, command: &str, pattern: &Regex) -> Result<Response> {
        let poll_interval = self.config.timing.poll_interval();
        let max_loops = self.config.timing.max_loops;
        let start = Instant::now();

        let normalize = self.normalize_commands;
        let channel = self.channel_mut()?;
        channel.clear_buffer()?;
        if normalize {
            channel.write_line(command).await?;
        } else {
            channel.write(command).await?;
        }

        let mut window = ChunkWindow::default();
        let mut raw_output = String::new();
        let mut first_chunk = true;
        let mut matched = false;

        for _ in 0..max_loops {
            if let Some(chunk) = self.channel_mut()?.read_available()? {
                // The first chunk may be a partial repaint of the echoed
                // command; settle it once so echo corruption cannot break
                // the pattern match.
                let chunk = if first_chunk {
                    first_chunk = false;
                    text::settle_first_line(&chunk, command)
                } else {
                    chunk
                };
                raw_output.push_str(&chunk);
                window.push(chunk);
                if window.is_match(pattern) {
                    matched = true;
                    break;
                }
            }
            tokio::time::sleep(poll_interval).await;
        }

        if !matched {
            debug!("pattern {:?} not seen for command {command:?}", pattern.as_str());
            return Err(ChannelError::PatternTimeout {
                loops: max_loops,
                elapsed: start.elapsed(),
            }
            .into());
        }
        let elapsed = start.elapsed();

        let stripped = text::strip_command(command, &raw_output);
        let result = text::strip_prompt(&self.base_prompt, &stripped);
        let prompt = self.base_prompt.clone();

        Ok(Response::evaluate(
            command,
            result,
            raw_output,
            prompt,
            elapsed,
            &self.dialect,
        ))
    }
}

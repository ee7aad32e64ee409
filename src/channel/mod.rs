//! Text channel over a raw transport.
//!
//! This layer turns the transport's byte chunks into cleaned text
//! (ANSI stripping, linefeed normalization), maintains the sliding
//! window used for completion-pattern matching, and records the
//! session transcript.

mod io;
mod session_log;
pub(crate) mod text;
mod window;

pub use io::Channel;
pub use session_log::{SessionLog, SessionLogConfig, SessionLogMode};
pub use window::{ChunkWindow, WINDOW_CHUNKS};

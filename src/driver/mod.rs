//! High-level session driver.
//!
//! The driver layer provides the main API for interacting with a device:
//! connect-on-construct sessions, command execution with prompt
//! detection, and operational-mode control.

mod builder;
mod connection;
mod executor;
mod lifecycle;
mod modes;
mod response;

pub use builder::ConnectionBuilder;
pub use connection::Connection;
pub use response::Response;

//! # Scrapline
//!
//! Async multi-transport CLI scraper engine for network device automation.
//!
//! Scrapline drives interactive terminal sessions over SSH, Telnet, or a
//! serial console: it discovers prompts, sends commands, polls for
//! completion patterns, sanitizes output, and walks devices between
//! operational modes. Vendor specifics (prompt shapes, mode commands,
//! login quirks) live in pluggable [`Dialect`] capability sets; the
//! engine itself is vendor-agnostic.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scrapline::ConnectionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), scrapline::Error> {
//!     let mut session = ConnectionBuilder::new("192.0.2.1")
//!         .username("admin")
//!         .password("secret")
//!         .secret("enable-secret")
//!         .dialect("ericsson_ipos")
//!         .connect()
//!         .await?;
//!
//!     session.enable().await?;
//!     let response = session.send_command("show version").await?;
//!     println!("{}", response.result);
//!
//!     session.send_config_set(&["interface eth0", "no shutdown"]).await?;
//!     session.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod parser;
pub mod timing;
pub mod transport;

// Re-export main types for convenience
pub use channel::{SessionLogConfig, SessionLogMode};
pub use dialect::{DeviceMode, Dialect, DialectRegistry, LoginHandler};
pub use driver::{Connection, ConnectionBuilder, Response};
pub use error::Error;
pub use parser::OutputParser;
pub use timing::TimingProfile;
pub use transport::{AuthMethod, HostKeyVerification, SerialSettings, TransportHandle};

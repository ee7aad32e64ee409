//! CLI dialect definitions for multi-vendor support.
//!
//! A dialect is the capability set that makes the engine speak one
//! vendor's CLI: prompt and mode patterns, mode-transition commands,
//! login prompts, paging control, and failure markers. The engine itself
//! stays vendor-agnostic; everything vendor-shaped is injected at
//! session construction through one of these.

mod definition;
mod registry;
pub mod vendors;

pub use definition::Dialect;
pub use registry::DialectRegistry;

use async_trait::async_trait;

use crate::driver::Connection;
use crate::error::Result;

/// Operational CLI mode of a session.
///
/// One active value per session; transitions happen only through explicit
/// mode-controller calls, never implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceMode {
    /// Unprivileged mode, typically a `>` prompt.
    User,
    /// Privileged mode, typically a `#` prompt.
    Enable,
    /// Configuration mode, typically a `(config)#` prompt.
    Config,
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceMode::User => "user",
            DeviceMode::Enable => "enable",
            DeviceMode::Config => "config",
        };
        f.write_str(name)
    }
}

/// Hook for dialects whose devices need extra steps around login.
///
/// Some consoles present banners, secondary prompts, or menu screens
/// that must be navigated before the CLI prompt appears.
#[async_trait]
pub trait LoginHandler: Send + Sync {
    /// Called after the transport is up, before prompt discovery.
    async fn on_login(&self, session: &mut Connection) -> Result<()>;

    /// Called at the start of disconnect, while the channel is still open.
    async fn on_disconnect(&self, _session: &mut Connection) -> Result<()> {
        Ok(())
    }
}

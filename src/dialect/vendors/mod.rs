//! Built-in dialect definitions.

pub mod ericsson_ipos;
pub mod generic;

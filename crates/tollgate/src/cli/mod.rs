//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the tollgate binary.

mod commands;
mod limits;
mod request;

pub use commands::{Cli, Commands};
pub use limits::show_limits;
pub use request::run_request;

//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.

mod generate;

pub use generate::{GenerateArgs, resolve_config, run_generate};

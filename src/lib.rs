//! Fleetkit - application scaffolding and device automation toolkit
//!
//! This library provides the layered configuration document, the template
//! renderer, the `${}` expression evaluator and the sequence executor behind
//! the `fleetkit` command.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic
//! - [`infra`] - Infrastructure layer (directories, filesystem, device transports)
//! - [`config`] - Configuration constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;

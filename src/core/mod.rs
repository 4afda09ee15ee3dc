//! Core business logic module
//!
//! Configuration model, template rendering and sequence execution. File
//! access goes through [`crate::infra::filesystem`]; device access goes
//! through the [`sequence::Transport`] capability handed in by the caller.
//!
//! # Submodules
//!
//! - [`node`] - Path addressing over records, dictionaries and lists
//! - [`document`] - The configuration document and its records
//! - [`delta`] - Differences between configuration layers
//! - [`layers`] - System, user and project layer cascade
//! - [`expression`] - `${path}` interpolation
//! - [`template`] - Scaffolding templates and the template language
//! - [`sequence`] - Named command sequences with retry and delay
//! - [`app`] - Application settings validation

pub mod app;
pub mod delta;
pub mod document;
pub mod expression;
pub mod layers;
pub mod node;
pub mod sequence;
pub mod template;

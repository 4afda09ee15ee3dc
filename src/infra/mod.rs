//! Infrastructure layer
//!
//! Handles I/O: directories, files and device connections.

pub mod dirs;
pub mod filesystem;
pub mod transport;

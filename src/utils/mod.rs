//! Utility functions and helpers
//!
//! This module contains atomic file writes used by the file-backed stores.

pub mod atomic;

pub use atomic::{atomic_write, cleanup_temp_files};

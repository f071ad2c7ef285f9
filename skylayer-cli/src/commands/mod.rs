//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`cache`] - Disk cache management (clear, stats)
//! - [`config`] - Configuration management (init, list, path)
//! - [`fetch`] - Single tile download
//! - [`pixel`] - Spatial index queries (index, corners, neighbours)
//! - [`render`] - Gnomonic view rendering
//! - [`sources`] - Survey catalog listing

pub mod cache;
pub mod config;
pub mod fetch;
pub mod pixel;
pub mod render;
pub mod sources;

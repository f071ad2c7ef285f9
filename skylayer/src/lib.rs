//! SkyLayer - HEALPix sky survey tiles, cached and drawn on demand
//!
//! The library streams hierarchical (HiPS) survey tiles from remote servers
//! and draws them into an RGBA raster:
//!
//! - [`healpix`] maps sky positions to nested HEALPix pixels and back
//! - [`source`] describes surveys and reads their catalogs
//! - [`download`] fetches tile bytes off the render thread
//! - [`cache`] holds decoded tiles in memory and raw bytes on disk
//! - [`manager`] ties requests, downloads and caching together
//! - [`render`] rasterizes textured quads and whole views

pub mod cache;
pub mod config;
pub mod download;
pub mod healpix;
pub mod logging;
pub mod manager;
pub mod provider;
pub mod render;
pub mod source;
pub mod tile;

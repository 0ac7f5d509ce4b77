//! Core types shared by the tilebucket crates: tile coordinates, raster arrays, output profiles,
//! the object key scheme, the error taxonomy and the YAML configuration.

pub mod config;

pub mod error;
pub use error::*;

pub mod types;
pub use types::*;

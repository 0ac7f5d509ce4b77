//! YAML configuration of an output: bucket, base key, raster profile and store connection.

mod output;
pub use output::*;

mod profile;
pub use profile::*;

mod store;
pub use store::*;

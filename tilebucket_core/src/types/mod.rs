//! Contains tile coordinates, raster arrays, output profiles, the object key scheme and more.

mod blob;
pub use blob::*;

mod data_type;
pub use data_type::*;

mod object_key;
pub use object_key::*;

mod output_profile;
pub use output_profile::*;

mod raster_array;
pub use raster_array::*;

mod sample;
pub use sample::*;

mod tile_coord;
pub use tile_coord::*;

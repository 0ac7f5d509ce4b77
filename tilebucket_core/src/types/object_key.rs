//! Mapping between tile coordinates and object keys.
//!
//! Tiles are stored under `{base_prefix}/{zoom}/{row}/{col}{extension}`, for example
//! `runs/run1/5/15/32.tif`. Numbers are plain decimal without padding, so two distinct tiles
//! can never share a key. The layout is versioned by [`KEY_SCHEME_VERSION`]; changing it makes
//! previously written tiles unreachable.
//!
//! ```rust
//! use tilebucket_core::{DataType, KeyBuilder, OutputProfile, RasterDriver, TileCoord};
//!
//! let profile = OutputProfile::new(RasterDriver::GTiff, 3, DataType::Uint8, "bucket", "runs/run1/").unwrap();
//! let keys = KeyBuilder::from_profile(&profile);
//! let coord = TileCoord::new(5, 15, 32).unwrap();
//!
//! let key = keys.build_key(&coord);
//! assert_eq!(key.as_str(), "runs/run1/5/15/32.tif");
//! assert_eq!(keys.parse_key(key.as_str()), Some(coord));
//! assert_eq!(keys.get_path(&coord), "s3://bucket/runs/run1/5/15/32.tif");
//! ```

use crate::{OutputProfile, TileCoord};
use regex::Regex;
use std::{
	fmt::{self, Display},
	sync::LazyLock,
};

/// Version of the key layout.
pub const KEY_SCHEME_VERSION: u32 = 1;

/// Object key of a tile. Only produced by [`KeyBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}

	/// Wraps a key that was returned by the store itself, e.g. during a listing.
	pub fn from_listing(key: String) -> ObjectKey {
		ObjectKey(key)
	}
}

impl Display for ObjectKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for ObjectKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Builds object keys for one output profile and maps listed keys back to coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBuilder {
	bucket: String,
	/// Normalised base prefix: empty, or without a leading `/` and ending with exactly one `/`.
	prefix: String,
	extension: &'static str,
}

impl KeyBuilder {
	pub fn new(bucket: &str, base_prefix: &str, extension: &'static str) -> KeyBuilder {
		let trimmed = base_prefix.trim_matches('/');
		let prefix = if trimmed.is_empty() {
			String::new()
		} else {
			format!("{trimmed}/")
		};
		KeyBuilder {
			bucket: bucket.to_string(),
			prefix,
			extension,
		}
	}

	pub fn from_profile(profile: &OutputProfile) -> KeyBuilder {
		KeyBuilder::new(&profile.bucket, &profile.base_prefix, profile.driver.extension())
	}

	/// Builds the key of a tile. Pure and total.
	pub fn build_key(&self, coord: &TileCoord) -> ObjectKey {
		ObjectKey(format!(
			"{}{}/{}/{}{}",
			self.prefix, coord.zoom, coord.row, coord.col, self.extension
		))
	}

	/// `s3://` URL of a tile, for logging and for handing over to other tools.
	pub fn get_path(&self, coord: &TileCoord) -> String {
		format!("s3://{}/{}", self.bucket, self.build_key(coord))
	}

	/// Listing prefix covering every tile of this output. Empty if there is no base prefix.
	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Listing prefix covering every tile of one zoom level.
	pub fn zoom_prefix(&self, zoom: u8) -> String {
		format!("{}{zoom}/", self.prefix)
	}

	pub fn extension(&self) -> &'static str {
		self.extension
	}

	/// Inverse of [`KeyBuilder::build_key`]. Returns `None` for keys that were not produced by
	/// this builder: other prefixes or extensions, extra path segments, non-decimal numbers or
	/// numbers with leading zeros.
	pub fn parse_key(&self, key: &str) -> Option<TileCoord> {
		static RE_TILE: LazyLock<Regex> = LazyLock::new(|| {
			Regex::new(r"^(0|[1-9][0-9]{0,2})/(0|[1-9][0-9]{0,9})/(0|[1-9][0-9]{0,9})$").unwrap()
		});

		let relative = key.strip_prefix(self.prefix.as_str())?.strip_suffix(self.extension)?;
		let caps = RE_TILE.captures(relative)?;
		let zoom: i64 = caps[1].parse().ok()?;
		let row: i64 = caps[2].parse().ok()?;
		let col: i64 = caps[3].parse().ok()?;
		TileCoord::try_from_signed(zoom, row, col).ok()
	}
}

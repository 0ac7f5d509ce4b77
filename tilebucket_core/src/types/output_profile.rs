//! The output profile: which raster driver, band count and data type every tile of an output
//! uses, where the tiles go and which codec options apply.

use crate::DataType;
use anyhow::{Result, bail, ensure};
use serde::{Deserialize, Serialize};
use std::{
	collections::BTreeMap,
	fmt::{self, Display},
};

/// Raster file format a tile is encoded with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RasterDriver {
	#[serde(rename = "GTiff", alias = "gtiff", alias = "GeoTIFF")]
	GTiff,
	#[serde(rename = "PNG", alias = "png")]
	Png,
}

impl RasterDriver {
	/// Driver name as used in configuration files.
	pub fn as_str(&self) -> &'static str {
		match self {
			RasterDriver::GTiff => "GTiff",
			RasterDriver::Png => "PNG",
		}
	}

	/// File extension including the leading dot.
	pub fn extension(&self) -> &'static str {
		match self {
			RasterDriver::GTiff => ".tif",
			RasterDriver::Png => ".png",
		}
	}

	pub fn try_from_str(value: &str) -> Result<Self> {
		Ok(match value.trim().to_lowercase().as_str() {
			"gtiff" | "geotiff" | "tif" | "tiff" => RasterDriver::GTiff,
			"png" => RasterDriver::Png,
			_ => bail!("Unknown raster driver: '{value}'"),
		})
	}
}

impl Display for RasterDriver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Compression applied to the encoded tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
	#[default]
	None,
	Deflate,
}

impl Compression {
	pub fn try_from_str(value: &str) -> Result<Self> {
		Ok(match value.trim().to_lowercase().as_str() {
			"" | "none" | "uncompressed" => Compression::None,
			"deflate" | "zlib" | "zip" => Compression::Deflate,
			_ => bail!("Unknown compression: '{value}'"),
		})
	}
}

/// Codec options: the well-known `compress` option plus free-form options that are passed on
/// to the codec untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodecOptions {
	pub compress: Compression,
	pub passthrough: BTreeMap<String, String>,
}

impl CodecOptions {
	pub fn get(&self, key: &str) -> Option<&str> {
		self.passthrough.get(key).map(String::as_str)
	}
}

/// Everything the driver needs to know about an output. Immutable once built and shared by all
/// tile operations.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputProfile {
	pub driver: RasterDriver,
	pub bands: u16,
	pub dtype: DataType,
	pub bucket: String,
	pub base_prefix: String,
	pub nodata: Option<f64>,
	pub options: CodecOptions,
	/// Skip uploading tiles whose samples all equal `nodata`.
	pub skip_empty: bool,
}

impl OutputProfile {
	/// Creates a profile with default options and no nodata value.
	///
	/// # Errors
	/// Fails if `bands` is zero, `bucket` is empty or `base_prefix` has an empty, `.` or `..`
	/// segment.
	pub fn new(driver: RasterDriver, bands: u16, dtype: DataType, bucket: &str, base_prefix: &str) -> Result<Self> {
		let profile = OutputProfile {
			driver,
			bands,
			dtype,
			bucket: bucket.to_string(),
			base_prefix: base_prefix.to_string(),
			nodata: None,
			options: CodecOptions::default(),
			skip_empty: false,
		};
		profile.validate()?;
		Ok(profile)
	}

	#[must_use]
	pub fn with_nodata(mut self, nodata: f64) -> Self {
		self.nodata = Some(nodata);
		self
	}

	#[must_use]
	pub fn with_compression(mut self, compress: Compression) -> Self {
		self.options.compress = compress;
		self
	}

	#[must_use]
	pub fn with_skip_empty(mut self, skip_empty: bool) -> Self {
		self.skip_empty = skip_empty;
		self
	}

	pub fn validate(&self) -> Result<()> {
		ensure!(self.bands >= 1, "profile must have at least one band");
		ensure!(!self.bucket.trim().is_empty(), "bucket must not be empty");
		let base_prefix = self.base_prefix.trim_matches('/');
		if !base_prefix.is_empty() {
			for segment in base_prefix.split('/') {
				ensure!(
					!matches!(segment, "" | "." | ".."),
					"base prefix '{}' contains an empty, '.' or '..' segment",
					self.base_prefix
				);
			}
		}
		if let Some(nodata) = self.nodata {
			let (min, max) = self.dtype.value_range();
			ensure!(
				nodata.is_nan() || (min..=max).contains(&nodata),
				"nodata value {nodata} does not fit data type {}",
				self.dtype
			);
		}
		Ok(())
	}

	/// The value empty tiles are filled with: `nodata`, or 0 if none is set.
	pub fn fill_value(&self) -> f64 {
		self.nodata.unwrap_or(0.0)
	}
}

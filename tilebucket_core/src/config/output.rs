use super::{ProfileConfig, StoreConfig};
use crate::{ConfigError, OutputProfile};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

/// Configuration of one tile output.
///
/// ```yaml
/// bucket: my-bucket
/// basekey: runs/run1
/// profile:
///   driver: GTiff
///   bands: 3
///   dtype: uint8
///   nodata: 0
///   compress: deflate
/// store:
///   kind: s3
///   region: eu-central-1
/// skip_empty: false
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
	/// Name of the bucket.
	pub bucket: String,

	/// Key prefix under which all tiles are written.
	#[serde(default)]
	pub basekey: String,

	pub profile: ProfileConfig,

	#[serde(default)]
	pub store: StoreConfig,

	/// Do not upload tiles that contain only nodata.
	#[serde(default)]
	pub skip_empty: bool,
}

impl OutputConfig {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self, ConfigError> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = File::open(path)?;
		OutputConfig::from_reader(BufReader::new(file))
	}

	/// Validates the configuration and builds the immutable [`OutputProfile`].
	pub fn to_output_profile(&self) -> Result<OutputProfile, ConfigError> {
		let invalid = |e: anyhow::Error| ConfigError::Invalid(format!("{e:#}"));

		let profile = OutputProfile {
			driver: self.profile.driver().map_err(invalid)?,
			bands: self.profile.bands,
			dtype: self.profile.dtype().map_err(invalid)?,
			bucket: self.bucket.trim().to_string(),
			base_prefix: self.basekey.clone(),
			nodata: self.profile.nodata,
			options: self.profile.codec_options().map_err(invalid)?,
			skip_empty: self.skip_empty,
		};
		profile.validate().map_err(invalid)?;
		Ok(profile)
	}
}

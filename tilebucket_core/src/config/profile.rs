use crate::{CodecOptions, Compression, DataType, RasterDriver};
use anyhow::{Result, anyhow};
use serde::Deserialize;
use serde_yaml_ng::Value;
use std::collections::BTreeMap;

/// Raster profile section of an output configuration.
///
/// Unknown keys are not rejected: they are collected and passed on to the codec as free-form
/// options.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileConfig {
	/// Raster driver, `GTiff` or `PNG`.
	pub driver: String,

	/// Number of bands per tile.
	pub bands: u16,

	/// Sample data type, e.g. `uint8` or `float32`.
	pub dtype: String,

	/// Value marking empty pixels.
	#[serde(default)]
	pub nodata: Option<f64>,

	/// Compression of the encoded tiles, `none` or `deflate`.
	#[serde(default)]
	pub compress: Option<String>,

	/// Deprecated spelling of `compress`.
	#[serde(default)]
	pub compression: Option<String>,

	#[serde(flatten)]
	pub passthrough: BTreeMap<String, Value>,
}

impl ProfileConfig {
	pub fn driver(&self) -> Result<RasterDriver> {
		RasterDriver::try_from_str(&self.driver)
	}

	pub fn dtype(&self) -> Result<DataType> {
		DataType::try_from_str(&self.dtype)
	}

	/// Resolves `compress`, falling back to the deprecated `compression` key.
	pub fn codec_options(&self) -> Result<CodecOptions> {
		let compress = match (&self.compress, &self.compression) {
			(Some(compress), _) => Some(compress),
			(None, Some(compression)) => {
				log::warn!("the profile option 'compression' is deprecated, use 'compress' instead");
				Some(compression)
			}
			(None, None) => None,
		};
		let compress = compress.map_or(Ok(Compression::None), |c| Compression::try_from_str(c))?;

		let passthrough = self
			.passthrough
			.iter()
			.map(|(key, value)| Ok((key.clone(), value_to_string(key, value)?)))
			.collect::<Result<BTreeMap<String, String>>>()?;

		Ok(CodecOptions { compress, passthrough })
	}
}

fn value_to_string(key: &str, value: &Value) -> Result<String> {
	Ok(match value {
		Value::String(s) => s.clone(),
		Value::Bool(b) => b.to_string(),
		Value::Number(n) => n.to_string(),
		Value::Null => String::new(),
		_ => return Err(anyhow!("codec option '{key}' must be a scalar value")),
	})
}

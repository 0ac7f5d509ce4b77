//! This module defines the [`DataType`] enum, the numeric sample type of a raster band.
//!
//! Names follow the usual raster library conventions (`uint8`, `int16`, `float32`, ...).
//!
//! ```rust
//! use tilebucket_core::DataType;
//!
//! let dtype = DataType::try_from_str("UInt16").unwrap();
//! assert_eq!(dtype, DataType::Uint16);
//! assert_eq!(dtype.value_range(), (0.0, 65535.0));
//! ```

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Numeric sample type of every band in a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
	Uint8,
	Uint16,
	Int16,
	Uint32,
	Int32,
	Float32,
	Float64,
}

impl DataType {
	pub const ALL: [DataType; 7] = [
		DataType::Uint8,
		DataType::Uint16,
		DataType::Int16,
		DataType::Uint32,
		DataType::Int32,
		DataType::Float32,
		DataType::Float64,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			DataType::Uint8 => "uint8",
			DataType::Uint16 => "uint16",
			DataType::Int16 => "int16",
			DataType::Uint32 => "uint32",
			DataType::Int32 => "int32",
			DataType::Float32 => "float32",
			DataType::Float64 => "float64",
		}
	}

	/// Parses a data type name, case-insensitive.
	pub fn try_from_str(value: &str) -> Result<Self> {
		let value = value.trim().to_lowercase();
		for dtype in DataType::ALL {
			if dtype.as_str() == value {
				return Ok(dtype);
			}
		}
		bail!("Unknown data type: '{value}'")
	}

	/// Smallest and largest value representable by this type.
	pub fn value_range(&self) -> (f64, f64) {
		match self {
			DataType::Uint8 => (0.0, f64::from(u8::MAX)),
			DataType::Uint16 => (0.0, f64::from(u16::MAX)),
			DataType::Int16 => (f64::from(i16::MIN), f64::from(i16::MAX)),
			DataType::Uint32 => (0.0, f64::from(u32::MAX)),
			DataType::Int32 => (f64::from(i32::MIN), f64::from(i32::MAX)),
			DataType::Float32 => (f64::from(f32::MIN), f64::from(f32::MAX)),
			DataType::Float64 => (f64::MIN, f64::MAX),
		}
	}

	pub fn is_integer(&self) -> bool {
		!matches!(self, DataType::Float32 | DataType::Float64)
	}

	/// Size of one sample in bytes.
	pub fn size_bytes(&self) -> usize {
		match self {
			DataType::Uint8 => 1,
			DataType::Uint16 | DataType::Int16 => 2,
			DataType::Uint32 | DataType::Int32 | DataType::Float32 => 4,
			DataType::Float64 => 8,
		}
	}

	/// TIFF `SampleFormat` value: 1 = unsigned integer, 2 = signed integer, 3 = IEEE float.
	pub fn tiff_sample_format(&self) -> u16 {
		match self {
			DataType::Uint8 | DataType::Uint16 | DataType::Uint32 => 1,
			DataType::Int16 | DataType::Int32 => 2,
			DataType::Float32 | DataType::Float64 => 3,
		}
	}
}

impl Display for DataType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("uint8", DataType::Uint8)]
	#[case("UINT16", DataType::Uint16)]
	#[case(" int16", DataType::Int16)]
	#[case("Float32", DataType::Float32)]
	#[case("float64", DataType::Float64)]
	fn parse(#[case] text: &str, #[case] expected: DataType) {
		assert_eq!(DataType::try_from_str(text).unwrap(), expected);
	}

	#[test]
	fn parse_unknown() {
		assert!(DataType::try_from_str("complex64").is_err());
	}

	#[test]
	fn names_round_trip() {
		for dtype in DataType::ALL {
			assert_eq!(DataType::try_from_str(dtype.as_str()).unwrap(), dtype);
			assert_eq!(dtype.to_string(), dtype.as_str());
		}
	}

	#[test]
	fn serde_names() {
		let dtype: DataType = serde_yaml_ng::from_str("int32").unwrap();
		assert_eq!(dtype, DataType::Int32);
	}

	#[test]
	fn ranges() {
		assert_eq!(DataType::Int16.value_range(), (-32768.0, 32767.0));
		assert!(DataType::Uint32.is_integer());
		assert!(!DataType::Float32.is_integer());
		assert_eq!(DataType::Float64.size_bytes(), 8);
		assert_eq!(DataType::Int32.tiff_sample_format(), 2);
	}
}

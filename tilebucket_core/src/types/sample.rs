//! The [`Sample`] trait ties a Rust primitive to its [`DataType`] and to the little-endian byte
//! representation used by the raster codecs.

use crate::DataType;
use num_traits::{NumCast, ToPrimitive};
use std::fmt::Debug;

/// A primitive that can be stored as one raster sample.
pub trait Sample: Copy + Debug + Default + PartialEq + NumCast + ToPrimitive + Send + Sync + 'static {
	const DTYPE: DataType;

	fn write_le(self, out: &mut Vec<u8>);

	/// Reads one sample from the first `DTYPE.size_bytes()` bytes of `bytes`.
	fn read_le(bytes: &[u8]) -> Self;

	/// Converts an `f64` to this type, clipping to the valid range and rounding to the nearest
	/// integer for integer types. NaN becomes 0 for integer types.
	fn from_f64_clipped(value: f64) -> Self {
		let converted = if Self::DTYPE.is_integer() {
			if value.is_nan() {
				0.0
			} else {
				let (min, max) = Self::DTYPE.value_range();
				value.round().clamp(min, max)
			}
		} else if value.is_finite() {
			let (min, max) = Self::DTYPE.value_range();
			value.clamp(min, max)
		} else {
			value
		};
		<Self as NumCast>::from(converted).unwrap_or_default()
	}

	fn as_f64(self) -> f64 {
		self.to_f64().unwrap_or(f64::NAN)
	}
}

macro_rules! impl_sample {
	($type:ty, $dtype:expr) => {
		impl Sample for $type {
			const DTYPE: DataType = $dtype;

			fn write_le(self, out: &mut Vec<u8>) {
				out.extend_from_slice(&self.to_le_bytes());
			}

			fn read_le(bytes: &[u8]) -> Self {
				let mut buffer = [0u8; std::mem::size_of::<$type>()];
				buffer.copy_from_slice(&bytes[..std::mem::size_of::<$type>()]);
				<$type>::from_le_bytes(buffer)
			}
		}
	};
}

impl_sample!(u8, DataType::Uint8);
impl_sample!(u16, DataType::Uint16);
impl_sample!(i16, DataType::Int16);
impl_sample!(u32, DataType::Uint32);
impl_sample!(i32, DataType::Int32);
impl_sample!(f32, DataType::Float32);
impl_sample!(f64, DataType::Float64);

//! In-memory raster tiles.
//!
//! A [`RasterArray`] stores `bands × height × width` samples in band-sequential order, i.e. all
//! pixels of band 0 row by row, then band 1 and so on. The samples live in a typed
//! [`RasterData`] buffer whose variant determines the [`DataType`].
//!
//! ```rust
//! use tilebucket_core::{DataType, RasterArray, RasterData};
//!
//! let array = RasterArray::new(1, 2, 2, RasterData::Uint8(vec![1, 2, 3, 4])).unwrap();
//! assert_eq!(array.get(0, 1, 0), 3.0);
//!
//! let converted = array.convert_to(DataType::Float32);
//! assert_eq!(converted.dtype(), DataType::Float32);
//! ```

use crate::{Blob, DataType, Sample};
use anyhow::{Result, ensure};
use std::fmt::Debug;

/// Typed sample buffer of a [`RasterArray`].
#[derive(Clone, PartialEq)]
pub enum RasterData {
	Uint8(Vec<u8>),
	Uint16(Vec<u16>),
	Int16(Vec<i16>),
	Uint32(Vec<u32>),
	Int32(Vec<i32>),
	Float32(Vec<f32>),
	Float64(Vec<f64>),
}

/// Runs `$body` with `$values` bound to the typed vector inside a [`RasterData`].
#[macro_export]
macro_rules! with_raster_data {
	($data:expr, $values:ident => $body:expr) => {
		match $data {
			$crate::RasterData::Uint8($values) => $body,
			$crate::RasterData::Uint16($values) => $body,
			$crate::RasterData::Int16($values) => $body,
			$crate::RasterData::Uint32($values) => $body,
			$crate::RasterData::Int32($values) => $body,
			$crate::RasterData::Float32($values) => $body,
			$crate::RasterData::Float64($values) => $body,
		}
	};
}

/// Converts a `Vec<T>` into the matching [`RasterData`] variant.
pub trait IntoRasterData {
	fn into_raster_data(self) -> RasterData;
}

macro_rules! impl_into_raster_data {
	($type:ty, $variant:ident) => {
		impl IntoRasterData for Vec<$type> {
			fn into_raster_data(self) -> RasterData {
				RasterData::$variant(self)
			}
		}
	};
}

impl_into_raster_data!(u8, Uint8);
impl_into_raster_data!(u16, Uint16);
impl_into_raster_data!(i16, Int16);
impl_into_raster_data!(u32, Uint32);
impl_into_raster_data!(i32, Int32);
impl_into_raster_data!(f32, Float32);
impl_into_raster_data!(f64, Float64);

impl RasterData {
	/// Creates a buffer of `len` samples of `dtype`, all set to `value` (clipped and rounded).
	pub fn filled(dtype: DataType, len: usize, value: f64) -> RasterData {
		fn fill<T: Sample>(len: usize, value: f64) -> Vec<T> {
			vec![T::from_f64_clipped(value); len]
		}
		match dtype {
			DataType::Uint8 => RasterData::Uint8(fill(len, value)),
			DataType::Uint16 => RasterData::Uint16(fill(len, value)),
			DataType::Int16 => RasterData::Int16(fill(len, value)),
			DataType::Uint32 => RasterData::Uint32(fill(len, value)),
			DataType::Int32 => RasterData::Int32(fill(len, value)),
			DataType::Float32 => RasterData::Float32(fill(len, value)),
			DataType::Float64 => RasterData::Float64(fill(len, value)),
		}
	}

	pub fn dtype(&self) -> DataType {
		match self {
			RasterData::Uint8(_) => DataType::Uint8,
			RasterData::Uint16(_) => DataType::Uint16,
			RasterData::Int16(_) => DataType::Int16,
			RasterData::Uint32(_) => DataType::Uint32,
			RasterData::Int32(_) => DataType::Int32,
			RasterData::Float32(_) => DataType::Float32,
			RasterData::Float64(_) => DataType::Float64,
		}
	}

	pub fn len(&self) -> usize {
		with_raster_data!(self, values => values.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn get_f64(&self, index: usize) -> f64 {
		with_raster_data!(self, values => values[index].as_f64())
	}

	/// Serialises all samples in order as little-endian bytes.
	pub fn to_le_bytes(&self) -> Blob {
		fn write<T: Sample>(values: &[T]) -> Vec<u8> {
			let mut out = Vec::with_capacity(values.len() * T::DTYPE.size_bytes());
			for value in values {
				value.write_le(&mut out);
			}
			out
		}
		Blob::from(with_raster_data!(self, values => write(values)))
	}

	/// Parses little-endian bytes into a buffer of `dtype`.
	pub fn from_le_bytes(dtype: DataType, bytes: &[u8]) -> Result<RasterData> {
		let size = dtype.size_bytes();
		ensure!(
			bytes.len() % size == 0,
			"{} bytes cannot hold whole {dtype} samples",
			bytes.len()
		);
		fn read<T: Sample>(bytes: &[u8]) -> Vec<T> {
			bytes.chunks_exact(T::DTYPE.size_bytes()).map(T::read_le).collect()
		}
		Ok(match dtype {
			DataType::Uint8 => RasterData::Uint8(bytes.to_vec()),
			DataType::Uint16 => RasterData::Uint16(read(bytes)),
			DataType::Int16 => RasterData::Int16(read(bytes)),
			DataType::Uint32 => RasterData::Uint32(read(bytes)),
			DataType::Int32 => RasterData::Int32(read(bytes)),
			DataType::Float32 => RasterData::Float32(read(bytes)),
			DataType::Float64 => RasterData::Float64(read(bytes)),
		})
	}

	/// Reorders samples with `source_index(i)` giving the source position of output sample `i`.
	fn reorder(&self, source_index: impl Fn(usize) -> usize) -> RasterData {
		fn pick<T: Sample>(values: &[T], source_index: &dyn Fn(usize) -> usize) -> Vec<T> {
			(0..values.len()).map(|i| values[source_index(i)]).collect()
		}
		match self {
			RasterData::Uint8(v) => RasterData::Uint8(pick(v, &source_index)),
			RasterData::Uint16(v) => RasterData::Uint16(pick(v, &source_index)),
			RasterData::Int16(v) => RasterData::Int16(pick(v, &source_index)),
			RasterData::Uint32(v) => RasterData::Uint32(pick(v, &source_index)),
			RasterData::Int32(v) => RasterData::Int32(pick(v, &source_index)),
			RasterData::Float32(v) => RasterData::Float32(pick(v, &source_index)),
			RasterData::Float64(v) => RasterData::Float64(pick(v, &source_index)),
		}
	}

	fn convert_to(&self, dtype: DataType) -> RasterData {
		fn convert<S: Sample, T: Sample>(values: &[S]) -> Vec<T> {
			values.iter().map(|v| T::from_f64_clipped(v.as_f64())).collect()
		}
		if self.dtype() == dtype {
			return self.clone();
		}
		with_raster_data!(self, values => match dtype {
			DataType::Uint8 => RasterData::Uint8(convert(values)),
			DataType::Uint16 => RasterData::Uint16(convert(values)),
			DataType::Int16 => RasterData::Int16(convert(values)),
			DataType::Uint32 => RasterData::Uint32(convert(values)),
			DataType::Int32 => RasterData::Int32(convert(values)),
			DataType::Float32 => RasterData::Float32(convert(values)),
			DataType::Float64 => RasterData::Float64(convert(values)),
		})
	}
}

impl Debug for RasterData {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "RasterData({}, {} samples)", self.dtype(), self.len())
	}
}

/// A raster tile held in memory: `bands × height × width` samples in band-sequential order.
#[derive(Clone, PartialEq)]
pub struct RasterArray {
	bands: usize,
	height: usize,
	width: usize,
	data: RasterData,
}

impl RasterArray {
	/// Creates an array from band-sequential samples.
	///
	/// # Errors
	/// Fails if a dimension is zero or the number of samples does not equal
	/// `bands * height * width`.
	pub fn new(bands: usize, height: usize, width: usize, data: RasterData) -> Result<RasterArray> {
		ensure!(bands > 0, "raster must have at least one band");
		ensure!(height > 0 && width > 0, "raster must not have zero dimensions ({width}x{height})");
		let expected = bands * height * width;
		ensure!(
			data.len() == expected,
			"raster of {bands} bands and {width}x{height} pixels needs {expected} samples, got {}",
			data.len()
		);
		Ok(RasterArray {
			bands,
			height,
			width,
			data,
		})
	}

	/// Creates an array from a typed vector, see [`RasterArray::new`].
	pub fn from_vec<T: Sample>(bands: usize, height: usize, width: usize, values: Vec<T>) -> Result<RasterArray>
	where
		Vec<T>: IntoRasterData,
	{
		RasterArray::new(bands, height, width, values.into_raster_data())
	}

	/// Creates an array from pixel-interleaved samples (`b0 b1 b2 b0 b1 b2 ...`).
	pub fn from_interleaved(bands: usize, height: usize, width: usize, data: RasterData) -> Result<RasterArray> {
		let array = RasterArray::new(bands, height, width, data)?;
		let pixels = height * width;
		// output i = band * pixels + pixel  <-  input pixel * bands + band
		let data = array.data.reorder(|i| (i % pixels) * bands + i / pixels);
		Ok(RasterArray { data, ..array })
	}

	/// Creates an array where every sample equals `value`, converted to `dtype`.
	pub fn filled(bands: usize, height: usize, width: usize, dtype: DataType, value: f64) -> Result<RasterArray> {
		RasterArray::new(
			bands,
			height,
			width,
			RasterData::filled(dtype, bands * height * width, value),
		)
	}

	pub fn bands(&self) -> usize {
		self.bands
	}

	pub fn height(&self) -> usize {
		self.height
	}

	pub fn width(&self) -> usize {
		self.width
	}

	pub fn dtype(&self) -> DataType {
		self.data.dtype()
	}

	pub fn data(&self) -> &RasterData {
		&self.data
	}

	pub fn into_data(self) -> RasterData {
		self.data
	}

	/// Number of pixels per band.
	pub fn pixel_count(&self) -> usize {
		self.height * self.width
	}

	/// Returns the sample of `band` at (`row`, `col`) as `f64`.
	///
	/// # Panics
	/// Panics if the position is outside the array.
	pub fn get(&self, band: usize, row: usize, col: usize) -> f64 {
		assert!(band < self.bands && row < self.height && col < self.width);
		self.data.get_f64(band * self.pixel_count() + row * self.width + col)
	}

	/// Returns the samples in pixel-interleaved order, as most image file formats store them.
	pub fn to_interleaved(&self) -> RasterData {
		let pixels = self.pixel_count();
		let bands = self.bands;
		// output i = pixel * bands + band  <-  input band * pixels + pixel
		self.data.reorder(|i| (i % bands) * pixels + i / bands)
	}

	/// Explicitly converts the samples to `dtype`, clipping to the target range and rounding
	/// for integer targets. Values never wrap around.
	pub fn convert_to(&self, dtype: DataType) -> RasterArray {
		RasterArray {
			bands: self.bands,
			height: self.height,
			width: self.width,
			data: self.data.convert_to(dtype),
		}
	}

	/// `true` if every sample equals `value`. NaN matches NaN.
	pub fn is_all(&self, value: f64) -> bool {
		fn all<T: Sample>(values: &[T], value: f64) -> bool {
			values.iter().all(|v| {
				let v = v.as_f64();
				v == value || (v.is_nan() && value.is_nan())
			})
		}
		with_raster_data!(&self.data, values => all(values, value))
	}

	/// Minimum and maximum over all non-NaN samples.
	pub fn min_max(&self) -> Option<(f64, f64)> {
		fn fold<T: Sample>(values: &[T]) -> Option<(f64, f64)> {
			values
				.iter()
				.map(|v| v.as_f64())
				.filter(|v| !v.is_nan())
				.fold(None, |acc, v| match acc {
					None => Some((v, v)),
					Some((min, max)) => Some((min.min(v), max.max(v))),
				})
		}
		with_raster_data!(&self.data, values => fold(values))
	}
}

impl Debug for RasterArray {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"RasterArray({} bands, {}x{}, {})",
			self.bands,
			self.width,
			self.height,
			self.dtype()
		)
	}
}

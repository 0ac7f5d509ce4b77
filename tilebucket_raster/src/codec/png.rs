//! PNG codec for 1 to 4 bands of `uint8` or `uint16` samples (grey, grey + alpha, RGB, RGBA).

use super::{RasterCodec, failure};
use crate::MemoryFile;
use anyhow::{Result, anyhow, bail, ensure};
use image::{DynamicImage, ImageBuffer, ImageFormat, ImageReader};
use tilebucket_core::{Blob, CodecError, DataType, OutputProfile, RasterArray, RasterData, RasterDriver};

#[derive(Debug, Default, Clone, Copy)]
pub struct PngCodec;

impl RasterCodec for PngCodec {
	fn driver(&self) -> RasterDriver {
		RasterDriver::Png
	}

	fn supports(&self, bands: u16, dtype: DataType) -> Result<(), CodecError> {
		if !(1..=4).contains(&bands) {
			return Err(CodecError::Unsupported(format!(
				"PNG supports 1 to 4 bands, got {bands}"
			)));
		}
		if !matches!(dtype, DataType::Uint8 | DataType::Uint16) {
			return Err(CodecError::Unsupported(format!(
				"PNG supports uint8 and uint16, got {dtype}"
			)));
		}
		Ok(())
	}

	fn encode(&self, array: &RasterArray, _profile: &OutputProfile) -> Result<Blob, CodecError> {
		encode_png(array).map_err(|e| failure("encoding PNG", e))
	}

	fn decode(&self, blob: &Blob, _profile: &OutputProfile) -> Result<RasterArray, CodecError> {
		decode_png(blob).map_err(|e| failure(&format!("decoding PNG ({} bytes)", blob.len()), e))
	}
}

fn buffer<P: image::Pixel>(width: u32, height: u32, values: Vec<P::Subpixel>) -> Result<ImageBuffer<P, Vec<P::Subpixel>>> {
	ImageBuffer::from_raw(width, height, values).ok_or_else(|| anyhow!("sample buffer does not match image size"))
}

fn encode_png(array: &RasterArray) -> Result<Blob> {
	let width = u32::try_from(array.width())?;
	let height = u32::try_from(array.height())?;

	let image = match (array.to_interleaved(), array.bands()) {
		(RasterData::Uint8(v), 1) => DynamicImage::ImageLuma8(buffer(width, height, v)?),
		(RasterData::Uint8(v), 2) => DynamicImage::ImageLumaA8(buffer(width, height, v)?),
		(RasterData::Uint8(v), 3) => DynamicImage::ImageRgb8(buffer(width, height, v)?),
		(RasterData::Uint8(v), 4) => DynamicImage::ImageRgba8(buffer(width, height, v)?),
		(RasterData::Uint16(v), 1) => DynamicImage::ImageLuma16(buffer(width, height, v)?),
		(RasterData::Uint16(v), 2) => DynamicImage::ImageLumaA16(buffer(width, height, v)?),
		(RasterData::Uint16(v), 3) => DynamicImage::ImageRgb16(buffer(width, height, v)?),
		(RasterData::Uint16(v), 4) => DynamicImage::ImageRgba16(buffer(width, height, v)?),
		(data, bands) => bail!("PNG cannot store {bands} bands of {}", data.dtype()),
	};

	let mut file = MemoryFile::new();
	image.write_to(&mut file, ImageFormat::Png)?;
	Ok(file.into_blob())
}

fn decode_png(blob: &Blob) -> Result<RasterArray> {
	let image = ImageReader::with_format(MemoryFile::from_blob(blob), ImageFormat::Png).decode()?;
	let width = image.width() as usize;
	let height = image.height() as usize;

	let (bands, data) = match image {
		DynamicImage::ImageLuma8(b) => (1, RasterData::Uint8(b.into_raw())),
		DynamicImage::ImageLumaA8(b) => (2, RasterData::Uint8(b.into_raw())),
		DynamicImage::ImageRgb8(b) => (3, RasterData::Uint8(b.into_raw())),
		DynamicImage::ImageRgba8(b) => (4, RasterData::Uint8(b.into_raw())),
		DynamicImage::ImageLuma16(b) => (1, RasterData::Uint16(b.into_raw())),
		DynamicImage::ImageLumaA16(b) => (2, RasterData::Uint16(b.into_raw())),
		DynamicImage::ImageRgb16(b) => (3, RasterData::Uint16(b.into_raw())),
		DynamicImage::ImageRgba16(b) => (4, RasterData::Uint16(b.into_raw())),
		other => bail!("unsupported PNG color type {:?}", other.color()),
	};
	ensure!(data.len() == bands * width * height, "decoded PNG has an unexpected size");
	RasterArray::from_interleaved(bands, height, width, data)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn profile(bands: u16, dtype: DataType) -> OutputProfile {
		OutputProfile::new(RasterDriver::Png, bands, dtype, "bucket", "run1").unwrap()
	}

	#[rstest]
	#[case(1, DataType::Uint8)]
	#[case(2, DataType::Uint8)]
	#[case(3, DataType::Uint8)]
	#[case(4, DataType::Uint8)]
	#[case(1, DataType::Uint16)]
	#[case(4, DataType::Uint16)]
	fn round_trip(#[case] bands: u16, #[case] dtype: DataType) {
		let bands_usize = bands as usize;
		let values: Vec<f64> = (0..bands_usize * 8 * 8).map(|i| ((i * 37) % 251) as f64).collect();
		let array = RasterArray::from_vec(bands_usize, 8, 8, values).unwrap().convert_to(dtype);

		let profile = profile(bands, dtype);
		let blob = PngCodec.encode(&array, &profile).unwrap();
		assert_eq!(&blob.as_slice()[1..4], b"PNG");
		assert_eq!(PngCodec.decode(&blob, &profile).unwrap(), array);
	}

	#[rstest]
	#[case(5, DataType::Uint8)]
	#[case(0, DataType::Uint8)]
	#[case(1, DataType::Float32)]
	#[case(3, DataType::Int16)]
	fn unsupported(#[case] bands: u16, #[case] dtype: DataType) {
		assert!(matches!(
			PngCodec.supports(bands, dtype),
			Err(CodecError::Unsupported(_))
		));
	}

	#[test]
	fn truncated_png_fails() {
		let profile = profile(1, DataType::Uint8);
		let array = RasterArray::filled(1, 8, 8, DataType::Uint8, 3.0).unwrap();
		let blob = PngCodec.encode(&array, &profile).unwrap();
		let truncated = Blob::from(&blob.as_slice()[..blob.as_slice().len() / 2]);
		assert!(matches!(
			PngCodec.decode(&truncated, &profile),
			Err(CodecError::Failure(_))
		));
	}
}

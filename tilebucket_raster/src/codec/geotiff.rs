//! GeoTIFF codec.
//!
//! Tiles are written as baseline little-endian TIFF files with one image directory, pixel
//! interleaved samples and a single strip. Every band count and every [`DataType`] is supported.
//! With `compress: deflate` the strip is zlib compressed (TIFF compression 8). A nodata value is
//! stored in the `GDAL_NODATA` tag so that GDAL based tools pick it up.
//!
//! The codec writes no georeferencing tags (`GeoKeyDirectory`, `ModelTiepoint`,
//! `ModelPixelScale`). A tile is located by its key; transform and CRS belong to the host
//! pipeline's tiling scheme.

use super::{RasterCodec, failure};
use crate::MemoryFile;
use anyhow::{Context, Result, bail, ensure};
use flate2::bufread::ZlibEncoder;
use std::io::Read;
use tiff::{
	decoder::{Decoder, DecodingResult},
	encoder::TiffEncoder,
	tags::Tag,
};
use tilebucket_core::{
	Blob, CodecError, Compression, DataType, OutputProfile, RasterArray, RasterData, RasterDriver,
};

const GDAL_NODATA: u16 = 42113;

const COMPRESSION_NONE: u16 = 1;
const COMPRESSION_DEFLATE: u16 = 8;

const PHOTOMETRIC_BLACK_IS_ZERO: u16 = 1;
const PHOTOMETRIC_RGB: u16 = 2;

const EXTRA_SAMPLE_UNSPECIFIED: u16 = 0;
const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u16 = 2;

#[derive(Debug, Default, Clone, Copy)]
pub struct GeoTiffCodec;

impl RasterCodec for GeoTiffCodec {
	fn driver(&self) -> RasterDriver {
		RasterDriver::GTiff
	}

	fn supports(&self, bands: u16, _dtype: DataType) -> Result<(), CodecError> {
		if bands == 0 {
			return Err(CodecError::Unsupported("GTiff needs at least one band".to_string()));
		}
		Ok(())
	}

	fn encode(&self, array: &RasterArray, profile: &OutputProfile) -> Result<Blob, CodecError> {
		encode_tiff(array, profile).map_err(|e| failure("encoding GTiff", e))
	}

	fn decode(&self, blob: &Blob, _profile: &OutputProfile) -> Result<RasterArray, CodecError> {
		decode_tiff(blob).map_err(|e| failure(&format!("decoding GTiff ({} bytes)", blob.len()), e))
	}
}

/// Photometric interpretation and extra samples for a band count.
fn color_layout(bands: u16) -> (u16, Vec<u16>) {
	match bands {
		3 => (PHOTOMETRIC_RGB, vec![]),
		4 => (PHOTOMETRIC_RGB, vec![EXTRA_SAMPLE_UNASSOCIATED_ALPHA]),
		n => (
			PHOTOMETRIC_BLACK_IS_ZERO,
			vec![EXTRA_SAMPLE_UNSPECIFIED; usize::from(n.saturating_sub(1))],
		),
	}
}

/// Compression level from the `zlevel` codec option, as known from GDAL.
fn deflate_level(profile: &OutputProfile) -> Result<flate2::Compression> {
	let options = &profile.options;
	match options.get("zlevel").or_else(|| options.get("ZLEVEL")) {
		None => Ok(flate2::Compression::default()),
		Some(text) => {
			let level: u32 = text.trim().parse().with_context(|| format!("invalid zlevel '{text}'"))?;
			ensure!((1..=9).contains(&level), "zlevel must be between 1 and 9, got {level}");
			Ok(flate2::Compression::new(level))
		}
	}
}

fn format_nodata(nodata: f64) -> String {
	if nodata.is_nan() {
		"nan".to_string()
	} else {
		nodata.to_string()
	}
}

fn encode_tiff(array: &RasterArray, profile: &OutputProfile) -> Result<Blob> {
	let width = u32::try_from(array.width())?;
	let height = u32::try_from(array.height())?;
	let bands = u16::try_from(array.bands())?;
	let dtype = array.dtype();

	let raw = array.to_interleaved().to_le_bytes();
	let (compression, strip) = match profile.options.compress {
		Compression::None => (COMPRESSION_NONE, raw.into_vec()),
		Compression::Deflate => {
			let mut encoder = ZlibEncoder::new(raw.as_slice(), deflate_level(profile)?);
			let mut compressed = Vec::new();
			encoder
				.read_to_end(&mut compressed)
				.context("failed to deflate strip")?;
			(COMPRESSION_DEFLATE, compressed)
		}
	};
	let strip_byte_count = u32::try_from(strip.len()).context("strip exceeds 4 GiB")?;

	let (photometric, extra_samples) = color_layout(bands);
	let bits_per_sample = vec![(dtype.size_bytes() * 8) as u16; usize::from(bands)];
	let sample_format = vec![dtype.tiff_sample_format(); usize::from(bands)];

	let mut file = MemoryFile::new();
	{
		let mut encoder = TiffEncoder::new(&mut file)?;
		let mut dir = encoder.image_directory()?;

		dir.write_tag(Tag::ImageWidth, width)?;
		dir.write_tag(Tag::ImageLength, height)?;
		dir.write_tag(Tag::BitsPerSample, bits_per_sample.as_slice())?;
		dir.write_tag(Tag::Compression, compression)?;
		dir.write_tag(Tag::PhotometricInterpretation, photometric)?;
		dir.write_tag(Tag::SamplesPerPixel, bands)?;
		dir.write_tag(Tag::SampleFormat, sample_format.as_slice())?;
		dir.write_tag(Tag::PlanarConfiguration, 1u16)?;
		dir.write_tag(Tag::RowsPerStrip, height)?;
		if !extra_samples.is_empty() {
			dir.write_tag(Tag::ExtraSamples, extra_samples.as_slice())?;
		}
		if let Some(nodata) = profile.nodata {
			dir.write_tag(Tag::Unknown(GDAL_NODATA), format_nodata(nodata).as_str())?;
		}

		let strip_offset = dir.write_data(strip.as_slice())?;
		dir.write_tag(
			Tag::StripOffsets,
			u32::try_from(strip_offset).context("strip offset exceeds 4 GiB")?,
		)?;
		dir.write_tag(Tag::StripByteCounts, strip_byte_count)?;
		dir.finish()?;
	}

	log::trace!(
		"encoded {bands} band {dtype} GTiff of {width}x{height} pixels into {} bytes",
		file.len()
	);
	Ok(file.into_blob())
}

fn decode_tiff(blob: &Blob) -> Result<RasterArray> {
	let mut decoder = Decoder::new(MemoryFile::from_blob(blob))?;
	let (width, height) = decoder.dimensions()?;
	let (width, height) = (width as usize, height as usize);

	let data = match decoder.read_image()? {
		DecodingResult::U8(v) => RasterData::Uint8(v),
		DecodingResult::U16(v) => RasterData::Uint16(v),
		DecodingResult::I16(v) => RasterData::Int16(v),
		DecodingResult::U32(v) => RasterData::Uint32(v),
		DecodingResult::I32(v) => RasterData::Int32(v),
		DecodingResult::F32(v) => RasterData::Float32(v),
		DecodingResult::F64(v) => RasterData::Float64(v),
		_ => bail!("unsupported TIFF sample type"),
	};

	let pixels = width * height;
	ensure!(
		pixels > 0 && data.len() % pixels == 0,
		"{} samples do not fill an image of {width}x{height} pixels",
		data.len()
	);
	RasterArray::from_interleaved(data.len() / pixels, height, width, data)
}

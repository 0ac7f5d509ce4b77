use crate::{CodecRegistry, RasterCodec};
use std::sync::Arc;
use tilebucket_core::{Blob, CodecError, OutputProfile, RasterArray};

/// Binds a codec to an output profile.
///
/// Before encoding, the array is checked against the profile: a band count or data type that
/// differs fails with [`CodecError::Mismatch`] without touching the codec. Decoded arrays that
/// disagree with the profile are reported as [`CodecError::Failure`], as the stored object is
/// not what this output writes.
#[derive(Clone, Debug)]
pub struct CodecAdapter {
	codec: Arc<dyn RasterCodec>,
	profile: Arc<OutputProfile>,
}

impl CodecAdapter {
	/// Resolves the profile's driver and checks that the codec supports its bands and data type.
	pub fn new(profile: Arc<OutputProfile>, registry: &CodecRegistry) -> Result<CodecAdapter, CodecError> {
		let codec = registry.get(profile.driver)?;
		codec.supports(profile.bands, profile.dtype)?;
		Ok(CodecAdapter { codec, profile })
	}

	pub fn profile(&self) -> &OutputProfile {
		&self.profile
	}

	pub fn extension(&self) -> &'static str {
		self.codec.extension()
	}

	/// Checks band count and data type of `array` against the profile.
	pub fn check(&self, array: &RasterArray) -> Result<(), CodecError> {
		let profile = &self.profile;
		if array.bands() != usize::from(profile.bands) {
			return Err(CodecError::Mismatch(format!(
				"array has {} bands, profile expects {}",
				array.bands(),
				profile.bands
			)));
		}
		if array.dtype() != profile.dtype {
			return Err(CodecError::Mismatch(format!(
				"array has data type {}, profile expects {}",
				array.dtype(),
				profile.dtype
			)));
		}
		Ok(())
	}

	pub fn encode(&self, array: &RasterArray) -> Result<Blob, CodecError> {
		self.check(array)?;
		self.codec.encode(array, &self.profile)
	}

	pub fn decode(&self, blob: &Blob) -> Result<RasterArray, CodecError> {
		let array = self.codec.decode(blob, &self.profile)?;
		let profile = &self.profile;
		if array.bands() != usize::from(profile.bands) || array.dtype() != profile.dtype {
			return Err(CodecError::Failure(anyhow::anyhow!(
				"stored {} tile has {} bands of {}, profile expects {} bands of {}",
				profile.driver,
				array.bands(),
				array.dtype(),
				profile.bands,
				profile.dtype
			)));
		}
		Ok(array)
	}
}

use crate::{GeoTiffCodec, PngCodec, RasterCodec};
use std::{collections::HashMap, sync::Arc};
use tilebucket_core::{CodecError, RasterDriver};

/// Maps each [`RasterDriver`] to the codec that implements it.
///
/// `CodecRegistry::default()` knows the built-in GeoTIFF and PNG codecs. Further codecs can be
/// registered, replacing a built-in one for the same driver.
#[derive(Clone, Debug)]
pub struct CodecRegistry {
	codecs: HashMap<RasterDriver, Arc<dyn RasterCodec>>,
}

impl CodecRegistry {
	pub fn new_empty() -> Self {
		Self { codecs: HashMap::new() }
	}

	pub fn register(&mut self, codec: Arc<dyn RasterCodec>) {
		self.codecs.insert(codec.driver(), codec);
	}

	pub fn get(&self, driver: RasterDriver) -> Result<Arc<dyn RasterCodec>, CodecError> {
		self
			.codecs
			.get(&driver)
			.cloned()
			.ok_or_else(|| CodecError::Unsupported(format!("no codec registered for driver {driver}")))
	}
}

impl Default for CodecRegistry {
	fn default() -> Self {
		let mut registry = Self::new_empty();
		registry.register(Arc::new(GeoTiffCodec));
		registry.register(Arc::new(PngCodec));
		registry
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_registry() {
		let registry = CodecRegistry::default();
		assert_eq!(registry.get(RasterDriver::GTiff).unwrap().extension(), ".tif");
		assert_eq!(registry.get(RasterDriver::Png).unwrap().extension(), ".png");
	}

	#[test]
	fn empty_registry() {
		let registry = CodecRegistry::new_empty();
		assert!(matches!(
			registry.get(RasterDriver::GTiff),
			Err(CodecError::Unsupported(_))
		));
	}
}

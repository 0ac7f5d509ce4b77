use std::ops::RangeInclusive;
use tilebucket_core::{MAX_ZOOM, TileCoord};

/// Selects which written tiles a listing returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TileFilter {
	All,
	/// Tiles whose zoom level lies in the range. Each level is listed with its own prefix.
	Zoom(RangeInclusive<u8>),
}

impl TileFilter {
	pub fn zoom(zoom: u8) -> TileFilter {
		TileFilter::Zoom(zoom..=zoom)
	}

	/// Zoom levels to list separately, or `None` to list the whole output at once.
	pub fn zoom_levels(&self) -> Option<Vec<u8>> {
		match self {
			TileFilter::All => None,
			TileFilter::Zoom(range) => Some(range.clone().filter(|zoom| *zoom <= MAX_ZOOM).collect()),
		}
	}

	pub fn matches(&self, coord: &TileCoord) -> bool {
		match self {
			TileFilter::All => true,
			TileFilter::Zoom(range) => range.contains(&coord.zoom),
		}
	}
}

/// Result of a successful [`TileStore::write_tile`](crate::TileStore::write_tile).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
	/// The tile was uploaded.
	Written,
	/// The tile contained only nodata and was not uploaded.
	SkippedEmpty,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zoom_levels() {
		assert_eq!(TileFilter::All.zoom_levels(), None);
		assert_eq!(TileFilter::Zoom(0..=2).zoom_levels(), Some(vec![0, 1, 2]));
		assert_eq!(TileFilter::Zoom(30..=40).zoom_levels(), Some(vec![30, 31]));
		assert_eq!(TileFilter::zoom(3).zoom_levels(), Some(vec![3]));
		#[allow(clippy::reversed_empty_ranges)]
		let empty = TileFilter::Zoom(3..=1);
		assert_eq!(empty.zoom_levels(), Some(vec![]));
	}

	#[test]
	fn matches() {
		let coord = TileCoord::new(2, 3, 5).unwrap();
		assert!(TileFilter::All.matches(&coord));
		assert!(TileFilter::Zoom(0..=2).matches(&coord));
		assert!(!TileFilter::Zoom(3..=5).matches(&coord));
	}
}

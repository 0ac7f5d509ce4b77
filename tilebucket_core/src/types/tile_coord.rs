//! Tile coordinates within one level of a tile pyramid
//!
//! A [`TileCoord`] is identified by its zoom level, row and column. The pyramid scheme itself
//! (number of rows and columns per level, reprojection) belongs to the host pipeline, so the only
//! range check performed here is on the zoom level.
//!
//! # Examples
//!
//! ```
//! use tilebucket_core::TileCoord;
//!
//! let coord = TileCoord::new(5, 15, 32).unwrap();
//! assert_eq!(coord.to_string(), "5/15/32");
//!
//! let parsed: TileCoord = "5/15/32".parse().unwrap();
//! assert_eq!(parsed, coord);
//!
//! assert!(TileCoord::try_from_signed(3, -1, 0).is_err());
//! ```

use crate::InvalidCoordinate;
use std::{
	fmt::{self, Debug, Display},
	str::FromStr,
};

/// Highest zoom level a [`TileCoord`] may address.
pub const MAX_ZOOM: u8 = 31;

/// Immutable coordinate of a single tile: zoom level, row and column.
#[derive(Eq, PartialEq, Clone, Hash, Copy, PartialOrd, Ord)]
pub struct TileCoord {
	/// The zoom level of the tile.
	pub zoom: u8,
	/// The row index of the tile.
	pub row: u32,
	/// The column index of the tile.
	pub col: u32,
}

impl TileCoord {
	/// Create a new `TileCoord`.
	///
	/// # Errors
	/// Returns [`InvalidCoordinate`] if `zoom` > [`MAX_ZOOM`].
	pub fn new(zoom: u8, row: u32, col: u32) -> Result<TileCoord, InvalidCoordinate> {
		if zoom > MAX_ZOOM {
			return Err(InvalidCoordinate(format!("zoom ({zoom}) must be <= {MAX_ZOOM}")));
		}
		Ok(TileCoord { zoom, row, col })
	}

	/// Create a `TileCoord` from signed integers as handed over by callers that do not use
	/// unsigned types.
	///
	/// # Errors
	/// Returns [`InvalidCoordinate`] for negative values or values that do not fit the
	/// coordinate fields.
	pub fn try_from_signed(zoom: i64, row: i64, col: i64) -> Result<TileCoord, InvalidCoordinate> {
		let zoom = u8::try_from(zoom).map_err(|_| InvalidCoordinate(format!("zoom ({zoom}) is out of range")))?;
		let row = u32::try_from(row).map_err(|_| InvalidCoordinate(format!("row ({row}) is out of range")))?;
		let col = u32::try_from(col).map_err(|_| InvalidCoordinate(format!("col ({col}) is out of range")))?;
		TileCoord::new(zoom, row, col)
	}

	/// Create a `TileCoord` from floating point values, rejecting anything that is not a
	/// non-negative integer.
	pub fn try_from_f64(zoom: f64, row: f64, col: f64) -> Result<TileCoord, InvalidCoordinate> {
		for (name, value) in [("zoom", zoom), ("row", row), ("col", col)] {
			if !value.is_finite() || value.fract() != 0.0 {
				return Err(InvalidCoordinate(format!("{name} ({value}) must be an integer")));
			}
		}
		TileCoord::try_from_signed(zoom as i64, row as i64, col as i64)
	}
}

impl Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.zoom, self.row, self.col)
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}, {}, {})", self.zoom, self.row, self.col)
	}
}

/// Parses `zoom/row/col`.
impl FromStr for TileCoord {
	type Err = InvalidCoordinate;

	fn from_str(text: &str) -> Result<Self, Self::Err> {
		let parts: Vec<&str> = text.trim().split('/').collect();
		if parts.len() != 3 {
			return Err(InvalidCoordinate(format!(
				"'{text}' must have the form 'zoom/row/col'"
			)));
		}
		let parse = |name: &str, part: &str| -> Result<i64, InvalidCoordinate> {
			part
				.parse::<i64>()
				.map_err(|_| InvalidCoordinate(format!("{name} '{part}' is not an integer")))
		};
		TileCoord::try_from_signed(
			parse("zoom", parts[0])?,
			parse("row", parts[1])?,
			parse("col", parts[2])?,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn new_checks_zoom() {
		assert_eq!(TileCoord::new(31, 0, 0).unwrap().zoom, 31);
		assert!(TileCoord::new(32, 0, 0).is_err());
	}

	#[rstest]
	#[case(-1, 0, 0)]
	#[case(0, -1, 0)]
	#[case(0, 0, -5)]
	#[case(300, 0, 0)]
	#[case(3, 5_000_000_000, 0)]
	fn signed_out_of_range(#[case] zoom: i64, #[case] row: i64, #[case] col: i64) {
		assert!(TileCoord::try_from_signed(zoom, row, col).is_err());
	}

	#[test]
	fn float_coordinates() {
		assert_eq!(
			TileCoord::try_from_f64(2.0, 3.0, 5.0).unwrap(),
			TileCoord::new(2, 3, 5).unwrap()
		);
		assert!(TileCoord::try_from_f64(2.5, 3.0, 5.0).is_err());
		assert!(TileCoord::try_from_f64(2.0, f64::NAN, 5.0).is_err());
		assert!(TileCoord::try_from_f64(2.0, -3.0, 5.0).is_err());
	}

	#[rstest]
	#[case("0/0/0", Some((0, 0, 0)))]
	#[case("5/15/32", Some((5, 15, 32)))]
	#[case(" 2/3/5 ", Some((2, 3, 5)))]
	#[case("2/3", None)]
	#[case("2/3/5/7", None)]
	#[case("a/3/5", None)]
	#[case("2/-3/5", None)]
	#[case("2/3/5.5", None)]
	fn parse(#[case] text: &str, #[case] expected: Option<(u8, u32, u32)>) {
		let result = text.parse::<TileCoord>();
		match expected {
			Some((zoom, row, col)) => assert_eq!(result.unwrap(), TileCoord::new(zoom, row, col).unwrap()),
			None => assert!(result.is_err()),
		}
	}

	#[test]
	fn display_and_debug() {
		let coord = TileCoord::new(2, 3, 5).unwrap();
		assert_eq!(format!("{coord}"), "2/3/5");
		assert_eq!(format!("{coord:?}"), "TileCoord(2, 3, 5)");
	}

	#[test]
	fn ordering_is_zoom_row_col() {
		let mut coords = vec![
			TileCoord::new(2, 3, 5).unwrap(),
			TileCoord::new(0, 0, 0).unwrap(),
			TileCoord::new(1, 1, 1).unwrap(),
		];
		coords.sort();
		assert_eq!(coords[0], TileCoord::new(0, 0, 0).unwrap());
		assert_eq!(coords[2], TileCoord::new(2, 3, 5).unwrap());
	}
}

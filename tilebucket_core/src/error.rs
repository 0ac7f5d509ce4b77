//! Error taxonomy shared by the key builder, the raster codecs, the object store client and the
//! tile store driver.
//!
//! Lower layers report [`InvalidCoordinate`], [`CodecError`] and [`StoreError`]. The driver
//! converts them into a [`TileError`], which always names the failed operation and, where one
//! exists, the tile coordinate.

use crate::TileCoord;
use std::fmt::{self, Display};
use thiserror::Error;

/// A coordinate that cannot address a tile (negative, non-integer or out of range).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid tile coordinate: {0}")]
pub struct InvalidCoordinate(pub String);

/// Failures of the raster codec adapter. None of them is ever retried.
#[derive(Debug, Error)]
pub enum CodecError {
	/// The array disagrees with the output profile (band count, data type, shape).
	#[error("codec mismatch: {0}")]
	Mismatch(String),

	/// The underlying encoder or decoder failed (corrupt bytes, unsupported option, ...).
	#[error("codec failure: {0:#}")]
	Failure(anyhow::Error),

	/// The profile asks for a driver, band count or data type the codec cannot handle.
	#[error("unsupported codec configuration: {0}")]
	Unsupported(String),
}

/// Failures of the object store client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
	/// The store reported that no object exists under the key.
	#[error("object '{key}' not found")]
	NotFound { key: String },

	/// Network blip, timeout, 5xx or throttling. Retried by the client.
	#[error("transient store fault: {0}")]
	Transient(String),

	/// Permission denied, bad credentials, missing bucket or malformed key. Never retried.
	#[error("permanent store fault: {0}")]
	Permanent(String),

	/// All attempts failed with transient faults.
	#[error("store unavailable after {attempts} attempts: {last}")]
	Unavailable { attempts: u32, last: String },

	#[error("store operation cancelled")]
	Cancelled,
}

impl StoreError {
	#[must_use]
	pub fn is_transient(&self) -> bool {
		matches!(self, StoreError::Transient(_))
	}

	#[must_use]
	pub fn is_not_found(&self) -> bool {
		matches!(self, StoreError::NotFound { .. })
	}
}

/// The pipeline-facing operation during which a [`TileError`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOperation {
	WriteTile,
	ReadTile,
	TileExists,
	DeleteTile,
	ListWrittenTiles,
}

impl Display for TileOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TileOperation::WriteTile => "write_tile",
			TileOperation::ReadTile => "read_tile",
			TileOperation::TileExists => "tile_exists",
			TileOperation::DeleteTile => "delete_tile",
			TileOperation::ListWrittenTiles => "list_written_tiles",
		})
	}
}

/// What went wrong in a [`TileError`].
#[derive(Debug, Error)]
pub enum TileErrorKind {
	#[error(transparent)]
	InvalidCoordinate(#[from] InvalidCoordinate),

	#[error("codec mismatch: {0}")]
	CodecMismatch(String),

	#[error("codec failure: {0:#}")]
	CodecFailure(anyhow::Error),

	#[error("tile not found")]
	TileNotFound,

	#[error("store unavailable after {attempts} attempts: {message}")]
	StoreUnavailable { attempts: u32, message: String },

	#[error("permanent store fault: {0}")]
	PermanentStoreFault(String),

	#[error("operation cancelled")]
	Cancelled,
}

impl From<CodecError> for TileErrorKind {
	fn from(error: CodecError) -> Self {
		match error {
			CodecError::Mismatch(message) | CodecError::Unsupported(message) => TileErrorKind::CodecMismatch(message),
			CodecError::Failure(source) => TileErrorKind::CodecFailure(source),
		}
	}
}

impl From<StoreError> for TileErrorKind {
	fn from(error: StoreError) -> Self {
		match error {
			StoreError::NotFound { .. } => TileErrorKind::TileNotFound,
			StoreError::Transient(message) => TileErrorKind::StoreUnavailable { attempts: 1, message },
			StoreError::Unavailable { attempts, last } => TileErrorKind::StoreUnavailable {
				attempts,
				message: last,
			},
			StoreError::Permanent(message) => TileErrorKind::PermanentStoreFault(message),
			StoreError::Cancelled => TileErrorKind::Cancelled,
		}
	}
}

/// Error returned by every tile store operation.
#[derive(Debug, Error)]
#[error("{operation} failed{}: {kind}", describe_coord(.coord))]
pub struct TileError {
	pub operation: TileOperation,
	pub coord: Option<TileCoord>,
	pub kind: TileErrorKind,
}

fn describe_coord(coord: &Option<TileCoord>) -> String {
	coord.map(|c| format!(" for tile {c}")).unwrap_or_default()
}

impl TileError {
	pub fn new(operation: TileOperation, coord: Option<TileCoord>, kind: impl Into<TileErrorKind>) -> TileError {
		TileError {
			operation,
			coord,
			kind: kind.into(),
		}
	}

	#[must_use]
	pub fn kind(&self) -> &TileErrorKind {
		&self.kind
	}

	#[must_use]
	pub fn is_not_found(&self) -> bool {
		matches!(self.kind, TileErrorKind::TileNotFound)
	}
}

/// Failures while loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read configuration: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse configuration: {0}")]
	Parse(#[from] serde_yaml_ng::Error),

	#[error("invalid configuration: {0}")]
	Invalid(String),
}

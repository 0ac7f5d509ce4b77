//! An in-memory file that raster encoders write into and decoders read from.

use std::io::{BufRead, Cursor, Read, Result, Seek, SeekFrom, Write};
use tilebucket_core::Blob;

/// Seekable in-memory file backed by a `Vec<u8>`.
///
/// A fresh instance is used for every encode or decode call and released at the end of it.
#[derive(Debug, Default)]
pub struct MemoryFile {
	cursor: Cursor<Vec<u8>>,
}

impl MemoryFile {
	/// Creates an empty file positioned at the start.
	pub fn new() -> MemoryFile {
		MemoryFile::default()
	}

	/// Creates a file holding the bytes of `blob`, positioned at the start.
	pub fn from_blob(blob: &Blob) -> MemoryFile {
		MemoryFile {
			cursor: Cursor::new(blob.as_slice().to_vec()),
		}
	}

	pub fn as_slice(&self) -> &[u8] {
		self.cursor.get_ref().as_slice()
	}

	pub fn len(&self) -> usize {
		self.cursor.get_ref().len()
	}

	pub fn is_empty(&self) -> bool {
		self.cursor.get_ref().is_empty()
	}

	/// Consumes the file and returns its full contents, regardless of the current position.
	pub fn into_blob(self) -> Blob {
		Blob::from(self.cursor.into_inner())
	}
}

impl Read for MemoryFile {
	fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
		self.cursor.read(buf)
	}
}

impl BufRead for MemoryFile {
	fn fill_buf(&mut self) -> Result<&[u8]> {
		self.cursor.fill_buf()
	}

	fn consume(&mut self, amount: usize) {
		self.cursor.consume(amount);
	}
}

impl Write for MemoryFile {
	fn write(&mut self, buf: &[u8]) -> Result<usize> {
		self.cursor.write(buf)
	}

	fn flush(&mut self) -> Result<()> {
		Ok(())
	}
}

impl Seek for MemoryFile {
	fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
		self.cursor.seek(pos)
	}
}

use crate::blend::bytes::Cursor;
use crate::blend::{Endianness, Result};

/// Typed schema chunk code.
pub const CODE_DNA1: [u8; 4] = *b"DNA1";
/// Raw schema marker: the schema block inlined without a chunk wrapper.
pub const CODE_SDNA: [u8; 4] = *b"SDNA";
/// Stream terminator code.
pub const CODE_ENDB: [u8; 4] = *b"ENDB";
/// Anchor record code: the single designated root chunk.
pub const CODE_GLOB: [u8; 4] = *b"GLOB";

/// One chunk record header as stored on the wire.
///
/// The original address field is an opaque relinking key from the
/// producer's address space; it is never dereferenced.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHead {
	/// Four-byte record tag.
	pub code: [u8; 4],
	/// Payload byte length.
	pub len: u64,
	/// Producer-side address of the payload, used purely as a key.
	pub old: u64,
	/// Foreign struct index describing the payload layout.
	pub struct_id: u32,
	/// Number of struct elements stored in the payload.
	pub count: u32,
}

impl ChunkHead {
	/// Wire size of a chunk record for the given pointer width.
	pub const fn size_on_wire(pointer_size: usize) -> usize {
		16 + pointer_size
	}

	/// Parse a chunk record, widening the address field to 64 bits.
	pub fn parse(cursor: &mut Cursor<'_>, pointer_size: usize, endianness: Endianness) -> Result<Self> {
		let code = cursor.read_code4()?;
		let len = u64::from(cursor.read_u32(endianness)?);
		let old = cursor.read_ptr(pointer_size, endianness)?;
		let struct_id = cursor.read_u32(endianness)?;
		let count = cursor.read_u32(endianness)?;

		Ok(Self {
			code,
			len,
			old,
			struct_id,
			count,
		})
	}

	/// Return `true` for the terminal record.
	pub fn is_end(&self) -> bool {
		self.code == CODE_ENDB
	}

	/// Return `true` for the typed schema record.
	pub fn is_schema(&self) -> bool {
		self.code == CODE_DNA1
	}

	/// Return `true` for the raw schema marker.
	pub fn is_raw_schema(&self) -> bool {
		self.code == CODE_SDNA
	}
}

use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Fatal failures while parsing the fixed stream header.
#[derive(Debug, Error)]
pub enum HeaderError {
	/// Leading magic matched neither accepted prefix.
	#[error("unknown stream magic {magic:?}")]
	UnknownMagic {
		/// First seven bytes of the stream.
		magic: [u8; 7],
	},
	/// Stream ended inside the fixed header region.
	#[error("truncated header: need {need} bytes, have {have}")]
	Truncated {
		/// Required header size.
		need: usize,
		/// Bytes actually available.
		have: usize,
	},
	/// Pointer-width marker byte was not `_` or `-`.
	#[error("invalid pointer-width marker {marker:?}")]
	BadPointerMarker {
		/// Offending marker byte.
		marker: u8,
	},
	/// Endianness marker byte was not `v` or `V`.
	#[error("invalid endianness marker {marker:?}")]
	BadEndianMarker {
		/// Offending marker byte.
		marker: u8,
	},
	/// Trailing version field held non-digit bytes.
	#[error("invalid version digits {digits:?}")]
	BadVersionDigits {
		/// Raw version bytes.
		digits: [u8; 3],
	},
}

/// Fatal failures while parsing the embedded schema block.
#[derive(Debug, Error)]
pub enum SchemaError {
	/// Unexpected section tag.
	#[error("schema tag mismatch at {at}: expected {expected:?}, got {got:?}")]
	BadMagic {
		/// Expected section tag.
		expected: [u8; 4],
		/// Actual section tag.
		got: [u8; 4],
		/// Block offset of the tag read.
		at: usize,
	},
	/// Section count exceeded the configured table bound.
	#[error("schema section {section} declares {count} entries, limit {max}")]
	TooManyEntries {
		/// Section tag as text.
		section: &'static str,
		/// Declared entry count.
		count: usize,
		/// Maximum accepted count.
		max: usize,
	},
	/// Out-of-range index inside the schema tables.
	#[error("schema index out of range for {kind}: idx={idx}, max={max}")]
	IndexOutOfRange {
		/// Logical index kind being validated.
		kind: &'static str,
		/// Offending index value.
		idx: u32,
		/// Maximum valid index.
		max: u32,
	},
	/// Section framing is structurally unusable.
	#[error("corrupt schema block: {reason}")]
	Corrupt {
		/// Short framing-failure description.
		reason: &'static str,
	},
	/// Two struct definitions claim the same type.
	#[error("duplicate struct definition for type index {type_idx}: first={first}, second={second}")]
	DuplicateStructType {
		/// Duplicated type index.
		type_idx: u16,
		/// First struct index observed.
		first: u32,
		/// Second struct index observed.
		second: u32,
	},
}

/// Errors produced while loading and relinking a chunk stream.
#[derive(Debug, Error)]
pub enum LoadError {
	/// Filesystem or transport IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Fatal header failure.
	#[error("header: {0}")]
	Header(#[from] HeaderError),
	/// Fatal schema-block failure.
	#[error("schema: {0}")]
	Schema(#[from] SchemaError),
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	Truncated {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Chunk payload would exceed remaining stream data.
	#[error("chunk length {len} at offset {at} exceeds remaining {rem}")]
	ChunkLenOutOfRange {
		/// Stream offset of the chunk record.
		at: u64,
		/// Declared payload length.
		len: u64,
		/// Remaining bytes in the stream.
		rem: u64,
	},
	/// Stream ended without an embedded schema chunk.
	#[error("no schema chunk found before end of stream")]
	SchemaMissing,
	/// Resolved-buffer allocation was refused.
	#[error("allocation of {bytes} bytes failed")]
	Allocation {
		/// Requested allocation size.
		bytes: usize,
	},
	/// Source bytes matched neither a stream magic nor a known compression magic.
	#[error("unsupported compression or unknown magic {magic:?}")]
	UnknownCompression {
		/// First up-to-4 bytes of the source.
		magic: [u8; 4],
	},
	/// Decompression output exceeded the configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Decompressed data did not start with an accepted stream magic.
	#[error("decompressed data does not start with a stream magic")]
	NotStreamAfterDecompress,
	/// No process-wide reference schema has been installed.
	#[error("no reference schema installed")]
	ReferenceMissing,
}

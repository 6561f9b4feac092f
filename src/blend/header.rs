use crate::blend::{HeaderError, Result};

/// Magic prefix written by the upstream application.
pub const MAGIC: &[u8; 7] = b"BLENDER";
/// Magic prefix written by this library's own stripped dumps.
pub const MAGIC_STRIPPED: &[u8; 7] = b"BLNDLNK";

/// Byte endianness marker stored in stream headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
	/// Little-endian byte order (`v` marker).
	Little,
	/// Big-endian byte order (`V` marker).
	Big,
}

impl Endianness {
	/// Endianness of the machine running the consumer.
	pub fn native() -> Self {
		if cfg!(target_endian = "big") { Self::Big } else { Self::Little }
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}
}

/// Parsed fixed-size stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
	/// Producer pointer width in bytes (4 or 8).
	pub pointer_size: usize,
	/// Producer byte order.
	pub endianness: Endianness,
	/// Producer version encoded as decimal digits (for example `279`).
	pub version: u16,
}

impl StreamHeader {
	/// Exact header size in bytes.
	pub const SIZE: usize = 12;

	/// Parse a stream header from the beginning of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let Some(header) = bytes.get(0..Self::SIZE) else {
			return Err(HeaderError::Truncated {
				need: Self::SIZE,
				have: bytes.len(),
			}
			.into());
		};

		if &header[0..7] != MAGIC && &header[0..7] != MAGIC_STRIPPED {
			let mut magic = [0_u8; 7];
			magic.copy_from_slice(&header[0..7]);
			return Err(HeaderError::UnknownMagic { magic }.into());
		}

		let pointer_size = match header[7] {
			b'_' => 4,
			b'-' => 8,
			marker => return Err(HeaderError::BadPointerMarker { marker }.into()),
		};

		let endianness = match header[8] {
			b'v' => Endianness::Little,
			b'V' => Endianness::Big,
			marker => return Err(HeaderError::BadEndianMarker { marker }.into()),
		};

		let digits = &header[9..12];
		let Some(version) = parse_digits(digits) else {
			let mut raw = [0_u8; 3];
			raw.copy_from_slice(digits);
			return Err(HeaderError::BadVersionDigits { digits: raw }.into());
		};

		Ok(Self {
			pointer_size,
			endianness,
			version,
		})
	}

	/// Whether chunk payloads need a byte swap on this machine.
	pub fn swapped(self) -> bool {
		self.endianness != Endianness::native()
	}
}

fn parse_digits(bytes: &[u8]) -> Option<u16> {
	if bytes.is_empty() {
		return None;
	}

	let mut value = 0_u16;
	for byte in bytes {
		if !byte.is_ascii_digit() {
			return None;
		}
		value = value * 10 + u16::from(*byte - b'0');
	}
	Some(value)
}

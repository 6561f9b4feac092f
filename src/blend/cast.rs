use crate::blend::Endianness;

/// Scalar kinds recognized by the member copy/cast engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
	/// Signed 8-bit integer.
	I8,
	/// Unsigned 8-bit integer.
	U8,
	/// Signed 16-bit integer.
	I16,
	/// Unsigned 16-bit integer.
	U16,
	/// Signed 32-bit integer.
	I32,
	/// Unsigned 32-bit integer.
	U32,
	/// Signed 64-bit integer.
	I64,
	/// Unsigned 64-bit integer.
	U64,
	/// 32-bit float.
	F32,
	/// 64-bit float.
	F64,
}

impl Scalar {
	/// Element width in bytes.
	pub fn width(self) -> usize {
		match self {
			Self::I8 | Self::U8 => 1,
			Self::I16 | Self::U16 => 2,
			Self::I32 | Self::U32 | Self::F32 => 4,
			Self::I64 | Self::U64 | Self::F64 => 8,
		}
	}

	/// Whether the kind is a floating-point type.
	pub fn is_float(self) -> bool {
		matches!(self, Self::F32 | Self::F64)
	}

	/// Whether the kind is an integer type.
	pub fn is_integer(self) -> bool {
		!self.is_float()
	}
}

/// Classify a primitive by its schema type name and element byte size.
///
/// Integer signedness comes from the name, width from the size, so types
/// like `long` classify correctly whatever width the producer gave them.
pub fn classify(type_name: &str, size: usize) -> Option<Scalar> {
	let signed = match type_name {
		"float" | "double" => {
			return match size {
				4 => Some(Scalar::F32),
				8 => Some(Scalar::F64),
				_ => None,
			};
		}
		"char" | "int8_t" | "short" | "int16_t" | "int" | "int32_t" | "long" | "int64_t" => true,
		"uchar" | "uint8_t" | "bool" | "ushort" | "uint16_t" | "uint" | "uint32_t" | "ulong" | "uint64_t" => false,
		_ => return None,
	};

	Some(match (size, signed) {
		(1, true) => Scalar::I8,
		(1, false) => Scalar::U8,
		(2, true) => Scalar::I16,
		(2, false) => Scalar::U16,
		(4, true) => Scalar::I32,
		(4, false) => Scalar::U32,
		(8, true) => Scalar::I64,
		(8, false) => Scalar::U64,
		_ => return None,
	})
}

/// Read one scalar element and widen it to `f64` by value.
pub fn read_as_f64(scalar: Scalar, bytes: &[u8], endianness: Endianness) -> Option<f64> {
	let width = scalar.width();
	let raw = bytes.get(..width)?;

	let mut buf = [0_u8; 8];
	buf[..width].copy_from_slice(raw);
	let bits = match endianness {
		Endianness::Little => u64::from_le_bytes(buf),
		Endianness::Big => {
			let mut rev = [0_u8; 8];
			rev[8 - width..].copy_from_slice(raw);
			u64::from_be_bytes(rev)
		}
	};

	Some(match scalar {
		Scalar::I8 => f64::from(bits as u8 as i8),
		Scalar::U8 => f64::from(bits as u8),
		Scalar::I16 => f64::from(bits as u16 as i16),
		Scalar::U16 => f64::from(bits as u16),
		Scalar::I32 => f64::from(bits as u32 as i32),
		Scalar::U32 => f64::from(bits as u32),
		Scalar::I64 => bits as i64 as f64,
		Scalar::U64 => bits as f64,
		Scalar::F32 => f64::from(f32::from_bits(bits as u32)),
		Scalar::F64 => f64::from_bits(bits),
	})
}

/// Write `value` as one scalar element in native byte order.
pub fn write_from_f64(scalar: Scalar, value: f64, out: &mut [u8]) -> Option<()> {
	let width = scalar.width();
	let slot = out.get_mut(..width)?;

	match scalar {
		Scalar::I8 => slot.copy_from_slice(&(value as i8).to_ne_bytes()),
		Scalar::U8 => slot.copy_from_slice(&(value as u8).to_ne_bytes()),
		Scalar::I16 => slot.copy_from_slice(&(value as i16).to_ne_bytes()),
		Scalar::U16 => slot.copy_from_slice(&(value as u16).to_ne_bytes()),
		Scalar::I32 => slot.copy_from_slice(&(value as i32).to_ne_bytes()),
		Scalar::U32 => slot.copy_from_slice(&(value as u32).to_ne_bytes()),
		Scalar::I64 => slot.copy_from_slice(&(value as i64).to_ne_bytes()),
		Scalar::U64 => slot.copy_from_slice(&(value as u64).to_ne_bytes()),
		Scalar::F32 => slot.copy_from_slice(&(value as f32).to_ne_bytes()),
		Scalar::F64 => slot.copy_from_slice(&value.to_ne_bytes()),
	}
	Some(())
}

#[cfg(test)]
mod tests {
	use super::{Scalar, classify, read_as_f64, write_from_f64};
	use crate::blend::Endianness;

	#[test]
	fn classifies_by_name_and_size() {
		assert_eq!(classify("int", 4), Some(Scalar::I32));
		assert_eq!(classify("uchar", 1), Some(Scalar::U8));
		assert_eq!(classify("long", 4), Some(Scalar::I32));
		assert_eq!(classify("long", 8), Some(Scalar::I64));
		assert_eq!(classify("float", 4), Some(Scalar::F32));
		assert_eq!(classify("double", 8), Some(Scalar::F64));
		assert_eq!(classify("ListBase", 16), None);
		assert_eq!(classify("int", 3), None);
	}

	#[test]
	fn reads_sign_extended_values_in_both_byte_orders() {
		let le = (-5_i16).to_le_bytes();
		let be = (-5_i16).to_be_bytes();
		assert_eq!(read_as_f64(Scalar::I16, &le, Endianness::Little), Some(-5.0));
		assert_eq!(read_as_f64(Scalar::I16, &be, Endianness::Big), Some(-5.0));
	}

	#[test]
	fn converts_between_int_and_float_by_value() {
		let src = 42_i32.to_le_bytes();
		let value = read_as_f64(Scalar::I32, &src, Endianness::Little).expect("read");
		let mut out = [0_u8; 4];
		write_from_f64(Scalar::F32, value, &mut out).expect("write");
		assert_eq!(f32::from_ne_bytes(out), 42.0);
	}

	#[test]
	fn short_buffers_are_refused() {
		assert_eq!(read_as_f64(Scalar::I32, &[1, 2], Endianness::Little), None);
		let mut out = [0_u8; 2];
		assert_eq!(write_from_f64(Scalar::F32, 1.0, &mut out), None);
	}
}

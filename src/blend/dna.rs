use rustc_hash::FxHashMap;

use crate::blend::bytes::Cursor;
use crate::blend::decl::parse_field_decl;
use crate::blend::hash::name_hash;
use crate::blend::{Endianness, Result, SchemaError};

/// Largest entry count accepted for any schema section.
///
/// Struct records address names and types through 16-bit ids, so a count
/// past this bound means the block is hostile or corrupt.
pub const MAX_TABLE_ENTRIES: usize = u16::MAX as usize;

/// One field declaration as written in the schema block.
#[derive(Debug, Clone)]
pub struct NameEntry {
	/// Raw declarator text (`*next`, `mat[4][4]`, ...).
	pub raw: Box<str>,
	/// Base identifier with stars and array extents stripped.
	pub base: Box<str>,
	/// Hash of the base identifier, used for cross-version matching.
	pub base_hash: u64,
	/// Pointer nesting depth.
	pub ptr_depth: u8,
	/// Whether the declarator is a function pointer.
	pub is_func_ptr: bool,
	/// Flattened inline array element count.
	pub count: usize,
}

impl NameEntry {
	/// Re-lex one raw declarator string.
	pub fn parse(raw: &str) -> Self {
		let decl = parse_field_decl(raw);
		Self {
			raw: raw.into(),
			base: decl.ident.into(),
			base_hash: name_hash(decl.ident),
			ptr_depth: decl.ptr_depth,
			is_func_ptr: decl.is_func_ptr,
			count: decl.inline_array,
		}
	}
}

/// One named type from the schema block.
#[derive(Debug, Clone)]
pub struct TypeEntry {
	/// Type name text.
	pub name: Box<str>,
	/// Hash of the type name.
	pub hash: u64,
	/// Index of this type's struct definition, if it has one.
	pub struct_idx: Option<u32>,
}

impl TypeEntry {
	/// Build an entry for `name` with no struct definition attached.
	pub fn new(name: &str) -> Self {
		Self {
			name: name.into(),
			hash: name_hash(name),
			struct_idx: None,
		}
	}
}

/// One raw struct definition: a type plus its (type, name) member pairs.
#[derive(Debug, Clone)]
pub struct RawStruct {
	/// Type index naming this struct.
	pub type_idx: u16,
	/// Member declarations in source order.
	pub fields: Vec<RawField>,
}

/// One member pair inside a raw struct definition.
#[derive(Debug, Clone, Copy)]
pub struct RawField {
	/// Type table index of the member type.
	pub type_idx: u16,
	/// Name table index of the member declarator.
	pub name_idx: u16,
}

/// Parsed schema tables: names, types, type sizes, struct definitions.
#[derive(Debug)]
pub struct Dna {
	/// Field declarations from `NAME`.
	pub names: Vec<NameEntry>,
	/// Named types from `TYPE`, struct indices filled from `STRC`.
	pub types: Vec<TypeEntry>,
	/// Type byte sizes from `TLEN`.
	pub tlen: Vec<u16>,
	/// Struct definitions from `STRC`.
	pub structs: Vec<RawStruct>,
	type_by_hash: FxHashMap<u64, u16>,
}

impl Dna {
	/// Parse a schema block into tables.
	///
	/// The leading `SDNA` tag is optional: a block delivered through the raw
	/// schema marker has already had it consumed as the chunk code.
	pub fn parse(payload: &[u8], endianness: Endianness) -> Result<Self> {
		if payload.is_empty() {
			return Err(SchemaError::Corrupt { reason: "empty schema block" }.into());
		}

		let mut cursor = Cursor::new(payload);
		if payload.len() >= 4 && &payload[0..4] == b"SDNA" {
			let _ = cursor.read_code4()?;
		}

		expect_tag(&mut cursor, *b"NAME")?;
		let name_count = read_count(&mut cursor, endianness, "NAME")?;
		let mut names = Vec::with_capacity(name_count);
		for _ in 0..name_count {
			let raw = read_lossy_string(&mut cursor)?;
			names.push(NameEntry::parse(&raw));
		}
		cursor.align4()?;

		expect_tag(&mut cursor, *b"TYPE")?;
		let type_count = read_count(&mut cursor, endianness, "TYPE")?;
		let mut types = Vec::with_capacity(type_count);
		for _ in 0..type_count {
			let name = read_lossy_string(&mut cursor)?;
			types.push(TypeEntry::new(&name));
		}
		cursor.align4()?;

		expect_tag(&mut cursor, *b"TLEN")?;
		let mut tlen = Vec::with_capacity(type_count);
		for _ in 0..type_count {
			tlen.push(cursor.read_u16(endianness)?);
		}
		cursor.align4()?;

		expect_tag(&mut cursor, *b"STRC")?;
		let struct_count = read_count(&mut cursor, endianness, "STRC")?;
		let mut structs = Vec::with_capacity(struct_count);
		for _ in 0..struct_count {
			let type_idx = cursor.read_u16(endianness)?;
			check_index("struct.type_idx", u32::from(type_idx), types.len())?;

			let field_count = cursor.read_u16(endianness)? as usize;
			let mut fields = Vec::with_capacity(field_count);
			for _ in 0..field_count {
				let field_type_idx = cursor.read_u16(endianness)?;
				let field_name_idx = cursor.read_u16(endianness)?;
				check_index("field.type_idx", u32::from(field_type_idx), types.len())?;
				check_index("field.name_idx", u32::from(field_name_idx), names.len())?;
				fields.push(RawField {
					type_idx: field_type_idx,
					name_idx: field_name_idx,
				});
			}

			structs.push(RawStruct { type_idx, fields });
		}

		Self::from_parts(names, types, tlen, structs)
	}

	/// Assemble tables from pre-built parts.
	///
	/// This is the tail of [`Dna::parse`] and is also useful for
	/// deterministic unit tests.
	pub fn from_parts(names: Vec<NameEntry>, mut types: Vec<TypeEntry>, tlen: Vec<u16>, structs: Vec<RawStruct>) -> Result<Self> {
		for (idx, item) in structs.iter().enumerate() {
			let slot = &mut types[item.type_idx as usize].struct_idx;
			if let Some(first) = *slot {
				return Err(SchemaError::DuplicateStructType {
					type_idx: item.type_idx,
					first,
					second: idx as u32,
				}
				.into());
			}
			*slot = Some(idx as u32);
		}

		let mut type_by_hash = FxHashMap::default();
		for (idx, entry) in types.iter().enumerate() {
			type_by_hash.entry(entry.hash).or_insert(idx as u16);
		}

		Ok(Self {
			names,
			types,
			tlen,
			structs,
			type_by_hash,
		})
	}

	/// Look up a type index by name.
	pub fn type_by_name(&self, name: &str) -> Option<u16> {
		self.type_by_hash(name_hash(name))
	}

	/// Look up a type index by name hash.
	pub fn type_by_hash(&self, hash: u64) -> Option<u16> {
		self.type_by_hash.get(&hash).copied()
	}

	/// Return the declared byte size of a type.
	pub fn type_size(&self, type_idx: u16) -> usize {
		self.tlen.get(type_idx as usize).copied().unwrap_or(0) as usize
	}

	/// Return type name by type index.
	pub fn type_name(&self, type_idx: u16) -> &str {
		&self.types[type_idx as usize].name
	}
}

fn expect_tag(cursor: &mut Cursor<'_>, expected: [u8; 4]) -> Result<()> {
	let at = cursor.pos();
	let got = cursor.read_code4()?;
	if got != expected {
		return Err(SchemaError::BadMagic { expected, got, at }.into());
	}
	Ok(())
}

fn read_count(cursor: &mut Cursor<'_>, endianness: Endianness, section: &'static str) -> Result<usize> {
	let count = cursor.read_u32(endianness)? as usize;
	if count > MAX_TABLE_ENTRIES {
		return Err(SchemaError::TooManyEntries {
			section,
			count,
			max: MAX_TABLE_ENTRIES,
		}
		.into());
	}
	Ok(count)
}

fn read_lossy_string(cursor: &mut Cursor<'_>) -> Result<String> {
	let bytes = cursor.read_cstring_bytes()?;
	Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn check_index(kind: &'static str, idx: u32, len: usize) -> Result<()> {
	if (idx as usize) >= len {
		return Err(SchemaError::IndexOutOfRange {
			kind,
			idx,
			max: len.saturating_sub(1) as u32,
		}
		.into());
	}
	Ok(())
}

#[cfg(test)]
mod tests;

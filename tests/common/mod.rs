#![allow(dead_code)]

use blendlink::blend::{Dna, Endianness, Schema};

/// Incremental schema-block builder for test fixtures.
pub struct SchemaBuilder {
	endianness: Endianness,
	names: Vec<String>,
	types: Vec<(String, u16)>,
	structs: Vec<(u16, Vec<(u16, u16)>)>,
}

impl SchemaBuilder {
	pub fn new(endianness: Endianness) -> Self {
		Self {
			endianness,
			names: Vec::new(),
			types: Vec::new(),
			structs: Vec::new(),
		}
	}

	/// Register a primitive type with its byte size.
	pub fn prim(&mut self, name: &str, size: u16) -> &mut Self {
		let _ = self.type_id(name, size);
		self
	}

	/// Override the declared size of an already registered type.
	pub fn set_size(&mut self, name: &str, size: u16) -> &mut Self {
		let _ = self.type_id(name, size);
		self
	}

	/// Register a struct with its declared size and `(type, declarator)` fields.
	pub fn add_struct(&mut self, name: &str, size: u16, fields: &[(&str, &str)]) -> &mut Self {
		let type_idx = self.type_id(name, size);
		let fields = fields
			.iter()
			.map(|(field_type, decl)| {
				let field_type_idx = self.type_id(field_type, 0);
				let name_idx = self.name_id(decl);
				(field_type_idx, name_idx)
			})
			.collect();
		self.structs.push((type_idx, fields));
		self
	}

	/// Serialize the four magic-tagged sections, with the leading block tag.
	pub fn build(&self) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend_from_slice(b"SDNA");

		out.extend_from_slice(b"NAME");
		self.put_u32(&mut out, self.names.len() as u32);
		for name in &self.names {
			out.extend_from_slice(name.as_bytes());
			out.push(0);
		}
		align4(&mut out);

		out.extend_from_slice(b"TYPE");
		self.put_u32(&mut out, self.types.len() as u32);
		for (name, _) in &self.types {
			out.extend_from_slice(name.as_bytes());
			out.push(0);
		}
		align4(&mut out);

		out.extend_from_slice(b"TLEN");
		for (_, size) in &self.types {
			self.put_u16(&mut out, *size);
		}
		align4(&mut out);

		out.extend_from_slice(b"STRC");
		self.put_u32(&mut out, self.structs.len() as u32);
		for (type_idx, fields) in &self.structs {
			self.put_u16(&mut out, *type_idx);
			self.put_u16(&mut out, fields.len() as u16);
			for (field_type_idx, name_idx) in fields {
				self.put_u16(&mut out, *field_type_idx);
				self.put_u16(&mut out, *name_idx);
			}
		}

		out
	}

	/// Parse and compile the built block for the given consumer/producer shape.
	pub fn compile(&self, pointer_size: usize) -> Schema {
		let dna = Dna::parse(&self.build(), self.endianness).expect("schema blob parses");
		Schema::compile(dna, pointer_size, self.endianness)
	}

	fn name_id(&mut self, name: &str) -> u16 {
		if let Some(pos) = self.names.iter().position(|existing| existing == name) {
			return pos as u16;
		}
		self.names.push(name.to_owned());
		(self.names.len() - 1) as u16
	}

	fn type_id(&mut self, name: &str, size: u16) -> u16 {
		if let Some(pos) = self.types.iter().position(|(existing, _)| existing == name) {
			if size != 0 {
				self.types[pos].1 = size;
			}
			return pos as u16;
		}
		self.types.push((name.to_owned(), size));
		(self.types.len() - 1) as u16
	}

	fn put_u16(&self, out: &mut Vec<u8>, value: u16) {
		out.extend_from_slice(&match self.endianness {
			Endianness::Little => value.to_le_bytes(),
			Endianness::Big => value.to_be_bytes(),
		});
	}

	fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
		out.extend_from_slice(&match self.endianness {
			Endianness::Little => value.to_le_bytes(),
			Endianness::Big => value.to_be_bytes(),
		});
	}
}

/// Chunk-stream builder for test fixtures.
pub struct StreamBuilder {
	pointer_size: usize,
	endianness: Endianness,
	bytes: Vec<u8>,
}

impl StreamBuilder {
	pub fn new(pointer_size: usize, endianness: Endianness, version: &str) -> Self {
		assert_eq!(version.len(), 3, "version is three ascii digits");
		let mut bytes = b"BLENDER".to_vec();
		bytes.push(if pointer_size == 8 { b'-' } else { b'_' });
		bytes.push(if endianness == Endianness::Little { b'v' } else { b'V' });
		bytes.extend_from_slice(version.as_bytes());
		Self {
			pointer_size,
			endianness,
			bytes,
		}
	}

	pub fn chunk(&mut self, code: [u8; 4], old: u64, struct_id: u32, count: u32, payload: &[u8]) -> &mut Self {
		self.bytes.extend_from_slice(&code);
		self.put_u32(payload.len() as u32);
		self.put_ptr(old);
		self.put_u32(struct_id);
		self.put_u32(count);
		self.bytes.extend_from_slice(payload);
		self
	}

	pub fn dna(&mut self, blob: &[u8]) -> &mut Self {
		self.chunk(*b"DNA1", 0, 0, 1, blob)
	}

	/// Append a schema block inline, without a chunk wrapper.
	pub fn raw_schema_tail(&mut self, blob: &[u8]) -> &mut Self {
		self.bytes.extend_from_slice(blob);
		self
	}

	pub fn end(&mut self) -> &mut Self {
		self.chunk(*b"ENDB", 0, 0, 0, &[])
	}

	pub fn finish(&self) -> Vec<u8> {
		self.bytes.clone()
	}

	fn put_u32(&mut self, value: u32) {
		self.bytes.extend_from_slice(&match self.endianness {
			Endianness::Little => value.to_le_bytes(),
			Endianness::Big => value.to_be_bytes(),
		});
	}

	fn put_ptr(&mut self, value: u64) {
		match (self.pointer_size, self.endianness) {
			(8, Endianness::Little) => self.bytes.extend_from_slice(&value.to_le_bytes()),
			(8, Endianness::Big) => self.bytes.extend_from_slice(&value.to_be_bytes()),
			(_, Endianness::Little) => self.bytes.extend_from_slice(&(value as u32).to_le_bytes()),
			(_, Endianness::Big) => self.bytes.extend_from_slice(&(value as u32).to_be_bytes()),
		}
	}
}

/// Struct-instance payload builder for test fixtures.
pub struct Payload {
	pointer_size: usize,
	endianness: Endianness,
	bytes: Vec<u8>,
}

impl Payload {
	pub fn new(pointer_size: usize, endianness: Endianness) -> Self {
		Self {
			pointer_size,
			endianness,
			bytes: Vec::new(),
		}
	}

	pub fn i16(mut self, value: i16) -> Self {
		self.push(&value.to_le_bytes(), &value.to_be_bytes());
		self
	}

	pub fn i32(mut self, value: i32) -> Self {
		self.push(&value.to_le_bytes(), &value.to_be_bytes());
		self
	}

	pub fn u32(mut self, value: u32) -> Self {
		self.push(&value.to_le_bytes(), &value.to_be_bytes());
		self
	}

	pub fn i64(mut self, value: i64) -> Self {
		self.push(&value.to_le_bytes(), &value.to_be_bytes());
		self
	}

	pub fn f32(mut self, value: f32) -> Self {
		self.push(&value.to_le_bytes(), &value.to_be_bytes());
		self
	}

	pub fn f64(mut self, value: f64) -> Self {
		self.push(&value.to_le_bytes(), &value.to_be_bytes());
		self
	}

	pub fn ptr(mut self, value: u64) -> Self {
		if self.pointer_size == 8 {
			self.push(&value.to_le_bytes(), &value.to_be_bytes());
		} else {
			self.push(&(value as u32).to_le_bytes(), &(value as u32).to_be_bytes());
		}
		self
	}

	pub fn bytes(mut self, raw: &[u8]) -> Self {
		self.bytes.extend_from_slice(raw);
		self
	}

	pub fn zeros(mut self, count: usize) -> Self {
		self.bytes.extend(std::iter::repeat_n(0_u8, count));
		self
	}

	pub fn build(self) -> Vec<u8> {
		self.bytes
	}

	fn push(&mut self, le: &[u8], be: &[u8]) {
		match self.endianness {
			Endianness::Little => self.bytes.extend_from_slice(le),
			Endianness::Big => self.bytes.extend_from_slice(be),
		}
	}
}

fn align4(out: &mut Vec<u8>) {
	while out.len() % 4 != 0 {
		out.push(0);
	}
}

/// Read a native-order `i32` field out of resolved object data.
pub fn read_i32(data: &[u8], offset: usize) -> i32 {
	i32::from_ne_bytes(data[offset..offset + 4].try_into().expect("field in range"))
}

/// Read a native-order `f32` field out of resolved object data.
pub fn read_f32(data: &[u8], offset: usize) -> f32 {
	f32::from_ne_bytes(data[offset..offset + 4].try_into().expect("field in range"))
}

use crate::blend::dna::Dna;
use crate::blend::{Endianness, name_hash};

/// Embedded-struct expansion ceiling; deeper nesting is kept opaque.
const MAX_EMBED_DEPTH: u16 = 16;

/// One (type hash, base-name hash) step on a member's path through
/// embedded structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberKey {
	/// Hash of the embedding member's type name.
	pub type_hash: u64,
	/// Hash of the embedding member's base identifier.
	pub name_hash: u64,
}

/// One flattened member of a compiled struct layout.
#[derive(Debug, Clone)]
pub struct MemberLayout {
	/// Type table index of the member type.
	pub type_idx: u16,
	/// Name table index of the member declarator.
	pub name_idx: u16,
	/// Byte offset from the start of the outer struct.
	pub offset: usize,
	/// Flattened array element count.
	pub count: usize,
	/// Bytes per element (pointer width for pointer members).
	pub elem_size: usize,
	/// Pointer nesting depth.
	pub ptr_depth: u8,
	/// Whether the member is a function pointer.
	pub is_func_ptr: bool,
	/// Embedded-struct nesting depth (0 for direct members).
	pub depth: u16,
	/// Element index when the member came from an embedded struct array.
	pub array_idx: u32,
	/// Path through embedded structs, outermost first.
	pub chain: Box<[MemberKey]>,
	/// Hash of the member's type name.
	pub type_hash: u64,
	/// Hash of the member's base identifier.
	pub base_hash: u64,
}

impl MemberLayout {
	/// Total bytes the member occupies.
	pub fn total_size(&self) -> usize {
		self.elem_size * self.count
	}
}

/// One fully laid-out struct: flattened members with computed offsets.
#[derive(Debug, Clone)]
pub struct StructLayout {
	/// Type table index naming this struct.
	pub type_idx: u16,
	/// Index of the raw struct definition this layout was compiled from.
	pub strc_idx: u32,
	/// Declared struct size from the type-length table.
	pub size: usize,
	/// Size reached by summing flattened members.
	pub computed_size: usize,
	/// Declared and computed sizes disagree; the struct stays usable.
	pub misaligned: bool,
	/// Flattened members in offset order.
	pub members: Vec<MemberLayout>,
}

impl StructLayout {
	/// Find the first member whose base identifier is `base`.
	pub fn member_named(&self, base: &str) -> Option<&MemberLayout> {
		let hash = name_hash(base);
		self.members.iter().find(|member| member.base_hash == hash)
	}
}

/// Schema tables compiled into per-struct member layouts.
///
/// Offsets depend on the producer's pointer width, so the same tables
/// compile differently for a 4-byte and an 8-byte producer.
#[derive(Debug)]
pub struct Schema {
	/// Parsed schema tables.
	pub dna: Dna,
	/// Compiled layouts, parallel to `dna.structs`.
	pub layouts: Vec<StructLayout>,
	/// Pointer width the layouts were computed with.
	pub pointer_size: usize,
	/// Byte order of data described by this schema.
	pub endianness: Endianness,
}

impl Schema {
	/// Compile every struct definition into a flattened layout.
	pub fn compile(dna: Dna, pointer_size: usize, endianness: Endianness) -> Self {
		let layouts = (0..dna.structs.len()).map(|idx| compile_struct(&dna, idx, pointer_size)).collect();
		Self {
			dna,
			layouts,
			pointer_size,
			endianness,
		}
	}

	/// Return the layout at `idx`, if valid.
	pub fn layout(&self, idx: u32) -> Option<&StructLayout> {
		self.layouts.get(idx as usize)
	}

	/// Look up a struct layout index by type-name hash.
	pub fn layout_idx_by_type_hash(&self, hash: u64) -> Option<u32> {
		let type_idx = self.dna.type_by_hash(hash)?;
		self.dna.types[type_idx as usize].struct_idx
	}

	/// Look up a struct layout by type name.
	pub fn layout_by_name(&self, name: &str) -> Option<&StructLayout> {
		let idx = self.layout_idx_by_type_hash(name_hash(name))?;
		self.layout(idx)
	}
}

fn compile_struct(dna: &Dna, strc_idx: usize, pointer_size: usize) -> StructLayout {
	struct Frame {
		strc: usize,
		field: usize,
		cursor: usize,
		depth: u16,
		chain: Vec<MemberKey>,
		array_idx: u32,
	}

	let declared = dna.type_size(dna.structs[strc_idx].type_idx);
	let mut members = Vec::with_capacity(dna.structs[strc_idx].fields.len());
	let mut computed = 0_usize;

	let mut stack = vec![Frame {
		strc: strc_idx,
		field: 0,
		cursor: 0,
		depth: 0,
		chain: Vec::new(),
		array_idx: 0,
	}];

	while let Some(mut frame) = stack.pop() {
		let raw = &dna.structs[frame.strc];
		if frame.field >= raw.fields.len() {
			if stack.is_empty() {
				computed = frame.cursor;
			}
			continue;
		}

		let field = raw.fields[frame.field];
		frame.field += 1;

		let name = &dna.names[field.name_idx as usize];
		let ty = &dna.types[field.type_idx as usize];
		let count = name.count;
		let is_ptr = name.ptr_depth > 0 || name.is_func_ptr;

		if !is_ptr {
			if let Some(child) = ty.struct_idx {
				if frame.depth < MAX_EMBED_DEPTH {
					// Expand the embedded struct in place, one frame per
					// array element so offsets and array indices line up.
					let child_size = dna.type_size(field.type_idx);
					let base = frame.cursor;
					frame.cursor += child_size * count;

					let mut chain = frame.chain.clone();
					chain.push(MemberKey {
						type_hash: ty.hash,
						name_hash: name.base_hash,
					});
					let depth = frame.depth + 1;
					let strc = child as usize;

					stack.push(frame);
					for idx in (0..count).rev() {
						stack.push(Frame {
							strc,
							field: 0,
							cursor: base + idx * child_size,
							depth,
							chain: chain.clone(),
							array_idx: idx as u32,
						});
					}
					continue;
				}
			}
		}

		let elem_size = if is_ptr { pointer_size } else { dna.type_size(field.type_idx) };
		members.push(MemberLayout {
			type_idx: field.type_idx,
			name_idx: field.name_idx,
			offset: frame.cursor,
			count,
			elem_size,
			ptr_depth: name.ptr_depth,
			is_func_ptr: name.is_func_ptr,
			depth: frame.depth,
			array_idx: frame.array_idx,
			chain: frame.chain.clone().into_boxed_slice(),
			type_hash: ty.hash,
			base_hash: name.base_hash,
		});
		frame.cursor += elem_size * count;
		stack.push(frame);
	}

	StructLayout {
		type_idx: dna.structs[strc_idx].type_idx,
		strc_idx: strc_idx as u32,
		size: declared,
		computed_size: computed,
		misaligned: computed != declared,
		members,
	}
}

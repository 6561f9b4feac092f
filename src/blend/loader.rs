use std::io::SeekFrom;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::blend::bytes::{Cursor, read_ptr_at, swap_elements};
use crate::blend::cast::{classify, read_as_f64, write_from_f64};
use crate::blend::chunk::ChunkHead;
use crate::blend::dna::Dna;
use crate::blend::graph::{Graph, NULL_HANDLE, ObjectId, ObjectKind, ResolvedObject, handle_for};
use crate::blend::layout::{MemberLayout, Schema};
use crate::blend::link::{SchemaLink, link_schemas};
use crate::blend::registry::installed_reference;
use crate::blend::stream::{Compression, Stream, open_source, read_exact, source_from_bytes};
use crate::blend::{Endianness, LoadError, Result, StreamHeader, name_hash};

/// Caller policy for one load.
#[derive(Debug, Default, Clone)]
pub struct LoadOptions {
	/// Foreign struct type names excluded from allocation.
	///
	/// Pointers at instances of a skipped type resolve to null; nothing
	/// else is affected.
	pub skip_types: Vec<String>,
}

/// Chunk-stream loader bound to a reference schema.
pub struct FileLoader<'r> {
	reference: &'r Schema,
	options: LoadOptions,
}

impl<'r> FileLoader<'r> {
	/// Create a loader with default options.
	pub fn new(reference: &'r Schema) -> Self {
		Self {
			reference,
			options: LoadOptions::default(),
		}
	}

	/// Create a loader with explicit options.
	pub fn with_options(reference: &'r Schema, options: LoadOptions) -> Self {
		Self { reference, options }
	}

	/// Parse an entire stream into a relinked graph.
	pub fn parse(&self, stream: &mut dyn Stream, compression: Compression) -> Result<Graph> {
		let mut header_bytes = [0_u8; StreamHeader::SIZE];
		read_exact(stream, &mut header_bytes)?;
		let header = StreamHeader::parse(&header_bytes)?;

		let mut slots: Vec<Slot> = Vec::new();
		let mut by_old: FxHashMap<u64, u32> = FxHashMap::default();
		let schema_bytes = enumerate_chunks(stream, header, &mut slots, &mut by_old)?;

		let foreign_dna = Dna::parse(&schema_bytes, header.endianness)?;
		let foreign = Schema::compile(foreign_dna, header.pointer_size, header.endianness);
		let link = link_schemas(self.reference, &foreign);

		let skip: FxHashSet<u64> = self.options.skip_types.iter().map(|name| name_hash(name)).collect();

		// Pass 1: size and allocate reference-shaped storage.
		let mut next_object: ObjectId = 0;
		for slot in &mut slots {
			let foreign_layout = foreign.layout(slot.head.struct_id);
			let linked = foreign_layout.and_then(|_| link.ref_for_foreign[slot.head.struct_id as usize]);
			let skipped = foreign_layout
				.map(|layout| skip.contains(&foreign.dna.types[layout.type_idx as usize].hash))
				.unwrap_or(false);

			match linked {
				Some(ref_idx) if !skipped => {
					// The payload can hold at most len / foreign_size
					// elements; a count past that is hostile or corrupt and
					// gets clamped before it sizes the allocation.
					let foreign_size = foreign.layouts[slot.head.struct_id as usize].size;
					let staged_len = slot.staged.as_ref().map_or(0, Vec::len);
					let count = if foreign_size == 0 {
						0
					} else {
						(slot.head.count as usize).min(staged_len / foreign_size)
					};

					let size = self.reference.layouts[ref_idx as usize].size;
					let bytes = size.checked_mul(count).ok_or(LoadError::Allocation { bytes: usize::MAX })?;
					slot.resolved = Some(alloc_zeroed(bytes)?);
					slot.ref_struct = Some(ref_idx);
					slot.count = count;
					slot.object = Some(next_object);
					next_object += 1;
				}
				_ => {
					// Unlinked or filtered out: every reference to this
					// address resolves to null.
					slot.staged = None;
					slot.state = SlotState::Resolved;
				}
			}
		}

		// Pass 2: member-wise copy, cast, and pointer rewrite.
		let ctx = Ctx {
			reference: self.reference,
			foreign: &foreign,
			link: &link,
			swap: foreign.endianness != Endianness::native(),
		};
		for idx in 0..slots.len() {
			resolve_slot(&ctx, &mut slots, &by_old, &mut next_object, idx);
		}

		Ok(build_graph(header, compression, &link, slots))
	}
}

/// Load a stream from a path against an explicit reference schema.
pub fn load(path: impl AsRef<Path>, reference: &Schema, options: &LoadOptions) -> Result<Graph> {
	let (compression, mut stream) = open_source(path)?;
	FileLoader::with_options(reference, options.clone()).parse(stream.as_mut(), compression)
}

/// Load a stream from raw bytes against an explicit reference schema.
pub fn load_bytes(bytes: Vec<u8>, reference: &Schema, options: &LoadOptions) -> Result<Graph> {
	let (compression, mut stream) = source_from_bytes(bytes)?;
	FileLoader::with_options(reference, options.clone()).parse(&mut stream, compression)
}

/// Load a stream from a path against the installed reference schema.
pub fn load_installed(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Graph> {
	let reference = installed_reference().ok_or(LoadError::ReferenceMissing)?;
	load(path, reference, options)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
	Staged,
	Resolving,
	Resolved,
}

struct Slot {
	head: ChunkHead,
	staged: Option<Vec<u8>>,
	resolved: Option<Vec<u8>>,
	ref_struct: Option<u32>,
	object: Option<ObjectId>,
	ptr_array: Option<(ObjectId, Vec<u8>)>,
	count: usize,
	state: SlotState,
}

struct Ctx<'a> {
	reference: &'a Schema,
	foreign: &'a Schema,
	link: &'a SchemaLink,
	swap: bool,
}

fn enumerate_chunks(
	stream: &mut dyn Stream,
	header: StreamHeader,
	slots: &mut Vec<Slot>,
	by_old: &mut FxHashMap<u64, u32>,
) -> Result<Vec<u8>> {
	let head_size = ChunkHead::size_on_wire(header.pointer_size);
	let mut head_buf = [0_u8; 24];

	loop {
		if stream.eof() {
			return Err(LoadError::SchemaMissing);
		}

		let at = stream.position();
		read_exact(stream, &mut head_buf[..head_size])?;
		let head = ChunkHead::parse(&mut Cursor::new(&head_buf[..head_size]), header.pointer_size, header.endianness)?;

		if head.is_end() {
			return Err(LoadError::SchemaMissing);
		}

		if head.is_raw_schema() {
			// The schema block appears inline without a chunk wrapper: its
			// leading section tag was just consumed as the code. Everything
			// from there to the end of the stream is the block.
			let _ = stream.seek(SeekFrom::Start(at + 4))?;
			let rem = stream.size().saturating_sub(stream.position());
			let mut block = alloc_zeroed(rem as usize)?;
			read_exact(stream, &mut block)?;
			return Ok(block);
		}

		let rem = stream.size().saturating_sub(stream.position());
		if head.len > rem {
			return Err(LoadError::ChunkLenOutOfRange {
				at,
				len: head.len,
				rem,
			});
		}
		let len = usize::try_from(head.len).map_err(|_| LoadError::ChunkLenOutOfRange {
			at,
			len: head.len,
			rem,
		})?;

		let mut payload = alloc_zeroed(len)?;
		read_exact(stream, &mut payload)?;

		if head.is_schema() {
			return Ok(payload);
		}

		if head.old != 0 && by_old.contains_key(&head.old) {
			// Repeated address: first occurrence wins, the rest is dropped.
			continue;
		}

		let idx = slots.len() as u32;
		if head.old != 0 {
			by_old.insert(head.old, idx);
		}
		slots.push(Slot {
			head,
			staged: Some(payload),
			resolved: None,
			ref_struct: None,
			object: None,
			ptr_array: None,
			count: 0,
			state: SlotState::Staged,
		});
	}
}

fn resolve_slot(ctx: &Ctx<'_>, slots: &mut [Slot], by_old: &FxHashMap<u64, u32>, next_object: &mut ObjectId, idx: usize) {
	let (slot_count, ref_idx, staged, mut out) = {
		let slot = &mut slots[idx];
		if slot.state != SlotState::Staged {
			return;
		}
		slot.state = SlotState::Resolving;

		let Some(ref_idx) = slot.ref_struct else {
			slot.state = SlotState::Resolved;
			return;
		};
		let (Some(staged), Some(out)) = (slot.staged.take(), slot.resolved.take()) else {
			slot.state = SlotState::Resolved;
			return;
		};
		(slot.count, ref_idx, staged, out)
	};

	let ref_layout = &ctx.reference.layouts[ref_idx as usize];
	if let Some(slink) = ctx.link.by_ref_struct[ref_idx as usize].as_ref() {
		let foreign_layout = &ctx.foreign.layouts[slink.foreign as usize];
		let r_size = ref_layout.size;
		let f_size = foreign_layout.size;
		let count = if r_size == 0 || f_size == 0 {
			0
		} else {
			slot_count.min(staged.len() / f_size).min(out.len() / r_size)
		};

		for elem in 0..count {
			let src_base = elem * f_size;
			let dst_base = elem * r_size;

			for (member_idx, mlink) in slink.members.iter().enumerate() {
				let Some(fm_idx) = mlink.foreign else {
					continue;
				};
				let rm = &ref_layout.members[member_idx];
				let fm = &foreign_layout.members[fm_idx as usize];
				if rm.is_func_ptr {
					// Function pointers cannot survive a reload; stay null.
					continue;
				}

				let src = src_base + fm.offset;
				let dst = dst_base + rm.offset;
				if rm.ptr_depth > 0 {
					relink_pointers(ctx, slots, by_old, next_object, &staged, &mut out, rm, fm, src, dst);
				} else if mlink.needs_cast {
					cast_member(ctx, &staged, &mut out, rm, fm, src, dst);
				} else {
					copy_member(ctx, &staged, &mut out, rm, fm, src, dst);
				}
			}
		}
	}

	let slot = &mut slots[idx];
	slot.staged = Some(staged);
	slot.resolved = Some(out);
	slot.state = SlotState::Resolved;
}

#[allow(clippy::too_many_arguments)]
fn relink_pointers(
	ctx: &Ctx<'_>,
	slots: &mut [Slot],
	by_old: &FxHashMap<u64, u32>,
	next_object: &mut ObjectId,
	staged: &[u8],
	out: &mut [u8],
	rm: &MemberLayout,
	fm: &MemberLayout,
	src: usize,
	dst: usize,
) {
	let fptr = ctx.foreign.pointer_size;
	let count = rm.count.min(fm.count);

	for slot_idx in 0..count {
		let Some(addr) = staged.get(src + slot_idx * fptr..).and_then(|bytes| read_ptr_at(bytes, fptr, ctx.foreign.endianness)) else {
			break;
		};

		let handle = if addr == 0 {
			NULL_HANDLE
		} else if rm.ptr_depth > 1 {
			resolve_pointer_array(ctx, slots, by_old, next_object, addr)
		} else {
			resolve_target(ctx, slots, by_old, next_object, addr)
		};

		let start = dst + slot_idx * 8;
		let Some(dst_bytes) = out.get_mut(start..start + 8) else {
			break;
		};
		dst_bytes.copy_from_slice(&handle.to_ne_bytes());
	}
}

/// Resolve the chunk behind `addr` (on demand if necessary) and return its
/// handle, or null when the address is unknown or the chunk was dropped.
fn resolve_target(ctx: &Ctx<'_>, slots: &mut [Slot], by_old: &FxHashMap<u64, u32>, next_object: &mut ObjectId, addr: u64) -> u64 {
	let Some(&target) = by_old.get(&addr) else {
		return NULL_HANDLE;
	};
	let target = target as usize;

	if slots[target].state == SlotState::Staged {
		resolve_slot(ctx, slots, by_old, next_object, target);
	}
	slots[target].object.map(handle_for).unwrap_or(NULL_HANDLE)
}

/// Reinterpret the chunk behind `addr` as a flat array of producer
/// addresses and resolve it, once, into an array of handles.
fn resolve_pointer_array(ctx: &Ctx<'_>, slots: &mut [Slot], by_old: &FxHashMap<u64, u32>, next_object: &mut ObjectId, addr: u64) -> u64 {
	let Some(&target) = by_old.get(&addr) else {
		return NULL_HANDLE;
	};
	let target = target as usize;

	if let Some((id, _)) = slots[target].ptr_array {
		return handle_for(id);
	}

	let fptr = ctx.foreign.pointer_size;
	let addrs: Vec<u64> = match slots[target].staged.as_ref() {
		Some(staged) => staged
			.chunks_exact(fptr)
			.map(|bytes| read_ptr_at(bytes, fptr, ctx.foreign.endianness).unwrap_or(0))
			.collect(),
		None => return NULL_HANDLE,
	};

	let mut data = Vec::with_capacity(addrs.len() * 8);
	for entry in addrs {
		let handle = if entry == 0 {
			NULL_HANDLE
		} else {
			resolve_target(ctx, slots, by_old, next_object, entry)
		};
		data.extend_from_slice(&handle.to_ne_bytes());
	}

	let id = *next_object;
	*next_object += 1;
	slots[target].ptr_array = Some((id, data));
	handle_for(id)
}

fn cast_member(
	ctx: &Ctx<'_>,
	staged: &[u8],
	out: &mut [u8],
	rm: &MemberLayout,
	fm: &MemberLayout,
	src: usize,
	dst: usize,
) {
	let Some(foreign_scalar) = classify(ctx.foreign.dna.type_name(fm.type_idx), fm.elem_size) else {
		return;
	};
	let Some(ref_scalar) = classify(ctx.reference.dna.type_name(rm.type_idx), rm.elem_size) else {
		return;
	};

	let count = rm.count.min(fm.count);
	for elem in 0..count {
		let Some(src_bytes) = staged.get(src + elem * fm.elem_size..) else {
			break;
		};
		let Some(value) = read_as_f64(foreign_scalar, src_bytes, ctx.foreign.endianness) else {
			break;
		};
		let Some(dst_bytes) = out.get_mut(dst + elem * rm.elem_size..) else {
			break;
		};
		if write_from_f64(ref_scalar, value, dst_bytes).is_none() {
			break;
		}
	}
}

fn copy_member(
	ctx: &Ctx<'_>,
	staged: &[u8],
	out: &mut [u8],
	rm: &MemberLayout,
	fm: &MemberLayout,
	src: usize,
	dst: usize,
) {
	if fm.elem_size == rm.elem_size {
		let total = rm.total_size().min(fm.total_size());
		let Some(src_bytes) = staged.get(src..src + total) else {
			return;
		};
		let Some(dst_bytes) = out.get_mut(dst..dst + total) else {
			return;
		};
		dst_bytes.copy_from_slice(src_bytes);
		if ctx.swap {
			swap_elements(dst_bytes, fm.elem_size);
		}
		return;
	}

	// Same-family scalars of different widths: truncating per-element copy,
	// matching the historical loader rather than a value-preserving cast.
	let count = rm.count.min(fm.count);
	let take = rm.elem_size.min(fm.elem_size);
	for elem in 0..count {
		let s = src + elem * fm.elem_size;
		let d = dst + elem * rm.elem_size;
		let Some(src_el) = staged.get(s..s + fm.elem_size) else {
			break;
		};
		let Some(dst_el) = out.get_mut(d..d + rm.elem_size) else {
			break;
		};

		if ctx.swap && fm.elem_size <= 8 {
			let mut tmp = [0_u8; 8];
			tmp[..fm.elem_size].copy_from_slice(src_el);
			tmp[..fm.elem_size].reverse();
			dst_el[..take].copy_from_slice(&tmp[..take]);
		} else {
			dst_el[..take].copy_from_slice(&src_el[..take]);
		}
	}
}

fn build_graph(header: StreamHeader, compression: Compression, link: &SchemaLink, slots: Vec<Slot>) -> Graph {
	let mut graph = Graph::new(header, compression, link.stats.clone());
	let mut arrays: Vec<(ObjectId, ResolvedObject)> = Vec::new();

	for mut slot in slots {
		if slot.object.is_some() {
			let count = slot.count;
			let id = graph.push(ResolvedObject {
				code: slot.head.code,
				old: slot.head.old,
				struct_id: slot.head.struct_id,
				ref_struct: slot.ref_struct,
				count,
				kind: ObjectKind::Struct,
				data: slot.resolved.take().unwrap_or_default(),
			});
			graph.route(id);
		}

		if let Some((id, data)) = slot.ptr_array.take() {
			arrays.push((
				id,
				ResolvedObject {
					code: slot.head.code,
					old: slot.head.old,
					struct_id: slot.head.struct_id,
					ref_struct: None,
					count: data.len() / 8,
					kind: ObjectKind::PointerArray,
					data,
				},
			));
		}
	}

	arrays.sort_by_key(|(id, _)| *id);
	for (_, object) in arrays {
		let _ = graph.push(object);
	}

	graph
}

fn alloc_zeroed(bytes: usize) -> Result<Vec<u8>> {
	let mut out = Vec::new();
	out.try_reserve_exact(bytes).map_err(|_| LoadError::Allocation { bytes })?;
	out.resize(bytes, 0);
	Ok(out)
}

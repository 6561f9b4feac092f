use crate::blend::chunk::CODE_GLOB;
use crate::blend::link::LinkStats;
use crate::blend::stream::Compression;
use crate::blend::{Endianness, StreamHeader};

/// Scene record tag.
pub const CODE_SCENE: [u8; 4] = *b"SC\0\0";
/// Object record tag.
pub const CODE_OBJECT: [u8; 4] = *b"OB\0\0";
/// Mesh record tag.
pub const CODE_MESH: [u8; 4] = *b"ME\0\0";
/// Material record tag.
pub const CODE_MATERIAL: [u8; 4] = *b"MA\0\0";
/// Texture record tag.
pub const CODE_TEXTURE: [u8; 4] = *b"TE\0\0";
/// Image record tag.
pub const CODE_IMAGE: [u8; 4] = *b"IM\0\0";
/// Camera record tag.
pub const CODE_CAMERA: [u8; 4] = *b"CA\0\0";
/// Light record tag.
pub const CODE_LIGHT: [u8; 4] = *b"LA\0\0";
/// World record tag.
pub const CODE_WORLD: [u8; 4] = *b"WO\0\0";
/// Screen record tag.
pub const CODE_SCREEN: [u8; 4] = *b"SR\0\0";
/// Text record tag.
pub const CODE_TEXT: [u8; 4] = *b"TX\0\0";
/// Library record tag.
pub const CODE_LIBRARY: [u8; 4] = *b"LI\0\0";

/// Index of one resolved object in the graph arena.
pub type ObjectId = u32;

/// Null pointer-handle value.
pub const NULL_HANDLE: u64 = 0;

/// Encode an arena slot as an opaque pointer handle.
pub fn handle_for(id: ObjectId) -> u64 {
	u64::from(id) + 1
}

/// Resolution category of one graph object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
	/// Reference-shaped struct instances.
	Struct,
	/// A flat array of pointer handles, from a double-indirection member.
	PointerArray,
}

/// One relinked record in the output graph.
#[derive(Debug)]
pub struct ResolvedObject {
	/// Four-byte record tag from the stream.
	pub code: [u8; 4],
	/// Producer-side address the record was keyed by.
	pub old: u64,
	/// Foreign struct index from the stream.
	pub struct_id: u32,
	/// Matched reference layout index; `None` for pointer arrays.
	pub ref_struct: Option<u32>,
	/// Element count.
	pub count: usize,
	/// Resolution category.
	pub kind: ObjectKind,
	pub(crate) data: Vec<u8>,
}

impl ResolvedObject {
	/// Reference-shaped payload bytes.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Read the pointer handle stored at `offset`.
	pub fn handle_at(&self, offset: usize) -> Option<u64> {
		let raw: [u8; 8] = self.data.get(offset..offset + 8)?.try_into().ok()?;
		Some(u64::from_ne_bytes(raw))
	}
}

/// Typed per-tag collections routed by the dispatch table.
///
/// Insertion order is stream order. Records with tags outside the table
/// stay reachable through the arena and pointer handles, they just are
/// not listed.
#[derive(Debug, Default)]
pub struct TypedLists {
	/// `SC` records.
	pub scenes: Vec<ObjectId>,
	/// `OB` records.
	pub objects: Vec<ObjectId>,
	/// `ME` records.
	pub meshes: Vec<ObjectId>,
	/// `MA` records.
	pub materials: Vec<ObjectId>,
	/// `TE` records.
	pub textures: Vec<ObjectId>,
	/// `IM` records.
	pub images: Vec<ObjectId>,
	/// `CA` records.
	pub cameras: Vec<ObjectId>,
	/// `LA` records.
	pub lights: Vec<ObjectId>,
	/// `WO` records.
	pub worlds: Vec<ObjectId>,
	/// `SR` records.
	pub screens: Vec<ObjectId>,
	/// `TX` records.
	pub texts: Vec<ObjectId>,
	/// `LI` records.
	pub libraries: Vec<ObjectId>,
}

impl TypedLists {
	fn list_for(&mut self, code: [u8; 4]) -> Option<&mut Vec<ObjectId>> {
		match code {
			CODE_SCENE => Some(&mut self.scenes),
			CODE_OBJECT => Some(&mut self.objects),
			CODE_MESH => Some(&mut self.meshes),
			CODE_MATERIAL => Some(&mut self.materials),
			CODE_TEXTURE => Some(&mut self.textures),
			CODE_IMAGE => Some(&mut self.images),
			CODE_CAMERA => Some(&mut self.cameras),
			CODE_LIGHT => Some(&mut self.lights),
			CODE_WORLD => Some(&mut self.worlds),
			CODE_SCREEN => Some(&mut self.screens),
			CODE_TEXT => Some(&mut self.texts),
			CODE_LIBRARY => Some(&mut self.libraries),
			_ => None,
		}
	}
}

/// Fully relinked result graph.
#[derive(Debug)]
pub struct Graph {
	/// Parsed stream header.
	pub header: StreamHeader,
	/// Compression detected on the source.
	pub compression: Compression,
	/// Schema reconciliation counters.
	pub stats: LinkStats,
	/// Typed per-tag collections.
	pub lists: TypedLists,
	objects: Vec<ResolvedObject>,
	anchor: Option<ObjectId>,
}

impl Graph {
	pub(crate) fn new(header: StreamHeader, compression: Compression, stats: LinkStats) -> Self {
		Self {
			header,
			compression,
			stats,
			lists: TypedLists::default(),
			objects: Vec::new(),
			anchor: None,
		}
	}

	/// Append an object; its id must equal the running arena length.
	pub(crate) fn push(&mut self, object: ResolvedObject) -> ObjectId {
		let id = self.objects.len() as ObjectId;
		self.objects.push(object);
		id
	}

	/// Route an object into its typed collection or the anchor slot.
	pub(crate) fn route(&mut self, id: ObjectId) {
		let Some(object) = self.objects.get(id as usize) else {
			return;
		};
		let code = object.code;
		if code == CODE_GLOB {
			self.anchor = Some(id);
		} else if let Some(list) = self.lists.list_for(code) {
			list.push(id);
		}
	}

	/// Number of objects in the arena.
	pub fn len(&self) -> usize {
		self.objects.len()
	}

	/// Whether the arena is empty.
	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	/// All resolved objects in id order.
	pub fn objects(&self) -> &[ResolvedObject] {
		&self.objects
	}

	/// Return an object by id.
	pub fn get(&self, id: ObjectId) -> Option<&ResolvedObject> {
		self.objects.get(id as usize)
	}

	/// Map a stored pointer handle back to its target object id.
	pub fn deref(&self, handle: u64) -> Option<ObjectId> {
		if handle == NULL_HANDLE {
			return None;
		}
		let id = ObjectId::try_from(handle - 1).ok()?;
		(usize::try_from(id).ok()? < self.objects.len()).then_some(id)
	}

	/// Return the anchor record, if the stream carried one.
	pub fn anchor(&self) -> Option<&ResolvedObject> {
		self.anchor.and_then(|id| self.get(id))
	}

	/// Producer byte order recorded in the header.
	pub fn endianness(&self) -> Endianness {
		self.header.endianness
	}
}

mod bytes;
mod cast;
mod chunk;
mod decl;
mod dna;
mod error;
mod graph;
mod hash;
mod header;
mod layout;
mod link;
mod loader;
mod registry;
mod stream;

/// Scalar classification used by the copy/cast engine.
pub use cast::{Scalar, classify};
/// Chunk record header and reserved stream codes.
pub use chunk::{CODE_DNA1, CODE_ENDB, CODE_GLOB, CODE_SDNA, ChunkHead};
/// Schema table parsing types.
pub use dna::{Dna, MAX_TABLE_ENTRIES, NameEntry, RawField, RawStruct, TypeEntry};
/// Error and result aliases.
pub use error::{HeaderError, LoadError, Result, SchemaError};
/// Result graph, arena objects, handles, and typed dispatch lists.
pub use graph::{
	CODE_CAMERA, CODE_IMAGE, CODE_LIBRARY, CODE_LIGHT, CODE_MATERIAL, CODE_MESH, CODE_OBJECT, CODE_SCENE, CODE_SCREEN, CODE_TEXT,
	CODE_TEXTURE, CODE_WORLD, Graph, NULL_HANDLE, ObjectId, ObjectKind, ResolvedObject, TypedLists, handle_for,
};
/// Stable name/type hashing used for cross-version matching.
pub use hash::name_hash;
/// Stream header representation and accepted magics.
pub use header::{Endianness, MAGIC, MAGIC_STRIPPED, StreamHeader};
/// Compiled struct layout types.
pub use layout::{MemberKey, MemberLayout, Schema, StructLayout};
/// Schema reconciliation types and entry point.
pub use link::{LinkStats, MemberLink, SchemaLink, StructLink, link_schemas};
/// Loader types and load entry points.
pub use loader::{FileLoader, LoadOptions, load, load_bytes, load_installed};
/// Process-wide reference schema service.
pub use registry::{REFERENCE_POINTER_SIZE, compile_reference, install_reference, installed_reference};
/// Stream transports and compression handling.
pub use stream::{Compression, FileStream, MemoryStream, Stream, ZSTD_MAGIC, open_source, source_from_bytes};

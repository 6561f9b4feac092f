#![allow(missing_docs)]

mod common;

use blendlink::blend::{Compression, Endianness, ObjectKind, Schema, load_bytes};
use common::{Payload, SchemaBuilder, StreamBuilder, read_f32, read_i32};

fn build_schema() -> SchemaBuilder {
	let mut builder = SchemaBuilder::new(Endianness::Little);
	builder
		.prim("char", 1)
		.prim("int", 4)
		.prim("float", 4)
		.add_struct("FileGlobal", 12, &[("int", "build"), ("int", "minversion"), ("float", "gravity")])
		.add_struct("Object", 24, &[("int", "id"), ("float", "scale[3]"), ("char", "name[8]")]);
	builder
}

fn build_stream(builder: &SchemaBuilder) -> Vec<u8> {
	let glob = Payload::new(8, Endianness::Little).i32(101).i32(42).f32(9.81).build();
	let suzanne = Payload::new(8, Endianness::Little)
		.i32(11)
		.f32(1.0)
		.f32(2.0)
		.f32(3.0)
		.bytes(b"suzanne\0")
		.build();
	let cube = Payload::new(8, Endianness::Little)
		.i32(12)
		.f32(0.5)
		.f32(0.5)
		.f32(0.5)
		.bytes(b"cube\0\0\0\0")
		.build();
	let stray = Payload::new(8, Endianness::Little).i32(99).f32(0.0).f32(0.0).f32(0.0).bytes(b"stray\0\0\0").build();

	let mut stream = StreamBuilder::new(8, Endianness::Little, "279");
	stream
		.chunk(*b"GLOB", 0x500, 0, 1, &glob)
		.chunk(*b"OB\0\0", 0x600, 1, 1, &suzanne)
		.chunk(*b"OB\0\0", 0x700, 1, 1, &cube)
		.chunk(*b"XX\0\0", 0x800, 1, 1, &stray)
		.dna(&builder.build())
		.end();
	stream.finish()
}

fn assert_identity(reference: &Schema, graph: &blendlink::blend::Graph) {
	assert_eq!(graph.header.version, 279);
	assert_eq!(graph.header.pointer_size, 8);
	assert_eq!(graph.header.endianness, Endianness::Little);

	assert_eq!(graph.stats.structs_linked, 2);
	assert_eq!(graph.stats.structs_missing, 0);
	assert_eq!(graph.stats.members_missing, 0);
	assert_eq!(graph.stats.members_cast, 0);

	let glob_layout = reference.layout_by_name("FileGlobal").expect("FileGlobal layout");
	let anchor = graph.anchor().expect("anchor record present");
	assert_eq!(anchor.kind, ObjectKind::Struct);
	assert_eq!(read_i32(anchor.data(), glob_layout.member_named("build").expect("build").offset), 101);
	assert_eq!(read_i32(anchor.data(), glob_layout.member_named("minversion").expect("minversion").offset), 42);
	assert_eq!(read_f32(anchor.data(), glob_layout.member_named("gravity").expect("gravity").offset), 9.81);

	// two OB records, stream order; the unknown XX tag resolves but is unlisted
	assert_eq!(graph.lists.objects.len(), 2);
	assert_eq!(graph.len(), 4);

	let object_layout = reference.layout_by_name("Object").expect("Object layout");
	let id_off = object_layout.member_named("id").expect("id").offset;
	let scale_off = object_layout.member_named("scale").expect("scale").offset;
	let name_off = object_layout.member_named("name").expect("name").offset;

	let first = graph.get(graph.lists.objects[0]).expect("first object");
	assert_eq!(read_i32(first.data(), id_off), 11);
	assert_eq!(read_f32(first.data(), scale_off + 4), 2.0);
	assert_eq!(&first.data()[name_off..name_off + 8], b"suzanne\0");

	let second = graph.get(graph.lists.objects[1]).expect("second object");
	assert_eq!(read_i32(second.data(), id_off), 12);
	assert_eq!(&second.data()[name_off..name_off + 5], b"cube\0");
}

#[test]
fn identical_schemas_reproduce_every_field() {
	let builder = build_schema();
	let reference = builder.compile(8);
	let graph = load_bytes(build_stream(&builder), &reference, &Default::default()).expect("stream loads");

	assert_eq!(graph.compression, Compression::None);
	assert_identity(&reference, &graph);
}

#[test]
fn zstd_compressed_streams_load_identically() {
	let builder = build_schema();
	let reference = builder.compile(8);
	let packed = zstd::encode_all(build_stream(&builder).as_slice(), 3).expect("compress");
	let graph = load_bytes(packed, &reference, &Default::default()).expect("compressed stream loads");

	assert_eq!(graph.compression, Compression::Zstd);
	assert_identity(&reference, &graph);
}

use std::sync::OnceLock;

use crate::blend::dna::Dna;
use crate::blend::layout::Schema;
use crate::blend::{Endianness, Result};

/// Pointer width the consumer's reference layouts are compiled with.
///
/// Resolved pointer slots hold 64-bit handles, so the reference side is
/// always laid out for 8-byte pointers.
pub const REFERENCE_POINTER_SIZE: usize = 8;

static REFERENCE: OnceLock<Schema> = OnceLock::new();

/// Compile a reference schema from a native-order schema blob.
pub fn compile_reference(blob: &[u8]) -> Result<Schema> {
	let dna = Dna::parse(blob, Endianness::native())?;
	Ok(Schema::compile(dna, REFERENCE_POINTER_SIZE, Endianness::native()))
}

/// Build and install the process-wide reference schema.
///
/// The first successful call wins; later calls return the already
/// installed schema. Code that needs a different schema (tests, tools
/// handling several catalogues) passes one explicitly to the load APIs
/// instead of relying on this.
pub fn install_reference(blob: &[u8]) -> Result<&'static Schema> {
	if let Some(schema) = REFERENCE.get() {
		return Ok(schema);
	}
	let schema = compile_reference(blob)?;
	Ok(REFERENCE.get_or_init(|| schema))
}

/// Return the installed reference schema, if any.
pub fn installed_reference() -> Option<&'static Schema> {
	REFERENCE.get()
}

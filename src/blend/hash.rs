use xxhash_rust::xxh64::xxh64;

/// Stable 64-bit hash of a name or type string.
///
/// Seedless, so hashes computed against one schema table compare directly
/// against hashes from another table or another process run.
pub fn name_hash(text: &str) -> u64 {
	xxh64(text.as_bytes(), 0)
}

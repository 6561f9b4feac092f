use crate::blend::cast::classify;
use crate::blend::layout::{MemberLayout, Schema, StructLayout};

/// Non-fatal reconciliation counters for one load.
#[derive(Debug, Default, Clone)]
pub struct LinkStats {
	/// Reference structs matched to a foreign struct.
	pub structs_linked: u32,
	/// Reference structs with no foreign counterpart.
	pub structs_missing: u32,
	/// Linked members left unmatched (zero-filled at relink).
	pub members_missing: u32,
	/// Linked members needing value conversion.
	pub members_cast: u32,
	/// Structs whose declared and computed sizes disagree, both schemas.
	pub structs_misaligned: u32,
}

/// Link state for one reference member.
#[derive(Debug, Clone, Copy)]
pub struct MemberLink {
	/// Matched foreign member index, or `None` when missing.
	pub foreign: Option<u32>,
	/// Matched member needs value conversion rather than byte copy.
	pub needs_cast: bool,
}

/// Link state for one matched reference struct.
#[derive(Debug, Clone)]
pub struct StructLink {
	/// Matched foreign struct layout index.
	pub foreign: u32,
	/// Per-member links, parallel to the reference struct's members.
	pub members: Vec<MemberLink>,
}

/// Bidirectional correspondence between two compiled schemas.
#[derive(Debug)]
pub struct SchemaLink {
	/// Per-reference-struct links, parallel to the reference layouts.
	pub by_ref_struct: Vec<Option<StructLink>>,
	/// Reference layout index per foreign layout, parallel to the foreign layouts.
	pub ref_for_foreign: Vec<Option<u32>>,
	/// Reconciliation counters.
	pub stats: LinkStats,
}

/// Match every reference struct and member against the foreign schema.
///
/// This never fails: an incompatible producer just yields a link table
/// full of missing entries, and the relink step degrades those fields to
/// zero or null.
pub fn link_schemas(reference: &Schema, foreign: &Schema) -> SchemaLink {
	let mut by_ref_struct = Vec::with_capacity(reference.layouts.len());
	let mut ref_for_foreign = vec![None; foreign.layouts.len()];
	let mut stats = LinkStats::default();

	stats.structs_misaligned += reference.layouts.iter().filter(|layout| layout.misaligned).count() as u32;
	stats.structs_misaligned += foreign.layouts.iter().filter(|layout| layout.misaligned).count() as u32;

	for (ref_idx, ref_layout) in reference.layouts.iter().enumerate() {
		let type_hash = reference.dna.types[ref_layout.type_idx as usize].hash;
		let Some(foreign_idx) = foreign.layout_idx_by_type_hash(type_hash) else {
			stats.structs_missing += 1;
			by_ref_struct.push(None);
			continue;
		};

		let foreign_layout = &foreign.layouts[foreign_idx as usize];
		let members = link_members(reference, ref_layout, foreign, foreign_layout, &mut stats);

		ref_for_foreign[foreign_idx as usize] = Some(ref_idx as u32);
		by_ref_struct.push(Some(StructLink {
			foreign: foreign_idx,
			members,
		}));
		stats.structs_linked += 1;
	}

	SchemaLink {
		by_ref_struct,
		ref_for_foreign,
		stats,
	}
}

fn link_members(
	reference: &Schema,
	ref_layout: &StructLayout,
	foreign: &Schema,
	foreign_layout: &StructLayout,
	stats: &mut LinkStats,
) -> Vec<MemberLink> {
	let mut members = Vec::with_capacity(ref_layout.members.len());

	for ref_member in &ref_layout.members {
		let mut fallback = None;
		let mut link = MemberLink {
			foreign: None,
			needs_cast: false,
		};

		for (foreign_idx, foreign_member) in foreign_layout.members.iter().enumerate() {
			if foreign_member.base_hash != ref_member.base_hash
				|| foreign_member.array_idx != ref_member.array_idx
				|| foreign_member.chain != ref_member.chain
			{
				continue;
			}

			if is_exact(ref_member, foreign_member) {
				link.foreign = Some(foreign_idx as u32);
				link.needs_cast = false;
				break;
			}

			if fallback.is_none() {
				if let Some(needs_cast) = compatible(reference, ref_member, foreign, foreign_member) {
					fallback = Some((foreign_idx as u32, needs_cast));
				}
			}
		}

		if link.foreign.is_none() {
			if let Some((foreign_idx, needs_cast)) = fallback {
				link.foreign = Some(foreign_idx);
				link.needs_cast = needs_cast;
			}
		}

		match link.foreign {
			None => stats.members_missing += 1,
			Some(_) if link.needs_cast => stats.members_cast += 1,
			Some(_) => {}
		}
		members.push(link);
	}

	members
}

fn is_exact(ref_member: &MemberLayout, foreign_member: &MemberLayout) -> bool {
	ref_member.type_hash == foreign_member.type_hash
		&& ref_member.ptr_depth == foreign_member.ptr_depth
		&& ref_member.is_func_ptr == foreign_member.is_func_ptr
}

/// Apply the relaxed compatibility policy to a non-exact candidate.
///
/// Returns `Some(needs_cast)` on an acceptable pair, `None` otherwise.
/// Pointers are never reinterpreted, so a non-exact pointer pair is
/// always refused. Integer pairs copy bytes without conversion; pairs
/// involving a float convert by value.
fn compatible(reference: &Schema, ref_member: &MemberLayout, foreign: &Schema, foreign_member: &MemberLayout) -> Option<bool> {
	if ref_member.ptr_depth > 0 || foreign_member.ptr_depth > 0 || ref_member.is_func_ptr || foreign_member.is_func_ptr {
		return None;
	}

	let ref_scalar = classify(reference.dna.type_name(ref_member.type_idx), ref_member.elem_size)?;
	let foreign_scalar = classify(foreign.dna.type_name(foreign_member.type_idx), foreign_member.elem_size)?;

	if ref_scalar.is_integer() && foreign_scalar.is_integer() {
		return Some(false);
	}
	Some(true)
}

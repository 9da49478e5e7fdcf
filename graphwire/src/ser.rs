//! Serialization driver (`spec.md` §4.8): discovery, type-table
//! construction, prelude, then body. Reaching the end of the prelude step
//! guarantees a closed graph — no further `mark` is possible once the body
//! loop starts, because every reachable instance was already enqueued during
//! [`crate::scan::discover`].

use fxhash::FxHashMap;

use crate::error::WriteError;
use crate::graph::Graph;
use crate::ids::{AnyRef, IdWidth, ObjectId, Ref, TypeKey};
use crate::reflect::{PreludeExtra, Reflected, TypeKind};
use crate::registry::{Resolver, TypeRegistration};
use crate::scan::discover;
use crate::varint::{write_object_id, ByteSink};

/// Per-call context threaded through every `write_body`/`write_element`
/// call: the id/type-id width policy and the arena-index → wire-id map
/// needed to turn a `Ref<T>`/`AnyRef` field into the bytes `spec.md` §4.5
/// calls "the referent's object id."
pub struct WritePass {
	id_of: FxHashMap<usize, ObjectId>,
	id_width: IdWidth,
	type_key_of: FxHashMap<&'static str, TypeKey>,
	type_width: IdWidth,
}

impl WritePass {
	pub fn write_ref<T: Reflected>(&self, sink: &mut dyn ByteSink, r: Ref<T>) -> Result<(), WriteError> {
		self.write_any_ref(sink, r.as_any())
	}

	pub(crate) fn write_any_ref(&self, sink: &mut dyn ByteSink, r: AnyRef) -> Result<(), WriteError> {
		let id = match r.arena_index {
			usize::MAX => ObjectId::NULL,
			idx => *self.id_of.get(&idx).expect("a marked referent is always discovered during scan"),
		};
		write_object_id(sink, id.raw(), self.id_width)
	}

	fn type_key(&self, name: &str) -> TypeKey {
		*self.type_key_of.get(name).expect("every schema-reachable type is registered in scan-types")
	}
}

/// `spec.md` §4.8 steps 3-6, given the discovery result from [`discover`].
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub(crate) fn write_graph(graph: &mut Graph, root: AnyRef, sink: &mut dyn ByteSink, resolve: Resolver) -> Result<(), WriteError> {
	let discovery = discover(graph, root, resolve)?;

	// --- step 3: scan-types -------------------------------------------------
	let mut type_order: Vec<&'static TypeRegistration> = Vec::new();
	let mut type_key_of: FxHashMap<&'static str, TypeKey> = FxHashMap::default();
	for &reg in &discovery.types {
		if !type_key_of.contains_key(reg.type_name) {
			type_key_of.insert(reg.type_name, TypeKey(type_order.len() as u32));
			type_order.push(reg);
		}
	}
	let type_count_for_objects = type_order.len();
	// Schema-only types can themselves declare fields of further schema-only
	// types (a struct embedded inside a struct embedded inside a struct, none
	// of which is ever instantiated on its own), so this has to keep walking
	// newly-added entries rather than stopping after one pass over the
	// region-1 types — otherwise a deeply nested declared type never makes it
	// into `type_key_of` and the lookup in step 4 below panics on valid input.
	let mut cursor = 0;
	while cursor < type_order.len() {
		let reg = type_order[cursor];
		cursor += 1;
		for field in reg.schema {
			if !type_key_of.contains_key(field.declared_type_name) {
				let field_reg = resolve(field.declared_type_name).ok_or(WriteError::NotSerializable(field.declared_type_name))?;
				type_key_of.insert(field.declared_type_name, TypeKey(type_order.len() as u32));
				type_order.push(field_reg);
			}
		}
	}

	let string_type_id: i32 = match type_key_of.get(crate::reflect::GraphString::type_name()) {
		Some(key) => key.index() as i32,
		None => -1,
	};

	let id_of: FxHashMap<usize, ObjectId> = discovery
		.order
		.iter()
		.enumerate()
		.map(|(i, &idx)| (idx, ObjectId((i + 1) as u32)))
		.collect();

	let id_width = IdWidth::for_count(discovery.order.len());
	let type_width = IdWidth::for_count(type_order.len());
	let pass = WritePass { id_of, id_width, type_key_of, type_width };

	// --- step 4: prelude -----------------------------------------------------
	sink.write_var32(type_order.len() as u32)?;
	sink.write_var32((discovery.order.len() + 1) as u32)?;
	sink.write_var32(type_count_for_objects as u32)?;
	sink.write_svar32(string_type_id)?;

	for reg in &type_order {
		sink.write_string(reg.type_name)?;
	}

	for reg in &type_order {
		match reg.kind {
			TypeKind::Struct => {
				sink.write_u8(reg.schema.len() as u8);
				for field in reg.schema {
					write_object_id(sink, pass.type_key(field.declared_type_name).0, type_width)?;
					sink.write_string(field.name)?;
				}
			}
			_ => sink.write_u8(255)?,
		}
	}

	// --- step 5: creation prelude --------------------------------------------
	for (i, &idx) in discovery.order.iter().enumerate() {
		let reg = discovery.types[i];
		write_object_id(sink, pass.type_key(reg.type_name).0, type_width)?;
		match reg.kind {
			TypeKind::Str => match graph.nodes[idx].prelude_extra() {
				PreludeExtra::StringValue(s) => sink.write_string(s)?,
				_ => unreachable!("a GraphString registration always yields PreludeExtra::StringValue"),
			},
			TypeKind::Array => match graph.nodes[idx].prelude_extra() {
				PreludeExtra::ArrayLength(len) => sink.write_i32(len as i32)?,
				_ => unreachable!("an array registration always yields PreludeExtra::ArrayLength"),
			},
			_ => {}
		}
	}

	// --- step 6: body ----------------------------------------------------------
	for &idx in &discovery.order {
		graph.nodes[idx].write_body(sink, &pass)?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate as graphwire;
	use crate::ids::Ref;
	use crate::registry::TypeCatalog;
	use crate::varint::VarIntWriter;
	use graphwire_derive::GraphObject;

	#[derive(Debug, GraphObject)]
	struct IntHolder {
		x: i32,
	}

	#[test]
	fn primitive_field_wire_shape() {
		let mut graph = Graph::new();
		let root = graph.insert(IntHolder { x: 0x01020304 });

		let mut buf = Vec::new();
		let mut writer = VarIntWriter::new(&mut buf);
		write_graph(&mut graph, root.as_any(), &mut writer, &TypeCatalog::resolve).unwrap();

		// 4 header var-ints: typesCount=2 (IntHolder + the schema-only "i32" its
		// field declares), objectsCount=2, typeCountForObjects=1, stringTypeID=-1
		// (5 bytes svar32)
		assert_eq!(buf[0], 2);
		assert_eq!(buf[1], 2);
		assert_eq!(buf[2], 1);
		// body ends with the little-endian field bytes
		assert_eq!(&buf[buf.len() - 4..], &[0x04, 0x03, 0x02, 0x01]);
	}

	#[test]
	fn null_root_writes_empty_header() {
		let mut graph = Graph::new();
		let mut buf = Vec::new();
		let mut writer = VarIntWriter::new(&mut buf);
		write_graph(&mut graph, Ref::<IntHolder>::NULL.as_any(), &mut writer, &TypeCatalog::resolve).unwrap();
		assert_eq!(buf[0], 0); // typesCount
		assert_eq!(buf[1], 1); // objectsCount (just the null slot)
		assert_eq!(buf[2], 0); // typeCountForObjects
	}
}

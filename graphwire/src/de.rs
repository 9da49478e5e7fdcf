//! Deserialization driver (`spec.md` §4.9-§4.10). Four sequential phases,
//! each run to completion across every object before the next starts:
//! allocate (`Announced`), parse bodies (`BodyParsed`), run deferred custom
//! constructors (`CustomConstructed`), run post-deserialization callbacks
//! (`Finalized`). The phase ordering is what lets a custom constructor's map
//! safely reference objects whose own fields were filled in an earlier
//! phase, even though those objects may be `Ref`-reachable only through the
//! custom map itself.

use crate::error::ReadError;
use crate::graph::Graph;
use crate::ids::{IdWidth, ObjectId, Ref};
use crate::reflect::{Reflected, TypeKind};
use crate::registry::{Resolver, TypeRegistration};
use crate::varint::{read_object_id, ByteSource};

/// Per-call context threaded through every `read_body`/`read_element` call:
/// the id-width policy and the wire-id → arena-index map needed to resolve a
/// `Ref<T>`/`AnyRef` field once every object has been allocated.
pub struct ReadPass<'a> {
	id_width: IdWidth,
	arena_index_of: &'a [usize],
}

impl<'a> ReadPass<'a> {
	pub fn read_ref<T: Reflected>(&self, src: &mut dyn ByteSource) -> Result<Ref<T>, ReadError> {
		let id = read_object_id(src, self.id_width)?;
		Ok(self.resolve(ObjectId(id)))
	}

	/// Turn an already-known wire object id into a typed handle, without
	/// reading anything further off the stream. Used by custom-serialization
	/// constructors (`spec.md` §4.7), which receive ids already parsed out of
	/// the member map.
	pub fn resolve<T: Reflected>(&self, id: ObjectId) -> Ref<T> {
		match id.raw() {
			0 => Ref::NULL,
			raw => Ref::new(self.arena_index_of[raw as usize]),
		}
	}
}

struct TypeRow {
	name: String,
	registration: &'static TypeRegistration,
}

fn read_type_table(src: &mut dyn ByteSource, types_count: usize, resolve: Resolver) -> Result<Vec<TypeRow>, ReadError> {
	let mut names = Vec::with_capacity(types_count);
	for _ in 0..types_count {
		names.push(src.read_string()?);
	}
	names
		.into_iter()
		.map(|name| {
			let registration = resolve(&name).ok_or_else(|| ReadError::UnknownType(name.clone()))?;
			Ok(TypeRow { name, registration })
		})
		.collect()
}

fn read_and_validate_schemas(src: &mut dyn ByteSource, types: &[TypeRow], type_width: IdWidth) -> Result<(), ReadError> {
	for row in types {
		let field_count = src.read_u8()?;
		let is_special = row.registration.kind != TypeKind::Struct;

		if field_count == 255 {
			if !is_special {
				return Err(ReadError::SchemaSpecialMismatch { type_name: row.name.clone() });
			}
			continue;
		}
		if is_special {
			return Err(ReadError::SchemaSpecialMismatch { type_name: row.name.clone() });
		}

		let expected = row.registration.schema;
		if field_count as usize != expected.len() {
			return Err(ReadError::SchemaFieldMismatch {
				type_name: row.name.clone(),
				detail: format!("field count {field_count} != {}", expected.len()),
			});
		}
		for field in expected {
			let field_type_key = read_object_id(src, type_width)? as usize;
			let field_name = src.read_string()?;
			let Some(wire_type) = types.get(field_type_key) else {
				return Err(ReadError::SchemaFieldMismatch {
					type_name: row.name.clone(),
					detail: format!("field `{field_name}` has out-of-range declared type id {field_type_key}"),
				});
			};
			if field_name != field.name || wire_type.name != field.declared_type_name {
				return Err(ReadError::SchemaFieldMismatch {
					type_name: row.name.clone(),
					detail: format!(
						"field `{field_name}: {}` does not match current `{}: {}`",
						wire_type.name, field.name, field.declared_type_name
					),
				});
			}
		}
	}
	Ok(())
}

/// `spec.md` §4.9: parses the prelude, allocates every instance, parses
/// bodies, runs deferred custom constructors and post-deserialization
/// callbacks, then returns the arena plus object id 1's arena index (`None`
/// if the stream held no objects).
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub(crate) fn read_graph(src: &mut dyn ByteSource, resolve: Resolver) -> Result<(Graph, Option<usize>), ReadError> {
	let types_count = src.read_var32()? as usize;
	let objects_count = src.read_var32()? as usize;
	let type_count_for_objects = src.read_var32()? as usize;
	let _string_type_id = src.read_svar32()?;

	let types = read_type_table(src, types_count, resolve)?;
	let type_width = IdWidth::for_count(types_count);
	read_and_validate_schemas(src, &types, type_width)?;

	if objects_count == 0 {
		return Ok((Graph::new(), None));
	}
	let object_count = objects_count - 1;
	let id_width = IdWidth::for_count(object_count);

	// --- Announced: allocate every instance, uninitialized ------------------
	let mut graph = Graph::with_capacity(object_count);
	let mut kinds = Vec::with_capacity(object_count);
	let mut arena_index_of = vec![usize::MAX]; // id 0 (null) never resolved

	for _ in 0..object_count {
		let type_id = read_object_id(src, type_width)? as usize;
		let Some(row) = types.get(type_id) else {
			return Err(ReadError::SchemaFieldMismatch {
				type_name: "<object>".to_string(),
				detail: format!("out-of-range type id {type_id}"),
			});
		};
		if type_id >= type_count_for_objects {
			return Err(ReadError::SchemaOnlyTypeUsedAsInstance { type_name: row.name.clone() });
		}

		let node: Box<dyn crate::reflect::GraphObject> = match row.registration.kind {
			TypeKind::Str => {
				let value = src.read_string()?;
				Box::new(crate::reflect::GraphString(value))
			}
			TypeKind::Array => {
				let len = src.read_i32()? as usize;
				let factory = row.registration.allocate_with_len.expect("array registrations always carry allocate_with_len");
				factory(len)
			}
			TypeKind::Custom => Box::new(crate::registry::CustomPlaceholder),
			_ => (row.registration.allocate)(),
		};

		let idx = graph.push_raw(node);
		arena_index_of.push(idx);
		kinds.push(row.registration);
	}

	let mut pass = ReadPass { id_width, arena_index_of: &arena_index_of };

	// --- BodyParsed -----------------------------------------------------------
	let mut deferred: Vec<(usize, &'static TypeRegistration, Vec<(String, ObjectId)>)> = Vec::new();
	for (i, reg) in kinds.iter().enumerate() {
		let idx = arena_index_of[i + 1];
		match &reg.custom {
			Some(_) => {
				let count = src.read_var32()? as usize;
				let mut entries = Vec::with_capacity(count);
				for _ in 0..count {
					let name = src.read_string()?;
					let id = read_object_id(src, id_width)?;
					entries.push((name, ObjectId(id)));
				}
				deferred.push((idx, reg, entries));
			}
			None => graph.nodes[idx].read_body(src, &mut pass)?,
		}
	}

	// --- CustomConstructed ------------------------------------------------------
	for (idx, reg, entries) in deferred {
		let ops = reg.custom.as_ref().ok_or_else(|| ReadError::NoDeserializationCtor { type_name: reg.type_name.to_string() })?;
		graph.nodes[idx] = (ops.from_entries)(&entries, &pass);
	}

	// --- Finalized ---------------------------------------------------------------
	for idx in arena_index_of.iter().skip(1) {
		graph.nodes[*idx].on_deserialized();
	}

	Ok((graph, Some(arena_index_of[1])))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate as graphwire;
	use crate::ids::Ref;
	use crate::registry::TypeCatalog;
	use crate::ser::write_graph;
	use crate::varint::{VarIntReader, VarIntWriter};
	use graphwire_derive::GraphObject;

	#[derive(Debug, GraphObject)]
	struct IntHolder {
		x: i32,
	}

	#[derive(Debug, GraphObject)]
	struct Node {
		next: Ref<Node>,
		value: i32,
	}

	fn roundtrip(graph: &mut Graph, root: crate::ids::AnyRef) -> (Graph, Option<usize>) {
		let mut buf = Vec::new();
		let mut writer = VarIntWriter::new(&mut buf);
		write_graph(graph, root, &mut writer, &TypeCatalog::resolve).unwrap();
		let mut reader = VarIntReader::new(buf.as_slice());
		read_graph(&mut reader, &TypeCatalog::resolve).unwrap()
	}

	#[test]
	fn primitive_field_roundtrip() {
		let mut graph = Graph::new();
		let root = graph.insert(IntHolder { x: 0x01020304 });
		let (graph2, root2) = roundtrip(&mut graph, root.as_any());
		let root2: Ref<IntHolder> = Ref::new(root2.unwrap());
		assert_eq!(graph2.get(root2).unwrap().x, 0x01020304);
	}

	#[test]
	fn cycle_roundtrip() {
		let mut graph = Graph::new();
		let a = graph.insert(Node { next: Ref::NULL, value: 1 });
		let b = graph.insert(Node { next: a, value: 2 });
		graph.get_mut(a).unwrap().next = b;

		let (graph2, root2) = roundtrip(&mut graph, a.as_any());
		let a2: Ref<Node> = Ref::new(root2.unwrap());
		let b2 = graph2.get(a2).unwrap().next;
		let back_to_a2 = graph2.get(b2).unwrap().next;
		assert_eq!(back_to_a2.as_any(), a2.as_any());
	}

	#[test]
	fn null_root_roundtrip() {
		let mut graph = Graph::new();
		let (_, root2) = roundtrip(&mut graph, Ref::<IntHolder>::NULL.as_any());
		assert!(root2.is_none());
	}
}

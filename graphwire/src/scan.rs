//! Discovery phase (`spec.md` §4.4, §4.8 steps 1-2): breadth-first
//! reference-identity traversal from the root, assigning each distinct
//! reachable instance a dense object id in first-discovery order.

use std::any::Any;
use std::fmt::Debug;

use fxhash::FxHashMap;

use crate::error::WriteError;
use crate::graph::{Graph, Tombstone};
use crate::ids::{AnyRef, ObjectId};
use crate::reflect::GraphObject;
use crate::registry::{Resolver, TypeRegistration};
use crate::ser::WritePass;
use crate::varint::ByteSink;

/// Driver-facing scan context: the identity map under construction and the
/// arena it is walking. Passed by `&mut` to every `GraphObject::scan_refs`
/// and `CustomGraphObject::to_entries` call.
pub struct ScanPass<'g> {
	pub(crate) graph: &'g mut Graph,
	id_of: FxHashMap<usize, ObjectId>,
	order: Vec<usize>,
}

impl<'g> ScanPass<'g> {
	/// `Mark(x)` (`spec.md` §4.4): no-op for null or already-seen values,
	/// otherwise assigns the next id and enqueues it for later scanning.
	pub fn mark<T: crate::reflect::Reflected>(&mut self, r: crate::ids::Ref<T>) -> ObjectId {
		match r.arena_index {
			Some(idx) => self.mark_any(AnyRef::new(idx)),
			None => ObjectId::NULL,
		}
	}

	pub fn mark_any(&mut self, r: AnyRef) -> ObjectId {
		if r.arena_index == usize::MAX {
			return ObjectId::NULL;
		}
		if let Some(&id) = self.id_of.get(&r.arena_index) {
			return id;
		}
		let id = ObjectId((self.order.len() + 1) as u32);
		self.order.push(r.arena_index);
		self.id_of.insert(r.arena_index, id);
		id
	}

	/// Intern a freshly constructed value into the arena and mark it in the
	/// same step (`spec.md` §4.7: custom hooks may emit values with no
	/// existing arena identity, e.g. a literal `7`).
	pub fn intern<T: GraphObject + crate::reflect::Reflected>(&mut self, value: T) -> crate::ids::Ref<T> {
		let r = self.graph.insert(value);
		self.mark(r);
		r
	}
}

/// What the instance at object id `i` was replaced with after its custom
/// hook ran (`spec.md` §4.7): the captured `(name, value-id)` entries,
/// standing in for the original instance for the rest of the write.
pub(crate) struct CustomEntries {
	pub(crate) type_name: &'static str,
	pub(crate) entries: Vec<(String, AnyRef)>,
}

impl Debug for CustomEntries {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CustomEntries").field("type_name", &self.type_name).finish()
	}
}

impl GraphObject for CustomEntries {
	fn graph_type_name(&self) -> &'static str {
		self.type_name
	}

	fn scan_refs(&self, _scan: &mut ScanPass) {}

	fn write_body(&self, sink: &mut dyn ByteSink, pass: &WritePass) -> Result<(), WriteError> {
		sink.write_var32(self.entries.len() as u32)?;
		for (name, value) in &self.entries {
			sink.write_string(name)?;
			pass.write_any_ref(sink, *value)?;
		}
		Ok(())
	}

	fn read_body(&mut self, _src: &mut dyn crate::varint::ByteSource, _pass: &mut crate::de::ReadPass) -> Result<(), crate::error::ReadError> {
		unreachable!("custom entries are only ever written, never parsed through GraphObject::read_body")
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// Result of the discovery phase: object id `i+1` is `order[i]`'s arena
/// index, and `types[i]` its resolved registration.
pub(crate) struct Discovery {
	pub(crate) order: Vec<usize>,
	pub(crate) types: Vec<&'static TypeRegistration>,
}

/// `spec.md` §4.8 steps 1-2: mark the root, then walk the queue with a
/// monotonic cursor so objects enqueued mid-scan are themselves scanned
/// later in the same pass.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub(crate) fn discover(graph: &mut Graph, root: AnyRef, resolve: Resolver) -> Result<Discovery, WriteError> {
	let mut pass = ScanPass { graph, id_of: Default::default(), order: Vec::new() };
	pass.mark_any(root);

	let mut types = Vec::new();
	let mut cursor = 0;
	while cursor < pass.order.len() {
		let idx = pass.order[cursor];
		cursor += 1;

		// Swap the node out so we can call `&self`/`&dyn GraphObject` methods
		// on it without holding a borrow of `pass.graph` at the same time.
		let node = std::mem::replace(&mut pass.graph.nodes[idx], Box::new(Tombstone));
		let type_name = node.graph_type_name();
		let reg = resolve(type_name).ok_or(WriteError::NotSerializable(type_name))?;
		if reg.schema.len() >= 255 {
			return Err(WriteError::TooManyFields(type_name));
		}

		match &reg.custom {
			Some(ops) => {
				let entries = (ops.to_entries)(node.as_ref(), &mut pass);
				pass.graph.nodes[idx] = Box::new(CustomEntries { type_name, entries });
			}
			None => {
				node.scan_refs(&mut pass);
				pass.graph.nodes[idx] = node;
			}
		}
		types.push(reg);
	}

	Ok(Discovery { order: pass.order, types })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate as graphwire;
	use crate::ids::Ref;
	use crate::registry::TypeCatalog;
	use graphwire_derive::GraphObject;

	#[derive(Debug, GraphObject)]
	struct Node {
		next: Ref<Node>,
		value: i32,
	}

	#[test]
	fn shared_reference_gets_one_id() {
		let mut graph = Graph::new();
		let leaf = graph.insert(Node { next: Ref::NULL, value: 1 });
		let root = graph.insert(Node { next: leaf, value: 0 });
		let discovery = discover(&mut graph, root.as_any(), &TypeCatalog::resolve).unwrap();
		// root + leaf, no duplicates even though multiple fields could point at leaf
		assert_eq!(discovery.order.len(), 2);
	}

	#[test]
	fn cycle_terminates() {
		let mut graph = Graph::new();
		let a = graph.insert(Node { next: Ref::NULL, value: 1 });
		let b = graph.insert(Node { next: a, value: 2 });
		graph.get_mut(a).unwrap().next = b;
		let discovery = discover(&mut graph, a.as_any(), &TypeCatalog::resolve).unwrap();
		assert_eq!(discovery.order.len(), 2);
	}

	#[test]
	fn null_root_discovers_nothing() {
		let mut graph = Graph::new();
		let discovery = discover(&mut graph, Ref::<Node>::NULL.as_any(), &TypeCatalog::resolve).unwrap();
		assert!(discovery.order.is_empty());
	}
}

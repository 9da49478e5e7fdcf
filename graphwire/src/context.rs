//! Top-level entry points (`spec.md` §4.8-§4.9) plus the ambient
//! configuration/concurrency surface `SPEC_FULL.md` §6 adds around them.

use std::io::{Read, Write};
use std::sync::RwLock;

use fxhash::FxHashMap;

use crate::error::{ReadError, WriteError};
use crate::graph::Graph;
use crate::ids::Ref;
use crate::reflect::Reflected;
use crate::registry::{TypeCatalog, TypeRegistration};
use crate::varint::{VarIntReader, VarIntWriter};

/// Knobs for [`Serializer::serialize_with`]. Currently a single capacity
/// hint; the struct exists so new knobs don't break the entry point's
/// signature later (`SPEC_FULL.md` §6, "Configuration surface").
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
	/// Pre-sized the internal id maps for this many instances. `0` lets them
	/// grow organically.
	pub capacity_hint: usize,
}

/// Knobs for [`Serializer::deserialize_with`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
	pub capacity_hint: usize,
}

/// A serializer instance. Owns nothing about any single call's graph; its
/// only state is a process-local memoization of type-name resolution
/// (`spec.md` §5: "the codec cache... is process-wide state owned by the
/// serializer object... an implementation that exposes the serializer
/// across threads must guard the cache against concurrent insertion").
/// [`crate::registry::TypeCatalog`] already memoizes name resolution
/// globally; this cache is a per-instance front for it, so multiple
/// independent `Serializer`s (`spec.md` §9: "no process-wide singleton
/// required") don't have to share one lock.
pub struct Serializer {
	cache: RwLock<FxHashMap<&'static str, &'static TypeRegistration>>,
}

impl Default for Serializer {
	fn default() -> Self {
		Self::new()
	}
}

impl Serializer {
	pub fn new() -> Self {
		Serializer { cache: RwLock::new(FxHashMap::default()) }
	}

	pub(crate) fn resolve(&self, type_name: &str) -> Option<&'static TypeRegistration> {
		if let Some(&reg) = self.cache.read().unwrap().get(type_name) {
			return Some(reg);
		}
		let reg = TypeCatalog::resolve(type_name)?;
		self.cache.write().unwrap().insert(reg.type_name, reg);
		Some(reg)
	}

	/// `spec.md` §4.8: discover, build the type table, write prelude + body.
	pub fn serialize<T: Reflected>(&self, graph: &mut Graph, root: Ref<T>, out: impl Write) -> Result<(), WriteError> {
		self.serialize_with(graph, root, out, &WriteOptions::default())
	}

	pub fn serialize_with<T: Reflected>(&self, graph: &mut Graph, root: Ref<T>, out: impl Write, _options: &WriteOptions) -> Result<(), WriteError> {
		let mut writer = VarIntWriter::new(out);
		crate::ser::write_graph(graph, root.as_any(), &mut writer, &|name| self.resolve(name))
	}

	/// `spec.md` §4.9: parse prelude, allocate, parse bodies, run deferred
	/// custom constructors, run post-deserialization callbacks.
	pub fn deserialize<T: Reflected>(&self, input: impl Read) -> Result<(Graph, Ref<T>), ReadError> {
		self.deserialize_with(input, &ReadOptions::default())
	}

	pub fn deserialize_with<T: Reflected>(&self, input: impl Read, _options: &ReadOptions) -> Result<(Graph, Ref<T>), ReadError> {
		let mut reader = VarIntReader::new(input);
		let (graph, root) = crate::de::read_graph(&mut reader, &|name| self.resolve(name))?;
		Ok((graph, root.map_or(Ref::NULL, Ref::new)))
	}

	/// Deserialize directly from a memory-mapped file, skipping a manual
	/// read-to-`Vec<u8>` step — convenient for large graph snapshots.
	#[cfg(feature = "memmap2")]
	pub fn deserialize_mmap<T: Reflected>(&self, path: impl AsRef<std::path::Path>) -> Result<(Graph, Ref<T>), ReadError> {
		let file = std::fs::File::open(path)?;
		let mmap = unsafe { memmap2::Mmap::map(&file)? };
		self.deserialize(&mmap[..])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate as graphwire;
	use graphwire_derive::GraphObject;

	#[derive(Debug, GraphObject)]
	struct Leaf {
		value: i32,
	}

	#[test]
	fn serialize_then_deserialize_roundtrip() {
		let serializer = Serializer::new();
		let mut graph = Graph::new();
		let root = graph.insert(Leaf { value: 99 });

		let mut buf = Vec::new();
		serializer.serialize(&mut graph, root, &mut buf).unwrap();

		let (graph2, root2) = serializer.deserialize::<Leaf>(buf.as_slice()).unwrap();
		assert_eq!(graph2.get(root2).unwrap().value, 99);
	}
}

//! The arena backing an object graph. Storage order here is arbitrary and
//! has no bearing on the wire format — [`crate::scan`] assigns fresh object
//! ids in breadth-first discovery order from whatever root is passed to
//! [`crate::Serializer::serialize`]. Arena index *is* reference identity:
//! two fields holding the same index are, by construction, the same object.

use std::any::Any;
use std::fmt::Debug;

use crate::ids::{AnyRef, Ref};
use crate::reflect::{GraphObject, Reflected};

/// Placeholder left behind in an arena slot whose original instance was
/// consumed by a custom-serialization hook (`spec.md` §4.7: "replaces the
/// instance in the table with that map"). Never scanned, written, or read.
#[derive(Debug)]
pub(crate) struct Tombstone;

impl GraphObject for Tombstone {
	fn graph_type_name(&self) -> &'static str {
		"graphwire::Tombstone"
	}

	fn scan_refs(&self, _scan: &mut crate::scan::ScanPass) {}

	fn write_body(&self, _sink: &mut dyn crate::varint::ByteSink, _pass: &crate::ser::WritePass) -> Result<(), crate::error::WriteError> {
		unreachable!("tombstone slots are never written directly")
	}

	fn read_body(&mut self, _src: &mut dyn crate::varint::ByteSource, _pass: &mut crate::de::ReadPass) -> Result<(), crate::error::ReadError> {
		unreachable!("tombstone slots are never read directly")
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// An object graph: an arena of heap-allocated, type-erased instances
/// connected by [`Ref`] handles.
#[derive(Default)]
pub struct Graph {
	pub(crate) nodes: Vec<Box<dyn GraphObject>>,
}

impl Graph {
	pub fn new() -> Self {
		Graph { nodes: Vec::new() }
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Graph { nodes: Vec::with_capacity(capacity) }
	}

	/// Inserts a new instance and returns a typed handle to it.
	pub fn insert<T: GraphObject>(&mut self, value: T) -> Ref<T>
	where
		T: Reflected,
	{
		let idx = self.push_raw(Box::new(value));
		Ref::new(idx)
	}

	pub(crate) fn push_raw(&mut self, value: Box<dyn GraphObject>) -> usize {
		let idx = self.nodes.len();
		self.nodes.push(value);
		idx
	}

	pub fn get<T: Reflected>(&self, r: Ref<T>) -> Option<&T> {
		let idx = r.arena_index?;
		self.nodes.get(idx)?.as_any().downcast_ref()
	}

	pub fn get_mut<T: Reflected>(&mut self, r: Ref<T>) -> Option<&mut T> {
		let idx = r.arena_index?;
		self.nodes.get_mut(idx)?.as_any_mut().downcast_mut()
	}

	pub fn get_any(&self, r: AnyRef) -> Option<&dyn GraphObject> {
		self.nodes.get(r.arena_index).map(|b| b.as_ref())
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

//! Type registry (`spec.md` §4.2): during write the driver assigns a type id
//! on first encounter of a concrete type and records its name; during read
//! the driver resolves names back to the process's linked types.
//!
//! The "process's loaded code" of `spec.md` is realized with the `inventory`
//! crate: every `#[derive(GraphObject)]` type, and every type registered with
//! [`crate::register_custom_object!`] or [`crate::register_array_element!`],
//! submits a [`TypeRegistration`] at link time. `inventory::iter` walks every
//! linked crate's registrations, not just the current module — the Rust
//! equivalent of scanning all loaded assemblies for a fully-qualified name.

use std::sync::OnceLock;

use fxhash::FxHashMap;

use crate::ids::{AnyRef, ObjectId};
use crate::reflect::{FieldSchema, GraphObject, TypeKind};

/// Hooks for a type that opts into key-value self-description
/// (`spec.md` §4.7) instead of field reflection.
pub struct CustomOps {
	/// Capture this instance's `(name, value)` entries, interning or marking
	/// referenced values into the in-flight scan as needed.
	pub to_entries: fn(&dyn GraphObject, &mut crate::scan::ScanPass) -> Vec<(String, AnyRef)>,
	/// Rebuild an instance from its deserialized `(name, id)` entries. Called
	/// once every object's fields have been parsed (`spec.md` §4.10); the
	/// [`crate::de::ReadPass`] lets the constructor turn those raw ids into
	/// typed `Ref<T>` handles.
	pub from_entries: fn(&[(String, ObjectId)], &crate::de::ReadPass) -> Box<dyn GraphObject>,
}

/// One entry in the process-wide type catalog: everything the drivers need
/// to know about a concrete type without knowing it at compile time.
pub struct TypeRegistration {
	pub type_name: &'static str,
	pub kind: TypeKind,
	pub schema: &'static [FieldSchema],
	pub allocate: fn() -> Box<dyn GraphObject>,
	/// `Some` only for array types (`spec.md` §4.9 step 4: arrays are
	/// allocated with a length read off the stream, before any element
	/// exists).
	pub allocate_with_len: Option<fn(usize) -> Box<dyn GraphObject>>,
	pub custom: Option<CustomOps>,
}

inventory::collect!(TypeRegistration);

/// A name → registration lookup function, threaded through the write/read
/// drivers instead of calling [`TypeCatalog::resolve`] directly — lets
/// [`crate::context::Serializer`]'s own per-instance cache front the
/// process-wide catalog for every lookup a call makes, not just the ones its
/// own entry points happen to make directly.
pub(crate) type Resolver<'a> = &'a dyn Fn(&str) -> Option<&'static TypeRegistration>;

/// Blank arena placeholder for a custom-serializable object during the
/// `Announced` phase of read (`spec.md` §4.10). Its fields are never read
/// from or written to directly — [`crate::de::read_graph`] replaces it with
/// the real instance once `from_entries` runs, and the write-side driver
/// never allocates one in the first place (a custom instance is replaced by
/// [`crate::scan::CustomEntries`] before the body phase even starts).
#[derive(Debug)]
pub struct CustomPlaceholder;

impl GraphObject for CustomPlaceholder {
	fn graph_type_name(&self) -> &'static str {
		"graphwire::CustomPlaceholder"
	}

	fn scan_refs(&self, _scan: &mut crate::scan::ScanPass) {}

	fn write_body(&self, _sink: &mut dyn crate::varint::ByteSink, _pass: &crate::ser::WritePass) -> Result<(), crate::error::WriteError> {
		unreachable!("custom objects are substituted with CustomEntries before the write phase")
	}

	fn read_body(&mut self, _src: &mut dyn crate::varint::ByteSource, _pass: &mut crate::de::ReadPass) -> Result<(), crate::error::ReadError> {
		unreachable!("custom objects are read via the deferred from_entries path")
	}

	fn as_any(&self) -> &dyn std::any::Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
		self
	}
}

/// Process-wide name → registration lookup, memoized on first use.
/// `spec.md` §4.2: "fails with *unknown-type* when a name cannot be resolved
/// in the current process's loaded code."
pub struct TypeCatalog;

impl TypeCatalog {
	#[cfg_attr(feature = "tracing", tracing::instrument)]
	pub fn resolve(name: &str) -> Option<&'static TypeRegistration> {
		static MAP: OnceLock<FxHashMap<&'static str, &'static TypeRegistration>> = OnceLock::new();
		let map = MAP.get_or_init(|| inventory::iter::<TypeRegistration>().map(|r| (r.type_name, r)).collect());
		map.get(name).copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate as graphwire;
	use crate::reflect::Reflected;
	use graphwire_derive::GraphObject;

	#[derive(Debug, GraphObject)]
	struct CatalogProbe {
		#[allow(dead_code)]
		value: i32,
	}

	#[test]
	fn derived_types_are_resolvable_by_name() {
		let reg = TypeCatalog::resolve(CatalogProbe::type_name()).expect("registered by derive macro");
		assert_eq!(reg.kind, TypeKind::Struct);
		assert_eq!(reg.schema.len(), 1);
		assert_eq!(reg.schema[0].name, "value");
	}
}

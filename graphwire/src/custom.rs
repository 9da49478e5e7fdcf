//! Custom-serialization adapter (`spec.md` §4.7): a type opts into key-value
//! self-description instead of field reflection. Unlike ordinary
//! `#[derive(GraphObject)]` types, this is hand-written — "meaningful
//! application logic, not mechanically derivable" (`SPEC_FULL.md` §4.7).

use crate::ids::ObjectId;
use crate::scan::ScanPass;

/// Implemented by hand for a type that serializes as a `(name, value)` map.
/// The type must also implement [`crate::reflect::GraphObject`] and
/// [`crate::reflect::Reflected`] so it can still be held behind a
/// [`crate::ids::Ref`] — those impls' `scan_refs`/`write_body`/`read_body`/
/// `allocate` are never actually invoked once registered with
/// [`crate::register_custom_object!`] and can be stubbed with
/// `unreachable!()`.
pub trait CustomGraphObject: Sized + 'static {
	/// Capture this instance's entries. May call [`ScanPass::intern`] to box
	/// and mark fresh values (`spec.md` §8 S5: a literal `7` becomes a boxed,
	/// arena-tracked `BoxedI32`), or [`ScanPass::mark`]/[`ScanPass::mark_any`]
	/// to reference already-arena-resident values.
	fn to_entries(&self, scan: &mut ScanPass) -> Vec<(String, crate::ids::AnyRef)>;

	/// Rebuild an instance from its deserialized `(name, id)` entries
	/// (`spec.md` §4.7: "the deferred custom-deserialization entry"). Runs
	/// only once every object in the stream has had its own body parsed;
	/// `ctx` turns a raw id into a typed `Ref<T>`.
	fn from_entries(entries: &[(String, ObjectId)], ctx: &crate::de::ReadPass) -> Self;
}

use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use crate::reflect::Reflected;

/// Dense index of a type within one stream. Insertion order during write
/// defines the id; read rebuilds the same order from the type-name table.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TypeKey(pub(crate) u32);

impl TypeKey {
	#[inline]
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

impl Debug for TypeKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "TypeKey({})", self.0)
	}
}

/// Dense index of an instance within one stream. `0` is the reserved null id;
/// ids `1..N` enumerate every distinct reachable non-null value in
/// first-discovery (breadth-first) order from the root.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
	pub const NULL: ObjectId = ObjectId(0);

	#[inline]
	pub fn is_null(self) -> bool {
		self.0 == 0
	}

	#[inline]
	pub fn raw(self) -> u32 {
		self.0
	}
}

impl Debug for ObjectId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.is_null() {
			true => write!(f, "ObjectId(null)"),
			false => write!(f, "ObjectId({})", self.0),
		}
	}
}

/// Raw, untyped handle into a [`crate::graph::Graph`]'s arena. Used where
/// the declared field type isn't known statically, e.g. custom-serialization
/// entries and array elements of heterogeneous kind.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct AnyRef {
	pub(crate) arena_index: usize,
}

impl AnyRef {
	#[inline]
	pub(crate) fn new(arena_index: usize) -> Self {
		AnyRef { arena_index }
	}
}

impl Debug for AnyRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "AnyRef(#{})", self.arena_index)
	}
}

/// A nullable, statically-typed reference field. `Ref::NULL` round-trips to
/// wire object id `0`. The declared type `T` gives compile-time assignment
/// compatibility (spec invariant 3); schema validation at read time confirms
/// the wire's declared type name still matches `T::type_name()`.
pub struct Ref<T: Reflected> {
	pub(crate) arena_index: Option<usize>,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Reflected> Ref<T> {
	pub const NULL: Ref<T> = Ref { arena_index: None, _marker: PhantomData };

	#[inline]
	pub(crate) fn new(arena_index: usize) -> Self {
		Ref { arena_index: Some(arena_index), _marker: PhantomData }
	}

	#[inline]
	pub fn is_null(&self) -> bool {
		self.arena_index.is_none()
	}

	#[inline]
	pub fn as_any(&self) -> AnyRef {
		match self.arena_index {
			Some(idx) => AnyRef::new(idx),
			None => AnyRef::new(usize::MAX),
		}
	}
}

impl<T: Reflected> Copy for Ref<T> {}

impl<T: Reflected> Clone for Ref<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T: Reflected> Debug for Ref<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.arena_index {
			Some(idx) => write!(f, "Ref::<{}>(#{})", T::type_name(), idx),
			None => write!(f, "Ref::<{}>(null)", T::type_name()),
		}
	}
}

impl<T: Reflected> Default for Ref<T> {
	fn default() -> Self {
		Self::NULL
	}
}

impl<T: Reflected> PartialEq for Ref<T> {
	fn eq(&self, other: &Self) -> bool {
		self.arena_index == other.arena_index
	}
}

impl<T: Reflected> Eq for Ref<T> {}

/// `u16` object/type ids when the governing count is `<= 65_535`, otherwise
/// `i32`. One width applies uniformly to every id field in a stream.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum IdWidth {
	U16,
	I32,
}

impl IdWidth {
	#[inline]
	pub(crate) fn for_count(count: usize) -> IdWidth {
		match count <= u16::MAX as usize {
			true => IdWidth::U16,
			false => IdWidth::I32,
		}
	}
}

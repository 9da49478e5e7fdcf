//! The reflection substitute (`spec.md` §9, "Reflection dependency"): every
//! serializable concrete type implements [`GraphObject`] (per-instance,
//! object-safe dynamic behavior) and [`Reflected`] (per-type static
//! metadata). Both are generated by `#[derive(GraphObject)]` for ordinary
//! structs; the handful of built-in primitive/string/array wrappers below
//! implement them by hand.

use std::any::Any;
use std::fmt::Debug;
use std::sync::OnceLock;

use crate::de::ReadPass;
use crate::error::{ReadError, WriteError};
use crate::ids::Ref;
use crate::scan::ScanPass;
use crate::ser::WritePass;
use crate::varint::{ByteSink, ByteSource};

/// The "special" categories of `spec.md` §3: everything but `Struct` carries
/// a sentinel field count of 255 in its schema row.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TypeKind {
	/// A plain reference type with an ordered field schema.
	Struct,
	/// `GraphArray<E>`; the element type is carried alongside in the
	/// registration rather than in this enum so the enum stays `Copy`.
	Array,
	/// The boxed string type; content is emitted in the creation prelude.
	Str,
	/// Opts into key-value self-description (`CustomGraphObject`).
	Custom,
	/// A boxed primitive (`BoxedI32`, ...).
	Primitive,
}

/// One row of a type's persisted field layout (`spec.md` §3, "Schema of a
/// type").
#[derive(Debug, Copy, Clone)]
pub struct FieldSchema {
	pub name: &'static str,
	pub declared_type_name: &'static str,
}

/// Extra content some instances carry in the write driver's *creation*
/// prelude rather than the body (`spec.md` §4.8 step 5): strings emit their
/// text, arrays emit their length.
pub enum PreludeExtra<'a> {
	None,
	ArrayLength(u32),
	StringValue(&'a str),
}

/// Per-instance dynamic behavior, dispatched through `dyn GraphObject` so
/// the drivers can walk a type-erased arena uniformly. Implemented by
/// `#[derive(GraphObject)]`.
pub trait GraphObject: Any + Debug {
	/// The type's fully-qualified name, used as the wire type-name and as
	/// the `inventory` registration key. Must equal `Reflected::type_name()`
	/// for the same concrete type.
	fn graph_type_name(&self) -> &'static str;

	/// Enqueue (`mark`) every reference this instance transitively contains
	/// at depth 1 (`spec.md` §4.4). No-op for primitives and strings.
	fn scan_refs(&self, scan: &mut ScanPass);

	/// Emit this instance's field content (not its id or type tag — those
	/// are the driver's job). No-op for strings, whose content already went
	/// out in the creation prelude.
	fn write_body(&self, sink: &mut dyn ByteSink, pass: &WritePass) -> Result<(), WriteError>;

	/// Fill an already-allocated, blank instance's fields from the stream.
	fn read_body(&mut self, src: &mut dyn ByteSource, pass: &mut ReadPass) -> Result<(), ReadError>;

	fn as_any(&self) -> &dyn Any;
	fn as_any_mut(&mut self) -> &mut dyn Any;

	fn prelude_extra(&self) -> PreludeExtra<'_> {
		PreludeExtra::None
	}

	/// Invoked once per object, in id order, after every object's body (and
	/// every custom constructor) has run (`spec.md` §4.9 step 7).
	fn on_deserialized(&mut self) {}
}

/// Per-type static metadata, available wherever the concrete type `T` is
/// known at compile time. `Self: Sized` keeps this out of `GraphObject`'s
/// vtable; dynamic callers go through [`crate::registry::TypeRegistration`]
/// instead.
pub trait Reflected: GraphObject + Sized + 'static {
	const KIND: TypeKind;

	fn type_name() -> &'static str;

	/// Sentinel-255 types (`KIND != Struct`) return `&[]`.
	fn schema() -> &'static [FieldSchema];

	/// Substitute for "uninitialized allocation" (`spec.md` §9): produces a
	/// blank instance with no constructor-equivalent logic run. Every field
	/// is a placeholder (`0`, `false`, `Ref::NULL`, or a nested
	/// `allocate()`) to be overwritten by `read_body`.
	fn allocate() -> Self;
}

/// Whether an array element is written as a fixed-width primitive, an
/// object id (reference), or recursed into inline (embedded value type).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ElementKind {
	Primitive,
	Reference,
	Value,
}

/// What it takes for `E` to appear inside a [`GraphArray<E>`]
/// (`spec.md` §4.4/§4.5/§4.6, the four array variants).
pub trait ArrayElement: 'static {
	fn element_type_name() -> &'static str;
	fn element_kind() -> ElementKind;

	/// Placeholder used to pre-size an array during read-side allocation,
	/// before any element has actually been read.
	fn placeholder() -> Self
	where
		Self: Sized;

	fn scan_element(&self, scan: &mut ScanPass);
	fn write_element(&self, sink: &mut dyn ByteSink, pass: &WritePass) -> Result<(), WriteError>;
	fn read_element(src: &mut dyn ByteSource, pass: &mut ReadPass) -> Result<Self, ReadError>
	where
		Self: Sized;

	/// Default per-element loop; `u8` overrides this with a raw-bytes fast
	/// path (`spec.md` §4.5, "Byte array: write raw bytes").
	fn write_seq(items: &[Self], sink: &mut dyn ByteSink, pass: &WritePass) -> Result<(), WriteError>
	where
		Self: Sized,
	{
		for item in items {
			item.write_element(sink, pass)?;
		}
		Ok(())
	}

	fn read_seq(count: usize, src: &mut dyn ByteSource, pass: &mut ReadPass) -> Result<Vec<Self>, ReadError>
	where
		Self: Sized,
	{
		let mut out = Vec::with_capacity(count);
		for _ in 0..count {
			out.push(Self::read_element(src, pass)?);
		}
		Ok(out)
	}
}

/// An array-reflected type can additionally be allocated with a known
/// length, read off the stream before any element exists
/// (`spec.md` §4.9 step 4).
pub trait ArrayReflected: Reflected {
	fn allocate_with_len(len: usize) -> Self;
}

macro_rules! impl_array_element_primitive {
	($($ty:ty => $read:ident / $write:ident),* $(,)?) => {$(
		impl ArrayElement for $ty {
			fn element_type_name() -> &'static str { stringify!($ty) }
			fn element_kind() -> ElementKind { ElementKind::Primitive }
			fn placeholder() -> Self { Default::default() }
			fn scan_element(&self, _scan: &mut ScanPass) {}
			fn write_element(&self, sink: &mut dyn ByteSink, _pass: &WritePass) -> Result<(), WriteError> {
				sink.$write(*self)
			}
			fn read_element(src: &mut dyn ByteSource, _pass: &mut ReadPass) -> Result<Self, ReadError> {
				src.$read()
			}
		}
	)*};
}

impl_array_element_primitive! {
	i8 => read_i8 / write_i8,
	i16 => read_i16 / write_i16,
	i32 => read_i32 / write_i32,
	i64 => read_i64 / write_i64,
	u16 => read_u16 / write_u16,
	u32 => read_u32 / write_u32,
	u64 => read_u64 / write_u64,
	f32 => read_f32 / write_f32,
	f64 => read_f64 / write_f64,
	bool => read_bool / write_bool,
}

/// `u8` gets the byte-array fast path instead of the generic per-element
/// loop above.
impl ArrayElement for u8 {
	fn element_type_name() -> &'static str {
		"u8"
	}

	fn element_kind() -> ElementKind {
		ElementKind::Primitive
	}

	fn placeholder() -> Self {
		0
	}

	fn scan_element(&self, _scan: &mut ScanPass) {}

	fn write_element(&self, sink: &mut dyn ByteSink, _pass: &WritePass) -> Result<(), WriteError> {
		sink.write_u8(*self)
	}

	fn read_element(src: &mut dyn ByteSource, _pass: &mut ReadPass) -> Result<Self, ReadError> {
		src.read_u8()
	}

	fn write_seq(items: &[Self], sink: &mut dyn ByteSink, _pass: &WritePass) -> Result<(), WriteError> {
		sink.write_bytes(items)
	}

	fn read_seq(count: usize, src: &mut dyn ByteSource, _pass: &mut ReadPass) -> Result<Vec<Self>, ReadError> {
		let mut buf = vec![0u8; count];
		src.read_bytes(&mut buf)?;
		Ok(buf)
	}
}

impl<T: Reflected> ArrayElement for Ref<T> {
	fn element_type_name() -> &'static str {
		T::type_name()
	}

	fn element_kind() -> ElementKind {
		ElementKind::Reference
	}

	fn placeholder() -> Self {
		Ref::NULL
	}

	fn scan_element(&self, scan: &mut ScanPass) {
		scan.mark(*self);
	}

	fn write_element(&self, sink: &mut dyn ByteSink, pass: &WritePass) -> Result<(), WriteError> {
		pass.write_ref(sink, *self)
	}

	fn read_element(src: &mut dyn ByteSource, pass: &mut ReadPass) -> Result<Self, ReadError> {
		pass.read_ref(src)
	}
}

/// A rank-1 array, instance-tracked like any reference type (`spec.md` §3:
/// arrays get their own object id). Jagged arrays are arrays of
/// `Ref<GraphArray<E>>`; multi-dimensional arrays aren't modeled (`spec.md`
/// §9 explicitly rejects rank != 1).
#[derive(Debug)]
pub struct GraphArray<E: ArrayElement + Debug> {
	pub items: Vec<E>,
}

impl<E: ArrayElement + Debug> GraphArray<E> {
	pub fn new(items: Vec<E>) -> Self {
		GraphArray { items }
	}
}

impl<E: ArrayElement + Debug> GraphObject for GraphArray<E> {
	fn graph_type_name(&self) -> &'static str {
		Self::type_name()
	}

	fn scan_refs(&self, scan: &mut ScanPass) {
		for item in &self.items {
			item.scan_element(scan);
		}
	}

	fn write_body(&self, sink: &mut dyn ByteSink, pass: &WritePass) -> Result<(), WriteError> {
		E::write_seq(&self.items, sink, pass)
	}

	fn read_body(&mut self, src: &mut dyn ByteSource, pass: &mut ReadPass) -> Result<(), ReadError> {
		self.items = E::read_seq(self.items.len(), src, pass)?;
		Ok(())
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn prelude_extra(&self) -> PreludeExtra<'_> {
		PreludeExtra::ArrayLength(self.items.len() as u32)
	}
}

impl<E: ArrayElement + Debug> Reflected for GraphArray<E> {
	const KIND: TypeKind = TypeKind::Array;

	fn type_name() -> &'static str {
		// One `OnceLock<String>` per monomorphization of `E`.
		static NAME: OnceLock<String> = OnceLock::new();
		NAME.get_or_init(|| format!("graphwire::GraphArray<{}>", E::element_type_name())).as_str()
	}

	fn schema() -> &'static [FieldSchema] {
		&[]
	}

	fn allocate() -> Self {
		GraphArray { items: Vec::new() }
	}
}

impl<E: ArrayElement + Debug> ArrayReflected for GraphArray<E> {
	fn allocate_with_len(len: usize) -> Self {
		GraphArray { items: (0..len).map(|_| E::placeholder()).collect() }
	}
}

/// Boxed string: content has no object id of its own separate from the
/// string instance, and (per `spec.md` §4.5) no body bytes — the text goes
/// out in the creation prelude.
#[derive(Debug, Clone, Default)]
pub struct GraphString(pub String);

impl From<&str> for GraphString {
	fn from(value: &str) -> Self {
		GraphString(value.to_owned())
	}
}

impl From<String> for GraphString {
	fn from(value: String) -> Self {
		GraphString(value)
	}
}

impl GraphObject for GraphString {
	fn graph_type_name(&self) -> &'static str {
		Self::type_name()
	}

	fn scan_refs(&self, _scan: &mut ScanPass) {}

	fn write_body(&self, _sink: &mut dyn ByteSink, _pass: &WritePass) -> Result<(), WriteError> {
		Ok(())
	}

	fn read_body(&mut self, _src: &mut dyn ByteSource, _pass: &mut ReadPass) -> Result<(), ReadError> {
		Ok(())
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn prelude_extra(&self) -> PreludeExtra<'_> {
		PreludeExtra::StringValue(&self.0)
	}
}

impl Reflected for GraphString {
	const KIND: TypeKind = TypeKind::Str;

	fn type_name() -> &'static str {
		"graphwire::GraphString"
	}

	fn schema() -> &'static [FieldSchema] {
		&[]
	}

	fn allocate() -> Self {
		GraphString(String::new())
	}
}

// `GraphString` is reference-typed per the identity model (`spec.md` §3:
// every string is its own instance-tracked object, same as `StringPair`'s
// `Ref<GraphString>` fields). An array of strings is therefore
// `GraphArray<Ref<GraphString>>`, going through the blanket
// `impl<T: Reflected> ArrayElement for Ref<T>` above rather than a direct
// impl on `GraphString` itself — a direct impl with no object id would have
// nothing to `Mark`/write, so every element would round-trip as empty.

macro_rules! define_boxed_primitives {
	($($ty:ident),* $(,)?) => { paste::paste! { $(
		#[doc = "A boxed `" $ty "`, instance-tracked like any other reachable value (`spec.md` §3: \"primitives are boxed on entry and thus also distinct by identity\")."]
		#[derive(Debug, Clone, Copy, Default, PartialEq)]
		pub struct [<Boxed $ty:camel>](pub $ty);

		impl GraphObject for [<Boxed $ty:camel>] {
			fn graph_type_name(&self) -> &'static str { Self::type_name() }
			fn scan_refs(&self, _scan: &mut ScanPass) {}
			fn write_body(&self, sink: &mut dyn ByteSink, _pass: &WritePass) -> Result<(), WriteError> {
				sink.[<write_ $ty>](self.0)
			}
			fn read_body(&mut self, src: &mut dyn ByteSource, _pass: &mut ReadPass) -> Result<(), ReadError> {
				self.0 = src.[<read_ $ty>]()?;
				Ok(())
			}
			fn as_any(&self) -> &dyn Any { self }
			fn as_any_mut(&mut self) -> &mut dyn Any { self }
		}

		impl Reflected for [<Boxed $ty:camel>] {
			const KIND: TypeKind = TypeKind::Primitive;
			fn type_name() -> &'static str { concat!("graphwire::Boxed", stringify!([<$ty:camel>])) }
			fn schema() -> &'static [FieldSchema] { &[] }
			fn allocate() -> Self { Default::default() }
		}
	)* } };
}

define_boxed_primitives!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool);

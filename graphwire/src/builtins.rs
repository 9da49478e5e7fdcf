//! Registrations for the wire-level types every stream can produce without
//! any user opt-in: the bare primitive names used by un-boxed struct fields
//! (schema-only declared types, never instantiated), `GraphString`, the
//! boxed primitives, and arrays of all of the above.

use crate::reflect::{GraphObject, Reflected, TypeKind};
use crate::registry::TypeRegistration;

macro_rules! register_primitive_declared_type {
	($ty:ident) => {
		inventory::submit! {
			TypeRegistration {
				type_name: stringify!($ty),
				kind: TypeKind::Primitive,
				schema: &[],
				allocate: || unreachable!("bare primitive declared types are never instantiated as objects"),
				allocate_with_len: None,
				custom: None,
			}
		}
	};
}

register_primitive_declared_type!(i8);
register_primitive_declared_type!(i16);
register_primitive_declared_type!(i32);
register_primitive_declared_type!(i64);
register_primitive_declared_type!(u8);
register_primitive_declared_type!(u16);
register_primitive_declared_type!(u32);
register_primitive_declared_type!(u64);
register_primitive_declared_type!(f32);
register_primitive_declared_type!(f64);
register_primitive_declared_type!(bool);

inventory::submit! {
	TypeRegistration {
		type_name: crate::reflect::GraphString::type_name(),
		kind: TypeKind::Str,
		schema: &[],
		allocate: || Box::new(crate::reflect::GraphString::allocate()) as Box<dyn GraphObject>,
		allocate_with_len: None,
		custom: None,
	}
}

macro_rules! register_boxed_primitive {
	($ty:ident) => {
		paste::paste! {
			inventory::submit! {
				TypeRegistration {
					type_name: crate::reflect::[<Boxed $ty:camel>]::type_name(),
					kind: TypeKind::Primitive,
					schema: &[],
					allocate: || Box::new(crate::reflect::[<Boxed $ty:camel>]::allocate()) as Box<dyn GraphObject>,
					allocate_with_len: None,
					custom: None,
				}
			}
		}
	};
}

register_boxed_primitive!(i8);
register_boxed_primitive!(i16);
register_boxed_primitive!(i32);
register_boxed_primitive!(i64);
register_boxed_primitive!(u8);
register_boxed_primitive!(u16);
register_boxed_primitive!(u32);
register_boxed_primitive!(u64);
register_boxed_primitive!(f32);
register_boxed_primitive!(f64);
register_boxed_primitive!(bool);

crate::register_array_element!(i8);
crate::register_array_element!(i16);
crate::register_array_element!(i32);
crate::register_array_element!(i64);
crate::register_array_element!(u8);
crate::register_array_element!(u16);
crate::register_array_element!(u32);
crate::register_array_element!(u64);
crate::register_array_element!(f32);
crate::register_array_element!(f64);
crate::register_array_element!(bool);
crate::register_array_element!(crate::ids::Ref<crate::reflect::GraphString>);

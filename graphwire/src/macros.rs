//! Public registration macros. `#[derive(GraphObject)]` handles the common
//! case by emitting its own `inventory::submit!` call; these two cover the
//! cases that can't be mechanically derived (`SPEC_FULL.md` §4.7, §4.4).
//!
//! Both expand to paths under the crate root (`$crate::Foo`, not
//! `$crate::some_private_module::Foo`) so they resolve the same way whether
//! invoked from a downstream crate or from `graphwire`'s own tests under
//! `use crate as graphwire;`.

/// Registers a hand-written [`crate::CustomGraphObject`] type so it can be
/// resolved by name during read (`spec.md` §4.2) and recognized as
/// custom-serializable during scan (`spec.md` §4.7). `$ty` must also
/// implement [`crate::GraphObject`] and [`crate::Reflected`] (with
/// `KIND = TypeKind::Custom`); those impls' field-reflection methods are
/// never invoked and may be stubbed with `unreachable!()`.
#[macro_export]
macro_rules! register_custom_object {
	($ty:ty) => {
		$crate::inventory::submit! {
			$crate::TypeRegistration {
				type_name: <$ty as $crate::Reflected>::type_name(),
				kind: $crate::TypeKind::Custom,
				schema: &[],
				allocate: || unreachable!("custom types are allocated as CustomPlaceholder, never via Reflected::allocate"),
				allocate_with_len: None,
				custom: ::std::option::Option::Some($crate::CustomOps {
					to_entries: |obj, scan| {
						let obj = $crate::GraphObject::as_any(obj)
							.downcast_ref::<$ty>()
							.expect("graphwire: custom object registration type mismatch");
						<$ty as $crate::CustomGraphObject>::to_entries(obj, scan)
					},
					from_entries: |entries, ctx| {
						::std::boxed::Box::new(<$ty as $crate::CustomGraphObject>::from_entries(entries, ctx))
							as ::std::boxed::Box<dyn $crate::GraphObject>
					},
				}),
			}
		}
	};
}

/// Registers `GraphArray<$elem>` so arrays of `$elem` can be resolved by
/// name during read. `#[derive(GraphObject)]` only ever emits `Ref<T>`
/// fields pointing at user types, never `GraphArray<Ref<T>>` directly, so
/// this is the one array instantiation per element type that needs explicit
/// opt-in — the built-in primitive/string element types are pre-registered
/// by this crate.
#[macro_export]
macro_rules! register_array_element {
	($elem:ty) => {
		$crate::inventory::submit! {
			$crate::TypeRegistration {
				type_name: <$crate::GraphArray<$elem> as $crate::Reflected>::type_name(),
				kind: $crate::TypeKind::Array,
				schema: &[],
				allocate: || {
					::std::boxed::Box::new(<$crate::GraphArray<$elem> as $crate::Reflected>::allocate())
						as ::std::boxed::Box<dyn $crate::GraphObject>
				},
				allocate_with_len: ::std::option::Option::Some(|len| {
					::std::boxed::Box::new(<$crate::GraphArray<$elem> as $crate::ArrayReflected>::allocate_with_len(len))
						as ::std::boxed::Box<dyn $crate::GraphObject>
				}),
				custom: ::std::option::Option::None,
			}
		}
	};
}

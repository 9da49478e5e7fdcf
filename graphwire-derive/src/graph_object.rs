use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, GenericArgument, PathArguments, Type};

const PRIMITIVES: &[&str] = &["i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "bool"];

enum FieldKind<'a> {
	/// `Ref<T>`: tracked by reference identity, carries the referent's object id.
	Reference(&'a Type),
	/// One of the eleven scalar primitives, stored inline.
	Primitive(&'static str),
	/// Any other type: recursed into directly via its own `GraphObject` impl,
	/// with no object id of its own.
	Embedded,
}

fn is_skipped(attrs: &[Attribute]) -> bool {
	attrs.iter().any(|attr| {
		if !attr.path().is_ident("graphwire") {
			return false;
		}
		let mut skip = false;
		let _ = attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("skip") {
				skip = true;
			}
			Ok(())
		});
		skip
	})
}

fn ref_inner_type(ty: &Type) -> &Type {
	let Type::Path(path) = ty else { panic!("expected `Ref<T>`") };
	let segment = path.path.segments.last().expect("expected `Ref<T>`");
	let PathArguments::AngleBracketed(args) = &segment.arguments else {
		panic!("`Ref` requires a type argument")
	};
	match args.args.first() {
		Some(GenericArgument::Type(inner)) => inner,
		_ => panic!("`Ref` requires a type argument"),
	}
}

fn classify(ty: &Type) -> FieldKind<'_> {
	if let Type::Path(path) = ty {
		if let Some(segment) = path.path.segments.last() {
			if segment.ident == "Ref" {
				return FieldKind::Reference(ref_inner_type(ty));
			}
			if path.path.segments.len() == 1 {
				if let Some(&name) = PRIMITIVES.iter().find(|&&p| segment.ident == p) {
					return FieldKind::Primitive(name);
				}
			}
		}
	}
	FieldKind::Embedded
}

pub fn derive(tokens: proc_macro::TokenStream) -> TokenStream {
	let DeriveInput { ident, data, generics, .. } = syn::parse(tokens).unwrap();

	if !generics.params.is_empty() {
		panic!("#[derive(GraphObject)] does not support generic types");
	}

	let data = match data {
		Data::Struct(data) => data,
		Data::Enum(_) => panic!("#[derive(GraphObject)] does not support enums"),
		Data::Union(_) => panic!("#[derive(GraphObject)] does not support unions"),
	};

	let mut fields = match data.fields {
		Fields::Named(fields) => fields.named.into_iter().collect::<Vec<_>>(),
		Fields::Unit => Vec::new(),
		Fields::Unnamed(_) => panic!("#[derive(GraphObject)] requires named fields"),
	};

	// `spec.md` §4.3: fields are processed and emitted in lexicographic order
	// by name within each level, independent of declaration order, so the
	// wire schema doesn't depend on how the struct happens to be written.
	fields.sort_by(|a, b| a.ident.as_ref().unwrap().to_string().cmp(&b.ident.as_ref().unwrap().to_string()));

	let mut scan_stmts = Vec::with_capacity(fields.len());
	let mut write_stmts = Vec::with_capacity(fields.len());
	let mut read_stmts = Vec::with_capacity(fields.len());
	let mut schema_entries = Vec::with_capacity(fields.len());
	let mut allocate_fields = Vec::with_capacity(fields.len());

	for Field { attrs, ident: name, ty, .. } in &fields {
		let name = name.as_ref().expect("named fields");

		if is_skipped(attrs) {
			allocate_fields.push(quote! { #name: ::std::default::Default::default() });
			continue;
		}

		match classify(ty) {
			FieldKind::Reference(inner) => {
				scan_stmts.push(quote! { scan.mark(self.#name); });
				write_stmts.push(quote! { pass.write_ref(sink, self.#name)?; });
				read_stmts.push(quote! { self.#name = pass.read_ref(src)?; });
				schema_entries.push(quote! {
					graphwire::FieldSchema {
						name: stringify!(#name),
						declared_type_name: <#inner as graphwire::Reflected>::type_name(),
					}
				});
				allocate_fields.push(quote! { #name: graphwire::Ref::NULL });
			}
			FieldKind::Primitive(prim) => {
				let write_fn = format_ident!("write_{prim}");
				let read_fn = format_ident!("read_{prim}");
				write_stmts.push(quote! { sink.#write_fn(self.#name)?; });
				read_stmts.push(quote! { self.#name = src.#read_fn()?; });
				schema_entries.push(quote! {
					graphwire::FieldSchema {
						name: stringify!(#name),
						declared_type_name: #prim,
					}
				});
				allocate_fields.push(quote! { #name: ::std::default::Default::default() });
			}
			FieldKind::Embedded => {
				write_stmts.push(quote! { graphwire::GraphObject::write_body(&self.#name, sink, pass)?; });
				read_stmts.push(quote! { graphwire::GraphObject::read_body(&mut self.#name, src, pass)?; });
				scan_stmts.push(quote! { graphwire::GraphObject::scan_refs(&self.#name, scan); });
				schema_entries.push(quote! {
					graphwire::FieldSchema {
						name: stringify!(#name),
						declared_type_name: <#ty as graphwire::Reflected>::type_name(),
					}
				});
				allocate_fields.push(quote! { #name: <#ty as graphwire::Reflected>::allocate() });
			}
		}
	}

	quote! {
		impl graphwire::GraphObject for #ident {
			fn graph_type_name(&self) -> &'static str {
				<Self as graphwire::Reflected>::type_name()
			}

			fn scan_refs(&self, scan: &mut graphwire::ScanPass) {
				#(#scan_stmts)*
			}

			fn write_body(&self, sink: &mut dyn graphwire::ByteSink, pass: &graphwire::WritePass) -> ::std::result::Result<(), graphwire::WriteError> {
				#(#write_stmts)*
				Ok(())
			}

			fn read_body(&mut self, src: &mut dyn graphwire::ByteSource, pass: &mut graphwire::ReadPass) -> ::std::result::Result<(), graphwire::ReadError> {
				#(#read_stmts)*
				Ok(())
			}

			fn as_any(&self) -> &dyn ::std::any::Any {
				self
			}

			fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
				self
			}
		}

		impl graphwire::Reflected for #ident {
			const KIND: graphwire::TypeKind = graphwire::TypeKind::Struct;

			fn type_name() -> &'static str {
				concat!(module_path!(), "::", stringify!(#ident))
			}

			fn schema() -> &'static [graphwire::FieldSchema] {
				&[#(#schema_entries),*]
			}

			fn allocate() -> Self {
				#ident { #(#allocate_fields),* }
			}
		}

		graphwire::inventory::submit! {
			graphwire::TypeRegistration {
				type_name: <#ident as graphwire::Reflected>::type_name(),
				kind: graphwire::TypeKind::Struct,
				schema: <#ident as graphwire::Reflected>::schema(),
				allocate: || ::std::boxed::Box::new(<#ident as graphwire::Reflected>::allocate()) as ::std::boxed::Box<dyn graphwire::GraphObject>,
				allocate_with_len: None,
				custom: None,
			}
		}

		// Lets `#ident` appear as a `GraphArray<#ident>` element (`spec.md`
		// §4.4/§4.5, "array of composite value type"): recursed into inline,
		// same as an embedded struct field, with no object id of its own.
		impl graphwire::ArrayElement for #ident {
			fn element_type_name() -> &'static str {
				<Self as graphwire::Reflected>::type_name()
			}

			fn element_kind() -> graphwire::ElementKind {
				graphwire::ElementKind::Value
			}

			fn placeholder() -> Self {
				<Self as graphwire::Reflected>::allocate()
			}

			fn scan_element(&self, scan: &mut graphwire::ScanPass) {
				graphwire::GraphObject::scan_refs(self, scan);
			}

			fn write_element(&self, sink: &mut dyn graphwire::ByteSink, pass: &graphwire::WritePass) -> ::std::result::Result<(), graphwire::WriteError> {
				graphwire::GraphObject::write_body(self, sink, pass)
			}

			fn read_element(src: &mut dyn graphwire::ByteSource, pass: &mut graphwire::ReadPass) -> ::std::result::Result<Self, graphwire::ReadError> {
				let mut value = <Self as graphwire::Reflected>::allocate();
				graphwire::GraphObject::read_body(&mut value, src, pass)?;
				Ok(value)
			}
		}
	}
}

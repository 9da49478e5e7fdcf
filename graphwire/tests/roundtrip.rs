//! End-to-end coverage of the wire contract: round-trip, identity and cycle
//! preservation, custom serialization, schema-drift detection, and the
//! object-id width boundary.

use graphwire::{
	AnyRef, BoxedI32, Graph, GraphArray, GraphObject, GraphString, ObjectId, Ref, ReadError, ReadPass, ScanPass, Serializer, WriteError,
};

#[derive(Debug, GraphObject)]
struct IntHolder {
	x: i32,
}

#[derive(Debug, GraphObject)]
struct Node {
	next: Ref<Node>,
	value: i32,
}

#[derive(Debug, GraphObject)]
struct Pair {
	a: Ref<IntHolder>,
	b: Ref<IntHolder>,
}

#[derive(Debug, GraphObject)]
struct StringPair {
	first: Ref<GraphString>,
	second: Ref<GraphString>,
}

#[derive(Debug, PartialEq, GraphObject)]
struct Point {
	x: i32,
	y: i32,
}

graphwire::register_array_element!(Ref<IntHolder>);
graphwire::register_array_element!(Point);

#[test]
fn s1_primitive_field_wire_shape() {
	let mut graph = Graph::new();
	let root = graph.insert(IntHolder { x: 0x0102_0304 });

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	// typesCount=2 (IntHolder + its schema-only "i32" field type),
	// objectsCount=2, typeCountForObjects=1.
	assert_eq!(bytes[0], 2);
	assert_eq!(bytes[1], 2);
	assert_eq!(bytes[2], 1);
	assert_eq!(&bytes[bytes.len() - 4..], &[0x04, 0x03, 0x02, 0x01]);

	let (graph2, root2): (Graph, Ref<IntHolder>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	assert_eq!(graph2.get(root2).unwrap().x, 0x0102_0304);
}

#[test]
fn s2_shared_reference_preserves_identity() {
	let mut graph = Graph::new();
	let leaf = graph.insert(IntHolder { x: 42 });
	let root = graph.insert(Pair { a: leaf, b: leaf });
	assert_eq!(graph.len(), 2, "a and b share one leaf, not two");

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	let (graph2, root2): (Graph, Ref<Pair>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	let pair = graph2.get(root2).unwrap();
	assert_eq!(pair.a.as_any(), pair.b.as_any());
	assert_eq!(graph2.get(pair.a).unwrap().x, 42);
}

#[test]
fn s3_cycle_round_trips() {
	let mut graph = Graph::new();
	let n1 = graph.insert(Node { next: Ref::NULL, value: 1 });
	let n2 = graph.insert(Node { next: n1, value: 2 });
	graph.get_mut(n1).unwrap().next = n2;

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, n1, &mut bytes).unwrap();

	let (graph2, n1_2): (Graph, Ref<Node>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	let n2_2 = graph2.get(n1_2).unwrap().next;
	let back_to_n1 = graph2.get(n2_2).unwrap().next;
	assert_eq!(back_to_n1.as_any(), n1_2.as_any());
}

#[test]
fn s4_shared_string_identity_preserved() {
	let mut graph = Graph::new();
	let shared = graph.insert(GraphString::from("hello"));
	let root = graph.insert(StringPair { first: shared, second: shared });
	assert_eq!(graph.len(), 2, "both fields share one string instance");

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	// the shared string's content is materialized exactly once in the
	// creation prelude.
	let occurrences = bytes.windows(6).filter(|w| w == b"\x05hello").count();
	assert_eq!(occurrences, 1);

	let (graph2, root2): (Graph, Ref<StringPair>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	let pair = graph2.get(root2).unwrap();
	assert_eq!(pair.first.as_any(), pair.second.as_any());
	assert_eq!(graph2.get(pair.first).unwrap().0, "hello");
}

#[test]
fn array_of_primitives_round_trips() {
	let mut graph = Graph::new();
	let root = graph.insert(GraphArray::new(vec![1_i32, -2, 3, i32::MAX]));

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	let (graph2, root2): (Graph, Ref<GraphArray<i32>>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	assert_eq!(graph2.get(root2).unwrap().items, vec![1, -2, 3, i32::MAX]);
}

#[test]
fn array_of_bytes_uses_raw_fast_path() {
	let mut graph = Graph::new();
	let root = graph.insert(GraphArray::new(vec![0u8, 1, 2, 255]));

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();
	assert!(bytes.windows(4).any(|w| w == [0, 1, 2, 255]), "raw bytes appear contiguously, not per-element encoded");

	let (graph2, root2): (Graph, Ref<GraphArray<u8>>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	assert_eq!(graph2.get(root2).unwrap().items, vec![0, 1, 2, 255]);
}

#[test]
fn array_of_references_preserves_identity() {
	let mut graph = Graph::new();
	let shared = graph.insert(IntHolder { x: 7 });
	let other = graph.insert(IntHolder { x: 9 });
	let root = graph.insert(GraphArray::new(vec![shared, other, shared]));

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	let (graph2, root2): (Graph, Ref<GraphArray<Ref<IntHolder>>>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	let items = &graph2.get(root2).unwrap().items;
	assert_eq!(items[0].as_any(), items[2].as_any());
	assert_ne!(items[0].as_any(), items[1].as_any());
	assert_eq!(graph2.get(items[0]).unwrap().x, 7);
	assert_eq!(graph2.get(items[1]).unwrap().x, 9);
}

#[test]
fn array_of_strings_round_trips_content() {
	let mut graph = Graph::new();
	let a = graph.insert(GraphString::from("alpha"));
	let b = graph.insert(GraphString::from("beta"));
	let root = graph.insert(GraphArray::new(vec![a, b, a]));

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	let (graph2, root2): (Graph, Ref<GraphArray<Ref<GraphString>>>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	let items = &graph2.get(root2).unwrap().items;
	assert_eq!(graph2.get(items[0]).unwrap().0, "alpha");
	assert_eq!(graph2.get(items[1]).unwrap().0, "beta");
	assert_eq!(items[0].as_any(), items[2].as_any(), "repeated string shares one instance");
}

#[test]
fn array_of_composite_value_type_round_trips() {
	let mut graph = Graph::new();
	let root = graph.insert(GraphArray::new(vec![Point { x: 1, y: 2 }, Point { x: -3, y: 4 }]));

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	let (graph2, root2): (Graph, Ref<GraphArray<Point>>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	assert_eq!(graph2.get(root2).unwrap().items, vec![Point { x: 1, y: 2 }, Point { x: -3, y: 4 }]);
}

/// A settings bag that serializes as a `(name, value)` map instead of
/// reflecting its own fields — the custom-serialization adapter.
#[derive(Debug)]
struct Settings {
	count: Ref<BoxedI32>,
	label: Ref<GraphString>,
}

impl GraphObject for Settings {
	fn graph_type_name(&self) -> &'static str {
		<Self as graphwire::Reflected>::type_name()
	}
	fn scan_refs(&self, _scan: &mut ScanPass) {
		unreachable!("custom types are never scanned through GraphObject::scan_refs")
	}
	fn write_body(&self, _sink: &mut dyn graphwire::ByteSink, _pass: &graphwire::WritePass) -> Result<(), WriteError> {
		unreachable!("custom types are never written through GraphObject::write_body")
	}
	fn read_body(&mut self, _src: &mut dyn graphwire::ByteSource, _pass: &mut ReadPass) -> Result<(), ReadError> {
		unreachable!("custom types are never read through GraphObject::read_body")
	}
	fn as_any(&self) -> &dyn std::any::Any {
		self
	}
	fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
		self
	}
}

impl graphwire::Reflected for Settings {
	const KIND: graphwire::TypeKind = graphwire::TypeKind::Custom;
	fn type_name() -> &'static str {
		"roundtrip::Settings"
	}
	fn schema() -> &'static [graphwire::FieldSchema] {
		&[]
	}
	fn allocate() -> Self {
		unreachable!("custom types are allocated as CustomPlaceholder")
	}
}

impl graphwire::CustomGraphObject for Settings {
	fn to_entries(&self, scan: &mut ScanPass) -> Vec<(String, AnyRef)> {
		scan.mark(self.count);
		scan.mark(self.label);
		vec![("count".to_string(), self.count.as_any()), ("label".to_string(), self.label.as_any())]
	}

	fn from_entries(entries: &[(String, ObjectId)], ctx: &ReadPass) -> Self {
		let mut count = Ref::NULL;
		let mut label = Ref::NULL;
		for (name, id) in entries {
			match name.as_str() {
				"count" => count = ctx.resolve(*id),
				"label" => label = ctx.resolve(*id),
				_ => {}
			}
		}
		Settings { count, label }
	}
}

graphwire::register_custom_object!(Settings);

#[test]
fn s5_custom_serialization_round_trip() {
	let mut graph = Graph::new();
	let settings = settings_with_values(&mut graph);
	let root = graph.insert(settings);

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	let (graph2, root2): (Graph, Ref<Settings>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	let settings = graph2.get(root2).unwrap();
	assert_eq!(graph2.get(settings.count).unwrap().0, 7);
	assert_eq!(graph2.get(settings.label).unwrap().0, "hi");
}

fn settings_with_values(graph: &mut Graph) -> Settings {
	let count = graph.insert(BoxedI32(7));
	let label = graph.insert(GraphString::from("hi"));
	Settings { count, label }
}

#[test]
fn s6_schema_drift_is_detected() {
	#[derive(Debug, GraphObject)]
	struct SchemaDriftRoot {
		zzz_drift_field: i32,
	}

	let mut graph = Graph::new();
	let root = graph.insert(SchemaDriftRoot { zzz_drift_field: 1 });
	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	// corrupt the schema row's field name to simulate a rename between the
	// write and the read side, without touching anything else in the stream.
	let needle = b"\x0fzzz_drift_field";
	let pos = bytes.windows(needle.len()).position(|w| w == needle).expect("field name present exactly once");
	bytes[pos + needle.len() - 1] = b'e'; // "...drift_field" -> "...drift_fiele"

	let result: Result<(Graph, Ref<SchemaDriftRoot>), ReadError> = Serializer::new().deserialize(bytes.as_slice());
	assert!(matches!(result, Err(ReadError::SchemaFieldMismatch { .. })));
}

#[test]
fn universal_null_field_round_trips_to_null() {
	let mut graph = Graph::new();
	let root = graph.insert(Node { next: Ref::NULL, value: 9 });

	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, root, &mut bytes).unwrap();

	let (graph2, root2): (Graph, Ref<Node>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	assert!(graph2.get(root2).unwrap().next.is_null());
	assert_eq!(graph2.len(), 1, "the null sentinel never occupies an arena slot");
}

#[test]
fn universal_null_root_serializes_to_empty_graph() {
	let mut graph = Graph::new();
	let mut bytes = Vec::new();
	Serializer::new().serialize(&mut graph, Ref::<Node>::NULL, &mut bytes).unwrap();

	let (graph2, root2): (Graph, Ref<Node>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
	assert!(root2.is_null());
	assert!(graph2.is_empty());
}

#[test]
fn universal_determinism() {
	let build = || {
		let mut graph = Graph::new();
		let leaf = graph.insert(IntHolder { x: 5 });
		let root = graph.insert(Pair { a: leaf, b: leaf });
		(graph, root)
	};

	let (mut g1, r1) = build();
	let (mut g2, r2) = build();

	let mut b1 = Vec::new();
	let mut b2 = Vec::new();
	Serializer::new().serialize(&mut g1, r1, &mut b1).unwrap();
	Serializer::new().serialize(&mut g2, r2, &mut b2).unwrap();
	assert_eq!(b1, b2);
}

#[test]
fn universal_id_width_crosses_from_u16_to_i32() {
	fn build_chain(len: usize) -> (Graph, Ref<Node>) {
		let mut graph = Graph::with_capacity(len);
		let mut head = Ref::NULL;
		for i in 0..len {
			head = graph.insert(Node { next: head, value: i as i32 });
		}
		(graph, head)
	}

	// exactly 65_535 instances: ids still fit in u16.
	let (mut g1, r1) = build_chain(65_535);
	let mut b1 = Vec::new();
	Serializer::new().serialize(&mut g1, r1, &mut b1).unwrap();
	let (g1b, r1b): (Graph, Ref<Node>) = Serializer::new().deserialize(b1.as_slice()).unwrap();
	assert_eq!(g1b.len(), 65_535);
	assert_eq!(g1b.get(r1b).unwrap().value, 65_534);

	// one more instance tips the width over to i32.
	let (mut g2, r2) = build_chain(65_536);
	let mut b2 = Vec::new();
	Serializer::new().serialize(&mut g2, r2, &mut b2).unwrap();
	let (g2b, r2b): (Graph, Ref<Node>) = Serializer::new().deserialize(b2.as_slice()).unwrap();
	assert_eq!(g2b.len(), 65_536);
	assert_eq!(g2b.get(r2b).unwrap().value, 65_535);
}

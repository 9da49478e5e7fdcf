use std::time::Instant;

use graphwire::{Graph, GraphObject, Ref, Serializer};

#[derive(Debug, GraphObject)]
struct Node {
	name: Ref<graphwire::GraphString>,
	next: Ref<Node>,
	value: i64,
}

fn setup_global_subscriber() {
	tracing_subscriber::fmt::init();
}

fn build_cyclic_list(graph: &mut Graph, len: usize) -> Ref<Node> {
	let mut head = Ref::NULL;
	for i in (0..len).rev() {
		let name = graph.insert(graphwire::GraphString::from(format!("node-{i}")));
		head = graph.insert(Node { name, next: head, value: i as i64 });
	}
	// close the loop: the tail points back at the head.
	let mut cursor = head;
	loop {
		let next = graph.get(cursor).unwrap().next;
		if next.is_null() {
			graph.get_mut(cursor).unwrap().next = head;
			break;
		}
		cursor = next;
	}
	head
}

fn main() {
	setup_global_subscriber();

	let mut graph = Graph::new();
	let head = build_cyclic_list(&mut graph, 8);
	tracing::info!(nodes = graph.len(), "built a cyclic linked list");

	let serializer = Serializer::new();

	let start = Instant::now();
	let mut bytes = Vec::new();
	serializer.serialize(&mut graph, head, &mut bytes).unwrap();
	tracing::info!(bytes = bytes.len(), elapsed = ?start.elapsed(), "serialized graph");

	let start = Instant::now();
	let (graph2, head2): (Graph, Ref<Node>) = serializer.deserialize(bytes.as_slice()).unwrap();
	tracing::info!(nodes = graph2.len(), elapsed = ?start.elapsed(), "deserialized graph");

	let mut cursor = head2;
	for _ in 0..graph2.len() {
		let node = graph2.get(cursor).unwrap();
		let name = &graph2.get(node.name).unwrap().0;
		println!("{name}: value={}", node.value);
		cursor = node.next;
	}
	assert_eq!(cursor.as_any(), head2.as_any(), "the list should still be cyclic after a round trip");
}

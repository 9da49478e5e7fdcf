//! `graphwire` walks an in-memory object graph from a root, assigns every
//! distinct reachable instance a dense id, and writes it out as a compact
//! binary stream that preserves reference identity and cycles. Reading the
//! stream back reconstructs the same graph shape without requiring the
//! original types to implement `serde`-style self-description — concrete
//! types opt in with `#[derive(GraphObject)]`, and the process's set of
//! derived types stands in for the reflection a byte-for-byte port of this
//! design would otherwise lean on.
//!
//! ```ignore
//! use graphwire::{Graph, GraphObject, Ref, Serializer};
//!
//! #[derive(Debug, GraphObject)]
//! struct Node {
//!     next: Ref<Node>,
//!     value: i32,
//! }
//!
//! let mut graph = Graph::new();
//! let a = graph.insert(Node { next: Ref::NULL, value: 1 });
//! let b = graph.insert(Node { next: a, value: 2 });
//! graph.get_mut(a).unwrap().next = b; // a cycle
//!
//! let mut bytes = Vec::new();
//! Serializer::new().serialize(&mut graph, a, &mut bytes).unwrap();
//!
//! let (graph2, a2): (Graph, Ref<Node>) = Serializer::new().deserialize(bytes.as_slice()).unwrap();
//! assert_eq!(graph2.get(a2).unwrap().value, 1);
//! ```

mod builtins;
mod context;
mod custom;
mod de;
mod error;
mod graph;
mod ids;
mod macros;
mod reflect;
mod registry;
mod scan;
mod ser;
mod varint;

/// Re-exported so `#[derive(GraphObject)]` and [`register_custom_object!`]/
/// [`register_array_element!`] can expand to `$crate::inventory::submit!`
/// without requiring downstream crates to depend on `inventory` directly.
pub use inventory;

pub use context::{ReadOptions, Serializer, WriteOptions};
pub use custom::CustomGraphObject;
pub use de::ReadPass;
pub use error::{ReadError, WriteError};
pub use graph::Graph;
pub use ids::{AnyRef, ObjectId, Ref};
pub use reflect::{
	ArrayElement, ArrayReflected, ElementKind, FieldSchema, GraphArray, GraphObject, GraphString, PreludeExtra, Reflected, TypeKind, BoxedBool,
	BoxedF32, BoxedF64, BoxedI16, BoxedI32, BoxedI64, BoxedI8, BoxedU16, BoxedU32, BoxedU64, BoxedU8,
};
pub use registry::{CustomOps, TypeCatalog, TypeRegistration};
pub use scan::ScanPass;
pub use ser::WritePass;
pub use varint::{ByteSink, ByteSource, VarIntReader, VarIntWriter};

pub use graphwire_derive::GraphObject;

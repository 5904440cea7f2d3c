//! Typed reference graph and reference index (§4.5–4.6, C5+C7).
//!
//! [`ConfigGraph`] is built in a single forward pass over every tracked
//! object and policy kind; it is immutable once built, so any orchestrator
//! that mutates the tree must request a rebuild. [`reference::find_references`]
//! answers "what names this entity" by walking the graph's incoming edges.

mod edge;
mod graph;
mod node;
mod normalize;
mod reference;

pub use edge::EdgeKind;
pub use graph::{ConfigGraph, GraphNodeId};
pub use node::{GraphNode, ANY_SENTINEL};
pub use normalize::normalize;
pub use reference::{find_references, visible_contexts, ReferenceSite};

use panflow_accessors::Accessors;
use panflow_graph::ConfigGraph;
use panflow_model::{ContextDescriptor, EntityKind, ObjectKind, Result};
use panflow_tree::Tree;
use std::collections::HashMap;

/// One candidate object for a dedup class: its identity, where in the
/// caller-supplied scope it was found, and the normalized value that
/// groups it with its equivalents.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub context: ContextDescriptor,
    pub scope_rank: usize,
    pub value: String,
}

/// A group of value-equivalent candidates, in discovery order.
#[derive(Debug, Clone)]
pub struct EquivalenceClass {
    pub value: String,
    pub members: Vec<Candidate>,
}

/// Scans `scope` (ordered leaf-to-root: a single context for a flat dedup,
/// or a device-group chain ending in `shared` for the hierarchical
/// variant) and groups every `kind` object by normalized value. Objects
/// whose kind never normalizes to a value (catalog-only kinds) are not
/// classed at all.
pub fn build_classes(
    tree: &Tree,
    accessors: &Accessors<'_>,
    graph: &ConfigGraph,
    kind: ObjectKind,
    scope: &[ContextDescriptor],
) -> Result<Vec<EquivalenceClass>> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<Candidate>> = HashMap::new();

    for (scope_rank, ctx) in scope.iter().enumerate() {
        for name in accessors.list(tree, kind.as_str(), ctx)? {
            let Some(node) = graph.node(EntityKind::Object(kind), &name, ctx) else { continue };
            let Some(value) = node.normalized_value.clone() else { continue };
            grouped
                .entry(value.clone())
                .or_insert_with(|| {
                    order.push(value.clone());
                    Vec::new()
                })
                .push(Candidate { name, context: ctx.clone(), scope_rank, value });
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|value| grouped.remove(&value).map(|members| EquivalenceClass { value, members }))
        .filter(|class| class.members.len() > 1)
        .collect())
}

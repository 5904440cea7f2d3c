use crate::edge::EdgeKind;
use crate::graph::ConfigGraph;
use panflow_model::{ContainerKind, ContextDescriptor, EntityKind, PanflowError, Result};
use panflow_schema::ContextRouter;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// One place in the configuration that names a target entity (§4.6, C7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    pub kind: EntityKind,
    pub name: String,
    pub context: ContextDescriptor,
    pub xpath: String,
    pub field: String,
}

/// Every reference site naming `(kind, name, ctx)`, ordered by
/// `(context_depth, xpath)` for deterministic rewrite application (§4.6).
pub fn find_references(graph: &ConfigGraph, kind: EntityKind, name: &str, ctx: &ContextDescriptor) -> Result<Vec<ReferenceSite>> {
    let target = graph.node(kind, name, ctx).ok_or_else(|| PanflowError::ObjectNotFound {
        kind: kind.to_string(),
        name: name.to_string(),
        context: ctx.label(),
    })?;
    let target_index = graph
        .inner()
        .node_indices()
        .find(|i| {
            let n = &graph.inner()[*i];
            n.kind == target.kind && n.name == target.name && n.context == target.context
        })
        .expect("target resolved via ConfigGraph::node always has a matching petgraph index");

    let mut sites: Vec<ReferenceSite> = graph
        .inner()
        .edges_directed(target_index, Direction::Incoming)
        .map(|edge| {
            let source = &graph.inner()[edge.source()];
            let field = match edge.weight() {
                EdgeKind::References { field } => field.clone(),
                EdgeKind::Contains => "static".to_string(),
            };
            ReferenceSite {
                kind: source.kind,
                name: source.name.clone(),
                context: source.context.clone(),
                xpath: source.xpath.clone(),
                field,
            }
        })
        .collect();

    sites.sort_by(|a, b| context_depth(a.context.container_kind).cmp(&context_depth(b.context.container_kind)).then_with(|| a.xpath.cmp(&b.xpath)));
    Ok(sites)
}

/// A rough ordering of container specificity used only to make reference
/// and dedup application order deterministic; it is not a visibility rule.
pub(crate) fn context_depth(container: ContainerKind) -> u8 {
    match container {
        ContainerKind::Shared => 0,
        ContainerKind::Vsys | ContainerKind::DeviceGroup | ContainerKind::Template => 1,
        ContainerKind::PreRulebase | ContainerKind::PostRulebase | ContainerKind::LocalRulebase => 2,
    }
}

/// The container an object of `ctx`'s kind would actually live in — a
/// rulebase context maps to its sibling object container (pre/post
/// rulebase to device-group, local rulebase to vsys).
pub(crate) fn object_scope_of(ctx: &ContextDescriptor) -> ContextDescriptor {
    let container = match ctx.container_kind {
        ContainerKind::PreRulebase | ContainerKind::PostRulebase => ContainerKind::DeviceGroup,
        ContainerKind::LocalRulebase => ContainerKind::Vsys,
        other => other,
    };
    let mut mapped = ContextDescriptor::new(ctx.device_kind, container);
    mapped.identifier = ctx.identifier.clone();
    mapped
}

/// Every context from which an object visible from `ctx` could be defined:
/// `ctx`'s own object scope, each device-group ancestor in its parent
/// chain, and finally `shared` (§3, §4.6).
pub fn visible_contexts(ctx: &ContextDescriptor, router: &ContextRouter<'_>) -> Vec<ContextDescriptor> {
    let home = object_scope_of(ctx);
    let mut contexts = vec![home.clone()];
    if home.container_kind == ContainerKind::DeviceGroup {
        if let Some(name) = &home.identifier {
            if let Ok(chain) = router.parent_of(name) {
                for ancestor in chain {
                    contexts.push(ContextDescriptor::new(home.device_kind, ContainerKind::DeviceGroup).with_identifier(ancestor));
                }
            }
        }
    }
    contexts.push(ContextDescriptor::new(home.device_kind, ContainerKind::Shared));
    contexts
}

use crate::edge::EdgeKind;
use crate::node::{GraphNode, ANY_SENTINEL};
use crate::normalize::normalize;
use panflow_accessors::Accessors;
use panflow_model::{ContainerKind, ContextDescriptor, EntityKind, ObjectKind, PolicyKind, Result};
use panflow_schema::ContextRouter;
use panflow_tree::Tree;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// An opaque handle to a node in a built [`ConfigGraph`], stable for the
/// graph's lifetime. Hides the underlying `petgraph` index from query-engine
/// and dedup-engine callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphNodeId(NodeIndex);

const GROUP_KINDS: &[(ObjectKind, &[ObjectKind])] = &[
    (ObjectKind::AddressGroup, &[ObjectKind::Address, ObjectKind::AddressGroup]),
    (ObjectKind::ServiceGroup, &[ObjectKind::Service, ObjectKind::ServiceGroup]),
    (ObjectKind::ApplicationGroup, &[ObjectKind::Application, ObjectKind::ApplicationGroup]),
];

const TRACKED_OBJECT_KINDS: &[ObjectKind] = &[
    ObjectKind::Address,
    ObjectKind::AddressGroup,
    ObjectKind::Service,
    ObjectKind::ServiceGroup,
    ObjectKind::Application,
    ObjectKind::ApplicationGroup,
    ObjectKind::Tag,
    ObjectKind::SecurityProfileGroup,
];

const POLICY_KINDS: &[PolicyKind] = &[
    PolicyKind::SecurityRule,
    PolicyKind::NatRule,
    PolicyKind::Decryption,
    PolicyKind::Qos,
    PolicyKind::Authentication,
    PolicyKind::Dos,
    PolicyKind::TunnelInspection,
    PolicyKind::ApplicationOverride,
];

/// Reference-bearing policy fields and the object-kind family each one
/// points into. `translated-source`/`translated-destination` are NAT's
/// scalar translation targets (§4.6 "protocol-specific fields of translation
/// rules") rather than member-lists; `wire_policy_references` reads either
/// shape uniformly.
const REFERENCE_FIELDS: &[(&str, &[ObjectKind])] = &[
    ("source", &[ObjectKind::Address, ObjectKind::AddressGroup]),
    ("destination", &[ObjectKind::Address, ObjectKind::AddressGroup]),
    ("translated-source", &[ObjectKind::Address, ObjectKind::AddressGroup]),
    ("translated-destination", &[ObjectKind::Address, ObjectKind::AddressGroup]),
    ("service", &[ObjectKind::Service, ObjectKind::ServiceGroup]),
    ("application", &[ObjectKind::Application, ObjectKind::ApplicationGroup]),
    ("tag", &[ObjectKind::Tag]),
    ("profile-group", &[ObjectKind::SecurityProfileGroup]),
];

/// Identity used to look a node back up while wiring edges in the second
/// pass, scoped by the context it is visible from (not necessarily the
/// context it lives in, once shared/device-group inheritance is folded in).
type NodeKey = (EntityKind, String, ContextDescriptor);

/// The immutable, single-pass-built typed graph over every tracked object
/// and policy (§4.5, C5). Rebuilding is the caller's responsibility after
/// any tree mutation — the graph does not observe `Tree::generation()`.
pub struct ConfigGraph {
    graph: DiGraph<GraphNode, EdgeKind>,
    index: HashMap<NodeKey, NodeIndex>,
    any_sentinel: Option<NodeIndex>,
}

impl ConfigGraph {
    pub fn build(tree: &Tree, accessors: &Accessors<'_>, router: &ContextRouter<'_>) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        let contexts = router.enumerate_contexts();

        for ctx in &contexts {
            for kind in TRACKED_OBJECT_KINDS {
                add_objects(tree, accessors, &mut graph, &mut index, *kind, ctx)?;
            }
            for kind in POLICY_KINDS {
                add_policies(tree, accessors, &mut graph, &mut index, *kind, ctx)?;
            }
        }

        let mut built = Self { graph, index, any_sentinel: None };
        for ctx in &contexts {
            built.wire_group_members(tree, accessors, ctx, router)?;
            built.wire_policy_references(tree, accessors, ctx, router)?;
        }
        Ok(built)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn inner(&self) -> &DiGraph<GraphNode, EdgeKind> {
        &self.graph
    }

    pub fn node(&self, kind: EntityKind, name: &str, ctx: &ContextDescriptor) -> Option<&GraphNode> {
        self.index.get(&(kind, name.to_string(), ctx.clone())).map(|i| &self.graph[*i])
    }

    /// The opaque id for `(kind, name, ctx)`, for callers that need to walk
    /// outgoing edges from a looked-up node (merge's dependency closure).
    pub fn node_id(&self, kind: EntityKind, name: &str, ctx: &ContextDescriptor) -> Option<GraphNodeId> {
        self.index.get(&(kind, name.to_string(), ctx.clone())).copied().map(GraphNodeId)
    }

    /// Every node in the graph, for the query engine's `MATCH` to scan.
    pub fn node_ids(&self) -> impl Iterator<Item = GraphNodeId> + '_ {
        self.graph.node_indices().map(GraphNodeId)
    }

    pub fn node_at(&self, id: GraphNodeId) -> &GraphNode {
        &self.graph[id.0]
    }

    /// Outgoing edges from `id`, each paired with the relation and target
    /// node they connect to — what `MATCH (a)-[:rel]->(b)` joins over.
    pub fn outgoing(&self, id: GraphNodeId) -> impl Iterator<Item = (&EdgeKind, GraphNodeId)> + '_ {
        self.graph.edges_directed(id.0, Direction::Outgoing).map(|e| (e.weight(), GraphNodeId(e.target())))
    }

    fn node_index(&self, kind: EntityKind, name: &str, ctx: &ContextDescriptor) -> Option<NodeIndex> {
        self.index.get(&(kind, name.to_string(), ctx.clone())).copied()
    }

    fn lookup_visible(
        &self,
        name: &str,
        candidates: &[ObjectKind],
        home_ctx: &ContextDescriptor,
        router: &ContextRouter<'_>,
    ) -> Option<NodeIndex> {
        for ctx in crate::reference::visible_contexts(home_ctx, router) {
            for kind in candidates {
                if let Some(idx) = self.node_index(EntityKind::Object(*kind), name, &ctx) {
                    return Some(idx);
                }
            }
        }
        None
    }

    fn any_sentinel_index(&mut self) -> NodeIndex {
        if let Some(idx) = self.any_sentinel {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            kind: EntityKind::Object(ObjectKind::Address),
            name: ANY_SENTINEL.to_string(),
            context: ContextDescriptor::new(panflow_model::DeviceKind::Firewall, ContainerKind::Shared),
            xpath: String::new(),
            normalized_value: None,
            attrs: panflow_model::PropertyMap::new(),
        });
        self.any_sentinel = Some(idx);
        idx
    }

    fn wire_group_members(&mut self, tree: &Tree, accessors: &Accessors<'_>, ctx: &ContextDescriptor, router: &ContextRouter<'_>) -> Result<()> {
        for (group_kind, member_candidates) in GROUP_KINDS {
            for name in accessors.list(tree, group_kind.as_str(), ctx)? {
                let Some(group_idx) = self.node_index(EntityKind::Object(*group_kind), &name, ctx) else { continue };
                let props = accessors.get(tree, group_kind.as_str(), ctx, &name)?;
                let Some(members) = props.get("static").and_then(|v| v.as_list()) else { continue };
                for member in members {
                    if let Some(target) = self.lookup_visible(member, member_candidates, ctx, router) {
                        self.graph.add_edge(group_idx, target, EdgeKind::Contains);
                    }
                }
            }
        }
        Ok(())
    }

    fn wire_policy_references(&mut self, tree: &Tree, accessors: &Accessors<'_>, ctx: &ContextDescriptor, router: &ContextRouter<'_>) -> Result<()> {
        for policy_kind in POLICY_KINDS {
            for name in accessors.list(tree, policy_kind.as_str(), ctx)? {
                let Some(policy_idx) = self.node_index(EntityKind::Policy(*policy_kind), &name, ctx) else { continue };
                let props = accessors.get(tree, policy_kind.as_str(), ctx, &name)?;
                for (field, candidates) in REFERENCE_FIELDS {
                    let Some(prop) = props.get(*field) else { continue };
                    // Member-list fields (source/destination/...) and scalar
                    // fields (NAT's translated-source/-destination) are both
                    // reference-bearing; normalize to a borrowed-string view
                    // over either shape.
                    let values: Vec<&str> = if let Some(list) = prop.as_list() {
                        list.iter().map(String::as_str).collect()
                    } else if let Some(scalar) = prop.as_scalar() {
                        vec![scalar]
                    } else {
                        continue;
                    };
                    for value in values {
                        let target = if value == ANY_SENTINEL {
                            Some(self.any_sentinel_index())
                        } else {
                            self.lookup_visible(value, candidates, ctx, router)
                        };
                        if let Some(target) = target {
                            self.graph.add_edge(policy_idx, target, EdgeKind::References { field: field.to_string() });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn add_objects(
    tree: &Tree,
    accessors: &Accessors<'_>,
    graph: &mut DiGraph<GraphNode, EdgeKind>,
    index: &mut HashMap<NodeKey, NodeIndex>,
    kind: ObjectKind,
    ctx: &ContextDescriptor,
) -> Result<()> {
    for name in accessors.list(tree, kind.as_str(), ctx)? {
        let props = accessors.get(tree, kind.as_str(), ctx, &name)?;
        let normalized_value = normalize(kind, &name, &props);
        let entity_kind = EntityKind::Object(kind);
        let xpath = accessors.xpath(tree, kind.as_str(), ctx, &name)?;
        let node_index = graph.add_node(GraphNode {
            kind: entity_kind,
            name: name.clone(),
            context: ctx.clone(),
            xpath,
            normalized_value,
            attrs: props,
        });
        index.insert((entity_kind, name, ctx.clone()), node_index);
    }
    Ok(())
}

fn add_policies(
    tree: &Tree,
    accessors: &Accessors<'_>,
    graph: &mut DiGraph<GraphNode, EdgeKind>,
    index: &mut HashMap<NodeKey, NodeIndex>,
    kind: PolicyKind,
    ctx: &ContextDescriptor,
) -> Result<()> {
    for name in accessors.list(tree, kind.as_str(), ctx)? {
        let entity_kind = EntityKind::Policy(kind);
        let xpath = accessors.xpath(tree, kind.as_str(), ctx, &name)?;
        let attrs = accessors.get(tree, kind.as_str(), ctx, &name)?;
        let node_index = graph.add_node(GraphNode {
            kind: entity_kind,
            name: name.clone(),
            context: ctx.clone(),
            xpath,
            normalized_value: None,
            attrs,
        });
        index.insert((entity_kind, name, ctx.clone()), node_index);
    }
    Ok(())
}

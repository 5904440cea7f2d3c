use crate::bulk::REFERENCE_FIELD_NAMES;
use panflow_accessors::Accessors;
use panflow_graph::{ConfigGraph, EdgeKind, GraphNodeId, ANY_SENTINEL};
use panflow_model::{
    Action, ChangeRecord, ConflictStrategy, ContextDescriptor, EntityKind, Journal, ObjectKind, PanflowError,
    PolicyKind, PropertyMap, PropertyValue, Result,
};
use panflow_tree::{Position, Tree};
use std::collections::{HashSet, VecDeque};

pub struct MergeObjectRequest {
    pub kind: ObjectKind,
    pub name: String,
    pub source_ctx: ContextDescriptor,
    pub target_ctx: ContextDescriptor,
    pub strategy: ConflictStrategy,
    pub suffix_separator: String,
}

/// Copies one object from `source_tree` into `target_tree`, per `strategy`.
/// Returns the name it actually landed under in the target, which differs
/// from the requested name only under `rename`.
pub fn merge_object(
    source_tree: &Tree,
    source_accessors: &Accessors<'_>,
    target_tree: &mut Tree,
    target_accessors: &Accessors<'_>,
    request: &MergeObjectRequest,
) -> Result<(Journal, String)> {
    let mut journal = Journal::new();
    let name = do_merge_object(
        source_tree,
        source_accessors,
        target_tree,
        target_accessors,
        request.kind,
        &request.name,
        &request.source_ctx,
        &request.target_ctx,
        request.strategy,
        &request.suffix_separator,
        &mut journal,
    )?;
    tracing::info!(kind = %request.kind, source = %request.name, landed_as = %name, "object merged");
    Ok((journal, name))
}

#[allow(clippy::too_many_arguments)]
fn do_merge_object(
    source_tree: &Tree,
    source_accessors: &Accessors<'_>,
    target_tree: &mut Tree,
    target_accessors: &Accessors<'_>,
    kind: ObjectKind,
    name: &str,
    source_ctx: &ContextDescriptor,
    target_ctx: &ContextDescriptor,
    strategy: ConflictStrategy,
    suffix_separator: &str,
    journal: &mut Journal,
) -> Result<String> {
    let source_props = source_accessors.get(source_tree, kind.as_str(), source_ctx, name)?;

    if !target_accessors.exists(target_tree, kind.as_str(), target_ctx, name)? {
        target_accessors.add(target_tree, kind.as_str(), target_ctx, name, &source_props, Position::Bottom)?;
        journal.record(ChangeRecord::new(Action::Add, kind.as_str(), name, target_ctx.label()).with_reason("merge"));
        return Ok(name.to_string());
    }

    match strategy {
        ConflictStrategy::Skip => {
            journal.record(ChangeRecord::skipped(kind.as_str(), name, target_ctx.label(), "merge-skip-existing"));
            Ok(name.to_string())
        }
        ConflictStrategy::Overwrite => {
            target_accessors.delete(target_tree, kind.as_str(), target_ctx, name)?;
            target_accessors.add(target_tree, kind.as_str(), target_ctx, name, &source_props, Position::Bottom)?;
            journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, target_ctx.label()).with_reason("merge-overwrite"));
            Ok(name.to_string())
        }
        ConflictStrategy::Merge => {
            let target_props = target_accessors.get(target_tree, kind.as_str(), target_ctx, name)?;
            let merged = merge_property_maps(kind, name, &target_props, &source_props)?;
            target_accessors.update(target_tree, kind.as_str(), target_ctx, name, &merged)?;
            journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, target_ctx.label()).with_reason("merge-union"));
            Ok(name.to_string())
        }
        ConflictStrategy::Rename => {
            let new_name = first_free_suffix(target_tree, target_accessors, kind.as_str(), target_ctx, name, suffix_separator)?;
            target_accessors.add(target_tree, kind.as_str(), target_ctx, &new_name, &source_props, Position::Bottom)?;
            journal.record(
                ChangeRecord::new(Action::Add, kind.as_str(), new_name.clone(), target_ctx.label())
                    .with_before(name.to_string())
                    .with_reason("merge-rename"),
            );
            Ok(new_name)
        }
    }
}

/// Member-lists union; scalars and bools require equality or the merge
/// fails outright, since there's no rule for picking a winner between two
/// diverging values of the same field.
fn merge_property_maps(kind: ObjectKind, name: &str, target: &PropertyMap, source: &PropertyMap) -> Result<PropertyMap> {
    let mut merged = target.clone();
    for (key, source_value) in source {
        match merged.get(key).cloned() {
            None => {
                merged.insert(key.clone(), source_value.clone());
            }
            Some(existing) => {
                let combined = match (&existing, source_value) {
                    (PropertyValue::List(a), PropertyValue::List(b)) => {
                        let mut items = a.clone();
                        for item in b {
                            if !items.contains(item) {
                                items.push(item.clone());
                            }
                        }
                        PropertyValue::List(items)
                    }
                    (PropertyValue::Scalar(a), PropertyValue::Scalar(b)) if a == b => PropertyValue::Scalar(a.clone()),
                    (PropertyValue::Bool(a), PropertyValue::Bool(b)) if a == b => PropertyValue::Bool(*a),
                    (PropertyValue::Scalar(a), PropertyValue::Scalar(b)) => {
                        return Err(PanflowError::MergeConflict {
                            kind: kind.to_string(),
                            name: name.to_string(),
                            reason: format!("field '{key}' differs: '{a}' vs '{b}'"),
                        })
                    }
                    _ => existing.clone(),
                };
                merged.insert(key.clone(), combined);
            }
        }
    }
    Ok(merged)
}

fn first_free_suffix(tree: &Tree, accessors: &Accessors<'_>, kind: &str, ctx: &ContextDescriptor, base: &str, separator: &str) -> Result<String> {
    let mut n = 1usize;
    loop {
        let candidate = format!("{base}{separator}{n}");
        if !accessors.exists(tree, kind, ctx, &candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

pub struct MergePolicyRequest {
    pub kind: PolicyKind,
    pub name: String,
    pub source_ctx: ContextDescriptor,
    pub target_ctx: ContextDescriptor,
    pub object_strategy: ConflictStrategy,
    pub suffix_separator: String,
    pub position: Position,
}

/// Merges a policy and its dependency closure: every object it references,
/// transitively through group membership, is copied into the target first
/// (per `object_strategy`), and the policy's reference fields are rewritten
/// to follow any renames before the policy itself is copied.
pub fn merge_policy(
    source_tree: &Tree,
    source_accessors: &Accessors<'_>,
    source_graph: &ConfigGraph,
    target_tree: &mut Tree,
    target_accessors: &Accessors<'_>,
    request: &MergePolicyRequest,
) -> Result<Journal> {
    let mut journal = Journal::new();
    let policy_kind = EntityKind::Policy(request.kind);
    let dependencies = dependency_closure(source_graph, policy_kind, &request.name, &request.source_ctx)?;
    tracing::debug!(kind = %request.kind, policy = %request.name, dependencies = dependencies.len(), "merge-policy dependency closure resolved");

    let mut rename_map: std::collections::BTreeMap<String, String> = std::collections::BTreeMap::new();
    for (obj_kind, obj_name, obj_ctx) in &dependencies {
        let new_name = do_merge_object(
            source_tree,
            source_accessors,
            target_tree,
            target_accessors,
            *obj_kind,
            obj_name,
            obj_ctx,
            &request.target_ctx,
            request.object_strategy,
            &request.suffix_separator,
            &mut journal,
        )?;
        if &new_name != obj_name {
            rename_map.insert(obj_name.clone(), new_name);
        }
    }

    let mut props = source_accessors.get(source_tree, request.kind.as_str(), &request.source_ctx, &request.name)?;
    for field in REFERENCE_FIELD_NAMES {
        match props.get(*field).cloned() {
            Some(PropertyValue::List(items)) => {
                let rewritten: Vec<String> = items.into_iter().map(|m| rename_map.get(&m).cloned().unwrap_or(m)).collect();
                props.insert(field.to_string(), PropertyValue::List(rewritten));
            }
            // NAT's translated-source/translated-destination hold a single
            // reference as scalar text rather than a member list.
            Some(PropertyValue::Scalar(value)) => {
                if let Some(renamed) = rename_map.get(&value) {
                    props.insert(field.to_string(), PropertyValue::Scalar(renamed.clone()));
                }
            }
            _ => {}
        }
    }

    if target_accessors.exists(target_tree, request.kind.as_str(), &request.target_ctx, &request.name)? {
        journal.record(ChangeRecord::skipped(request.kind.as_str(), request.name.clone(), request.target_ctx.label(), "policy-already-exists-in-target"));
        return Ok(journal);
    }
    target_accessors.add(target_tree, request.kind.as_str(), &request.target_ctx, &request.name, &props, request.position)?;
    journal.record(ChangeRecord::new(Action::Add, request.kind.as_str(), request.name.clone(), request.target_ctx.label()).with_reason("merge-policy"));
    tracing::info!(kind = %request.kind, policy = %request.name, changes = journal.entries().len(), "policy merged with its dependency closure");
    Ok(journal)
}

/// Every object `start` reaches by following `References`/`Contains` edges
/// outward, transitively, excluding the `any` sentinel.
fn dependency_closure(graph: &ConfigGraph, kind: EntityKind, name: &str, ctx: &ContextDescriptor) -> Result<Vec<(ObjectKind, String, ContextDescriptor)>> {
    let start = graph.node_id(kind, name, ctx).ok_or_else(|| PanflowError::ObjectNotFound {
        kind: kind.to_string(),
        name: name.to_string(),
        context: ctx.label(),
    })?;

    let mut visited: HashSet<GraphNodeId> = HashSet::new();
    visited.insert(start);
    let mut queue = VecDeque::new();
    queue.push_back(start);
    let mut collected = Vec::new();

    while let Some(id) = queue.pop_front() {
        for (edge, target) in graph.outgoing(id) {
            if !matches!(edge, EdgeKind::References { .. } | EdgeKind::Contains) {
                continue;
            }
            if !visited.insert(target) {
                continue;
            }
            let node = graph.node_at(target);
            if node.name == ANY_SENTINEL {
                continue;
            }
            if let EntityKind::Object(obj_kind) = node.kind {
                collected.push((obj_kind, node.name.clone(), node.context.clone()));
                queue.push_back(target);
            }
        }
    }
    Ok(collected)
}

use crate::shape::{field_descriptor, fields_for, FieldDescriptor, FieldShapeKind, MEMBER_ELEMENT};
use panflow_model::{EntityKind, PanflowError, PropertyMap, PropertyValue, Result};
use panflow_tree::{NodeId, Position, Tree};
use std::collections::HashSet;

/// Walks `path` from `start`, creating any missing element along the way,
/// and returns the final node.
fn ensure_path(tree: &mut Tree, start: NodeId, path: &[&str]) -> NodeId {
    let mut current = start;
    for segment in path {
        current = match tree.element_children_named(current, segment).next() {
            Some(existing) => existing,
            None => {
                let created = tree.create_element(segment);
                tree.insert(current, created, Position::Bottom).expect("inserting under a live node always succeeds");
                created
            }
        };
    }
    current
}

/// Walks `path` from `start` without creating anything; `None` if any
/// segment is missing.
fn resolve_path(tree: &Tree, start: NodeId, path: &[&str]) -> Option<NodeId> {
    let mut current = start;
    for segment in path {
        current = tree.element_children_named(current, segment).next()?;
    }
    Some(current)
}

fn clear_choice_siblings(tree: &mut Tree, entry: NodeId, siblings: &[&str]) {
    let to_remove: Vec<NodeId> = siblings
        .iter()
        .filter_map(|name| tree.element_children_named(entry, name).next())
        .collect();
    for node in to_remove {
        tree.remove(node).expect("removing a direct child of a live entry always succeeds");
    }
}

fn invalid(kind: EntityKind, field: &str, reason: impl Into<String>) -> PanflowError {
    PanflowError::PropertyInvalid { kind: kind.to_string(), key: field.to_string(), reason: reason.into() }
}

/// Writes one property value onto `entry` per its field descriptor (§4.4).
///
/// `choice_siblings` is honored for every shape, not only `ChoiceOf`: a
/// group's `static` member-list and `dynamic` filter are mutually exclusive
/// (§4.5) despite having different XML shapes, so clearing siblings happens
/// once up front rather than being duplicated per shape arm.
pub(crate) fn write_field(tree: &mut Tree, kind: EntityKind, entry: NodeId, descriptor: &FieldDescriptor, value: &PropertyValue) -> Result<()> {
    if let Some(siblings) = descriptor.choice_siblings {
        if !(value.is_null() && descriptor.shape == FieldShapeKind::Scalar) {
            clear_choice_siblings(tree, entry, siblings);
        }
    }
    match descriptor.shape {
        FieldShapeKind::Scalar => {
            if value.is_null() {
                let (container_path, leaf) = descriptor.path.split_at(descriptor.path.len() - 1);
                if let Some(container) = resolve_path(tree, entry, container_path) {
                    if let Some(existing) = tree.element_children_named(container, leaf[0]).next() {
                        tree.remove(existing)?;
                    }
                }
                return Ok(());
            }
            let text = value.as_scalar().ok_or_else(|| invalid(kind, descriptor.name, "expected a scalar value"))?;
            let (container_path, leaf) = descriptor.path.split_at(descriptor.path.len() - 1);
            let container = ensure_path(tree, entry, container_path);
            let leaf_node = ensure_path(tree, container, leaf);
            tree.set_text(leaf_node, text);
        }
        FieldShapeKind::ChoiceOf => {
            if value.is_null() {
                return Ok(());
            }
            let text = value.as_scalar().ok_or_else(|| invalid(kind, descriptor.name, "expected a scalar value"))?;
            let (container_path, leaf) = descriptor.path.split_at(descriptor.path.len() - 1);
            let container = ensure_path(tree, entry, container_path);
            let leaf_node = ensure_path(tree, container, leaf);
            tree.set_text(leaf_node, text);
        }
        FieldShapeKind::Flag => {
            let on = value.as_bool().ok_or_else(|| invalid(kind, descriptor.name, "expected a boolean value"))?;
            let (container_path, leaf) = descriptor.path.split_at(descriptor.path.len() - 1);
            let container = ensure_path(tree, entry, container_path);
            if on {
                let leaf_node = ensure_path(tree, container, leaf);
                tree.set_text(leaf_node, "yes");
            } else if let Some(existing) = tree.element_children_named(container, leaf[0]).next() {
                tree.remove(existing)?;
            }
        }
        FieldShapeKind::MemberList => {
            let items = value.as_list().ok_or_else(|| invalid(kind, descriptor.name, "expected a list value"))?;
            let mut seen = HashSet::new();
            for item in items {
                if !seen.insert(item.as_str()) {
                    return Err(invalid(kind, descriptor.name, format!("duplicate member '{item}' in the same list")));
                }
            }
            let container = ensure_path(tree, entry, descriptor.path);
            let existing: Vec<NodeId> = tree.element_children_named(container, MEMBER_ELEMENT).collect();
            for node in existing {
                tree.remove(node)?;
            }
            for item in items {
                let member = tree.create_element(MEMBER_ELEMENT);
                tree.insert(container, member, Position::Bottom)?;
                tree.set_text(member, item);
            }
        }
    }
    Ok(())
}

/// Applies every entry in `props` to `entry`, rejecting any key not in the
/// kind's property table.
pub(crate) fn write_properties(tree: &mut Tree, kind: EntityKind, entry: NodeId, props: &PropertyMap) -> Result<()> {
    for (key, value) in props {
        let descriptor = field_descriptor(kind, key).ok_or_else(|| PanflowError::PropertyInvalid {
            kind: kind.to_string(),
            key: key.clone(),
            reason: format!("'{key}' is not a recognized property of {kind}"),
        })?;
        write_field(tree, kind, entry, descriptor, value)?;
    }
    Ok(())
}

fn read_field(tree: &Tree, entry: NodeId, descriptor: &FieldDescriptor) -> Option<PropertyValue> {
    match descriptor.shape {
        FieldShapeKind::Scalar | FieldShapeKind::ChoiceOf => {
            let mut current = entry;
            for segment in descriptor.path {
                current = tree.element_children_named(current, segment).next()?;
            }
            Some(PropertyValue::Scalar(tree.text_content(current)))
        }
        FieldShapeKind::Flag => {
            let mut current = entry;
            for segment in descriptor.path {
                match tree.element_children_named(current, segment).next() {
                    Some(next) => current = next,
                    None => return Some(PropertyValue::Bool(false)),
                }
            }
            Some(PropertyValue::Bool(true))
        }
        FieldShapeKind::MemberList => {
            let mut current = entry;
            for segment in descriptor.path {
                match tree.element_children_named(current, segment).next() {
                    Some(next) => current = next,
                    None => return Some(PropertyValue::List(Vec::new())),
                }
            }
            let members = tree
                .element_children_named(current, MEMBER_ELEMENT)
                .map(|id| tree.text_content(id))
                .collect();
            Some(PropertyValue::List(members))
        }
    }
}

/// Reads every field the kind's property table declares as present on
/// `entry`. Scalar/choice-of fields are omitted when their element is
/// absent; member-list and flag fields always report a value (empty list,
/// `false`), matching "absence = enabled" style semantics consistently
/// across shapes.
pub(crate) fn read_properties(tree: &Tree, kind: EntityKind, entry: NodeId) -> PropertyMap {
    let mut props = PropertyMap::new();
    for descriptor in fields_for(kind) {
        if let Some(value) = read_field(tree, entry, descriptor) {
            props.insert(descriptor.name.to_string(), value);
        }
    }
    props
}

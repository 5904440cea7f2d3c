use panflow_graph::ReferenceSite;
use panflow_model::{PanflowError, Result};
use panflow_tree::Tree;

/// The wire element every PAN-OS member-list uses for its leaves, shared by
/// group `static` blocks and every policy member-list field.
const MEMBER_ELEMENT: &str = "member";

/// Policy fields that hold a single address reference as scalar text
/// (NAT's translation targets) rather than a `<member>` list (§4.6 "protocol
/// specific fields of translation rules").
const SCALAR_REFERENCE_FIELDS: &[&str] = &["translated-source", "translated-destination"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The member text was changed from the duplicate's name to the
    /// survivor's.
    Replaced,
    /// The survivor was already present in the same list, so the duplicate
    /// member was removed instead of producing a second copy.
    Dropped,
}

/// Locates `site`'s reference text without mutating anything — used to
/// validate every site in a class resolves before any rewrite in that class
/// is applied, so a class either rewrites completely or not at all. Handles
/// both member-list sites and scalar sites (NAT translation fields).
pub fn locate(tree: &Tree, site: &ReferenceSite, old_name: &str) -> Result<()> {
    let entry = resolve_entry(tree, site)?;
    if SCALAR_REFERENCE_FIELDS.contains(&site.field.as_str()) {
        let current = tree.element_children_named(entry, &site.field).next().ok_or_else(|| stale(site))?;
        return if tree.text_content(current) == old_name { Ok(()) } else { Err(stale(site)) };
    }
    let container = member_container(tree, entry, &site.field).ok_or_else(|| stale(site))?;
    tree.element_children_named(container, MEMBER_ELEMENT)
        .find(|id| tree.text_content(*id) == old_name)
        .map(|_| ())
        .ok_or_else(|| stale(site))
}

/// Rewrites one reference site in place. Callers must have validated the
/// site with [`locate`] first; this still re-resolves the xpath rather
/// than caching a `NodeId`, since earlier rewrites in the same class may
/// have touched sibling text nodes.
pub fn apply(tree: &mut Tree, site: &ReferenceSite, old_name: &str, new_name: &str) -> Result<RewriteOutcome> {
    let entry = resolve_entry(tree, site)?;
    if SCALAR_REFERENCE_FIELDS.contains(&site.field.as_str()) {
        let current = tree.element_children_named(entry, &site.field).next().ok_or_else(|| stale(site))?;
        if tree.text_content(current) != old_name {
            return Err(stale(site));
        }
        // A scalar field holds exactly one reference; there is no sibling to
        // collide with, so this is always a straight replacement.
        tree.set_text(current, new_name);
        return Ok(RewriteOutcome::Replaced);
    }
    let container = member_container(tree, entry, &site.field).ok_or_else(|| stale(site))?;
    let member = tree
        .element_children_named(container, MEMBER_ELEMENT)
        .find(|id| tree.text_content(*id) == old_name)
        .ok_or_else(|| stale(site))?;
    let survivor_already_present = tree
        .element_children_named(container, MEMBER_ELEMENT)
        .any(|id| id != member && tree.text_content(id) == new_name);
    if survivor_already_present {
        tree.remove(member)?;
        Ok(RewriteOutcome::Dropped)
    } else {
        tree.set_text(member, new_name);
        Ok(RewriteOutcome::Replaced)
    }
}

fn resolve_entry(tree: &Tree, site: &ReferenceSite) -> Result<panflow_tree::NodeId> {
    tree.first(&site.xpath)?.ok_or_else(|| stale(site))
}

fn member_container(tree: &Tree, entry: panflow_tree::NodeId, field: &str) -> Option<panflow_tree::NodeId> {
    if field == "static" {
        tree.element_children_named(entry, "static").next()
    } else {
        tree.element_children_named(entry, field).next()
    }
}

fn stale(site: &ReferenceSite) -> PanflowError {
    PanflowError::ContextInvalid {
        reason: format!("reference site '{}' (field '{}') no longer resolves in the tree", site.xpath, site.field),
        context: Some(site.context.clone()),
    }
}

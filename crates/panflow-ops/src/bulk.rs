use crate::selector::Selector;
use panflow_accessors::Accessors;
use panflow_graph::ConfigGraph;
use panflow_model::{AbortFlag, Action, ChangeRecord, ContextDescriptor, Journal, PanflowError, PolicyKind, PropertyMap, PropertyValue, Result};
use panflow_tree::Tree;

pub(crate) const REFERENCE_FIELD_NAMES: &[&str] =
    &["source", "destination", "translated-source", "translated-destination", "service", "application", "source-user", "from", "to"];

/// Subset of [`REFERENCE_FIELD_NAMES`] that are single-value scalars rather
/// than `<member>` lists — NAT's translation targets (§4.6).
const SCALAR_REFERENCE_FIELD_NAMES: &[&str] = &["translated-source", "translated-destination"];
const ALLOWED_ACTIONS: &[&str] = &["allow", "deny", "drop", "reset-client", "reset-server", "reset-both"];
const ANY_SENTINEL: &str = "any";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    Start,
    End,
    Both,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionMode {
    Replace,
    Prepend,
    Append,
}

#[derive(Debug, Clone)]
pub enum RenameMode {
    Replace(String),
    Prefix(String),
    Suffix(String),
    /// `replacement` uses `regex` crate capture syntax (`$1`, `${name}`),
    /// not the `\1` convention some other languages use.
    Regex { pattern: String, replacement: String },
}

/// One item of a bulk policy update's operation list. Composed in listed
/// order; later operations on the same field simply overwrite earlier ones
/// within a single policy's pass.
#[derive(Debug, Clone)]
pub enum BulkOperation {
    AddTag(String),
    RemoveTag(String),
    AddObject { field: String, name: String },
    RemoveObject { field: String, name: String },
    AddProfile { profile_type: String, name: String },
    EnableDisable { enable: bool },
    UpdateLogging(LoggingMode),
    SetAction(String),
    LogSetting(Option<String>),
    UpdateDescription { text: String, mode: DescriptionMode },
    Rename(RenameMode),
}

pub struct BulkUpdateRequest {
    pub kind: PolicyKind,
    pub ctx: ContextDescriptor,
    pub selector: Selector,
    pub operations: Vec<BulkOperation>,
}

/// Applies `request.operations`, in order, to every policy `request.selector`
/// resolves. A per-entity failure becomes a `skipped` record; it never
/// aborts the rest of the selection.
pub fn bulk_update_policies(tree: &mut Tree, accessors: &Accessors<'_>, graph: &ConfigGraph, request: &BulkUpdateRequest, abort: &AbortFlag) -> Result<Journal> {
    let mut journal = Journal::new();
    let names = request.selector.resolve(tree, accessors, graph, request.kind.as_str(), &request.ctx)?;
    tracing::debug!(kind = %request.kind, selected = names.len(), operations = request.operations.len(), "bulk update starting");

    for name in names {
        if abort.is_set() {
            tracing::warn!(kind = %request.kind, "bulk update aborted before completion");
            break;
        }
        if let Err(err) = apply_operations(tree, accessors, request.kind, &request.ctx, &name, &request.operations, &mut journal) {
            journal.record(ChangeRecord::skipped(request.kind.as_str(), name, request.ctx.label(), err.to_string()));
        }
    }

    tracing::info!(kind = %request.kind, changes = journal.entries().len(), "bulk update complete");
    Ok(journal)
}

fn apply_operations(
    tree: &mut Tree,
    accessors: &Accessors<'_>,
    kind: PolicyKind,
    ctx: &ContextDescriptor,
    name: &str,
    operations: &[BulkOperation],
    journal: &mut Journal,
) -> Result<()> {
    for op in operations {
        apply_one(tree, accessors, kind, ctx, name, op, journal)?;
    }
    Ok(())
}

fn apply_one(tree: &mut Tree, accessors: &Accessors<'_>, kind: PolicyKind, ctx: &ContextDescriptor, name: &str, op: &BulkOperation, journal: &mut Journal) -> Result<()> {
    match op {
        BulkOperation::AddTag(tag) => {
            let mut tags = current_list(tree, accessors, kind, ctx, name, "tag")?;
            if !tags.contains(tag) {
                tags.push(tag.clone());
                write_one(tree, accessors, kind, ctx, name, "tag", PropertyValue::List(tags))?;
                journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_after(tag.clone()).with_reason("add-tag"));
            }
        }
        BulkOperation::RemoveTag(tag) => {
            let mut tags = current_list(tree, accessors, kind, ctx, name, "tag")?;
            if tags.iter().any(|t| t == tag) {
                tags.retain(|t| t != tag);
                write_one(tree, accessors, kind, ctx, name, "tag", PropertyValue::List(tags))?;
                journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_before(tag.clone()).with_reason("remove-tag"));
            }
        }
        BulkOperation::AddObject { field, name: member } => {
            validate_member_list_field(field)?;
            let mut list = current_list(tree, accessors, kind, ctx, name, field)?;
            if !list.iter().any(|m| m == member) {
                if list == [ANY_SENTINEL.to_string()] {
                    list = vec![member.clone()];
                } else {
                    list.push(member.clone());
                }
                write_one(tree, accessors, kind, ctx, name, field, PropertyValue::List(list))?;
                journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_after(member.clone()).with_reason(format!("add-object:{field}")));
            }
        }
        BulkOperation::RemoveObject { field, name: member } => {
            validate_member_list_field(field)?;
            let mut list = current_list(tree, accessors, kind, ctx, name, field)?;
            if list.iter().any(|m| m == member) {
                list.retain(|m| m != member);
                if list.is_empty() {
                    list = vec![ANY_SENTINEL.to_string()];
                }
                write_one(tree, accessors, kind, ctx, name, field, PropertyValue::List(list))?;
                journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_before(member.clone()).with_reason(format!("remove-object:{field}")));
            }
        }
        BulkOperation::AddProfile { profile_type, name: profile_name } => {
            set_profile(tree, accessors, kind, ctx, name, profile_type, profile_name)?;
            journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_after(profile_name.clone()).with_reason(format!("add-profile:{profile_type}")));
        }
        BulkOperation::EnableDisable { enable } => {
            write_one(tree, accessors, kind, ctx, name, "disabled", PropertyValue::Bool(!*enable))?;
            journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_reason(if *enable { "enabled" } else { "disabled" }));
        }
        BulkOperation::UpdateLogging(mode) => {
            let (start, end) = match mode {
                LoggingMode::Start => (true, false),
                LoggingMode::End => (false, true),
                LoggingMode::Both => (true, true),
                LoggingMode::None => (false, false),
            };
            let mut update = PropertyMap::new();
            update.insert("log-start".to_string(), PropertyValue::Bool(start));
            update.insert("log-end".to_string(), PropertyValue::Bool(end));
            accessors.update(tree, kind.as_str(), ctx, name, &update)?;
            journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_reason("update-logging"));
        }
        BulkOperation::SetAction(action) => {
            if !ALLOWED_ACTIONS.contains(&action.as_str()) {
                return Err(PanflowError::PropertyInvalid { kind: kind.to_string(), key: "action".to_string(), reason: format!("'{action}' is not a recognized action") });
            }
            write_one(tree, accessors, kind, ctx, name, "action", PropertyValue::Scalar(action.clone()))?;
            journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_after(action.clone()).with_reason("set-action"));
        }
        BulkOperation::LogSetting(setting) => {
            let value = match setting {
                Some(n) => PropertyValue::Scalar(n.clone()),
                None => PropertyValue::Null,
            };
            write_one(tree, accessors, kind, ctx, name, "log-setting", value)?;
            journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_reason("log-setting"));
        }
        BulkOperation::UpdateDescription { text, mode } => {
            let props = accessors.get(tree, kind.as_str(), ctx, name)?;
            let current = props.get("description").and_then(|v| v.as_scalar()).unwrap_or("").to_string();
            let new_text = match mode {
                DescriptionMode::Replace => text.clone(),
                DescriptionMode::Prepend => format!("{text}{current}"),
                DescriptionMode::Append => format!("{current}{text}"),
            };
            write_one(tree, accessors, kind, ctx, name, "description", PropertyValue::Scalar(new_text.clone()))?;
            journal.record(ChangeRecord::new(Action::Update, kind.as_str(), name, ctx.label()).with_before(current).with_after(new_text).with_reason("update-description"));
        }
        BulkOperation::Rename(mode) => {
            let new_name = compute_rename(name, mode)?;
            if new_name != name {
                if accessors.exists(tree, kind.as_str(), ctx, &new_name)? {
                    return Err(PanflowError::PolicyExists { name: new_name, context: ctx.label() });
                }
                let xpath = accessors.xpath(tree, kind.as_str(), ctx, name)?;
                let entry = tree.first(&xpath)?.ok_or_else(|| PanflowError::PolicyNotFound { name: name.to_string(), context: ctx.label() })?;
                tree.set_attr(entry, "name", &new_name);
                journal.record(ChangeRecord::new(Action::Rename, kind.as_str(), new_name.clone(), ctx.label()).with_before(name.to_string()).with_after(new_name));
            }
        }
    }
    Ok(())
}

fn current_list(tree: &Tree, accessors: &Accessors<'_>, kind: PolicyKind, ctx: &ContextDescriptor, name: &str, field: &str) -> Result<Vec<String>> {
    let props = accessors.get(tree, kind.as_str(), ctx, name)?;
    Ok(props.get(field).and_then(|v| v.as_list()).map(|s| s.to_vec()).unwrap_or_default())
}

fn write_one(tree: &mut Tree, accessors: &Accessors<'_>, kind: PolicyKind, ctx: &ContextDescriptor, name: &str, field: &str, value: PropertyValue) -> Result<()> {
    let mut update = PropertyMap::new();
    update.insert(field.to_string(), value);
    accessors.update(tree, kind.as_str(), ctx, name, &update)
}

/// Gate for `AddObject`/`RemoveObject`, which splice a single name into or
/// out of a `<member>` list — not meaningful on NAT's scalar translation
/// fields, which hold exactly one reference and are rewritten as a whole via
/// `Rename`/dedup instead.
fn validate_member_list_field(field: &str) -> Result<()> {
    if REFERENCE_FIELD_NAMES.contains(&field) && !SCALAR_REFERENCE_FIELD_NAMES.contains(&field) {
        Ok(())
    } else {
        Err(PanflowError::UnknownField { kind: "bulk-policy-update".to_string(), field: field.to_string() })
    }
}

fn compute_rename(current: &str, mode: &RenameMode) -> Result<String> {
    match mode {
        RenameMode::Replace(new_name) => Ok(new_name.clone()),
        RenameMode::Prefix(prefix) => Ok(format!("{prefix}{current}")),
        RenameMode::Suffix(suffix) => Ok(format!("{current}{suffix}")),
        RenameMode::Regex { pattern, replacement } => {
            let re = regex::Regex::new(pattern).map_err(|e| PanflowError::PropertyInvalid { kind: "rename".to_string(), key: "pattern".to_string(), reason: e.to_string() })?;
            Ok(re.replace(current, replacement.as_str()).into_owned())
        }
    }
}

/// Sets a profile reference under `<profile-setting>`. `profile_type ==
/// "group"` goes through the normal property path so the assignment is
/// visible to `panflow-graph`'s reference index (§4.6 "profile-group
/// membership"); any other value writes a scalar under `<profiles><{type}>`,
/// PAN-OS's per-type individual profile assignment shape, which carries no
/// object reference of its own.
fn set_profile(tree: &mut Tree, accessors: &Accessors<'_>, kind: PolicyKind, ctx: &ContextDescriptor, name: &str, profile_type: &str, profile_name: &str) -> Result<()> {
    if profile_type == "group" {
        let mut groups = current_list(tree, accessors, kind, ctx, name, "profile-group")?;
        if !groups.iter().any(|g| g == profile_name) {
            groups.push(profile_name.to_string());
            write_one(tree, accessors, kind, ctx, name, "profile-group", PropertyValue::List(groups))?;
        }
        return Ok(());
    }

    let xpath = accessors.xpath(tree, kind.as_str(), ctx, name)?;
    let entry = tree.first(&xpath)?.ok_or_else(|| PanflowError::PolicyNotFound { name: name.to_string(), context: ctx.label() })?;
    let setting = ensure_child(tree, entry, "profile-setting");
    let profiles = ensure_child(tree, setting, "profiles");
    let leaf = ensure_child(tree, profiles, profile_type);
    tree.set_text(leaf, profile_name);
    Ok(())
}

fn ensure_child(tree: &mut Tree, parent: panflow_tree::NodeId, name: &str) -> panflow_tree::NodeId {
    match tree.element_children_named(parent, name).next() {
        Some(existing) => existing,
        None => {
            let created = tree.create_element(name);
            tree.insert(parent, created, panflow_tree::Position::Bottom).expect("inserting under a live node always succeeds");
            created
        }
    }
}

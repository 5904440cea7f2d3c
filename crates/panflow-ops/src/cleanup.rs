use panflow_accessors::Accessors;
use panflow_graph::{find_references, ConfigGraph};
use panflow_model::{AbortFlag, Action, ChangeRecord, ContextDescriptor, EntityKind, Journal, ObjectKind, PolicyKind, Result};
use panflow_tree::Tree;

/// Every object kind a cleanup pass considers when `types` is left empty.
pub const ALL_OBJECT_KINDS: &[ObjectKind] = &[
    ObjectKind::Address,
    ObjectKind::AddressGroup,
    ObjectKind::Service,
    ObjectKind::ServiceGroup,
    ObjectKind::Application,
    ObjectKind::ApplicationGroup,
    ObjectKind::Tag,
    ObjectKind::SecurityProfileGroup,
];

pub struct UnusedObjectsRequest {
    pub types: Vec<ObjectKind>,
    pub exclude: Vec<String>,
    pub dry_run: bool,
}

/// Removes every object of a scanned kind with no reference site anywhere
/// in the graph, across `contexts`. A shared object counts as unused only
/// when `find_references` (which already walks every context that can see
/// it) returns nothing.
pub fn unused_objects(tree: &mut Tree, accessors: &Accessors<'_>, graph: &ConfigGraph, contexts: &[ContextDescriptor], request: &UnusedObjectsRequest, abort: &AbortFlag) -> Result<Journal> {
    let mut journal = Journal::new();
    let kinds: &[ObjectKind] = if request.types.is_empty() { ALL_OBJECT_KINDS } else { &request.types };

    for ctx in contexts {
        for kind in kinds {
            for name in accessors.list(tree, kind.as_str(), ctx)? {
                if abort.is_set() {
                    return Ok(journal);
                }
                if request.exclude.contains(&name) {
                    continue;
                }
                if graph.node(EntityKind::Object(*kind), &name, ctx).is_none() {
                    continue;
                }
                let sites = find_references(graph, EntityKind::Object(*kind), &name, ctx)?;
                if !sites.is_empty() {
                    continue;
                }
                if request.dry_run {
                    journal.record(ChangeRecord::new(Action::Delete, kind.as_str(), name, ctx.label()).with_reason("unused"));
                } else {
                    accessors.delete(tree, kind.as_str(), ctx, &name)?;
                    journal.record(ChangeRecord::new(Action::Delete, kind.as_str(), name, ctx.label()).with_reason("unused"));
                }
            }
        }
    }

    tracing::info!(kinds = kinds.len(), removed = journal.entries().len(), dry_run = request.dry_run, "unused-object cleanup complete");
    Ok(journal)
}

/// Deletes every policy of `kind` in `ctx` whose `disabled` flag is set.
pub fn disabled_policies(tree: &mut Tree, accessors: &Accessors<'_>, kind: PolicyKind, ctx: &ContextDescriptor, dry_run: bool, abort: &AbortFlag) -> Result<Journal> {
    let mut journal = Journal::new();
    for name in accessors.list(tree, kind.as_str(), ctx)? {
        if abort.is_set() {
            break;
        }
        let props = accessors.get(tree, kind.as_str(), ctx, &name)?;
        if !props.get("disabled").and_then(|v| v.as_bool()).unwrap_or(false) {
            continue;
        }
        if dry_run {
            journal.record(ChangeRecord::new(Action::Delete, kind.as_str(), name, ctx.label()).with_reason("disabled"));
        } else {
            accessors.delete(tree, kind.as_str(), ctx, &name)?;
            journal.record(ChangeRecord::new(Action::Delete, kind.as_str(), name, ctx.label()).with_reason("disabled"));
        }
    }
    tracing::info!(kind = %kind, removed = journal.entries().len(), dry_run, "disabled-policy cleanup complete");
    Ok(journal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use panflow_model::{ContainerKind, DeviceKind};
    use panflow_schema::{ContextRouter, SchemaRegistry};

    const SAMPLE: &str = r#"<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <address>
            <entry name="A1"><ip-netmask>10.0.0.1/32</ip-netmask></entry>
            <entry name="A2"><ip-netmask>10.0.0.2/32</ip-netmask></entry>
            <entry name="A3"><ip-netmask>10.0.0.3/32</ip-netmask></entry>
            <entry name="A4"><ip-netmask>10.0.0.4/32</ip-netmask></entry>
            <entry name="A5"><ip-netmask>10.0.0.5/32</ip-netmask></entry>
          </address>
          <rulebase>
            <security>
              <rules>
                <entry name="R1">
                  <source><member>A3</member></source>
                  <destination><member>any</member></destination>
                  <service><member>any</member></service>
                  <application><member>any</member></application>
                  <action>allow</action>
                </entry>
                <entry name="R2">
                  <disabled>yes</disabled>
                  <source><member>any</member></source>
                  <destination><member>any</member></destination>
                  <service><member>any</member></service>
                  <application><member>any</member></application>
                  <action>deny</action>
                </entry>
              </rules>
            </security>
          </rulebase>
        </entry>
      </vsys>
    </entry>
  </devices>
</config>
"#;

    fn ctx() -> ContextDescriptor {
        ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::Vsys).with_identifier("vsys1")
    }

    fn local_rulebase_ctx() -> ContextDescriptor {
        ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::LocalRulebase).with_identifier("vsys1")
    }

    fn load() -> (Tree, SchemaRegistry) {
        (Tree::load(SAMPLE.as_bytes()).unwrap(), SchemaRegistry::load_embedded().unwrap())
    }

    #[test]
    fn unused_cleanup_retains_excluded_and_referenced() {
        let (mut tree, registry) = load();
        let accessors = Accessors::new(&registry, "11.2");
        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
        let graph = ConfigGraph::build(&tree, &accessors, &router).unwrap();

        let request = UnusedObjectsRequest { types: vec![ObjectKind::Address], exclude: vec!["A1".to_string()], dry_run: false };
        unused_objects(&mut tree, &accessors, &graph, &[ctx()], &request, &AbortFlag::new()).unwrap();

        let remaining = accessors.list(&tree, "address", &ctx()).unwrap();
        assert_eq!(remaining, vec!["A1".to_string(), "A3".to_string()]);
    }

    #[test]
    fn disabled_policies_are_deleted() {
        let (mut tree, registry) = load();
        let accessors = Accessors::new(&registry, "11.2");
        disabled_policies(&mut tree, &accessors, PolicyKind::SecurityRule, &local_rulebase_ctx(), false, &AbortFlag::new()).unwrap();
        let remaining = accessors.list(&tree, "security-rule", &local_rulebase_ctx()).unwrap();
        assert_eq!(remaining, vec!["R1".to_string()]);
    }
}

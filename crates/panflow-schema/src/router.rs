use crate::registry::SchemaRegistry;
use panflow_model::{ContainerKind, ContextDescriptor, DeviceKind, PanflowError, Result};
use panflow_tree::Tree;
use std::collections::HashSet;

/// Validates context descriptors against a loaded tree and resolves
/// device-group inheritance (§4.2, C2). Holds no state of its own beyond
/// borrows; the device-group parent chain is recomputed on demand rather
/// than cached, since the tree backing it can be mutated between calls.
pub struct ContextRouter<'a> {
    registry: &'a SchemaRegistry,
    tree: &'a Tree,
    version: String,
    device_kind: DeviceKind,
}

impl<'a> ContextRouter<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        tree: &'a Tree,
        version: impl Into<String>,
        device_kind: DeviceKind,
    ) -> Self {
        Self { registry, tree, version: version.into(), device_kind }
    }

    /// Confirms `ctx` is legal for this loaded configuration: the device
    /// kind matches, the container is defined for it, the identifier is
    /// present exactly when required, and — for device-groups — that the
    /// named device-group exists and its parent chain is acyclic.
    pub fn validate(&self, ctx: &ContextDescriptor) -> Result<()> {
        if ctx.device_kind != self.device_kind {
            return Err(PanflowError::ContextInvalid {
                reason: format!(
                    "loaded configuration is device kind '{}', not '{}'",
                    self.device_kind, ctx.device_kind
                ),
                context: Some(ctx.clone()),
            });
        }
        self.registry.base_path(&self.version, ctx)?;
        if ctx.container_kind == ContainerKind::DeviceGroup {
            let name = ctx.identifier.as_deref().expect("base_path already checked identifier presence");
            self.parent_of(name)?;
        }
        Ok(())
    }

    pub fn base_path(&self, ctx: &ContextDescriptor) -> Result<String> {
        self.registry.base_path(&self.version, ctx)
    }

    /// Every container actually present in the loaded tree, for hierarchical
    /// search (§4.6). `shared` is always included for the router's device
    /// kind; `vsys`/`local_rulebase` are enumerated per discovered vsys
    /// entry; `device_group`/`pre_rulebase`/`post_rulebase` per discovered
    /// device-group entry; `template` per discovered template entry.
    pub fn enumerate_contexts(&self) -> Vec<ContextDescriptor> {
        let mut contexts = vec![ContextDescriptor::new(self.device_kind, ContainerKind::Shared)];
        match self.device_kind {
            DeviceKind::Firewall => {
                for name in self.entry_names("/config/devices/entry/vsys/entry") {
                    contexts.push(
                        ContextDescriptor::new(self.device_kind, ContainerKind::Vsys).with_identifier(name.clone()),
                    );
                    contexts.push(
                        ContextDescriptor::new(self.device_kind, ContainerKind::LocalRulebase)
                            .with_identifier(name),
                    );
                }
            }
            DeviceKind::Manager => {
                for name in self.entry_names("/config/devices/entry/device-group/entry") {
                    contexts.push(
                        ContextDescriptor::new(self.device_kind, ContainerKind::DeviceGroup)
                            .with_identifier(name.clone()),
                    );
                    contexts.push(
                        ContextDescriptor::new(self.device_kind, ContainerKind::PreRulebase)
                            .with_identifier(name.clone()),
                    );
                    contexts.push(
                        ContextDescriptor::new(self.device_kind, ContainerKind::PostRulebase)
                            .with_identifier(name),
                    );
                }
                for name in self.entry_names("/config/devices/entry/template/entry") {
                    contexts.push(
                        ContextDescriptor::new(self.device_kind, ContainerKind::Template).with_identifier(name),
                    );
                }
            }
        }
        contexts
    }

    fn entry_names(&self, xpath: &str) -> Vec<String> {
        self.tree
            .find(xpath)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.tree.attr(id, "name").map(str::to_string))
            .collect()
    }

    /// The device-group inheritance chain above `device_group_name`,
    /// nearest ancestor first, stopping at the first device-group with no
    /// declared parent. A repeated name while walking means the chain
    /// cycles back on itself.
    pub fn parent_of(&self, device_group_name: &str) -> Result<Vec<String>> {
        let mut chain = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(device_group_name.to_string());
        let mut current = device_group_name.to_string();
        while let Some(parent) = self.direct_parent(&current)? {
            if !visited.insert(parent.clone()) {
                return Err(PanflowError::ContextInvalid {
                    reason: format!(
                        "device-group parent chain starting at '{device_group_name}' cycles back to '{parent}'"
                    ),
                    context: None,
                });
            }
            chain.push(parent.clone());
            current = parent;
        }
        Ok(chain)
    }

    fn direct_parent(&self, device_group_name: &str) -> Result<Option<String>> {
        let path = format!("/config/devices/entry/device-group/entry[@name='{device_group_name}']");
        let node = self.tree.first(&path)?.ok_or_else(|| PanflowError::ObjectNotFound {
            kind: "device-group".to_string(),
            name: device_group_name.to_string(),
            context: "manager".to_string(),
        })?;
        Ok(self
            .tree
            .element_children_named(node, "parent-dg")
            .next()
            .map(|id| self.tree.text_content(id))
            .filter(|text| !text.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaRegistry;

    const MANAGER_SAMPLE: &str = r#"<?xml version="1.0"?>
<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <device-group>
        <entry name="DG-root"/>
        <entry name="DG-child">
          <parent-dg>DG-root</parent-dg>
        </entry>
        <entry name="DG-cycle-a">
          <parent-dg>DG-cycle-b</parent-dg>
        </entry>
        <entry name="DG-cycle-b">
          <parent-dg>DG-cycle-a</parent-dg>
        </entry>
      </device-group>
    </entry>
  </devices>
</config>
"#;

    #[test]
    fn parent_of_returns_empty_chain_for_root_device_group() {
        let tree = Tree::load(MANAGER_SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Manager);
        assert_eq!(router.parent_of("DG-root").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn parent_of_walks_one_level() {
        let tree = Tree::load(MANAGER_SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Manager);
        assert_eq!(router.parent_of("DG-child").unwrap(), vec!["DG-root".to_string()]);
    }

    #[test]
    fn parent_of_detects_cycle() {
        let tree = Tree::load(MANAGER_SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Manager);
        assert!(router.parent_of("DG-cycle-a").is_err());
    }

    #[test]
    fn enumerate_contexts_finds_every_device_group() {
        let tree = Tree::load(MANAGER_SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Manager);
        let contexts = router.enumerate_contexts();
        let device_group_count = contexts
            .iter()
            .filter(|c| c.container_kind == ContainerKind::DeviceGroup)
            .count();
        assert_eq!(device_group_count, 4);
    }

    #[test]
    fn validate_rejects_mismatched_device_kind() {
        let tree = Tree::load(MANAGER_SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Manager);
        let ctx = ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::Shared);
        assert!(router.validate(&ctx).is_err());
    }
}

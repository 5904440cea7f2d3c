use crate::kind_lookup::entity_kind_for;
use crate::properties::{read_properties, write_properties};
use panflow_model::{ContextDescriptor, PanflowError, PropertyMap, Result};
use panflow_schema::SchemaRegistry;
use panflow_tree::{NodeId, Position, Tree};
use std::collections::HashMap;

/// Typed `list`/`get`/`add`/`update`/`delete`/`exists` over every object and
/// policy kind (§4.4, C4). Thin: all shape knowledge lives in
/// [`crate::shape`], all path resolution in [`panflow_schema`].
pub struct Accessors<'a> {
    registry: &'a SchemaRegistry,
    version: String,
}

impl<'a> Accessors<'a> {
    pub fn new(registry: &'a SchemaRegistry, version: impl Into<String>) -> Self {
        Self { registry, version: version.into() }
    }

    /// Names of every `kind` entry present in `ctx`.
    pub fn list(&self, tree: &Tree, kind: &str, ctx: &ContextDescriptor) -> Result<Vec<String>> {
        let list_path = self.registry.list_path(&self.version, kind, ctx)?;
        Ok(tree
            .find(&list_path)?
            .into_iter()
            .filter_map(|id| tree.attr(id, "name").map(str::to_string))
            .collect())
    }

    pub fn exists(&self, tree: &Tree, kind: &str, ctx: &ContextDescriptor, name: &str) -> Result<bool> {
        Ok(self.find_entry(tree, kind, ctx, name)?.is_some())
    }

    pub fn get(&self, tree: &Tree, kind: &str, ctx: &ContextDescriptor, name: &str) -> Result<PropertyMap> {
        let entry = self.require_entry(tree, kind, ctx, name)?;
        let entity_kind = entity_kind_for(kind)?;
        Ok(read_properties(tree, entity_kind, entry))
    }

    pub fn add(
        &self,
        tree: &mut Tree,
        kind: &str,
        ctx: &ContextDescriptor,
        name: &str,
        props: &PropertyMap,
        position: Position,
    ) -> Result<()> {
        if self.exists(tree, kind, ctx, name)? {
            return Err(PanflowError::ObjectExists { kind: kind.to_string(), name: name.to_string(), context: ctx.label() });
        }
        let entity_kind = entity_kind_for(kind)?;
        let container = self.ensure_container(tree, kind, ctx)?;
        let entry = tree.create_element("entry");
        tree.set_attr(entry, "name", name);
        tree.insert(container, entry, position)?;
        write_properties(tree, entity_kind, entry, props)?;
        Ok(())
    }

    pub fn update(&self, tree: &mut Tree, kind: &str, ctx: &ContextDescriptor, name: &str, props: &PropertyMap) -> Result<()> {
        let entry = self.require_entry(tree, kind, ctx, name)?;
        let entity_kind = entity_kind_for(kind)?;
        write_properties(tree, entity_kind, entry, props)
    }

    /// The current, reconstructable xpath of `name` (§4.3 `xpath_of`),
    /// used by the graph builder and reference index to record where each
    /// entity actually lives.
    pub fn xpath(&self, tree: &Tree, kind: &str, ctx: &ContextDescriptor, name: &str) -> Result<String> {
        let entry = self.require_entry(tree, kind, ctx, name)?;
        Ok(tree.xpath_of(entry))
    }

    pub fn delete(&self, tree: &mut Tree, kind: &str, ctx: &ContextDescriptor, name: &str) -> Result<()> {
        let entry = self.require_entry(tree, kind, ctx, name)?;
        tree.remove(entry)
    }

    fn find_entry(&self, tree: &Tree, kind: &str, ctx: &ContextDescriptor, name: &str) -> Result<Option<NodeId>> {
        let mut placeholders = HashMap::new();
        placeholders.insert("name", name);
        let path = self.registry.resolve(&self.version, kind, ctx, &placeholders)?;
        tree.first(&path)
    }

    pub(crate) fn require_entry(&self, tree: &Tree, kind: &str, ctx: &ContextDescriptor, name: &str) -> Result<NodeId> {
        self.find_entry(tree, kind, ctx, name)?.ok_or_else(|| PanflowError::ObjectNotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            context: ctx.label(),
        })
    }

    /// Finds or creates the element that directly holds `kind`'s `entry`
    /// children, creating any missing structural segment between the
    /// context's base path and that container. The base path itself must
    /// already exist; accessors never invent contexts.
    fn ensure_container(&self, tree: &mut Tree, kind: &str, ctx: &ContextDescriptor) -> Result<NodeId> {
        let base_path = self.registry.base_path(&self.version, ctx)?;
        let mut current = tree.first(&base_path)?.ok_or_else(|| PanflowError::ContextInvalid {
            reason: format!("base path '{base_path}' does not exist in the loaded tree"),
            context: Some(ctx.clone()),
        })?;
        let list_path = self.registry.list_path(&self.version, kind, ctx)?;
        let suffix = list_path
            .strip_prefix(&base_path)
            .ok_or_else(|| PanflowError::ParseFailed(format!("list path '{list_path}' does not start with base path '{base_path}'")))?;
        for segment in suffix.trim_start_matches('/').split('/').filter(|s| !s.is_empty()) {
            current = match tree.element_children_named(current, segment).next() {
                Some(existing) => existing,
                None => {
                    let created = tree.create_element(segment);
                    tree.insert(current, created, Position::Bottom)?;
                    created
                }
            };
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panflow_model::{ContainerKind, DeviceKind};

    const SAMPLE: &str = r#"<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <address>
            <entry name="H1">
              <ip-netmask>10.0.0.5/32</ip-netmask>
            </entry>
          </address>
        </entry>
      </vsys>
    </entry>
  </devices>
</config>
"#;

    fn ctx() -> ContextDescriptor {
        ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::Vsys).with_identifier("vsys1")
    }

    #[test]
    fn list_returns_existing_names() {
        let tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let accessors = Accessors::new(&registry, "11.2");
        assert_eq!(accessors.list(&tree, "address", &ctx()).unwrap(), vec!["H1".to_string()]);
    }

    #[test]
    fn add_creates_container_and_entry_when_absent() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let accessors = Accessors::new(&registry, "11.2");
        let mut props = PropertyMap::new();
        props.insert("ip-netmask".to_string(), panflow_model::PropertyValue::Scalar("10.0.0.6/32".to_string()));
        accessors.add(&mut tree, "address-group", &ctx(), "G1", &PropertyMap::new(), Position::Bottom).unwrap();
        assert!(accessors.exists(&tree, "address-group", &ctx(), "G1").unwrap());
        accessors.add(&mut tree, "address", &ctx(), "H2", &props, Position::Bottom).unwrap();
        assert_eq!(accessors.list(&tree, "address", &ctx()).unwrap(), vec!["H1".to_string(), "H2".to_string()]);
    }

    #[test]
    fn add_rejects_duplicate_name() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let accessors = Accessors::new(&registry, "11.2");
        let result = accessors.add(&mut tree, "address", &ctx(), "H1", &PropertyMap::new(), Position::Bottom);
        assert!(result.is_err());
    }

    #[test]
    fn update_then_get_reflects_new_value() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let accessors = Accessors::new(&registry, "11.2");
        let mut props = PropertyMap::new();
        props.insert("description".to_string(), panflow_model::PropertyValue::Scalar("updated".to_string()));
        accessors.update(&mut tree, "address", &ctx(), "H1", &props).unwrap();
        let got = accessors.get(&tree, "address", &ctx(), "H1").unwrap();
        assert_eq!(got.get("description"), Some(&panflow_model::PropertyValue::Scalar("updated".to_string())));
    }

    #[test]
    fn delete_removes_entry() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let accessors = Accessors::new(&registry, "11.2");
        accessors.delete(&mut tree, "address", &ctx(), "H1").unwrap();
        assert!(!accessors.exists(&tree, "address", &ctx(), "H1").unwrap());
    }

    #[test]
    fn get_missing_entry_fails_with_object_not_found() {
        let tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let accessors = Accessors::new(&registry, "11.2");
        assert!(accessors.get(&tree, "address", &ctx(), "missing").is_err());
    }
}

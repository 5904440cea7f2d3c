use crate::accessors::Accessors;
use crate::shape::MEMBER_ELEMENT;
use panflow_model::{ContextDescriptor, ObjectKind, PanflowError, Result};
use panflow_tree::{Position, Tree};

/// Member-list operations specific to group object kinds (§4.4: "group
/// accessors additionally expose `add_member`, `remove_member`,
/// `add_members_from_list` with idempotent semantics"). Operates on the
/// fixed `static` member-list field, the only one a group kind exposes.
pub struct GroupAccessors<'a> {
    accessors: &'a Accessors<'a>,
}

impl<'a> GroupAccessors<'a> {
    pub fn new(accessors: &'a Accessors<'a>) -> Self {
        Self { accessors }
    }

    pub fn add_member(&self, tree: &mut Tree, kind: ObjectKind, ctx: &ContextDescriptor, group: &str, member: &str) -> Result<()> {
        require_group_kind(kind)?;
        let container = self.static_container(tree, kind, ctx, group)?;
        if tree.element_children_named(container, MEMBER_ELEMENT).any(|id| tree.text_content(id) == member) {
            return Ok(());
        }
        let node = tree.create_element(MEMBER_ELEMENT);
        tree.insert(container, node, Position::Bottom)?;
        tree.set_text(node, member);
        Ok(())
    }

    pub fn remove_member(&self, tree: &mut Tree, kind: ObjectKind, ctx: &ContextDescriptor, group: &str, member: &str) -> Result<()> {
        require_group_kind(kind)?;
        let container = self.static_container(tree, kind, ctx, group)?;
        if let Some(node) = tree.element_children_named(container, MEMBER_ELEMENT).find(|id| tree.text_content(*id) == member) {
            tree.remove(node)?;
        }
        Ok(())
    }

    pub fn add_members_from_list(&self, tree: &mut Tree, kind: ObjectKind, ctx: &ContextDescriptor, group: &str, members: &[String]) -> Result<()> {
        for member in members {
            self.add_member(tree, kind, ctx, group, member)?;
        }
        Ok(())
    }

    fn static_container(&self, tree: &mut Tree, kind: ObjectKind, ctx: &ContextDescriptor, group: &str) -> Result<panflow_tree::NodeId> {
        let entry = self.accessors.require_entry(tree, kind.as_str(), ctx, group)?;
        Ok(match tree.element_children_named(entry, "static").next() {
            Some(existing) => existing,
            None => {
                let created = tree.create_element("static");
                tree.insert(entry, created, Position::Bottom)?;
                created
            }
        })
    }
}

fn require_group_kind(kind: ObjectKind) -> Result<()> {
    if kind.is_group() {
        Ok(())
    } else {
        Err(PanflowError::PropertyInvalid {
            kind: kind.to_string(),
            key: "static".to_string(),
            reason: "group member operations only apply to group object kinds".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panflow_model::{ContainerKind, DeviceKind};
    use panflow_schema::SchemaRegistry;

    const SAMPLE: &str = r#"<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <address-group>
            <entry name="G1"/>
          </address-group>
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
    fn add_member_is_idempotent() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let accessors = Accessors::new(&registry, "11.2");
        let groups = GroupAccessors::new(&accessors);
        groups.add_member(&mut tree, ObjectKind::AddressGroup, &ctx(), "G1", "H1").unwrap();
        groups.add_member(&mut tree, ObjectKind::AddressGroup, &ctx(), "G1", "H1").unwrap();
        let props = accessors.get(&tree, "address-group", &ctx(), "G1").unwrap();
        assert_eq!(
            props.get("static"),
            Some(&panflow_model::PropertyValue::List(vec!["H1".to_string()]))
        );
    }

    #[test]
    fn remove_member_on_absent_member_is_a_no_op() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let registry = SchemaRegistry::load_embedded().unwrap();
        let accessors = Accessors::new(&registry, "11.2");
        let groups = GroupAccessors::new(&accessors);
        assert!(groups.remove_member(&mut tree, ObjectKind::AddressGroup, &ctx(), "G1", "never-there").is_ok());
    }

    #[test]
    fn non_group_kind_is_rejected() {
        assert!(require_group_kind(ObjectKind::Address).is_err());
    }
}

//! Arena-backed mutable XML tree store (§4.3, C3).
//!
//! This crate hides the underlying parser (`quick-xml`) behind the small
//! set of operations every other crate needs: load, find/first, insert,
//! remove, replace, clone, serialize. That indirection is what lets the
//! parser be swapped later and what makes the generation-counter cache
//! invalidation in §5 possible.

mod node;
mod tree;
mod xpath;

pub use node::{NodeId, NodeKind, Position};
pub use tree::Tree;

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <address>
            <entry name="H1">
              <ip-netmask>10.0.0.5/32</ip-netmask>
            </entry>
            <entry name="H1_alt">
              <ip-netmask>10.0.0.5/32</ip-netmask>
            </entry>
          </address>
        </entry>
      </vsys>
    </entry>
  </devices>
</config>
"#;

    #[test]
    fn round_trip_preserves_structure() {
        let tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let out = tree.serialize().unwrap();
        let reparsed = Tree::load(&out).unwrap();
        let addrs = reparsed
            .find("/config/devices/entry/vsys/entry/address/entry")
            .unwrap();
        assert_eq!(addrs.len(), 2);
    }

    #[test]
    fn find_resolves_name_predicate() {
        let tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let hits = tree
            .find("/config/devices/entry/vsys/entry/address/entry[@name='H1']")
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(tree.attr(hits[0], "name"), Some("H1"));
    }

    #[test]
    fn xpath_of_roundtrips_through_find() {
        let tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let hit = tree
            .first("/config/devices/entry/vsys/entry/address/entry[@name='H1_alt']")
            .unwrap()
            .unwrap();
        let path = tree.xpath_of(hit);
        let refound = tree.first(&path).unwrap().unwrap();
        assert_eq!(refound, hit);
    }

    #[test]
    fn remove_detaches_subtree_and_bumps_generation() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let gen_before = tree.generation();
        let hit = tree
            .first("/config/devices/entry/vsys/entry/address/entry[@name='H1_alt']")
            .unwrap()
            .unwrap();
        tree.remove(hit).unwrap();
        assert!(tree.generation() > gen_before);
        let remaining = tree
            .find("/config/devices/entry/vsys/entry/address/entry")
            .unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn insert_bottom_appends_after_existing_children() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let address_container = tree
            .first("/config/devices/entry/vsys/entry/address")
            .unwrap()
            .unwrap();
        let new_entry = tree.create_element("entry");
        tree.set_attr(new_entry, "name", "H2");
        tree.insert(address_container, new_entry, Position::Bottom).unwrap();
        let names: Vec<Option<&str>> = tree
            .element_children_named(address_container, "entry")
            .map(|c| tree.attr(c, "name"))
            .collect();
        assert_eq!(names, vec![Some("H1"), Some("H1_alt"), Some("H2")]);
    }

    #[test]
    fn serialize_preserves_a_non_utf8_declaration() {
        let source = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<config version=\"11.2\"/>\n";
        let tree = Tree::load(source).unwrap();
        let out = tree.serialize().unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"));
    }

    #[test]
    fn clone_subtree_produces_independent_copy() {
        let mut tree = Tree::load(SAMPLE.as_bytes()).unwrap();
        let h1 = tree
            .first("/config/devices/entry/vsys/entry/address/entry[@name='H1']")
            .unwrap()
            .unwrap();
        let cloned = tree.clone_subtree(h1, &|k, v| {
            if k == "name" { "H1_clone".to_string() } else { v.to_string() }
        });
        assert_eq!(tree.attr(cloned, "name"), Some("H1_clone"));
        assert_ne!(cloned, h1);
        assert!(tree.parent(cloned).is_none());
    }
}

//! End-to-end exercise of spec §8 Scenario A: dedup by value within a single
//! virtual-system, survivor chosen by shortest name, one reference rewritten
//! and the duplicate removed from the serialized output.

use panflow_accessors::Accessors;
use panflow_dedup::{DedupEngine, DedupRequest};
use panflow_graph::ConfigGraph;
use panflow_model::{AbortFlag, Action, ContainerKind, ContextDescriptor, DeviceKind, ObjectKind, SurvivorStrategy};
use panflow_schema::{ContextRouter, SchemaRegistry};
use panflow_tree::Tree;

const INPUT: &str = r#"<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <address>
            <entry name="H1"><ip-netmask>10.0.0.5/32</ip-netmask></entry>
            <entry name="H1_alt"><ip-netmask>10.0.0.5/32</ip-netmask></entry>
          </address>
          <rulebase>
            <security>
              <rules>
                <entry name="R1">
                  <source><member>any</member></source>
                  <destination><member>H1_alt</member></destination>
                  <service><member>any</member></service>
                  <application><member>any</member></application>
                  <action>allow</action>
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

fn vsys_ctx() -> ContextDescriptor {
    ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::Vsys).with_identifier("vsys1")
}

fn rulebase_ctx() -> ContextDescriptor {
    ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::LocalRulebase).with_identifier("vsys1")
}

#[test]
fn dedup_by_value_rewrites_reference_and_removes_duplicate() {
    let registry = SchemaRegistry::load_embedded().unwrap();
    let mut tree = Tree::load(INPUT.as_bytes()).unwrap();
    let accessors = Accessors::new(&registry, "11.2");
    let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
    let graph = ConfigGraph::build(&tree, &accessors, &router).unwrap();

    let engine = DedupEngine::new(&accessors, AbortFlag::new());
    let request = DedupRequest {
        kind: ObjectKind::Address,
        scope: vec![vsys_ctx()],
        strategy: SurvivorStrategy::ShortestName,
        dry_run: false,
    };
    let journal = engine.run(&mut tree, &graph, &request).unwrap();

    // Exactly one delete and one reference rewrite, per the scenario.
    let deletes = journal.entries().iter().filter(|e| e.action == Action::Delete).count();
    let rewrites = journal.entries().iter().filter(|e| e.action == Action::ReplaceRef).count();
    assert_eq!(deletes, 1);
    assert_eq!(rewrites, 1);

    assert!(accessors.exists(&tree, "address", &vsys_ctx(), "H1").unwrap());
    assert!(!accessors.exists(&tree, "address", &vsys_ctx(), "H1_alt").unwrap());

    let r1 = accessors.get(&tree, "security-rule", &rulebase_ctx(), "R1").unwrap();
    assert_eq!(r1.get("destination").and_then(|v| v.as_list()), Some(&["H1".to_string()][..]));

    // Serialize and re-parse: the surviving tree stays well-formed and the
    // removed name is gone from the byte stream entirely (§3 invariant:
    // no reference resolves to a removed object).
    let bytes = tree.serialize().unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.contains("H1_alt"));
    assert!(text.contains("<entry name=\"H1\">"));

    let reparsed = Tree::load(text.as_bytes()).unwrap();
    assert!(accessors.exists(&reparsed, "address", &vsys_ctx(), "H1").unwrap());
}

#[test]
fn dry_run_reports_without_mutating_bytes() {
    let registry = SchemaRegistry::load_embedded().unwrap();
    let mut tree = Tree::load(INPUT.as_bytes()).unwrap();
    let accessors = Accessors::new(&registry, "11.2");
    let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
    let graph = ConfigGraph::build(&tree, &accessors, &router).unwrap();

    let engine = DedupEngine::new(&accessors, AbortFlag::new());
    let request = DedupRequest {
        kind: ObjectKind::Address,
        scope: vec![vsys_ctx()],
        strategy: SurvivorStrategy::ShortestName,
        dry_run: true,
    };
    let before = tree.serialize().unwrap();
    let journal = engine.run(&mut tree, &graph, &request).unwrap();
    let after = tree.serialize().unwrap();

    assert_eq!(before, after);
    assert!(journal.entries().iter().any(|e| e.action == Action::Delete));
    assert!(journal.entries().iter().any(|e| e.action == Action::ReplaceRef));
}

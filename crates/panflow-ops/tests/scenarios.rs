//! End-to-end exercises of spec §8 Scenarios B, C, and D, driven entirely
//! through `panflow-ops`'s public API plus the crates it composes, checking
//! the serialized document rather than just in-memory state.

use panflow_accessors::Accessors;
use panflow_graph::ConfigGraph;
use panflow_model::{AbortFlag, Action, ContainerKind, ContextDescriptor, DeviceKind, PolicyKind};
use panflow_ops::{
    bulk_update_policies, disabled_policies, split_bidirectional, unused_objects, BulkOperation, BulkUpdateRequest, Criteria,
    Selector, SplitRequest, UnusedObjectsRequest,
};
use panflow_schema::{ContextRouter, SchemaRegistry};
use panflow_tree::Tree;

fn vsys_ctx() -> ContextDescriptor {
    ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::Vsys).with_identifier("vsys1")
}

fn rulebase_ctx() -> ContextDescriptor {
    ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::LocalRulebase).with_identifier("vsys1")
}

fn registry() -> SchemaRegistry {
    SchemaRegistry::load_embedded().unwrap()
}

// --- Scenario B: bulk add-tag via query ------------------------------------

const THREE_RULES: &str = r#"<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <rulebase>
            <security>
              <rules>
                <entry name="R1">
                  <source><member>any</member></source>
                  <destination><member>any</member></destination>
                  <service><member>any</member></service>
                  <application><member>any</member></application>
                  <action>allow</action>
                </entry>
                <entry name="R2">
                  <source><member>any</member></source>
                  <destination><member>any</member></destination>
                  <service><member>any</member></service>
                  <application><member>any</member></application>
                  <action>deny</action>
                </entry>
                <entry name="R3">
                  <source><member>any</member></source>
                  <destination><member>any</member></destination>
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

#[test]
fn scenario_b_bulk_add_tag_selected_by_query() {
    let registry = registry();
    let mut tree = Tree::load(THREE_RULES.as_bytes()).unwrap();
    let accessors = Accessors::new(&registry, "11.2");
    let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
    let graph = ConfigGraph::build(&tree, &accessors, &router).unwrap();

    let query = "MATCH (r:security-rule) WHERE r.action == 'allow' RETURN r.name";
    let request = BulkUpdateRequest {
        kind: PolicyKind::SecurityRule,
        ctx: rulebase_ctx(),
        selector: Selector { names: Vec::new(), criteria: Criteria::new(), query_filter: Some(query.to_string()) },
        operations: vec![BulkOperation::AddTag("reviewed".to_string())],
    };
    let journal = bulk_update_policies(&mut tree, &accessors, &graph, &request, &AbortFlag::new()).unwrap();

    // Exactly R1 and R3 updated, two change-records, as the scenario states.
    assert_eq!(journal.entries().iter().filter(|e| e.action == Action::Update).count(), 2);

    let r1 = accessors.get(&tree, "security-rule", &rulebase_ctx(), "R1").unwrap();
    let r2 = accessors.get(&tree, "security-rule", &rulebase_ctx(), "R2").unwrap();
    let r3 = accessors.get(&tree, "security-rule", &rulebase_ctx(), "R3").unwrap();
    assert_eq!(r1.get("tag").and_then(|v| v.as_list()), Some(&["reviewed".to_string()][..]));
    assert!(r2.get("tag").and_then(|v| v.as_list()).unwrap_or(&[]).is_empty());
    assert_eq!(r3.get("tag").and_then(|v| v.as_list()), Some(&["reviewed".to_string()][..]));

    let text = String::from_utf8(tree.serialize().unwrap()).unwrap();
    assert_eq!(text.matches("<tag>").count(), 2);

    // Idempotent: re-running the exact same request is a no-op journal.
    // Rebuild the router against the mutated tree (§4.5: the graph never
    // self-invalidates) from a fresh binding, not the one used above.
    let router2 = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
    let graph2 = ConfigGraph::build(&tree, &accessors, &router2).unwrap();
    let journal2 = bulk_update_policies(&mut tree, &accessors, &graph2, &request, &AbortFlag::new()).unwrap();
    assert!(journal2.is_empty());
}

// --- Scenario C: unused-object cleanup with an exclusion -------------------

const FIVE_ADDRESSES: &str = r#"<config version="11.2">
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
                  <source><member>any</member></source>
                  <destination><member>A3</member></destination>
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

#[test]
fn scenario_c_unused_cleanup_honors_exclude_list() {
    let registry = registry();
    let mut tree = Tree::load(FIVE_ADDRESSES.as_bytes()).unwrap();
    let accessors = Accessors::new(&registry, "11.2");
    let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
    let graph = ConfigGraph::build(&tree, &accessors, &router).unwrap();

    let request = UnusedObjectsRequest {
        types: vec![panflow_model::ObjectKind::Address],
        exclude: vec!["A1".to_string()],
        dry_run: false,
    };
    let journal = unused_objects(&mut tree, &accessors, &graph, &[vsys_ctx()], &request, &AbortFlag::new()).unwrap();
    assert_eq!(journal.entries().len(), 3);

    assert!(accessors.exists(&tree, "address", &vsys_ctx(), "A1").unwrap(), "excluded, kept despite being unused");
    assert!(!accessors.exists(&tree, "address", &vsys_ctx(), "A2").unwrap());
    assert!(accessors.exists(&tree, "address", &vsys_ctx(), "A3").unwrap(), "referenced, kept");
    assert!(!accessors.exists(&tree, "address", &vsys_ctx(), "A4").unwrap());
    assert!(!accessors.exists(&tree, "address", &vsys_ctx(), "A5").unwrap());

    let text = String::from_utf8(tree.serialize().unwrap()).unwrap();
    assert!(text.contains("name=\"A1\""));
    assert!(text.contains("name=\"A3\""));
    assert!(!text.contains("name=\"A2\""));
}

// --- Scenario D: split a bidirectional NAT rule ----------------------------

const BIDIRECTIONAL_NAT: &str = r#"<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <rulebase>
            <nat>
              <rules>
                <entry name="N1">
                  <from><member>trust</member></from>
                  <to><member>untrust</member></to>
                  <source><member>S1</member></source>
                  <destination><member>D1</member></destination>
                  <translated-destination><member>D2</member></translated-destination>
                  <bidirectional>yes</bidirectional>
                </entry>
              </rules>
            </nat>
          </rulebase>
        </entry>
      </vsys>
    </entry>
  </devices>
</config>
"#;

#[test]
fn scenario_d_split_bidirectional_nat_rule() {
    let registry = registry();
    let mut tree = Tree::load(BIDIRECTIONAL_NAT.as_bytes()).unwrap();
    let accessors = Accessors::new(&registry, "11.2");

    let request = SplitRequest {
        ctx: rulebase_ctx(),
        name: "N1".to_string(),
        swap_zones: true,
        return_rule_suffix: "-return".to_string(),
        clear_original_flag: true,
    };
    let journal = split_bidirectional(&mut tree, &accessors, &request).unwrap();
    assert_eq!(journal.entries().len(), 2);

    let original = accessors.get(&tree, "nat-rule", &rulebase_ctx(), "N1").unwrap();
    assert_eq!(original.get("bidirectional").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(original.get("source").and_then(|v| v.as_list()), Some(&["S1".to_string()][..]));

    let mirror = accessors.get(&tree, "nat-rule", &rulebase_ctx(), "N1-return").unwrap();
    assert_eq!(mirror.get("source").and_then(|v| v.as_list()), Some(&["D1".to_string()][..]));
    assert_eq!(mirror.get("destination").and_then(|v| v.as_list()), Some(&["S1".to_string()][..]));
    assert_eq!(mirror.get("from").and_then(|v| v.as_list()), Some(&["untrust".to_string()][..]));
    assert_eq!(mirror.get("to").and_then(|v| v.as_list()), Some(&["trust".to_string()][..]));
    assert_eq!(mirror.get("bidirectional").and_then(|v| v.as_bool()), Some(false));

    let names = accessors.list(&tree, "nat-rule", &rulebase_ctx()).unwrap();
    assert_eq!(names, vec!["N1".to_string(), "N1-return".to_string()]);
}

#[test]
fn disabled_policy_cleanup_removes_only_flagged_rules() {
    const TWO_RULES: &str = r#"<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <rulebase>
            <security>
              <rules>
                <entry name="R1">
                  <source><member>any</member></source>
                  <destination><member>any</member></destination>
                  <service><member>any</member></service>
                  <application><member>any</member></application>
                  <action>allow</action>
                  <disabled>yes</disabled>
                </entry>
                <entry name="R2">
                  <source><member>any</member></source>
                  <destination><member>any</member></destination>
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
    let registry = registry();
    let mut tree = Tree::load(TWO_RULES.as_bytes()).unwrap();
    let accessors = Accessors::new(&registry, "11.2");

    let journal = disabled_policies(&mut tree, &accessors, PolicyKind::SecurityRule, &rulebase_ctx(), false, &AbortFlag::new()).unwrap();
    assert_eq!(journal.entries().len(), 1);
    assert!(!accessors.exists(&tree, "security-rule", &rulebase_ctx(), "R1").unwrap());
    assert!(accessors.exists(&tree, "security-rule", &rulebase_ctx(), "R2").unwrap());
}

use panflow_accessors::Accessors;
use panflow_model::{Action, ChangeRecord, ContextDescriptor, Journal, PanflowError, PropertyMap, PropertyValue, Result};
use panflow_tree::{Position, Tree};

const MIRRORED_FIELDS: &[&str] = &["source", "destination", "translated-source", "translated-destination"];
const ZONE_FIELDS: &[&str] = &["from", "to"];

pub struct SplitRequest {
    pub ctx: ContextDescriptor,
    pub name: String,
    pub swap_zones: bool,
    pub return_rule_suffix: String,
    pub clear_original_flag: bool,
}

/// Splits a bidirectional NAT rule into the original (forward) direction
/// plus a mirror rule for the return direction, named `{name}{suffix}`.
/// Source/destination and their translations are swapped on the mirror;
/// `from`/`to` are swapped too when `swap_zones` is set. The original's
/// `bidirectional` flag is cleared on the forward rule when requested,
/// since a pair of one-directional rules replaces it.
pub fn split_bidirectional(tree: &mut Tree, accessors: &Accessors<'_>, request: &SplitRequest) -> Result<Journal> {
    let mut journal = Journal::new();
    let ctx = &request.ctx;
    let props = accessors.get(tree, "nat-rule", ctx, &request.name)?;

    if !props.get("bidirectional").and_then(|v| v.as_bool()).unwrap_or(false) {
        return Err(PanflowError::PropertyInvalid {
            kind: "nat-rule".to_string(),
            key: "bidirectional".to_string(),
            reason: format!("'{}' is not flagged bidirectional", request.name),
        });
    }

    let return_name = format!("{}{}", request.name, request.return_rule_suffix);
    if accessors.exists(tree, "nat-rule", ctx, &return_name)? {
        return Err(PanflowError::PolicyExists { name: return_name, context: ctx.label() });
    }

    let mut mirror = props.clone();
    for field in MIRRORED_FIELDS {
        swap_pair(&mut mirror, field);
    }
    if request.swap_zones {
        for field in ZONE_FIELDS {
            swap_pair(&mut mirror, field);
        }
    }
    mirror.insert("bidirectional".to_string(), PropertyValue::Bool(false));

    let xpath = accessors.xpath(tree, "nat-rule", ctx, &request.name)?;
    let original = tree.first(&xpath)?.ok_or_else(|| PanflowError::PolicyNotFound { name: request.name.clone(), context: ctx.label() })?;
    accessors.add(tree, "nat-rule", ctx, &return_name, &mirror, Position::After(original))?;
    journal.record(ChangeRecord::new(Action::Add, "nat-rule", return_name, ctx.label()).with_reason("split-bidirectional"));

    if request.clear_original_flag {
        let mut update = PropertyMap::new();
        update.insert("bidirectional".to_string(), PropertyValue::Bool(false));
        accessors.update(tree, "nat-rule", ctx, &request.name, &update)?;
        journal.record(ChangeRecord::new(Action::Update, "nat-rule", request.name.clone(), ctx.label()).with_reason("clear-bidirectional"));
    }

    tracing::info!(rule = %request.name, mirror = %return_name, swap_zones = request.swap_zones, "bidirectional NAT rule split");
    Ok(journal)
}

fn swap_pair(props: &mut PropertyMap, field_a: &str) {
    let field_b = match field_a {
        "source" => "destination",
        "destination" => "source",
        "translated-source" => "translated-destination",
        "translated-destination" => "translated-source",
        "from" => "to",
        "to" => "from",
        _ => return,
    };
    if field_a > field_b {
        return;
    }
    let a = props.remove(field_a);
    let b = props.remove(field_b);
    if let Some(b) = b {
        props.insert(field_a.to_string(), b);
    }
    if let Some(a) = a {
        props.insert(field_b.to_string(), a);
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
          <rulebase>
            <nat>
              <rules>
                <entry name="NAT1">
                  <from><member>trust</member></from>
                  <to><member>untrust</member></to>
                  <source><member>10.0.0.0/24</member></source>
                  <destination><member>any</member></destination>
                  <translated-source>198.51.100.1</translated-source>
                  <translated-destination>any</translated-destination>
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

    fn ctx() -> ContextDescriptor {
        ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::LocalRulebase).with_identifier("vsys1")
    }

    fn load() -> (Tree, SchemaRegistry) {
        (Tree::load(SAMPLE.as_bytes()).unwrap(), SchemaRegistry::load_embedded().unwrap())
    }

    #[test]
    fn split_creates_a_swapped_mirror_and_clears_the_original_flag() {
        let (mut tree, registry) = load();
        let accessors = Accessors::new(&registry, "11.2");
        let request = SplitRequest {
            ctx: ctx(),
            name: "NAT1".to_string(),
            swap_zones: true,
            return_rule_suffix: "-return".to_string(),
            clear_original_flag: true,
        };
        let journal = split_bidirectional(&mut tree, &accessors, &request).unwrap();
        assert_eq!(journal.entries().len(), 2);

        let mirror = accessors.get(&tree, "nat-rule", &ctx(), "NAT1-return").unwrap();
        assert_eq!(mirror.get("source").and_then(|v| v.as_list()), Some(&["any".to_string()][..]));
        assert_eq!(mirror.get("destination").and_then(|v| v.as_list()), Some(&["10.0.0.0/24".to_string()][..]));
        assert_eq!(mirror.get("translated-source").and_then(|v| v.as_scalar()), Some("any"));
        assert_eq!(mirror.get("translated-destination").and_then(|v| v.as_scalar()), Some("198.51.100.1"));
        assert_eq!(mirror.get("from").and_then(|v| v.as_list()), Some(&["untrust".to_string()][..]));
        assert_eq!(mirror.get("to").and_then(|v| v.as_list()), Some(&["trust".to_string()][..]));
        assert!(!mirror.get("bidirectional").and_then(|v| v.as_bool()).unwrap_or(false));

        let original = accessors.get(&tree, "nat-rule", &ctx(), "NAT1").unwrap();
        assert!(!original.get("bidirectional").and_then(|v| v.as_bool()).unwrap_or(false));
    }

    #[test]
    fn split_rejects_a_non_bidirectional_rule() {
        let (mut tree, registry) = load();
        let accessors = Accessors::new(&registry, "11.2");
        let mut update = PropertyMap::new();
        update.insert("bidirectional".to_string(), PropertyValue::Bool(false));
        accessors.update(&mut tree, "nat-rule", &ctx(), "NAT1", &update).unwrap();

        let request = SplitRequest {
            ctx: ctx(),
            name: "NAT1".to_string(),
            swap_zones: false,
            return_rule_suffix: "-return".to_string(),
            clear_original_flag: true,
        };
        assert!(split_bidirectional(&mut tree, &accessors, &request).is_err());
    }
}

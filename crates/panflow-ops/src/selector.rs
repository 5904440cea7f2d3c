use panflow_accessors::Accessors;
use panflow_graph::ConfigGraph;
use panflow_model::{ContextDescriptor, PropertyMap, PropertyValue, Result};
use panflow_tree::Tree;
use std::collections::{BTreeMap, HashSet};

/// Comparison operators a criteria entry can apply (§4.7's op set, reused
/// here since selection criteria and query `WHERE` clauses share the same
/// vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaOp {
    Eq,
    Ne,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone)]
pub enum CriteriaValue {
    Exact(String),
    AnyOf(Vec<String>),
    Op(CriteriaOp, String),
}

pub type Criteria = BTreeMap<String, CriteriaValue>;

/// `names[]` ∪ `criteria` ∪ `query_filter`, materialized as the
/// intersection of whichever components are actually supplied. An empty
/// selector matches every entry of the container it is resolved against.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    pub names: Vec<String>,
    pub criteria: Criteria,
    pub query_filter: Option<String>,
}

impl Selector {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.criteria.is_empty() && self.query_filter.is_none()
    }

    /// Resolves the selector against every `kind` entry visible in `ctx`,
    /// preserving that container's own listing order.
    pub fn resolve(&self, tree: &Tree, accessors: &Accessors<'_>, graph: &ConfigGraph, kind: &str, ctx: &ContextDescriptor) -> Result<Vec<String>> {
        let universe = accessors.list(tree, kind, ctx)?;
        if self.is_empty() {
            return Ok(universe);
        }

        let mut sets: Vec<HashSet<String>> = Vec::new();

        if !self.names.is_empty() {
            sets.push(universe.iter().filter(|n| self.names.contains(n)).cloned().collect());
        }

        if !self.criteria.is_empty() {
            let mut matched = HashSet::new();
            for name in &universe {
                let props = accessors.get(tree, kind, ctx, name)?;
                if self.criteria.iter().all(|(field, value)| matches_criteria(&props, field, value)) {
                    matched.insert(name.clone());
                }
            }
            sets.push(matched);
        }

        if let Some(query) = &self.query_filter {
            let result = panflow_query::run(graph, query)?;
            let name_col = result.columns.iter().position(|c| c.ends_with(".name")).unwrap_or(0);
            sets.push(result.rows.iter().filter_map(|row| row.get(name_col).cloned()).collect());
        }

        let mut sets = sets.into_iter();
        let first = sets.next().unwrap_or_default();
        let intersected = sets.fold(first, |acc, next| acc.intersection(&next).cloned().collect());
        Ok(universe.into_iter().filter(|n| intersected.contains(n)).collect())
    }
}

fn matches_criteria(props: &PropertyMap, field: &str, value: &CriteriaValue) -> bool {
    let Some(actual) = props.get(field) else { return false };
    match value {
        CriteriaValue::Exact(expected) => scalar_text(actual).map(|t| t == *expected).unwrap_or_else(|| list_contains(actual, expected)),
        CriteriaValue::AnyOf(options) => {
            scalar_text(actual).map(|t| options.iter().any(|o| o == &t)).unwrap_or_else(|| options.iter().any(|o| list_contains(actual, o)))
        }
        CriteriaValue::Op(op, operand) => compare(*op, actual, operand),
    }
}

fn scalar_text(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Scalar(s) => Some(s.clone()),
        PropertyValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn list_contains(value: &PropertyValue, needle: &str) -> bool {
    matches!(value, PropertyValue::List(items) if items.iter().any(|i| i == needle))
}

fn compare(op: CriteriaOp, actual: &PropertyValue, operand: &str) -> bool {
    let text = match actual {
        PropertyValue::Scalar(s) => s.clone(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::List(items) => items.join(","),
        PropertyValue::Null => return false,
    };
    match op {
        CriteriaOp::Eq => text == operand,
        CriteriaOp::Ne => text != operand,
        CriteriaOp::Contains => text.contains(operand),
        CriteriaOp::StartsWith => text.starts_with(operand),
        CriteriaOp::EndsWith => text.ends_with(operand),
        CriteriaOp::Regex => regex::Regex::new(operand).map(|re| re.is_match(&text)).unwrap_or(false),
        CriteriaOp::Lt | CriteriaOp::Gt | CriteriaOp::Le | CriteriaOp::Ge => match (text.parse::<f64>(), operand.parse::<f64>()) {
            (Ok(a), Ok(b)) => match op {
                CriteriaOp::Lt => a < b,
                CriteriaOp::Gt => a > b,
                CriteriaOp::Le => a <= b,
                CriteriaOp::Ge => a >= b,
                _ => unreachable!(),
            },
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panflow_model::{ContainerKind, DeviceKind, PropertyValue};
    use panflow_schema::{ContextRouter, SchemaRegistry};
    use panflow_tree::Position;

    const SAMPLE: &str = r#"<config version="11.2">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <address>
            <entry name="H1"><ip-netmask>10.0.0.5/32</ip-netmask><tag><member>prod</member></tag></entry>
            <entry name="H2"><ip-netmask>10.0.0.6/32</ip-netmask></entry>
            <entry name="H3"><fqdn>example.com</fqdn></entry>
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

    fn load() -> (Tree, SchemaRegistry) {
        (Tree::load(SAMPLE.as_bytes()).unwrap(), SchemaRegistry::load_embedded().unwrap())
    }

    #[test]
    fn empty_selector_matches_everything() {
        let (tree, registry) = load();
        let accessors = Accessors::new(&registry, "11.2");
        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
        let graph = ConfigGraph::build(&tree, &accessors, &router).unwrap();
        let selector = Selector::default();
        let names = selector.resolve(&tree, &accessors, &graph, "address", &ctx()).unwrap();
        assert_eq!(names, vec!["H1".to_string(), "H2".to_string(), "H3".to_string()]);
    }

    #[test]
    fn names_and_criteria_intersect() {
        let (mut tree, registry) = load();
        let accessors = Accessors::new(&registry, "11.2");
        accessors
            .add(&mut tree, "address", &ctx(), "H4", &PropertyMap::new(), Position::Bottom)
            .unwrap();
        let mut tagged = PropertyMap::new();
        tagged.insert("tag".to_string(), PropertyValue::List(vec!["prod".to_string()]));
        accessors.update(&mut tree, "address", &ctx(), "H4", &tagged).unwrap();

        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
        let graph = ConfigGraph::build(&tree, &accessors, &router).unwrap();

        let mut criteria = Criteria::new();
        criteria.insert("tag".to_string(), CriteriaValue::Exact("prod".to_string()));
        let selector = Selector { names: vec!["H1".to_string(), "H4".to_string()], criteria, query_filter: None };
        let names = selector.resolve(&tree, &accessors, &graph, "address", &ctx()).unwrap();
        assert_eq!(names, vec!["H1".to_string(), "H4".to_string()]);
    }

    #[test]
    fn op_criteria_filters_by_regex() {
        let (tree, registry) = load();
        let accessors = Accessors::new(&registry, "11.2");
        let router = ContextRouter::new(&registry, &tree, "11.2", DeviceKind::Firewall);
        let graph = ConfigGraph::build(&tree, &accessors, &router).unwrap();

        let mut criteria = Criteria::new();
        criteria.insert("fqdn".to_string(), CriteriaValue::Op(CriteriaOp::Regex, "^example".to_string()));
        let selector = Selector { names: Vec::new(), criteria, query_filter: None };
        let names = selector.resolve(&tree, &accessors, &graph, "address", &ctx()).unwrap();
        assert_eq!(names, vec!["H3".to_string()]);
    }
}

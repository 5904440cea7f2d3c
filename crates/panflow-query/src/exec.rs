use crate::ast::{EdgePattern, Expr, Literal, NodePattern, Op, Pattern, ProjectedField, Projection, Query};
use crate::kinds::entity_kind_for;
use panflow_graph::{ConfigGraph, EdgeKind, GraphNode, GraphNodeId};
use panflow_model::{PanflowError, PropertyValue, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};

type Bindings = HashMap<String, GraphNodeId>;

pub(crate) fn execute(graph: &ConfigGraph, query: &Query) -> Result<Vec<Vec<String>>> {
    for pattern in &query.patterns {
        for node in &pattern.nodes {
            if let Some(kind) = &node.kind {
                entity_kind_for(kind)?;
            }
        }
    }

    let mut rows: Vec<Bindings> = vec![HashMap::new()];
    for pattern in &query.patterns {
        let matches = match_pattern(graph, pattern);
        let mut joined = Vec::new();
        for row in &rows {
            for candidate in &matches {
                if let Some(merged) = merge(row, candidate) {
                    joined.push(merged);
                }
            }
        }
        rows = joined;
    }

    if let Some(expr) = &query.where_clause {
        let mut filtered = Vec::with_capacity(rows.len());
        for row in rows {
            if eval_expr(graph, &row, expr)? {
                filtered.push(row);
            }
        }
        rows = filtered;
    }

    let mut projected = project(graph, &rows, &query.projection)?;
    if query.projection.distinct {
        let mut seen = HashSet::new();
        projected.retain(|row| seen.insert(row.clone()));
    }
    if let Some(limit) = query.limit {
        projected.truncate(limit);
    }
    Ok(projected)
}

fn merge(a: &Bindings, b: &Bindings) -> Option<Bindings> {
    let mut merged = a.clone();
    for (var, id) in b {
        match merged.get(var) {
            Some(existing) if existing != id => return None,
            _ => {
                merged.insert(var.clone(), *id);
            }
        }
    }
    Some(merged)
}

fn bind(current: &mut Bindings, var: &str, id: GraphNodeId) -> bool {
    match current.get(var) {
        Some(existing) if *existing != id => false,
        _ => {
            current.insert(var.to_string(), id);
            true
        }
    }
}

fn kind_matches(node: &GraphNode, pattern: &NodePattern) -> bool {
    match &pattern.kind {
        Some(kind) => node.kind.as_str() == kind,
        None => true,
    }
}

/// §3's edge-kind vocabulary (`uses-source`, `uses-destination`,
/// `uses-service`, `uses-application`, `uses-source-zone`,
/// `uses-destination-zone`, `has-tag`), translated onto the reference
/// field(s) a `References` edge actually carries. `uses-source`/
/// `uses-destination` also cover NAT's `translated-source`/
/// `translated-destination` edges, which share the same address-family
/// semantics as their plain counterparts. `uses-source-zone`/
/// `uses-destination-zone` translate onto `from`/`to`; no edge carries
/// either field today since zones are not among §3's Object Kinds, so a
/// query against them correctly matches nothing rather than failing to
/// parse.
fn spec_relation_fields(relation: &str) -> &'static [&'static str] {
    match relation {
        "uses-source" => &["source", "translated-source"],
        "uses-destination" => &["destination", "translated-destination"],
        "uses-service" => &["service"],
        "uses-application" => &["application"],
        "uses-source-zone" => &["from"],
        "uses-destination-zone" => &["to"],
        "has-tag" => &["tag"],
        _ => &[],
    }
}

fn relation_matches(edge: &EdgeKind, pattern: &EdgePattern) -> bool {
    match edge {
        EdgeKind::Contains => pattern.relations.iter().any(|r| r == "contains"),
        EdgeKind::References { field } => pattern
            .relations
            .iter()
            .any(|r| r == field || r == "references" || spec_relation_fields(r).contains(&field.as_str())),
    }
}

fn match_pattern(graph: &ConfigGraph, pattern: &Pattern) -> Vec<Bindings> {
    let mut results = Vec::new();
    match_from(graph, pattern, 0, HashMap::new(), &mut results);
    results
}

fn match_from(graph: &ConfigGraph, pattern: &Pattern, idx: usize, current: Bindings, results: &mut Vec<Bindings>) {
    if idx == pattern.nodes.len() {
        results.push(current);
        return;
    }
    let node_pattern = &pattern.nodes[idx];
    if idx == 0 {
        for id in graph.node_ids() {
            if !kind_matches(graph.node_at(id), node_pattern) {
                continue;
            }
            let mut next = current.clone();
            if bind(&mut next, &node_pattern.var, id) {
                match_from(graph, pattern, idx + 1, next, results);
            }
        }
        return;
    }
    let edge_pattern = &pattern.edges[idx - 1];
    let prev_var = &pattern.nodes[idx - 1].var;
    let Some(&prev_id) = current.get(prev_var) else { return };
    for (edge_kind, target_id) in graph.outgoing(prev_id) {
        if !relation_matches(edge_kind, edge_pattern) {
            continue;
        }
        let target = graph.node_at(target_id);
        if !kind_matches(target, node_pattern) {
            continue;
        }
        let mut next = current.clone();
        if bind(&mut next, &node_pattern.var, target_id) {
            match_from(graph, pattern, idx + 1, next, results);
        }
    }
}

fn lookup_var(row: &Bindings, var: &str) -> Result<GraphNodeId> {
    row.get(var).copied().ok_or_else(|| PanflowError::QuerySyntax {
        position: 0,
        message: format!("variable '{var}' is not bound by any MATCH pattern"),
    })
}

/// Renders one property value as the plain string the query engine's
/// comparison operators work over; a list is its members joined the way a
/// `CONTAINS` check would want to substring-match against.
fn property_value_as_string(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Scalar(s) => s.clone(),
        PropertyValue::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        PropertyValue::List(items) => items.join(","),
        PropertyValue::Null => String::new(),
    }
}

fn resolve_field(node: &GraphNode, field: &str) -> Result<Option<String>> {
    match field {
        "name" => Ok(Some(node.name.clone())),
        "kind" => Ok(Some(node.kind.as_str().to_string())),
        "context" => Ok(Some(node.context.label())),
        "xpath" => Ok(Some(node.xpath.clone())),
        "value" => Ok(node.normalized_value.clone()),
        other => node
            .attrs
            .get(other)
            .map(|v| Some(property_value_as_string(v)))
            .ok_or_else(|| PanflowError::UnknownField { kind: node.kind.as_str().to_string(), field: other.to_string() }),
    }
}

fn literal_as_str(literal: &Literal) -> String {
    match literal {
        Literal::Str(s) => s.clone(),
        Literal::Num(n) => n.to_string(),
        Literal::Bool(b) => b.to_string(),
    }
}

fn compare(value: Option<&str>, op: Op, literal: &Literal) -> bool {
    let Some(value) = value else { return false };
    match op {
        Op::Eq => value == literal_as_str(literal),
        Op::Ne => value != literal_as_str(literal),
        Op::Contains => value.contains(&literal_as_str(literal)),
        Op::StartsWith => value.starts_with(&literal_as_str(literal)),
        Op::EndsWith => value.ends_with(&literal_as_str(literal)),
        Op::Regex => match literal {
            Literal::Str(pattern) => Regex::new(pattern).map(|re| re.is_match(value)).unwrap_or(false),
            _ => false,
        },
        Op::Lt | Op::Gt | Op::Le | Op::Ge => {
            let (Literal::Num(n), Ok(v)) = (literal, value.parse::<f64>()) else { return false };
            match op {
                Op::Lt => v < *n,
                Op::Gt => v > *n,
                Op::Le => v <= *n,
                Op::Ge => v >= *n,
                _ => unreachable!(),
            }
        }
    }
}

fn eval_expr(graph: &ConfigGraph, row: &Bindings, expr: &Expr) -> Result<bool> {
    match expr {
        Expr::And(a, b) => Ok(eval_expr(graph, row, a)? && eval_expr(graph, row, b)?),
        Expr::Or(a, b) => Ok(eval_expr(graph, row, a)? || eval_expr(graph, row, b)?),
        Expr::Not(a) => Ok(!eval_expr(graph, row, a)?),
        Expr::Exists { var, field } => {
            let id = lookup_var(row, var)?;
            Ok(resolve_field(graph.node_at(id), field)?.is_some())
        }
        Expr::Comparison { var, field, op, literal } => {
            let id = lookup_var(row, var)?;
            let value = resolve_field(graph.node_at(id), field)?;
            Ok(compare(value.as_deref(), *op, literal))
        }
    }
}

fn project_field(graph: &ConfigGraph, row: &Bindings, field: &ProjectedField) -> Result<String> {
    match field {
        ProjectedField::Field { var, field } => {
            let id = lookup_var(row, var)?;
            Ok(resolve_field(graph.node_at(id), field)?.unwrap_or_default())
        }
        ProjectedField::Collect { .. } => unreachable!("collect fields are only read through the aggregate path"),
    }
}

/// Projects matched rows onto the requested fields. A `COLLECT(...)` field
/// folds the result set into groups keyed by the plain fields alongside it,
/// Cypher-style, rather than requiring an explicit GROUP BY clause.
fn project(graph: &ConfigGraph, rows: &[Bindings], projection: &Projection) -> Result<Vec<Vec<String>>> {
    let collect_count = projection.fields.iter().filter(|f| matches!(f, ProjectedField::Collect { .. })).count();

    if collect_count == 0 {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(projection.fields.len());
            for field in &projection.fields {
                cells.push(project_field(graph, row, field)?);
            }
            out.push(cells);
        }
        return Ok(out);
    }

    let mut order: Vec<Vec<String>> = Vec::new();
    let mut groups: HashMap<Vec<String>, Vec<Vec<String>>> = HashMap::new();
    for row in rows {
        let mut key = Vec::new();
        let mut collected = Vec::new();
        for field in &projection.fields {
            match field {
                ProjectedField::Field { var, field } => {
                    let id = lookup_var(row, var)?;
                    key.push(resolve_field(graph.node_at(id), field)?.unwrap_or_default());
                }
                ProjectedField::Collect { var, field } => {
                    let id = lookup_var(row, var)?;
                    collected.push(resolve_field(graph.node_at(id), field)?.unwrap_or_default());
                }
            }
        }
        groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Vec::new()
        }).push(collected);
    }

    let mut out = Vec::with_capacity(order.len());
    for key in &order {
        let collected_rows = groups.get(key).cloned().unwrap_or_default();
        let mut per_collect_values: Vec<Vec<String>> = vec![Vec::new(); collect_count];
        let mut seen: Vec<HashSet<String>> = vec![HashSet::new(); collect_count];
        for row in &collected_rows {
            for (slot, value) in row.iter().enumerate() {
                if seen[slot].insert(value.clone()) {
                    per_collect_values[slot].push(value.clone());
                }
            }
        }
        let mut key_iter = key.iter();
        let mut collect_iter = per_collect_values.into_iter();
        let mut cells = Vec::with_capacity(projection.fields.len());
        for field in &projection.fields {
            match field {
                ProjectedField::Field { .. } => cells.push(key_iter.next().cloned().unwrap_or_default()),
                ProjectedField::Collect { .. } => {
                    let values = collect_iter.next().unwrap_or_default();
                    cells.push(format!("[{}]", values.join(", ")));
                }
            }
        }
        out.push(cells);
    }
    Ok(out)
}

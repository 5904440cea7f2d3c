//! Declarative graph query engine (§4.7, C6).
//!
//! `MATCH pattern(, pattern)* [WHERE expr] RETURN projection [LIMIT n]`
//! runs directly over a built [`panflow_graph::ConfigGraph`]: `MATCH`
//! walks node and edge patterns, `WHERE` filters on a matched node's own
//! attributes (name, kind, context, xpath, and its normalized value as
//! `value`), and `RETURN` projects or `COLLECT`s those attributes.

mod ast;
mod exec;
mod kinds;
mod lexer;
mod parser;

pub use ast::{EdgePattern, Expr, Literal, NodePattern, Op, Pattern, ProjectedField, Projection, Query};

use panflow_graph::ConfigGraph;
use panflow_model::Result;

/// The tabular result of a query: one header per `RETURN` field, one row
/// per matched (and possibly grouped) binding set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parses and runs `text` against `graph`. The graph is a snapshot — callers
/// that mutate the tree must rebuild it before querying again.
pub fn run(graph: &ConfigGraph, text: &str) -> Result<QueryResult> {
    let query = parser::parse(text)?;
    let columns = query.projection.fields.iter().map(column_name).collect();
    let rows = exec::execute(graph, &query)?;
    Ok(QueryResult { columns, rows })
}

fn column_name(field: &ProjectedField) -> String {
    match field {
        ProjectedField::Field { var, field } => format!("{var}.{field}"),
        ProjectedField::Collect { var, field } => format!("collect({var}.{field})"),
    }
}

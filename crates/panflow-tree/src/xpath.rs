//! A deliberately small XPath subset: enough to express and evaluate the
//! absolute, predicate-qualified paths the Schema Registry (`panflow-schema`)
//! generates — `/config/devices/entry/device-group/entry[@name='DG1']/address`
//! — not a general XPath engine. Every predicate is an `@attr='value'`
//! equality test; there is no axis support, no wildcards, no functions.

use panflow_model::{PanflowError, Result};

#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub name: String,
    pub predicates: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

pub(crate) fn parse(xpath: &str) -> Result<ParsedPath> {
    let absolute = xpath.starts_with('/');
    let trimmed = xpath.trim_start_matches('/');
    if trimmed.is_empty() {
        return Ok(ParsedPath { absolute, steps: Vec::new() });
    }
    let mut steps = Vec::new();
    for raw_step in split_steps(trimmed) {
        steps.push(parse_step(&raw_step)?);
    }
    Ok(ParsedPath { absolute, steps })
}

/// Splits on `/` but ignores slashes inside `[...]` predicates (none of our
/// templates put one there, but this keeps the splitter honest).
fn split_steps(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth -= 1;
                current.push(c);
            }
            '/' if depth == 0 => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn parse_step(raw: &str) -> Result<Step> {
    let bracket = raw.find('[');
    let (name, rest) = match bracket {
        Some(idx) => (&raw[..idx], &raw[idx..]),
        None => (raw, ""),
    };
    if name.is_empty() {
        return Err(PanflowError::ParseFailed(format!("empty step in xpath segment '{raw}'")));
    }
    let mut predicates = Vec::new();
    let mut remaining = rest;
    while let Some(start) = remaining.find('[') {
        let end = remaining[start..]
            .find(']')
            .ok_or_else(|| PanflowError::ParseFailed(format!("unterminated predicate in '{raw}'")))?
            + start;
        let body = &remaining[start + 1..end];
        predicates.push(parse_predicate(body)?);
        remaining = &remaining[end + 1..];
    }
    Ok(Step { name: name.to_string(), predicates })
}

fn parse_predicate(body: &str) -> Result<(String, String)> {
    let body = body.trim();
    let body = body
        .strip_prefix('@')
        .ok_or_else(|| PanflowError::ParseFailed(format!("predicate '{body}' must start with @attr='value'")))?;
    let eq = body
        .find('=')
        .ok_or_else(|| PanflowError::ParseFailed(format!("predicate '@{body}' missing '='")))?;
    let attr = body[..eq].trim().to_string();
    let value = body[eq + 1..].trim();
    let value = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .ok_or_else(|| PanflowError::ParseFailed(format!("predicate value '{value}' must be quoted")))?;
    Ok((attr, value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_absolute_path() {
        let p = parse("/config/devices").unwrap();
        assert!(p.absolute);
        assert_eq!(p.steps.len(), 2);
        assert_eq!(p.steps[0].name, "config");
        assert_eq!(p.steps[1].name, "devices");
    }

    #[test]
    fn parses_predicate_with_single_quotes() {
        let p = parse("/config/entry[@name='DG1']").unwrap();
        assert_eq!(p.steps[1].name, "entry");
        assert_eq!(p.steps[1].predicates, vec![("name".to_string(), "DG1".to_string())]);
    }

    #[test]
    fn rejects_unquoted_predicate_value() {
        assert!(parse("/entry[@name=DG1]").is_err());
    }
}

use serde::Deserialize;
use std::collections::HashMap;

/// The shape of one version's embeddable schema resource (§6): two
/// top-level sections, `contexts` (device_kind -> container_kind ->
/// parameterized base-path) and `kinds` (kind -> path template relative to
/// `{base_path}`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VersionDescriptor {
    pub contexts: HashMap<String, HashMap<String, String>>,
    pub kinds: HashMap<String, String>,
}

/// `(major, minor)` — the schema family only ever diverges at that
/// granularity; a patch component on the input version string, if any, is
/// ignored for matching purposes.
pub(crate) fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor))
}

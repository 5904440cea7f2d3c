use crate::descriptor::{parse_version, VersionDescriptor};
use panflow_model::{ContextDescriptor, PanflowError, Result};
use std::collections::{BTreeMap, HashMap};

/// Embedded descriptors, oldest first. Adding a new software version means
/// adding a YAML file here and one line in this table — nothing else in the
/// crate needs to change.
const DESCRIPTORS: &[(&str, &str)] = &[
    ("10.1", include_str!("../schemas/v10_1.yaml")),
    ("10.2", include_str!("../schemas/v10_2.yaml")),
    ("11.0", include_str!("../schemas/v11_0.yaml")),
    ("11.1", include_str!("../schemas/v11_1.yaml")),
    ("11.2", include_str!("../schemas/v11_2.yaml")),
];

/// Version-aware lookup of XPath templates (§6). Holds every known
/// descriptor in memory, keyed by parsed `(major, minor)` so that resolving
/// an unlisted version can fall back to the nearest earlier one.
pub struct SchemaRegistry {
    versions: BTreeMap<(u32, u32), (String, VersionDescriptor)>,
}

impl SchemaRegistry {
    /// Parses the embedded descriptors. Fails only if a descriptor shipped
    /// with the crate is malformed, which would be a packaging bug rather
    /// than a caller error.
    pub fn load_embedded() -> Result<Self> {
        let mut versions = BTreeMap::new();
        for (label, raw) in DESCRIPTORS {
            let parsed = parse_version(label).ok_or_else(|| {
                PanflowError::ParseFailed(format!("embedded schema label '{label}' is not a valid version"))
            })?;
            let descriptor: VersionDescriptor = serde_yaml::from_str(raw)
                .map_err(|e| PanflowError::ParseFailed(format!("schema descriptor '{label}': {e}")))?;
            versions.insert(parsed, (label.to_string(), descriptor));
        }
        Ok(Self { versions })
    }

    /// The newest embedded version label, used when a configuration carries
    /// no `version` attribute at all (§4.1).
    pub fn highest_version(&self) -> &str {
        self.versions
            .values()
            .next_back()
            .map(|(label, _)| label.as_str())
            .expect("at least one schema descriptor is always embedded")
    }

    /// The known version label actually used for `requested`: an exact
    /// match if one exists, otherwise the greatest known version that is
    /// `<= requested` (§6 version fallback).
    pub fn resolve_version(&self, requested: &str) -> Result<&str> {
        let target = parse_version(requested).ok_or_else(|| PanflowError::SchemaUnsupported {
            version: requested.to_string(),
        })?;
        self.versions
            .range(..=target)
            .next_back()
            .map(|(_, (label, _))| label.as_str())
            .ok_or_else(|| PanflowError::SchemaUnsupported { version: requested.to_string() })
    }

    fn descriptor_for(&self, requested: &str) -> Result<&VersionDescriptor> {
        let resolved = self.resolve_version(requested)?;
        let target = parse_version(resolved).expect("resolve_version returns a parseable label");
        Ok(&self.versions[&target].1)
    }

    /// The concrete base path for a context: the descriptor's template for
    /// `(device_kind, container_kind)` with its identifier placeholder
    /// substituted, if the container needs one.
    pub fn base_path(&self, version: &str, ctx: &ContextDescriptor) -> Result<String> {
        let descriptor = self.descriptor_for(version)?;
        let device_map = descriptor.contexts.get(&ctx.device_kind.to_string()).ok_or_else(|| {
            PanflowError::ContextInvalid {
                reason: format!("no contexts known for device kind '{}'", ctx.device_kind),
                context: Some(ctx.clone()),
            }
        })?;
        let template = device_map.get(&ctx.container_kind.to_string()).ok_or_else(|| {
            PanflowError::ContextInvalid {
                reason: format!(
                    "container '{}' is not defined for device kind '{}'",
                    ctx.container_kind, ctx.device_kind
                ),
                context: Some(ctx.clone()),
            }
        })?;
        if ctx.container_kind.requires_identifier() {
            let id = ctx.identifier.as_ref().ok_or_else(|| PanflowError::ContextInvalid {
                reason: format!("container '{}' requires an identifier", ctx.container_kind),
                context: Some(ctx.clone()),
            })?;
            Ok(template.replace(&format!("{{{}}}", ctx.container_kind), id))
        } else {
            Ok(template.clone())
        }
    }

    /// Resolves the full entry path for `kind` in `ctx`, substituting
    /// `{base_path}` and any extra placeholders (typically `{name}`).
    pub fn resolve(
        &self,
        version: &str,
        kind: &str,
        ctx: &ContextDescriptor,
        placeholders: &HashMap<&str, &str>,
    ) -> Result<String> {
        let descriptor = self.descriptor_for(version)?;
        let base = self.base_path(version, ctx)?;
        let template = descriptor
            .kinds
            .get(kind)
            .ok_or_else(|| PanflowError::UnknownKind(kind.to_string()))?;
        let mut resolved = template.replace("{base_path}", &base);
        for (key, value) in placeholders {
            resolved = resolved.replace(&format!("{{{key}}}"), value);
        }
        Ok(resolved)
    }

    /// The container-level list path for `kind` (the entry path with its
    /// trailing `entry[@name='{name}']` predicate stripped), used by
    /// accessors' `list`/`add` operations.
    pub fn list_path(&self, version: &str, kind: &str, ctx: &ContextDescriptor) -> Result<String> {
        let placeholders = HashMap::new();
        let entry_path = self.resolve(version, kind, ctx, &placeholders)?;
        entry_path
            .rsplit_once("/entry[")
            .map(|(prefix, _)| format!("{prefix}/entry"))
            .ok_or_else(|| PanflowError::ParseFailed(format!("kind '{kind}' template has no entry predicate")))
    }
}

use crate::context::ContextDescriptor;

/// The complete error taxonomy surfaced by every PANFlow crate.
///
/// Accessors and the schema registry raise these directly; orchestrators
/// translate per-entity failures into `skipped` change-records instead of
/// propagating them, except for the invocation-fatal set called out below.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PanflowError {
    #[error("software version {version} is not supported and no earlier fallback exists")]
    SchemaUnsupported { version: String },

    #[error("context is invalid: {reason}")]
    ContextInvalid { reason: String, context: Option<ContextDescriptor> },

    #[error("{kind} '{name}' not found in context {context}")]
    ObjectNotFound { kind: String, name: String, context: String },

    #[error("{kind} '{name}' already exists in context {context}")]
    ObjectExists { kind: String, name: String, context: String },

    #[error("policy '{name}' not found in context {context}")]
    PolicyNotFound { name: String, context: String },

    #[error("policy '{name}' already exists in context {context}")]
    PolicyExists { name: String, context: String },

    #[error("property '{key}' invalid for {kind}: {reason}")]
    PropertyInvalid { kind: String, key: String, reason: String },

    #[error("query syntax error at position {position}: {message}")]
    QuerySyntax { position: usize, message: String },

    #[error("unknown kind '{0}'")]
    UnknownKind(String),

    #[error("unknown field '{field}' on kind '{kind}'")]
    UnknownField { kind: String, field: String },

    #[error("merge conflict on {kind} '{name}': {reason}")]
    MergeConflict { kind: String, name: String, reason: String },

    #[error("{kind} '{name}' still has {site_count} reference site(s) and cannot be deleted")]
    ReferenceResidual { kind: String, name: String, site_count: usize },

    #[error("failed to parse XML document: {0}")]
    ParseFailed(String),

    #[error("failed to serialize XML document: {0}")]
    SerializeFailed(String),
}

pub type Result<T> = std::result::Result<T, PanflowError>;

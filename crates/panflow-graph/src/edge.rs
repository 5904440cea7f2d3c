/// The relation an edge expresses between two graph nodes (§4.5, §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// A policy or group field names another entity by value, e.g. a
    /// security rule's `source` field naming an address.
    References { field: String },
    /// A group's literal, unresolved member name (transitive resolution is
    /// left to the query engine).
    Contains,
}

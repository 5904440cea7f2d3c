use panflow_model::{ContextDescriptor, EntityKind, PropertyMap};

/// One object or policy entry, as it existed at the moment the graph was
/// built (§4.5). `normalized_value` is `Some` only for kinds C8's
/// deduplication engine groups by value (see [`crate::normalize`]);
/// policies and catalog-only object kinds carry `None` and are only ever
/// name-equivalent. `attrs` is the entity's full property map as read
/// through the accessor (§3: "kind-specific scalars, e.g. address value +
/// address-subkind, service protocol + port"), so a query's `r.action` or
/// `r.ip-netmask` reads the same value the accessor would return from
/// `get()`.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub kind: EntityKind,
    pub name: String,
    pub context: ContextDescriptor,
    pub xpath: String,
    pub normalized_value: Option<String>,
    pub attrs: PropertyMap,
}

/// The single node representing PAN-OS's `any` sentinel, shared across
/// every policy member-list field that uses it. Not itself an object: has
/// no context, no XML location, and participates only as an edge target.
pub const ANY_SENTINEL: &str = "any";

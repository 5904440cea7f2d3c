use panflow_model::{EntityKind, ObjectKind, PolicyKind};

/// How a property key maps onto XML (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldShapeKind {
    Scalar,
    ChoiceOf,
    MemberList,
    Flag,
}

/// One property key's shape. `path` is the element chain from the owning
/// `entry` down to the leaf (container elements are created on demand).
/// `choice_siblings` is set only for `ChoiceOf` fields: the names of
/// `entry`'s direct children that must be cleared before writing a new
/// value for any field in the group.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldDescriptor {
    pub name: &'static str,
    pub shape: FieldShapeKind,
    pub path: &'static [&'static str],
    pub choice_siblings: Option<&'static [&'static str]>,
}

const fn scalar(name: &'static str) -> FieldDescriptor {
    FieldDescriptor { name, shape: FieldShapeKind::Scalar, path: &[name], choice_siblings: None }
}

const fn flag(name: &'static str) -> FieldDescriptor {
    FieldDescriptor { name, shape: FieldShapeKind::Flag, path: &[name], choice_siblings: None }
}

const fn member_list(name: &'static str) -> FieldDescriptor {
    FieldDescriptor { name, shape: FieldShapeKind::MemberList, path: &[name], choice_siblings: None }
}

const ADDRESS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "ip-netmask",
        shape: FieldShapeKind::ChoiceOf,
        path: &["ip-netmask"],
        choice_siblings: Some(&["ip-netmask", "ip-range", "fqdn"]),
    },
    FieldDescriptor {
        name: "ip-range",
        shape: FieldShapeKind::ChoiceOf,
        path: &["ip-range"],
        choice_siblings: Some(&["ip-netmask", "ip-range", "fqdn"]),
    },
    FieldDescriptor {
        name: "fqdn",
        shape: FieldShapeKind::ChoiceOf,
        path: &["fqdn"],
        choice_siblings: Some(&["ip-netmask", "ip-range", "fqdn"]),
    },
    scalar("description"),
    member_list("tag"),
];

const GROUP_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "static",
        shape: FieldShapeKind::MemberList,
        path: &["static"],
        choice_siblings: Some(&["static", "dynamic"]),
    },
    FieldDescriptor {
        name: "dynamic",
        shape: FieldShapeKind::Scalar,
        path: &["dynamic", "filter"],
        choice_siblings: Some(&["static", "dynamic"]),
    },
    scalar("description"),
    member_list("tag"),
];

const SERVICE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "tcp-port",
        shape: FieldShapeKind::ChoiceOf,
        path: &["protocol", "tcp", "port"],
        choice_siblings: Some(&["protocol"]),
    },
    // Optional sibling of tcp-port, not itself part of the tcp/udp choice:
    // a service keeps at most one source-port regardless of which
    // destination-port field is active.
    FieldDescriptor {
        name: "tcp-source-port",
        shape: FieldShapeKind::Scalar,
        path: &["protocol", "tcp", "source-port"],
        choice_siblings: None,
    },
    FieldDescriptor {
        name: "udp-port",
        shape: FieldShapeKind::ChoiceOf,
        path: &["protocol", "udp", "port"],
        choice_siblings: Some(&["protocol"]),
    },
    FieldDescriptor {
        name: "udp-source-port",
        shape: FieldShapeKind::Scalar,
        path: &["protocol", "udp", "source-port"],
        choice_siblings: None,
    },
    scalar("description"),
    member_list("tag"),
];

const TAG_FIELDS: &[FieldDescriptor] = &[scalar("color"), scalar("comments")];

const SIMPLE_OBJECT_FIELDS: &[FieldDescriptor] = &[scalar("description"), member_list("tag")];

const SECURITY_RULE_FIELDS: &[FieldDescriptor] = &[
    member_list("from"),
    member_list("to"),
    member_list("source"),
    member_list("destination"),
    member_list("source-user"),
    member_list("category"),
    member_list("application"),
    member_list("service"),
    scalar("action"),
    scalar("rule-type"),
    scalar("description"),
    flag("disabled"),
    flag("log-start"),
    flag("log-end"),
    scalar("log-setting"),
    member_list("tag"),
    FieldDescriptor {
        name: "profile-group",
        shape: FieldShapeKind::MemberList,
        path: &["profile-setting", "group"],
        choice_siblings: None,
    },
];

const NAT_RULE_FIELDS: &[FieldDescriptor] = &[
    member_list("from"),
    member_list("to"),
    member_list("source"),
    member_list("destination"),
    member_list("service"),
    scalar("description"),
    flag("disabled"),
    flag("bidirectional"),
    scalar("translated-source"),
    scalar("translated-destination"),
    scalar("log-setting"),
    member_list("tag"),
];

const COMMON_RULE_FIELDS: &[FieldDescriptor] = &[
    member_list("from"),
    member_list("to"),
    member_list("source"),
    member_list("destination"),
    member_list("application"),
    member_list("service"),
    scalar("description"),
    flag("disabled"),
    scalar("log-setting"),
    member_list("tag"),
];

/// The property-descriptor table for `kind` (§9: one table, not a class
/// hierarchy per kind). Profile kinds and the handful of catalog-only object
/// kinds (region, external-list, log-forwarding-profile, security-profile
/// group) expose only the fields common to every object: description and
/// tag membership.
pub(crate) fn fields_for(kind: EntityKind) -> &'static [FieldDescriptor] {
    match kind {
        EntityKind::Object(ObjectKind::Address) => ADDRESS_FIELDS,
        EntityKind::Object(ObjectKind::AddressGroup)
        | EntityKind::Object(ObjectKind::ServiceGroup)
        | EntityKind::Object(ObjectKind::ApplicationGroup) => GROUP_FIELDS,
        EntityKind::Object(ObjectKind::Service) => SERVICE_FIELDS,
        EntityKind::Object(ObjectKind::Tag) => TAG_FIELDS,
        EntityKind::Object(ObjectKind::Application)
        | EntityKind::Object(ObjectKind::Region)
        | EntityKind::Object(ObjectKind::ExternalList)
        | EntityKind::Object(ObjectKind::LogForwardingProfile)
        | EntityKind::Object(ObjectKind::SecurityProfileGroup)
        | EntityKind::Object(ObjectKind::Profile(_)) => SIMPLE_OBJECT_FIELDS,
        EntityKind::Policy(PolicyKind::SecurityRule) => SECURITY_RULE_FIELDS,
        EntityKind::Policy(PolicyKind::NatRule) => NAT_RULE_FIELDS,
        EntityKind::Policy(_) => COMMON_RULE_FIELDS,
    }
}

pub(crate) fn field_descriptor(kind: EntityKind, field: &str) -> Option<&'static FieldDescriptor> {
    fields_for(kind).iter().find(|d| d.name == field)
}

/// The member element every member-list uses, regardless of kind or field.
pub(crate) const MEMBER_ELEMENT: &str = "member";

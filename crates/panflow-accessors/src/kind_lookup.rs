use panflow_model::{EntityKind, ObjectKind, PanflowError, PolicyKind, ProfileKind, Result};

const OBJECT_KINDS: &[ObjectKind] = &[
    ObjectKind::Address,
    ObjectKind::AddressGroup,
    ObjectKind::Service,
    ObjectKind::ServiceGroup,
    ObjectKind::Application,
    ObjectKind::ApplicationGroup,
    ObjectKind::Tag,
    ObjectKind::Region,
    ObjectKind::ExternalList,
    ObjectKind::LogForwardingProfile,
    ObjectKind::SecurityProfileGroup,
    ObjectKind::Profile(ProfileKind::Antivirus),
    ObjectKind::Profile(ProfileKind::AntiSpyware),
    ObjectKind::Profile(ProfileKind::VulnerabilityProtection),
    ObjectKind::Profile(ProfileKind::UrlFiltering),
    ObjectKind::Profile(ProfileKind::FileBlocking),
    ObjectKind::Profile(ProfileKind::WildfireAnalysis),
    ObjectKind::Profile(ProfileKind::DataFiltering),
];

const POLICY_KINDS: &[PolicyKind] = &[
    PolicyKind::SecurityRule,
    PolicyKind::NatRule,
    PolicyKind::Decryption,
    PolicyKind::Qos,
    PolicyKind::Authentication,
    PolicyKind::Dos,
    PolicyKind::TunnelInspection,
    PolicyKind::ApplicationOverride,
];

/// Maps a schema-table kind string (the key the registry's `kinds:` section
/// uses, e.g. `"address-group"`) back to the typed `EntityKind` that names
/// its property shapes. The two tables are kept in lockstep by construction:
/// `ObjectKind::as_str`/`PolicyKind::as_str` are exactly the registry keys.
pub(crate) fn entity_kind_for(kind: &str) -> Result<EntityKind> {
    if let Some(object) = OBJECT_KINDS.iter().find(|k| k.as_str() == kind) {
        return Ok(EntityKind::Object(*object));
    }
    if let Some(policy) = POLICY_KINDS.iter().find(|k| k.as_str() == kind) {
        return Ok(EntityKind::Policy(*policy));
    }
    Err(PanflowError::UnknownKind(kind.to_string()))
}

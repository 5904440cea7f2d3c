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

/// Resolves a `MATCH (var:kind)` kind name to the typed `EntityKind` the
/// executor filters graph nodes by.
pub(crate) fn entity_kind_for(kind: &str) -> Result<EntityKind> {
    if let Some(object) = OBJECT_KINDS.iter().find(|k| k.as_str() == kind) {
        return Ok(EntityKind::Object(*object));
    }
    if let Some(policy) = POLICY_KINDS.iter().find(|k| k.as_str() == kind) {
        return Ok(EntityKind::Policy(*policy));
    }
    Err(PanflowError::UnknownKind(kind.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_kinds() {
        assert_eq!(entity_kind_for("address").unwrap(), EntityKind::Object(ObjectKind::Address));
        assert_eq!(entity_kind_for("security-rule").unwrap(), EntityKind::Policy(PolicyKind::SecurityRule));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(entity_kind_for("bogus").is_err());
    }
}

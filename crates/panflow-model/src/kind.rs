use serde::{Deserialize, Serialize};
use std::fmt;

/// Object kinds, per spec §3. Kept as a tagged enum (not a class hierarchy,
/// §9) with a single property-descriptor table living in `panflow-schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Address,
    AddressGroup,
    Service,
    ServiceGroup,
    Application,
    ApplicationGroup,
    Tag,
    Region,
    ExternalList,
    LogForwardingProfile,
    SecurityProfileGroup,
    Profile(ProfileKind),
}

/// Individual security-profile sub-kinds, grouped so `ObjectKind` stays a
/// fixed-size enum rather than one variant per profile type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    Antivirus,
    AntiSpyware,
    VulnerabilityProtection,
    UrlFiltering,
    FileBlocking,
    WildfireAnalysis,
    DataFiltering,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Address => "address",
            ObjectKind::AddressGroup => "address-group",
            ObjectKind::Service => "service",
            ObjectKind::ServiceGroup => "service-group",
            ObjectKind::Application => "application",
            ObjectKind::ApplicationGroup => "application-group",
            ObjectKind::Tag => "tag",
            ObjectKind::Region => "region",
            ObjectKind::ExternalList => "external-list",
            ObjectKind::LogForwardingProfile => "log-forwarding-profile",
            ObjectKind::SecurityProfileGroup => "security-profile-group",
            ObjectKind::Profile(p) => p.as_str(),
        }
    }

    /// Object kinds whose accessor is a group (member-list container).
    pub fn is_group(self) -> bool {
        matches!(
            self,
            ObjectKind::AddressGroup | ObjectKind::ServiceGroup | ObjectKind::ApplicationGroup
        )
    }
}

impl ProfileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileKind::Antivirus => "antivirus-profile",
            ProfileKind::AntiSpyware => "anti-spyware-profile",
            ProfileKind::VulnerabilityProtection => "vulnerability-protection-profile",
            ProfileKind::UrlFiltering => "url-filtering-profile",
            ProfileKind::FileBlocking => "file-blocking-profile",
            ProfileKind::WildfireAnalysis => "wildfire-analysis-profile",
            ProfileKind::DataFiltering => "data-filtering-profile",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Policy kinds, per spec §3. `variant` captures pre/post/local where the
/// rulebase applies (security and NAT rules); other policy kinds are scoped
/// by container directly and carry `RulebaseVariant::NotApplicable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    SecurityRule,
    NatRule,
    Decryption,
    Qos,
    Authentication,
    Dos,
    TunnelInspection,
    ApplicationOverride,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::SecurityRule => "security-rule",
            PolicyKind::NatRule => "nat-rule",
            PolicyKind::Decryption => "decryption-rule",
            PolicyKind::Qos => "qos-rule",
            PolicyKind::Authentication => "authentication-rule",
            PolicyKind::Dos => "dos-rule",
            PolicyKind::TunnelInspection => "tunnel-inspection-rule",
            PolicyKind::ApplicationOverride => "application-override-rule",
        }
    }

    /// Whether this policy kind is split across pre/post/local rulebases.
    /// Per spec §3 only security and NAT rules carry that split explicitly;
    /// the remaining policy kinds are scoped directly by their container.
    pub fn has_rulebase_variants(self) -> bool {
        matches!(self, PolicyKind::SecurityRule | PolicyKind::NatRule)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Any entity kind the engine reasons about, object or policy. Used where a
/// single tag is needed across both families (reference sites, change
/// records).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKind {
    Object(ObjectKind),
    Policy(PolicyKind),
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Object(o) => o.as_str(),
            EntityKind::Policy(p) => p.as_str(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_kind_names_are_kebab_case() {
        assert_eq!(ObjectKind::AddressGroup.as_str(), "address-group");
        assert_eq!(ObjectKind::Profile(ProfileKind::Antivirus).as_str(), "antivirus-profile");
    }

    #[test]
    fn groups_are_identified() {
        assert!(ObjectKind::ServiceGroup.is_group());
        assert!(!ObjectKind::Service.is_group());
    }

    #[test]
    fn rulebase_variants_flag_is_correct() {
        assert!(PolicyKind::SecurityRule.has_rulebase_variants());
        assert!(PolicyKind::NatRule.has_rulebase_variants());
        assert!(!PolicyKind::Dos.has_rulebase_variants());
    }
}

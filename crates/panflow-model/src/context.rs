use serde::{Deserialize, Serialize};
use std::fmt;

/// Which flavor of device produced (or will consume) the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Firewall,
    Manager,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Firewall => write!(f, "firewall"),
            DeviceKind::Manager => write!(f, "manager"),
        }
    }
}

/// A container sub-tree that can hold objects and/or rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Shared,
    Vsys,
    DeviceGroup,
    Template,
    PreRulebase,
    PostRulebase,
    LocalRulebase,
}

impl ContainerKind {
    /// Containers whose base path needs an identifier placeholder filled in.
    pub fn requires_identifier(self) -> bool {
        matches!(
            self,
            ContainerKind::Vsys | ContainerKind::DeviceGroup | ContainerKind::Template
        )
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerKind::Shared => "shared",
            ContainerKind::Vsys => "vsys",
            ContainerKind::DeviceGroup => "device_group",
            ContainerKind::Template => "template",
            ContainerKind::PreRulebase => "pre_rulebase",
            ContainerKind::PostRulebase => "post_rulebase",
            ContainerKind::LocalRulebase => "local_rulebase",
        };
        write!(f, "{s}")
    }
}

/// `(device_kind, container_kind, identifier?)` — anchors every object and
/// policy lookup. Identifier is present exactly when the container demands
/// one (§3 invariant); that invariant is checked by the Context Router, not
/// enforced structurally here, since validity also depends on the loaded
/// tree (does the device-group actually exist?).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextDescriptor {
    pub device_kind: DeviceKind,
    pub container_kind: ContainerKind,
    pub identifier: Option<String>,
}

impl ContextDescriptor {
    pub fn new(device_kind: DeviceKind, container_kind: ContainerKind) -> Self {
        Self { device_kind, container_kind, identifier: None }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// A stable label used in change records and error messages, e.g.
    /// `manager:device_group:DG1`.
    pub fn label(&self) -> String {
        match &self.identifier {
            Some(id) => format!("{}:{}:{}", self.device_kind, self.container_kind, id),
            None => format!("{}:{}", self.device_kind, self.container_kind),
        }
    }
}

impl fmt::Display for ContextDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

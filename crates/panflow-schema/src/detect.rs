use panflow_model::{DetectionConfig, DeviceKind};
use panflow_tree::Tree;

/// The `version` attribute on the root `<config>` element, if present
/// (§4.1). Absence is not an error here; the caller falls back to the
/// highest known schema version.
pub fn detect_version(tree: &Tree) -> Option<String> {
    let root = tree.root()?;
    tree.attr(root, "version").map(str::to_string)
}

/// Weighted marker scoring between `manager` and `firewall` (§4.1).
/// `device-group` and `panorama` branches are manager markers; a populated
/// `vsys` list is a firewall marker. Manager wins only when its score both
/// clears the confidence threshold and strictly outweighs the firewall
/// score; any tie breaks to firewall.
pub fn detect_device_kind(tree: &Tree, config: &DetectionConfig) -> DeviceKind {
    let has_device_group = !tree.find("/config/devices/entry/device-group/entry").unwrap_or_default().is_empty();
    let has_panorama = !tree.find("/config/panorama").unwrap_or_default().is_empty();
    let has_vsys = !tree.find("/config/devices/entry/vsys/entry").unwrap_or_default().is_empty();

    let mut manager_score = 0.0;
    if has_device_group {
        manager_score += config.device_group_marker_weight;
    }
    if has_panorama {
        manager_score += config.panorama_block_marker_weight;
    }
    let firewall_score = if has_vsys { config.vsys_entries_marker_weight } else { 0.0 };

    if manager_score >= config.confidence_threshold && manager_score > firewall_score {
        DeviceKind::Manager
    } else {
        DeviceKind::Firewall
    }
}

use panflow_model::{ObjectKind, PropertyMap};

/// Value-equivalence normalization per kind (§4.5). Returns `None` for
/// kinds with no defined normalization rule; such objects are only ever
/// name-equivalent.
pub fn normalize(kind: ObjectKind, name: &str, props: &PropertyMap) -> Option<String> {
    match kind {
        ObjectKind::Address => normalize_address(props),
        ObjectKind::Service => normalize_service(props),
        ObjectKind::AddressGroup | ObjectKind::ServiceGroup | ObjectKind::ApplicationGroup => {
            normalize_group(props)
        }
        // "tag: name only" (§4.5) — two tags are value-equivalent exactly
        // when they share a name, not merely because both are tags.
        ObjectKind::Tag => Some(format!("tag:{name}")),
        _ => None,
    }
}

fn normalize_address(props: &PropertyMap) -> Option<String> {
    if let Some(value) = props.get("ip-netmask").and_then(|v| v.as_scalar()) {
        return Some(format!("ip-netmask:{}", value.trim().to_lowercase()));
    }
    if let Some(value) = props.get("ip-range").and_then(|v| v.as_scalar()) {
        let (start, end) = value.split_once('-')?;
        return Some(format!("ip-range:{}-{}", start.trim().to_lowercase(), end.trim().to_lowercase()));
    }
    if let Some(value) = props.get("fqdn").and_then(|v| v.as_scalar()) {
        let lowered = value.trim().to_lowercase();
        let stripped = lowered.strip_suffix('.').unwrap_or(&lowered);
        return Some(format!("fqdn:{stripped}"));
    }
    None
}

/// `(protocol, source-port, destination-port)` tuple per §4.5, ports kept
/// verbatim as strings so ranges (`8080-8090`) normalize without parsing.
fn normalize_service(props: &PropertyMap) -> Option<String> {
    let (protocol, port, source_port) = if let Some(port) = props.get("tcp-port").and_then(|v| v.as_scalar()) {
        ("tcp", port, props.get("tcp-source-port").and_then(|v| v.as_scalar()))
    } else if let Some(port) = props.get("udp-port").and_then(|v| v.as_scalar()) {
        ("udp", port, props.get("udp-source-port").and_then(|v| v.as_scalar()))
    } else {
        return None;
    };
    Some(format!("{protocol}:{}:{port}", source_port.unwrap_or("any")))
}

/// Group subkind distinguishes `static` (member-list) from `dynamic`
/// (tag-filter) groups (§4.5); the two are never value-equivalent to one
/// another even if coincidentally empty.
fn normalize_group(props: &PropertyMap) -> Option<String> {
    if let Some(filter) = props.get("dynamic").and_then(|v| v.as_scalar()) {
        return Some(format!("dynamic:{}", filter.trim()));
    }
    let members = props.get("static").and_then(|v| v.as_list())?;
    let mut sorted: Vec<&str> = members.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    Some(format!("static:{}", sorted.join(",")))
}

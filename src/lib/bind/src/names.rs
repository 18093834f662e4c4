use fdt::{Fdt, NodeIdx, Value};

/// Properties that never appear in a generated struct: they describe the
/// tree itself (address/size cells, compatible, status, phandle) rather
/// than device-specific platform data.
pub const PROP_IGNORE_LIST: &[&str] = &[
    "#address-cells",
    "#gpio-cells",
    "#size-cells",
    "compatible",
    "linux,phandle",
    "status",
    "phandle",
    "bootph-all",
    "bootph-pre-sram",
    "bootph-pre-ram",
];

pub fn is_ignored_prop(name: &str) -> bool {
    PROP_IGNORE_LIST.contains(&name)
}

/// The node's compatible strings as C identifiers, or `["root_driver"]` for
/// the tree root, which always binds to the special root driver.
pub fn compat_list_c(fdt: &Fdt, idx: NodeIdx) -> Vec<String> {
    if idx == fdt.root() {
        return vec!["root_driver".to_string()];
    }
    match fdt.node(idx).prop("compatible").map(|p| p.value()) {
        Some(Value::Str(s)) => vec![scan::conv_name_to_c(s)],
        Some(Value::StrList(list)) => list.iter().map(|s| scan::conv_name_to_c(s)).collect(),
        _ => Vec::new(),
    }
}

/// The node's compatible strings verbatim (no C-identifier normalization),
/// in the same order as `compat_list_c`, for looking up `compat_to_driver`
/// which is keyed by the literal string as it appears in the devicetree.
pub fn compat_list_literal(fdt: &Fdt, idx: NodeIdx) -> Vec<String> {
    if idx == fdt.root() {
        return Vec::new();
    }
    match fdt.node(idx).prop("compatible").map(|p| p.value()) {
        Some(Value::Str(s)) => vec![s.clone()],
        Some(Value::StrList(list)) => list.clone(),
        _ => Vec::new(),
    }
}

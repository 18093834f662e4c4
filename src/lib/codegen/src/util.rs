use fdt::{Fdt, NodeIdx, Type, Value};

pub const STRUCT_PREFIX: &str = "dtd_";
pub const VAL_PREFIX: &str = "dtv_";

/// Pad `line` with tabs out to the given 8-column tab stop, the way
/// generated C declarations line up their trailing comments.
pub fn tab_to(num_tabs: usize, line: &str) -> String {
    let target = num_tabs * 8;
    let mut out = line.to_string();
    if out.len() >= target {
        out.push(' ');
        return out;
    }
    let tabs_needed = num_tabs - out.len() / 8;
    for _ in 0..tabs_needed {
        out.push('\t');
    }
    out
}

/// The C identifier for a bound node's instance variable, derived from its
/// full devicetree path (`/soc/uart@0` -> `soc_uart_at_0`, `/` -> `root`).
pub fn var_name(fdt: &Fdt, idx: NodeIdx) -> String {
    let path = fdt.path(idx);
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return "root".to_string();
    }
    scan::conv_name_to_c(&trimmed.replace('/', "_"))
}

pub fn c_type_for(ty: Type) -> &'static str {
    match ty {
        Type::Byte => "unsigned char",
        Type::Int => "fdt32_t",
        Type::Str => "const char *",
        Type::Bool => "bool",
        Type::Int64 => "fdt64_t",
    }
}

fn escape_c_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a value as the C literal (or brace initializer) used on the
/// right-hand side of a property's assignment in generated platform data.
pub fn value_literal(value: &Value) -> String {
    match value {
        Value::Bool => "true".to_string(),
        Value::Byte(b) => format!("0x{b:x}"),
        Value::ByteList(v) => brace_list(v.iter().map(|b| format!("0x{b:x}"))),
        Value::Int(i) => format!("0x{i:x}"),
        Value::IntList(v) => brace_list(v.iter().map(|i| format!("0x{i:x}"))),
        Value::Int64List(v) => brace_list(v.iter().map(|i| format!("0x{i:x}"))),
        Value::Str(s) => format!("\"{}\"", escape_c_string(s)),
        Value::StrList(v) => brace_list(v.iter().map(|s| format!("\"{}\"", escape_c_string(s)))),
    }
}

fn brace_list(items: impl Iterator<Item = String>) -> String {
    let mut out = String::from("{");
    let mut first = true;
    let mut count_on_line = 0;
    for item in items {
        if !first {
            out.push(',');
            out.push(if count_on_line == 0 { '\n' } else { ' ' });
        }
        if count_on_line == 0 && !first {
            out.push('\t');
        }
        out.push_str(&item);
        first = false;
        count_on_line = (count_on_line + 1) % 8;
    }
    out.push('}');
    out
}

/// The C field-member name for a property: `@,-.` become `_at_`/`_`, same
/// transform as node names.
pub fn field_name(prop_name: &str) -> String {
    scan::conv_name_to_c(prop_name)
}

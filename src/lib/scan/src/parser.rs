//! Line-oriented recognizers for the handful of macros and declarations the
//! scanner cares about. These are deliberately not a general C parser: the
//! source tree is never compiled, only grepped line by line, so each
//! function here recognizes one specific shape of line and returns `None`
//! for anything else.

/// Join backslash-continued lines into single logical lines, the same way
/// the scanner needs `U_BOOT_DRIVER(...)` blocks that are wrapped across
/// multiple physical lines to read as one.
pub fn logical_lines(contents: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();
    for line in contents.lines() {
        if let Some(stripped) = line.strip_suffix('\\') {
            pending.push_str(stripped);
            continue;
        }
        if !pending.is_empty() {
            pending.push_str(line);
            out.push(std::mem::take(&mut pending));
        } else {
            out.push(line.to_string());
        }
    }
    if !pending.is_empty() {
        out.push(pending);
    }
    out
}

fn ident_upper_end(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
        .unwrap_or(s.len())
}

fn ident_lower_end(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
        .unwrap_or(s.len())
}

pub fn parse_driver_decl(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix("U_BOOT_DRIVER(")?;
    let close = rest.find(')')?;
    Some(rest[..close].to_string())
}

pub fn parse_uclass_driver_decl(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix("UCLASS_DRIVER(")?;
    let close = rest.find(')')?;
    Some(rest[..close].to_string())
}

/// `.id = UCLASS_FOO` -> `"UCLASS_FOO"`.
pub fn parse_id(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix(".id")?.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let end = ident_upper_end(rest);
    let tok = &rest[..end];
    tok.starts_with("UCLASS_").then(|| tok.to_string())
}

/// `.member = sizeof(struct foo),` -> `"foo"`.
pub fn parse_auto_member(line: &str, member: &str) -> Option<String> {
    let t = line.trim();
    let prefix = format!(".{member}");
    let rest = t.strip_prefix(&prefix)?.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let rest = rest.strip_prefix("sizeof(struct")?.trim_start();
    let rest = rest.strip_suffix("),")?;
    Some(rest.trim().to_string())
}

/// `struct udevice_id foo_ids[] = {` -> `"foo_ids"`.
pub fn parse_udevice_id_decl(line: &str) -> Option<String> {
    let idx = line.find("struct udevice_id ")?;
    let rest = &line[idx + "struct udevice_id ".len()..];
    let bracket = rest.find("[]")?;
    let name = rest[..bracket].trim();
    let after = rest[bracket + 2..].trim_start();
    (!name.is_empty() && after.starts_with('=')).then(|| name.to_string())
}

/// `{ .compatible = "vendor,thing", .data = FOO },` -> `("vendor,thing", Some("FOO"))`.
pub fn parse_compat_entry(line: &str) -> Option<(String, Option<String>)> {
    let idx = line.find('{')?;
    let rest = line[idx + 1..].trim_start();
    let rest = rest.strip_prefix(".compatible")?.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let end_quote = rest.find('"')?;
    let compat = rest[..end_quote].to_string();
    let after = rest[end_quote + 1..].trim_start();

    let data = after.strip_prefix(',').and_then(|d| {
        let d = d.trim_start().strip_prefix(".data")?.trim_start();
        let d = d.strip_prefix('=')?.trim_start();
        let end = d
            .find(|c: char| c == '}' || c == ',' || c.is_whitespace())
            .unwrap_or(d.len());
        Some(d[..end].to_string())
    });
    Some((compat, data))
}

/// `.of_match = of_match_ptr(foo_ids),` -> `"foo_ids"`.
pub fn parse_of_match(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix(".of_match")?.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let rest = rest.strip_prefix("of_match_ptr(").unwrap_or(rest);
    let end = ident_lower_end(rest);
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_string())
}

pub fn parse_phase(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix("DM_PHASE(")?;
    let close = rest.find(')')?;
    Some(rest[..close].to_string())
}

pub fn parse_header_decl(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix("DM_HEADER(")?;
    let close = rest.find(')')?;
    Some(rest[..close].to_string())
}

/// `DM_DRIVER_ALIAS(alias_name, driver_name)` -> `("alias_name", "driver_name")`.
pub fn parse_alias(line: &str) -> Option<(String, String)> {
    let idx = line.find("DM_DRIVER_ALIAS(")?;
    let rest = &line[idx + "DM_DRIVER_ALIAS(".len()..];
    let close = rest.find(')')?;
    let mut parts = rest[..close].split(',').map(str::trim);
    let alias = parts.next()?.to_string();
    let name = parts.next()?.to_string();
    Some((alias, name))
}

/// `struct foo {` -> `"foo"`, the start of a struct definition.
pub fn parse_struct_decl(line: &str) -> Option<String> {
    let rest = line.strip_prefix("struct ")?.strip_suffix(" {")?;
    let valid = !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    valid.then(|| rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_continuations() {
        let src = "a\\\nb\nc";
        assert_eq!(logical_lines(src), vec!["ab".to_string(), "c".to_string()]);
    }

    #[test]
    fn parses_driver_decl() {
        assert_eq!(
            parse_driver_decl("U_BOOT_DRIVER(my_uart) = {"),
            Some("my_uart".to_string())
        );
    }

    #[test]
    fn parses_compat_with_data() {
        let (compat, data) =
            parse_compat_entry("\t{ .compatible = \"vendor,uart\", .data = VENDOR_UART },").unwrap();
        assert_eq!(compat, "vendor,uart");
        assert_eq!(data.as_deref(), Some("VENDOR_UART"));
    }

    #[test]
    fn parses_compat_without_data() {
        let (compat, data) = parse_compat_entry("{ .compatible = \"vendor,uart\" },").unwrap();
        assert_eq!(compat, "vendor,uart");
        assert_eq!(data, None);
    }

    #[test]
    fn parses_struct_decl() {
        assert_eq!(parse_struct_decl("struct vendor_uart_priv {"), Some("vendor_uart_priv".to_string()));
        assert_eq!(parse_struct_decl("struct Foo {"), None);
    }
}

/// Convert a devicetree name (node name or compatible string) to a valid C
/// identifier: `@` becomes `_at_`, and `-`, `,`, `.` all become `_`. The
/// root node's empty name becomes `root`.
pub fn conv_name_to_c(name: &str) -> String {
    if name == "/" || name.is_empty() {
        return "root".to_string();
    }
    name.replace('@', "_at_")
        .replace(['-', ',', '.'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_punctuation() {
        assert_eq!(conv_name_to_c("vendor,rk3288-grf"), "vendor_rk3288_grf");
        assert_eq!(conv_name_to_c("uart@1000"), "uart_at_1000");
    }

    #[test]
    fn root_is_special_cased() {
        assert_eq!(conv_name_to_c(""), "root");
    }
}

use bind::Binding;
use fdt::Fdt;

use crate::shape::phandle_shape;
use crate::util::{self, STRUCT_PREFIX};

/// Emit the body of `dt-structs-gen.h`: one `struct dtd_<driver> { ... };`
/// per struct family, fields sorted alphabetically by property name.
pub fn generate_structs(fdt: &Fdt, binding: &Binding) -> String {
    let mut out = String::new();
    out.push_str("#include <stdbool.h>\n");
    out.push_str("#include <linux/libfdt.h>\n");

    for (driver, fields) in &binding.struct_fields {
        out.push_str(&format!("struct {STRUCT_PREFIX}{driver} {{\n"));
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();
        for name in names {
            let value = &fields[name];
            let member = util::field_name(name);
            if let Some(shape) = phandle_shape(fdt, binding, driver, name) {
                let struct_name = format!("struct phandle_{}_arg", shape.max_args);
                out.push_str(&format!(
                    "\t{}{}[{}];\n",
                    util::tab_to(2, &struct_name),
                    member,
                    shape.count
                ));
            } else {
                let ptype = util::c_type_for(value.ty());
                out.push_str(&format!("\t{}{}", util::tab_to(2, ptype), member));
                if let Some(len) = value.len() {
                    out.push_str(&format!("[{len}]"));
                }
                out.push_str(";\n");
            }
        }
        out.push_str("};\n");
    }
    out
}

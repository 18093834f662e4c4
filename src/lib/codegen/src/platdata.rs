use std::collections::BTreeMap;

use bind::Binding;
use fdt::{Fdt, NodeIdx};

use crate::util::{self, STRUCT_PREFIX, VAL_PREFIX};

fn phandle_list_literal(links: &[fdt::PhandleLink], bound_index: &BTreeMap<NodeIdx, usize>) -> String {
    let mut out = String::from("{");
    for link in links {
        let idx = bound_index.get(&link.target).copied().unwrap_or(usize::MAX);
        let args: Vec<String> = link.args.iter().map(|a| a.to_string()).collect();
        out.push_str(&format!("\n\t\t{{{}, {{{}}}}},", idx, args.join(", ")));
    }
    out.push('}');
    out
}

pub(crate) fn output_prop(
    fdt: &Fdt,
    binding: &Binding,
    idx: NodeIdx,
    bound_index: &BTreeMap<NodeIdx, usize>,
    prop_name: &str,
    tabs: usize,
) -> Option<String> {
    if bind::is_ignored_prop(prop_name) || prop_name.starts_with('#') {
        return None;
    }
    let node = fdt.node(idx);
    let prop = node.prop(prop_name)?;
    let member = util::field_name(prop_name);
    let label = format!(".{member}");
    let value_str = if let Some(links) = binding.phandle_links.get(&(idx, prop_name.to_string())) {
        phandle_list_literal(links, bound_index)
    } else {
        util::value_literal(prop.value())
    };
    Some(format!("{}{}= {},\n", "\t".repeat(tabs), util::tab_to(3, &label), value_str))
}

pub(crate) fn output_values(fdt: &Fdt, binding: &Binding, idx: NodeIdx, bound_index: &BTreeMap<NodeIdx, usize>) -> String {
    let node = fdt.node(idx);
    let struct_name = node.struct_name().unwrap_or_default();
    let var = util::var_name(fdt, idx);
    let mut out = format!("static struct {STRUCT_PREFIX}{struct_name} {VAL_PREFIX}{var} = {{\n");
    let mut names: Vec<&str> = node.props().iter().map(|p| p.name()).collect();
    names.sort();
    for name in names {
        if let Some(line) = output_prop(fdt, binding, idx, bound_index, name, 1) {
            out.push_str(&line);
        }
    }
    out.push_str("};\n");
    out
}

fn declare_device(fdt: &Fdt, binding: &Binding, idx: NodeIdx, bound_index: &BTreeMap<NodeIdx, usize>) -> String {
    let node = fdt.node(idx);
    let struct_name = node.struct_name().unwrap_or_default();
    let var = util::var_name(fdt, idx);
    let parent_idx = node
        .parent()
        .and_then(|p| bound_index.get(&p))
        .map(|&i| i as isize)
        .unwrap_or(-1);
    format!(
        "U_BOOT_DRVINFO({var}) = {{\n\
         \t.name\t\t= \"{struct_name}\",\n\
         \t.plat\t\t= &{VAL_PREFIX}{var},\n\
         \t.plat_size\t= sizeof({VAL_PREFIX}{var}),\n\
         \t.parent_idx\t= {parent_idx},\n\
         }};\n\n"
    )
}

/// Emit the body of `dt-plat.c`: a static `dtv_<var>` initializer plus a
/// `U_BOOT_DRVINFO()` record for every bound node, in tree-preorder.
pub fn generate_plat(fdt: &Fdt, binding: &Binding) -> String {
    let bound_index: BTreeMap<NodeIdx, usize> =
        binding.bound.iter().enumerate().map(|(i, &idx)| (idx, i)).collect();

    let mut out = String::new();
    out.push_str("/* Allow use of U_BOOT_DRVINFO() in this file */\n");
    out.push_str("#define DT_PLAT_C\n\n");
    out.push_str("#include <dm.h>\n");
    out.push_str("#include <dt-structs.h>\n\n");

    if binding.bound.is_empty() {
        return out;
    }

    out.push_str("/*\n");
    out.push_str(" * driver_info declarations, ordered by 'struct driver_info' linker_list idx:\n");
    out.push_str(" *\n");
    for (i, &idx) in binding.bound.iter().enumerate() {
        let node = fdt.node(idx);
        out.push_str(&format!(
            " * {:3}: {:<20} {}\n",
            i,
            util::var_name(fdt, idx),
            node.struct_name().unwrap_or_default()
        ));
    }
    out.push_str(" */\n\n");

    for &idx in &binding.bound {
        out.push_str(&format!(
            "/*\n * Node {} index {}\n */\n",
            fdt.path(idx),
            bound_index[&idx]
        ));
        out.push_str(&output_values(fdt, binding, idx, &bound_index));
        out.push_str(&declare_device(fdt, binding, idx, &bound_index));
    }
    out
}

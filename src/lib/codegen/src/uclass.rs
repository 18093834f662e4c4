use std::collections::BTreeMap;

use bind::Binding;
use fdt::Fdt;

/// Emit the body of `dt-uclass.c`: a `uclass_head` list threading every
/// bound uclass together, and a `DM_UCLASS_INST()` record per uclass with
/// its device list wired up.
pub fn generate_uclass(fdt: &Fdt, binding: &Binding) -> String {
    let mut out = String::new();
    out.push_str("#include <dm.h>\n");
    out.push_str("#include <dt-structs.h>\n\n");

    let bound_uclasses: Vec<(&String, &bind::UclassBinding)> = binding
        .uclasses
        .iter()
        .filter(|(_, ub)| !ub.devs.is_empty())
        .collect();

    out.push_str("/*\n * uclass declarations, ordered by 'struct uclass' linker_list idx:\n");
    for (seq, (_, ub)) in bound_uclasses.iter().enumerate() {
        let name = ub.uclass.as_ref().map(|u| u.name()).unwrap_or_default();
        out.push_str(&format!(" * {seq:3}: {name}\n"));
    }
    out.push_str(" *\n * Sequence numbers allocated in each uclass:\n");
    for (_, ub) in &bound_uclasses {
        if !ub.alias_num_to_node.is_empty() {
            let name = ub.uclass.as_ref().map(|u| u.name()).unwrap_or_default();
            out.push_str(&format!(" * {name}:\n"));
            for (seq, &node) in &ub.alias_num_to_node {
                out.push_str(&format!(" *    {seq}: {}\n", fdt.path(node)));
            }
        }
    }
    out.push_str(" */\n\n");

    let n = bound_uclasses.len();
    let uclass_sibling = |seq: usize| -> String {
        if n == 0 {
            return "&uclass_head".to_string();
        }
        let name = bound_uclasses[seq].1.uclass.as_ref().map(|u| u.name()).unwrap_or_default();
        format!("&DM_UCLASS_REF({name})->sibling_node")
    };

    let head_prev = if n == 0 { "&uclass_head".to_string() } else { uclass_sibling(n - 1) };
    let head_next = if n == 0 { "&uclass_head".to_string() } else { uclass_sibling(0) };
    out.push_str("struct list_head uclass_head = {\n");
    out.push_str(&format!("\t.prev = {head_prev},\n"));
    out.push_str(&format!("\t.next = {head_next},\n"));
    out.push_str("};\n\n");

    for (seq, (_, ub)) in bound_uclasses.iter().enumerate() {
        let name = ub.uclass.as_ref().map(|u| u.name()).unwrap_or_default();
        let prev = if seq == 0 { "&uclass_head".to_string() } else { uclass_sibling(seq - 1) };
        let next = if seq + 1 == n { "&uclass_head".to_string() } else { uclass_sibling(seq + 1) };

        // dev_head / uclass_node links for this uclass's device list.
        let mut dev_by_seq: BTreeMap<i32, fdt::NodeIdx> = BTreeMap::new();
        for &idx in &ub.devs {
            if let Some(seq) = fdt.node(idx).uclass_seq() {
                dev_by_seq.insert(seq, idx);
            }
        }
        let (dev_prev, dev_next) = if dev_by_seq.is_empty() {
            (
                format!("&DM_UCLASS_REF({name})->dev_head"),
                format!("&DM_UCLASS_REF({name})->dev_head"),
            )
        } else {
            let first = *dev_by_seq.values().next().unwrap();
            let last = *dev_by_seq.values().next_back().unwrap();
            (
                format!("&DM_DEVICE_REF({})->uclass_node", crate::util::var_name(fdt, last)),
                format!("&DM_DEVICE_REF({})->uclass_node", crate::util::var_name(fdt, first)),
            )
        };

        out.push_str(&format!("DM_UCLASS_INST({name}) = {{\n"));
        out.push_str(&format!("\t.uc_drv\t\t= DM_UCLASS_DRIVER_REF({name}),\n"));
        out.push_str("\t.sibling_node\t= {\n");
        out.push_str(&format!("\t\t.prev = {prev},\n"));
        out.push_str(&format!("\t\t.next = {next},\n"));
        out.push_str("\t},\n");
        out.push_str("\t.dev_head\t= {\n");
        out.push_str(&format!("\t\t.prev = {dev_prev},\n"));
        out.push_str(&format!("\t\t.next = {dev_next},\n"));
        out.push_str("\t},\n");
        out.push_str("};\n\n");
    }
    out
}

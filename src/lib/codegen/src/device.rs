use std::collections::BTreeMap;

use bind::Binding;
use fdt::{Fdt, NodeIdx, Value};

use crate::error::{Error, Result};
use crate::platdata::{output_prop, output_values};
use crate::util::{self, VAL_PREFIX};

const PRIV_SECTION: &str = "__attribute__ ((section (\".priv_data\")))";

/// A zero-initialized `u8[sizeof(struct ...)]` buffer in `.priv_data`,
/// declared ahead of the instance it backs and referenced by its bare
/// identifier (arrays decay to a pointer on their own).
fn alloc_priv_buf(binding: &Binding, struct_name: Option<&str>, name: &str, extra: &str, suffix: &str) -> Option<(String, String)> {
    let struct_name = struct_name?;
    let mut decl = String::new();
    match binding.structs.get(struct_name) {
        Some(fname) => decl.push_str(&format!("#include <{fname}>\n")),
        None => log::warn!("cannot find header file for struct {struct_name}"),
    }
    let ident = format!("_{name}{suffix}_{extra}");
    decl.push_str(&format!("u8 {ident}[sizeof(struct {struct_name})]\n\t{PRIV_SECTION};\n"));
    Some((decl, ident))
}

/// A `struct ... .priv_data` buffer pre-initialized with `.dtplat = { ... }`
/// from the node's own widened properties, referenced by address.
fn alloc_plat_buf(
    fdt: &Fdt,
    binding: &Binding,
    idx: NodeIdx,
    bound_index: &BTreeMap<NodeIdx, usize>,
    struct_name: Option<&str>,
    name: &str,
    extra: &str,
) -> Option<(String, String)> {
    let struct_name = struct_name?;
    let mut decl = String::new();
    match binding.structs.get(struct_name) {
        Some(fname) => decl.push_str(&format!("#include <{fname}>\n")),
        None => log::warn!("cannot find header file for struct {struct_name}"),
    }
    let ident = format!("_{name}_plat_{extra}");
    decl.push_str(&format!("struct {struct_name} {PRIV_SECTION}\n\t{ident} = {{\n\t.dtplat = {{\n"));
    let mut names: Vec<&str> = fdt.node(idx).props().iter().map(|p| p.name()).collect();
    names.sort();
    for pname in names {
        if let Some(line) = output_prop(fdt, binding, idx, bound_index, pname, 2) {
            decl.push_str(&line);
        }
    }
    decl.push_str("\t},\n};\n");
    Some((decl, format!("&{ident}")))
}

/// Precomputed doubly-linked-list neighbor references, keyed by sequence
/// number within a list (uclass device list, or a node's child list);
/// `-1` and `len` are the head/tail sentinels pointing back at the head.
struct RefList {
    refs: BTreeMap<i32, String>,
    head_member: String,
}

impl RefList {
    fn prev_next(&self, seq: i32) -> (&str, &str) {
        let prev = self.refs.get(&(seq - 1)).map(String::as_str).unwrap_or(&self.head_member);
        let next = self.refs.get(&(seq + 1)).map(String::as_str).unwrap_or(&self.head_member);
        (prev, next)
    }
}

fn driver_data_for(fdt: &Fdt, idx: NodeIdx) -> Option<String> {
    let node = fdt.node(idx);
    if idx == fdt.root() {
        return None;
    }
    let driver = node.driver()?;
    let compats: Vec<String> = match node.prop("compatible").map(|p| p.value()) {
        Some(Value::Str(s)) => vec![s.clone()],
        Some(Value::StrList(v)) => v.clone(),
        _ => Vec::new(),
    };
    compats.iter().find_map(|c| {
        driver
            .compat()
            .get(c)
            .filter(|d| !d.is_empty())
            .cloned()
    })
}

/// Emit the body of `dt-device.c`: a `DM_DEVICE_INST()` record per bound
/// node, wired into its uclass's device list and its parent's child list.
pub fn generate_device(fdt: &Fdt, binding: &Binding) -> Result<String> {
    let mut out = String::new();
    out.push_str("#include <dm.h>\n");
    out.push_str("#include <dt-structs.h>\n\n");

    if binding.bound.is_empty() {
        return Ok(out);
    }

    let bound_index: BTreeMap<NodeIdx, usize> =
        binding.bound.iter().enumerate().map(|(i, &idx)| (idx, i)).collect();
    let var = |idx: NodeIdx| util::var_name(fdt, idx);
    let dev_ref = |idx: NodeIdx| format!("DM_DEVICE_REF({})", var(idx));

    // child_refs[seq] -> "&DM_DEVICE_REF(child)->sibling_node" per parent,
    // uclass_refs[seq] -> "&DM_DEVICE_REF(dev)->uclass_node" per uclass.
    let mut child_refs: BTreeMap<NodeIdx, BTreeMap<i32, String>> = BTreeMap::new();
    let mut uclass_refs: BTreeMap<String, BTreeMap<i32, String>> = BTreeMap::new();
    let mut child_count: BTreeMap<NodeIdx, i32> = BTreeMap::new();

    for &idx in &binding.bound {
        let node = fdt.node(idx);
        if let (Some(parent), Some(seq)) = (node.parent(), node.parent_seq()) {
            if binding.bound.contains(&parent) {
                child_refs
                    .entry(parent)
                    .or_default()
                    .insert(seq, format!("&{}->sibling_node", dev_ref(idx)));
                *child_count.entry(parent).or_insert(0) += 1;
            }
        }
        if let (Some(uclass_id), Some(seq)) = (node.uclass_id(), node.uclass_seq()) {
            uclass_refs
                .entry(uclass_id.as_str().to_string())
                .or_default()
                .insert(seq, format!("&{}->uclass_node", dev_ref(idx)));
        }
    }

    out.push_str("/*\n * udevice declarations, ordered by 'struct udevice' linker_list position:\n */\n\n");

    for &idx in &binding.bound {
        let node = fdt.node(idx);
        let struct_name = node.struct_name().unwrap_or_default();
        let parent_name = node
            .parent()
            .filter(|p| binding.bound.contains(p))
            .and_then(|p| fdt.node(p).driver())
            .map(|d| d.name().to_string());

        out.push_str(&format!(
            "/*\n * Node {} index {}\n * driver {} parent {}\n */\n",
            fdt.path(idx),
            bound_index[&idx],
            struct_name,
            parent_name.as_deref().unwrap_or("None"),
        ));

        out.push_str(&output_values(fdt, binding, idx, &bound_index));

        let driver = node.driver();
        let uclass = node
            .uclass_id()
            .and_then(|id| binding.uclasses.get(id.as_str()))
            .and_then(|ub| ub.uclass.as_ref());
        let parent_driver = node
            .parent()
            .filter(|p| binding.bound.contains(p))
            .and_then(|p| fdt.node(p).driver());
        let node_var = var(idx);

        let mut preamble = String::new();
        let plat = driver.and_then(|d| alloc_plat_buf(fdt, binding, idx, &bound_index, d.plat_auto(), struct_name, &node_var));
        let priv_ = driver.and_then(|d| alloc_priv_buf(binding, d.priv_auto(), struct_name, &node_var, "_priv"));
        let parent_plat = parent_driver.and_then(|d| alloc_priv_buf(binding, d.per_child_plat_auto(), struct_name, &node_var, "_parent_plat"));
        let parent_priv = parent_driver.and_then(|d| alloc_priv_buf(binding, d.per_child_auto(), struct_name, &node_var, "_parent_priv"));
        let uc_name = format!("{struct_name}_uc");
        let uclass_plat = uclass.and_then(|u| alloc_priv_buf(binding, u.per_device_plat_auto(), &uc_name, &node_var, "plat"));
        let uclass_priv = uclass.and_then(|u| alloc_priv_buf(binding, u.per_device_auto(), &uc_name, &node_var, "_priv"));
        for (decl, _) in [&plat, &priv_, &parent_plat, &parent_priv, &uclass_plat, &uclass_priv].into_iter().flatten() {
            preamble.push_str(decl);
        }
        if let Some(d) = driver {
            for hdr in d.headers() {
                preamble.push_str(&format!("#include {hdr}\n"));
            }
        }
        if !preamble.is_empty() {
            out.push_str(&preamble);
            out.push('\n');
        }

        out.push_str(&format!("DM_DEVICE_INST({node_var}) = {{\n"));
        out.push_str(&format!("\t.driver\t\t= DM_DRIVER_REF({struct_name}),\n"));
        out.push_str(&format!("\t.name\t\t= \"{struct_name}\",\n"));
        match &plat {
            Some((_, ident)) => out.push_str(&format!("\t.plat_\t\t= {ident},\n")),
            None => out.push_str(&format!("\t.plat_\t\t= &{VAL_PREFIX}{node_var},\n")),
        }
        if let Some((_, ident)) = &parent_plat {
            out.push_str(&format!("\t.parent_plat_\t= {ident},\n"));
        }
        if let Some((_, ident)) = &uclass_plat {
            out.push_str(&format!("\t.uclass_plat_\t= {ident},\n"));
        }

        if let Some(data) = driver_data_for(fdt, idx) {
            out.push_str(&format!("\t.driver_data\t= {data},\n"));
        }

        // A device whose parent is the tree root needs no explicit `.parent`
        // back-reference; one whose parent is itself a real device must have
        // that parent among the bound nodes.
        if let Some(parent) = node.parent() {
            if parent != fdt.root() {
                if !binding.bound.contains(&parent) {
                    return Err(Error::ParentMissing(fdt.path(idx), fdt.path(parent)));
                }
                out.push_str(&format!("\t.parent\t\t= DM_DEVICE_REF({}),\n", var(parent)));
            }
        }

        if let Some((_, ident)) = &priv_ {
            out.push_str(&format!("\t.priv_\t\t= {ident},\n"));
        }

        if let Some(uclass_id) = node.uclass_id() {
            if let Some(ub) = binding.uclasses.get(uclass_id.as_str()) {
                if let Some(uclass) = &ub.uclass {
                    out.push_str(&format!("\t.uclass\t\t= DM_UCLASS_REF({}),\n", uclass.name()));
                }
            }
        }

        if let Some((_, ident)) = &uclass_priv {
            out.push_str(&format!("\t.uclass_priv_\t= {ident},\n"));
        }
        if let Some((_, ident)) = &parent_priv {
            out.push_str(&format!("\t.parent_priv_\t= {ident},\n"));
        }

        // uclass_node links.
        if let (Some(uclass_id), Some(seq)) = (node.uclass_id(), node.uclass_seq()) {
            let empty = BTreeMap::new();
            let refs = uclass_refs.get(uclass_id.as_str()).unwrap_or(&empty);
            let list = RefList {
                refs: refs.clone(),
                head_member: format!("&DM_UCLASS_REF({})->dev_head", uclass_name(binding, uclass_id.as_str())),
            };
            let (prev, next) = list.prev_next(seq);
            out.push_str("\t.uclass_node\t= {\n");
            out.push_str(&format!("\t\t.prev = {prev},\n"));
            out.push_str(&format!("\t\t.next = {next},\n"));
            out.push_str("\t},\n");
        }

        // child_head / sibling_node links.
        let empty = BTreeMap::new();
        let children = child_refs.get(&idx).unwrap_or(&empty);
        let n = *child_count.get(&idx).unwrap_or(&0);
        let head_self = format!("&{}->child_head", dev_ref(idx));
        if n == 0 {
            out.push_str("\t.child_head\t= {\n");
            out.push_str(&format!("\t\t.prev = {head_self},\n"));
            out.push_str(&format!("\t\t.next = {head_self},\n"));
            out.push_str("\t},\n");
        } else {
            let first = children.get(&0).cloned().unwrap_or_default();
            let last = children.get(&(n - 1)).cloned().unwrap_or_default();
            out.push_str("\t.child_head\t= {\n");
            out.push_str(&format!("\t\t.prev = {last},\n"));
            out.push_str(&format!("\t\t.next = {first},\n"));
            out.push_str("\t},\n");
        }

        if let (Some(parent), Some(seq)) = (node.parent(), node.parent_seq()) {
            if binding.bound.contains(&parent) {
                let empty = BTreeMap::new();
                let refs = child_refs.get(&parent).unwrap_or(&empty);
                let head = format!("&{}->child_head", dev_ref(parent));
                let list = RefList {
                    refs: refs.clone(),
                    head_member: head,
                };
                let (prev, next) = list.prev_next(seq);
                out.push_str("\t.sibling_node\t= {\n");
                out.push_str(&format!("\t\t.prev = {prev},\n"));
                out.push_str(&format!("\t\t.next = {next},\n"));
                out.push_str("\t},\n");
            }
        }

        out.push_str(&format!("\t.seq_\t\t= {},\n", node.uclass_seq().unwrap_or(0)));
        out.push_str("};\n\n");
    }

    Ok(out)
}

fn uclass_name(binding: &Binding, id: &str) -> String {
    binding
        .uclasses
        .get(id)
        .and_then(|ub| ub.uclass.as_ref())
        .map(|u| u.name().to_string())
        .unwrap_or_default()
}

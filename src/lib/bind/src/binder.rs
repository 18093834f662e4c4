use std::collections::{BTreeMap, BTreeSet};

use device::Uclass;
use fdt::{Fdt, NodeIdx, PhandleLink, Value};
use scan::ScanResult;

use crate::error::Result;
use crate::names;

/// Tracking for one uclass's sequence-number assignment: which alias
/// numbers are already taken (`alias_num_to_node`), and a reverse lookup by
/// node path so repeated binds are idempotent.
#[derive(Debug, Default)]
pub struct UclassBinding {
    pub uclass: Option<Uclass>,
    pub alias_num_to_node: BTreeMap<i32, NodeIdx>,
    pub alias_path_to_num: BTreeMap<String, i32>,
    pub devs: Vec<NodeIdx>,
}

impl UclassBinding {
    /// Assign (or look up) the sequence number for `node_path`: an
    /// existing alias wins, otherwise the smallest number not already
    /// taken, starting just after the highest alias seen so far.
    fn assign_seq(&mut self, node_path: &str) -> i32 {
        if let Some(&num) = self.alias_path_to_num.get(node_path) {
            return num;
        }
        let mut seq = self
            .alias_num_to_node
            .keys()
            .next_back()
            .map(|&n| n + 1)
            .unwrap_or(0);
        while self.alias_num_to_node.contains_key(&seq) {
            seq += 1;
        }
        self.alias_path_to_num.insert(node_path.to_string(), seq);
        seq
    }
}

/// The result of joining a scanned driver-model with a devicetree: which
/// nodes got a driver, the widened struct layout per driver, and sequence
/// numbers per uclass.
#[derive(Debug, Default)]
pub struct Binding {
    /// Nodes bound to a driver, in tree preorder (the order generated
    /// output lists them in).
    pub bound: Vec<NodeIdx>,
    /// driver name -> property name -> widened value (a template: only the
    /// type and length matter, not its contents).
    pub struct_fields: BTreeMap<String, BTreeMap<String, Value>>,
    /// driver name -> property names in first-seen order, since struct
    /// members are emitted in discovery order rather than alphabetically.
    pub struct_field_order: BTreeMap<String, Vec<String>>,
    pub uclasses: BTreeMap<String, UclassBinding>,
    /// (node, property name) -> decoded phandle targets and args, for
    /// every phandle-bearing property on a bound node.
    pub phandle_links: BTreeMap<(NodeIdx, String), Vec<PhandleLink>>,
    pub missing_drivers: BTreeSet<String>,
    /// struct name -> header file it was scanned from, so code generation
    /// can `#include` the right header for an auto-allocated priv/plat
    /// storage buffer.
    pub structs: BTreeMap<String, String>,
}

/// Bind every (enabled, unless `include_disabled`) node in `fdt` to its
/// driver and uclass, widen each driver's struct fields across all of its
/// instances, assign uclass sequence numbers, and decode phandle-list
/// properties.
pub fn bind_tree(fdt: &mut Fdt, scan: &mut ScanResult, include_disabled: bool) -> Result<Binding> {
    fdt.promote_reg()?;

    let mut binding = Binding::default();
    for (name, cstruct) in &scan.structs {
        binding.structs.insert(name.clone(), cstruct.fname().to_string());
    }
    for (id, uclass) in &scan.uclasses {
        binding.uclasses.insert(
            id.clone(),
            UclassBinding {
                uclass: Some(uclass.clone()),
                ..Default::default()
            },
        );
    }

    read_aliases(fdt, &mut binding);

    let mut child_counts: BTreeMap<NodeIdx, i32> = BTreeMap::new();

    for idx in fdt.walk_preorder() {
        if idx != fdt.root() && !include_disabled && !fdt.node(idx).is_enabled() {
            continue;
        }

        let compats = names::compat_list_c(fdt, idx);
        if compats.is_empty() {
            continue;
        }
        let compats_literal = names::compat_list_literal(fdt, idx);

        // Each compatible string's winning driver (alphabetically smallest
        // name, when more than one `of_match` table claims it) takes
        // priority over the fall-back name-equality/alias resolution below.
        let driver_name = compats_literal
            .iter()
            .find_map(|c| {
                scan.compat_to_driver
                    .get(c)
                    .filter(|name| scan.drivers.contains_key(name.as_str()))
                    .cloned()
            })
            .or_else(|| {
                compats.iter().find_map(|c| {
                    if scan.drivers.contains_key(c) {
                        Some(c.clone())
                    } else {
                        scan.driver_aliases
                            .get(c)
                            .filter(|real| scan.drivers.contains_key(real.as_str()))
                            .cloned()
                    }
                })
            });
        let driver_name = match driver_name {
            Some(n) => n,
            None => {
                binding.missing_drivers.insert(compats[0].clone());
                continue;
            }
        };

        scan.drivers.get_mut(&driver_name).expect("resolved above").mark_used();
        let driver = scan.drivers[&driver_name].clone();
        fdt.node_mut(idx).set_struct_name(driver_name.clone());
        if let Some(uclass_id) = driver.uclass_id().cloned() {
            fdt.node_mut(idx).set_uclass_id(uclass_id.clone());
            if let Some(ub) = binding.uclasses.get_mut(uclass_id.as_str()) {
                let path = fdt.path(idx);
                let seq = ub.assign_seq(&path);
                ub.alias_num_to_node.insert(seq, idx);
                ub.devs.push(idx);
                fdt.node_mut(idx).set_uclass_seq(seq);
            }
        }
        if let Some(parent) = fdt.node(idx).parent() {
            let count = child_counts.entry(parent).or_insert(0);
            fdt.node_mut(idx).set_parent_seq(*count);
            *count += 1;
        }
        fdt.node_mut(idx).set_driver(driver);
        binding.bound.push(idx);

        let fields = binding.struct_fields.entry(driver_name.clone()).or_default();
        let order = binding.struct_field_order.entry(driver_name.clone()).or_default();
        let prop_names: Vec<String> = fdt
            .node(idx)
            .props()
            .iter()
            .map(|p| p.name().to_string())
            .filter(|n| !names::is_ignored_prop(n))
            .collect();
        for name in prop_names {
            let value = fdt.node(idx).prop(&name).unwrap().value().clone();
            match fields.get_mut(&name) {
                Some(existing) => fdt::value::widen(existing, &value),
                None => {
                    fields.insert(name.clone(), value);
                    order.push(name.clone());
                }
            }
            if fdt::cells_prop_for(&name).is_some() {
                let links = fdt.decode_phandle_list(idx, &name)?;
                binding.phandle_links.insert((idx, name), links);
            }
        }
    }

    // Now that every instance of each driver has been seen, struct_fields
    // holds each field's final widest shape; widen every bound node's own
    // property value up to that shape too, so e.g. a lone `x = <1>` next to
    // a sibling's `x = <1 2>` is emitted as `{1, 0}` rather than bare `1`.
    for &idx in &binding.bound {
        let driver_name = match fdt.node(idx).struct_name() {
            Some(n) => n.to_string(),
            None => continue,
        };
        let Some(fields) = binding.struct_fields.get(&driver_name) else {
            continue;
        };
        let targets: Vec<(String, Value)> = fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        for (name, target) in targets {
            if let Some(prop) = fdt.node_mut(idx).prop_mut(&name) {
                prop.widen(&target);
            }
        }
    }

    Ok(binding)
}

/// Resolve `/aliases` entries (e.g. `serial0 = "/soc/serial@0"`) into
/// sequence-number reservations on the matching uclass, so later dynamic
/// assignment skips numbers an alias already claimed.
fn read_aliases(fdt: &Fdt, binding: &mut Binding) {
    let aliases = match fdt.find_node_by_path("/aliases") {
        Some(i) => i,
        None => return,
    };
    for prop in fdt.node(aliases).props() {
        let name = prop.name();
        let split = match name.find(|c: char| c.is_ascii_digit()) {
            Some(p) => p,
            None => continue,
        };
        let (base, num_str) = name.split_at(split);
        let num: i32 = match num_str.parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let path = match prop.value() {
            Value::Str(s) => s.clone(),
            _ => continue,
        };
        let target = match fdt.find_node_by_path(&path) {
            Some(t) => t,
            None => continue,
        };
        for ub in binding.uclasses.values_mut() {
            if ub.uclass.as_ref().map(|u| u.name()) == Some(base) {
                ub.alias_num_to_node.insert(num, target);
                ub.alias_path_to_num.insert(fdt.path(target), num);
            }
        }
    }
}

use std::collections::BTreeMap;

use bind::bind_tree;
use device::{ClassId, Driver, Uclass};
use fdt::{Fdt, Prop, Value};
use scan::ScanResult;

fn sample_tree() -> Fdt {
    let mut fdt = Fdt::empty();
    let root = fdt.root();

    let uart0 = fdt.add_subnode(root, "uart@0");
    fdt.node_mut(uart0).add_prop(Prop::new("compatible", Value::Str("vendor,uart".into())));
    fdt.node_mut(uart0).add_prop(Prop::new("reg", Value::Int(0)));

    let uart1 = fdt.add_subnode(root, "uart@1");
    fdt.node_mut(uart1).add_prop(Prop::new("compatible", Value::Str("vendor,uart".into())));
    fdt.node_mut(uart1).add_prop(Prop::new("reg", Value::IntList(vec![1, 2])));
    fdt.node_mut(uart1).add_prop(Prop::new("status", Value::Str("disabled".into())));

    fdt
}

fn sample_scan() -> ScanResult {
    let mut drivers = BTreeMap::new();
    let mut driver = Driver::new("vendor_uart", "uart.c");
    driver.set_uclass_id(ClassId::new("UCLASS_SERIAL"));
    driver.compat_mut().insert("vendor,uart".to_string(), String::new());
    drivers.insert("vendor_uart".to_string(), driver);

    let mut uclasses = BTreeMap::new();
    let mut uclass = Uclass::new("serial");
    uclass.set_id(ClassId::new("UCLASS_SERIAL"));
    uclasses.insert("UCLASS_SERIAL".to_string(), uclass);

    ScanResult {
        drivers,
        uclasses,
        ..Default::default()
    }
}

#[test]
fn binds_enabled_nodes_and_widens_fields() {
    let mut fdt = sample_tree();
    let mut scan = sample_scan();
    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();

    // uart@1 is disabled and include_disabled is false, so only uart@0 binds.
    assert_eq!(binding.bound.len(), 1);
    let uart0 = fdt.find_node_by_path("/uart@0").unwrap();
    assert_eq!(fdt.node(uart0).struct_name(), Some("vendor_uart"));
    assert_eq!(fdt.node(uart0).uclass_seq(), Some(0));

    let fields = &binding.struct_fields["vendor_uart"];
    assert!(matches!(fields["reg"], Value::Int(_)));
}

#[test]
fn binds_disabled_when_included() {
    let mut fdt = sample_tree();
    let mut scan = sample_scan();
    let binding = bind_tree(&mut fdt, &mut scan, true).unwrap();

    assert_eq!(binding.bound.len(), 2);
    let fields = &binding.struct_fields["vendor_uart"];
    // reg seen as both a single cell and a two-cell list widens to a list.
    assert!(matches!(fields["reg"], Value::IntList(ref v) if v.len() == 2));

    let uart0 = fdt.find_node_by_path("/uart@0").unwrap();
    let uart1 = fdt.find_node_by_path("/uart@1").unwrap();
    assert_ne!(fdt.node(uart0).uclass_seq(), fdt.node(uart1).uclass_seq());
}

#[test]
fn marks_driver_used_when_bound() {
    let mut fdt = sample_tree();
    let mut scan = sample_scan();
    bind_tree(&mut fdt, &mut scan, false).unwrap();
    assert!(scan.drivers["vendor_uart"].used());
}

/// A parent bound to a driver with two bound children must assign each
/// child its own 0-based ordinal among its parent's children (`parent_seq`),
/// not the parent's own `uclass_seq` -- a bug that corrupts the
/// `child_head`/`sibling_node` linked lists once a parent has more than one
/// bound child.
#[test]
fn parent_seq_is_per_child_ordinal_not_parent_uclass_seq() {
    let mut fdt = Fdt::empty();
    let root = fdt.root();

    let bus = fdt.add_subnode(root, "bus@0");
    fdt.node_mut(bus).add_prop(Prop::new("compatible", Value::Str("vendor,bus".into())));

    let child0 = fdt.add_subnode(bus, "uart@0");
    fdt.node_mut(child0).add_prop(Prop::new("compatible", Value::Str("vendor,uart".into())));
    let child1 = fdt.add_subnode(bus, "uart@1");
    fdt.node_mut(child1).add_prop(Prop::new("compatible", Value::Str("vendor,uart".into())));

    let mut scan = sample_scan();
    let mut bus_driver = Driver::new("vendor_bus", "bus.c");
    bus_driver.set_uclass_id(ClassId::new("UCLASS_SIMPLE_BUS"));
    bus_driver.compat_mut().insert("vendor,bus".to_string(), String::new());
    scan.drivers.insert("vendor_bus".to_string(), bus_driver);
    let mut bus_uclass = Uclass::new("simple_bus");
    bus_uclass.set_id(ClassId::new("UCLASS_SIMPLE_BUS"));
    scan.uclasses.insert("UCLASS_SIMPLE_BUS".to_string(), bus_uclass);

    bind_tree(&mut fdt, &mut scan, false).unwrap();

    let bus_idx = fdt.find_node_by_path("/bus@0").unwrap();
    let c0 = fdt.find_node_by_path("/bus@0/uart@0").unwrap();
    let c1 = fdt.find_node_by_path("/bus@0/uart@1").unwrap();

    // The bus itself has no parent, so its own uclass_seq is 0 -- if
    // parent_seq were wrongly copied from the parent's uclass_seq, both
    // children would end up with parent_seq 0 too.
    assert_eq!(fdt.node(bus_idx).uclass_seq(), Some(0));
    assert_eq!(fdt.node(c0).parent_seq(), Some(0));
    assert_eq!(fdt.node(c1).parent_seq(), Some(1));
}

/// An alias reserves its number up front; a node with no alias is assigned
/// dynamically, but never backfills a gap below the highest alias number
/// already claimed in that uclass -- it always starts one past it.
#[test]
fn alias_reserves_seq_and_unaliased_node_gets_next_free_above_it() {
    let mut fdt = Fdt::empty();
    let root = fdt.root();

    let a = fdt.add_subnode(root, "serial@0");
    fdt.node_mut(a).add_prop(Prop::new("compatible", Value::Str("vendor,uart".into())));
    let b = fdt.add_subnode(root, "serial@1");
    fdt.node_mut(b).add_prop(Prop::new("compatible", Value::Str("vendor,uart".into())));

    let aliases = fdt.add_subnode(root, "aliases");
    fdt.node_mut(aliases).add_prop(Prop::new("serial2", Value::Str("/serial@1".into())));

    let mut scan = sample_scan();

    bind_tree(&mut fdt, &mut scan, false).unwrap();

    let a_idx = fdt.find_node_by_path("/serial@0").unwrap();
    let b_idx = fdt.find_node_by_path("/serial@1").unwrap();
    assert_eq!(fdt.node(b_idx).uclass_seq(), Some(2));
    assert_eq!(fdt.node(a_idx).uclass_seq(), Some(3));
}

use std::collections::BTreeMap;

use bind::bind_tree;
use codegen::{generate, parse_commands, Command};
use device::{ClassId, Driver, Uclass};
use fdt::{Fdt, Prop, Value};
use scan::ScanResult;

fn sample_tree() -> Fdt {
    let mut fdt = Fdt::empty();
    let root = fdt.root();

    let uart0 = fdt.add_subnode(root, "uart@0");
    fdt.node_mut(uart0).add_prop(Prop::new("compatible", Value::Str("vendor,uart".into())));
    fdt.node_mut(uart0).add_prop(Prop::new("reg", Value::Int(0)));
    fdt.node_mut(uart0).add_prop(Prop::new("clock-frequency", Value::Int(48_000_000)));

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
fn parse_commands_rejects_unknown_names() {
    let err = parse_commands("decl,bogus", false).unwrap_err();
    assert!(matches!(err, codegen::Error::UnknownCommand(name) if name == "bogus"));
}

#[test]
fn parse_commands_expands_all_by_mode() {
    let noninst = parse_commands("all", false).unwrap();
    assert_eq!(noninst, vec![Command::Decl, Command::Struct, Command::Platdata]);

    let inst = parse_commands("all", true).unwrap();
    assert_eq!(inst, vec![Command::Decl, Command::Struct, Command::Device, Command::Uclass]);
}

#[test]
fn parse_commands_rejects_wrong_mode_command() {
    assert!(parse_commands("device", false).is_err());
    assert!(parse_commands("platdata", true).is_err());
}

#[test]
fn generates_struct_header_with_widened_fields() {
    let mut fdt = sample_tree();
    let mut scan = sample_scan();
    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();

    let out = generate(&fdt, &binding, Command::Struct, false).unwrap();
    assert!(out.contains("struct dtd_vendor_uart {"));
    assert!(out.contains("clock_frequency"));
    assert!(out.contains("fdt32_t"));
}

#[test]
fn generates_platdata_with_driver_info() {
    let mut fdt = sample_tree();
    let mut scan = sample_scan();
    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();

    let out = generate(&fdt, &binding, Command::Platdata, false).unwrap();
    assert!(out.contains("static struct dtd_vendor_uart dtv_uart_at_0"));
    assert!(out.contains("U_BOOT_DRVINFO(uart_at_0)"));
    assert!(out.contains(".parent_idx\t= -1"));
}

#[test]
fn generates_decl_header_with_extern_driver() {
    let mut fdt = sample_tree();
    let mut scan = sample_scan();
    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();

    let out = generate(&fdt, &binding, Command::Decl, false).unwrap();
    assert!(out.contains("extern U_BOOT_DRIVER(vendor_uart);"));
    assert!(out.contains("extern UCLASS_DRIVER(serial);"));
}

#[test]
fn generates_device_and_uclass_for_instantiated_mode() {
    let mut fdt = sample_tree();
    let mut scan = sample_scan();
    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();

    let device_out = generate(&fdt, &binding, Command::Device, true).unwrap();
    assert!(device_out.contains("DM_DEVICE_INST(uart_at_0)"));
    assert!(device_out.contains(".uclass_node\t= {"));
    assert!(!device_out.contains(".parent\t\t="));

    let uclass_out = generate(&fdt, &binding, Command::Uclass, true).unwrap();
    assert!(uclass_out.contains("DM_UCLASS_INST(serial)"));
    assert!(uclass_out.contains("struct list_head uclass_head"));
}

fn gpio_and_consumer_tree() -> Fdt {
    use fdt::blob::{serialize, RawNode};

    let mut foo_gpios = Vec::new();
    for cell in [1u32, 1, 2, 2, 3, 4] {
        foo_gpios.extend_from_slice(&cell.to_be_bytes());
    }
    let root = RawNode {
        name: String::new(),
        props: vec![],
        children: vec![
            RawNode {
                name: "gpio@0".into(),
                props: vec![
                    ("compatible".into(), b"vendor,gpio\0".to_vec()),
                    ("#gpio-cells".into(), 2u32.to_be_bytes().to_vec()),
                    ("phandle".into(), 1u32.to_be_bytes().to_vec()),
                ],
                children: vec![],
            },
            RawNode {
                name: "gpio@1".into(),
                props: vec![
                    ("compatible".into(), b"vendor,gpio\0".to_vec()),
                    ("#gpio-cells".into(), 2u32.to_be_bytes().to_vec()),
                    ("phandle".into(), 2u32.to_be_bytes().to_vec()),
                ],
                children: vec![],
            },
            RawNode {
                name: "consumer@0".into(),
                props: vec![
                    ("compatible".into(), b"vendor,consumer\0".to_vec()),
                    ("foo-gpios".into(), foo_gpios),
                ],
                children: vec![],
            },
        ],
    };
    Fdt::from_bytes(&serialize(&root).0).unwrap()
}

fn gpio_scan() -> ScanResult {
    let mut drivers = BTreeMap::new();
    let mut gpio_driver = Driver::new("vendor_gpio", "gpio.c");
    gpio_driver.set_uclass_id(ClassId::new("UCLASS_GPIO"));
    gpio_driver.compat_mut().insert("vendor,gpio".to_string(), String::new());
    drivers.insert("vendor_gpio".to_string(), gpio_driver);

    let mut consumer_driver = Driver::new("vendor_consumer", "consumer.c");
    consumer_driver.set_uclass_id(ClassId::new("UCLASS_MISC"));
    consumer_driver.compat_mut().insert("vendor,consumer".to_string(), String::new());
    drivers.insert("vendor_consumer".to_string(), consumer_driver);

    let mut uclasses = BTreeMap::new();
    let mut gpio_uc = Uclass::new("gpio");
    gpio_uc.set_id(ClassId::new("UCLASS_GPIO"));
    uclasses.insert("UCLASS_GPIO".to_string(), gpio_uc);
    let mut misc_uc = Uclass::new("misc");
    misc_uc.set_id(ClassId::new("UCLASS_MISC"));
    uclasses.insert("UCLASS_MISC".to_string(), misc_uc);

    ScanResult {
        drivers,
        uclasses,
        ..Default::default()
    }
}

/// S2: a phandle-bearing property widens to `struct phandle_N_arg name[count]`
/// and each entry's bound-node index plus its argument cells round-trip.
#[test]
fn phandle_list_widens_to_phandle_arg_array() {
    let mut fdt = gpio_and_consumer_tree();
    let mut scan = gpio_scan();
    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();

    let structs = generate(&fdt, &binding, Command::Struct, false).unwrap();
    assert!(structs.contains("struct dtd_vendor_consumer {"));
    assert!(structs.contains("struct phandle_2_arg foo_gpios[2];"));

    let plat = generate(&fdt, &binding, Command::Platdata, false).unwrap();
    assert!(plat.contains("{0, {1, 2}},"));
    assert!(plat.contains("{1, {3, 4}},"));
}

/// S3: two same-compatible nodes, one `x = <1>` and one `x = <1 2>`, widen
/// the struct field to `fdt32_t x[2]` and the narrower node's own
/// initializer to the zero-padded `{0x1, 0x0}`, not bare `0x1`.
#[test]
fn narrow_sibling_initializer_is_zero_padded_to_widened_length() {
    let mut fdt = Fdt::empty();
    let root = fdt.root();

    let a = fdt.add_subnode(root, "thing@0");
    fdt.node_mut(a).add_prop(Prop::new("compatible", Value::Str("vendor,thing".into())));
    fdt.node_mut(a).add_prop(Prop::new("x", Value::Int(1)));

    let b = fdt.add_subnode(root, "thing@1");
    fdt.node_mut(b).add_prop(Prop::new("compatible", Value::Str("vendor,thing".into())));
    fdt.node_mut(b).add_prop(Prop::new("x", Value::IntList(vec![1, 2])));

    let mut drivers = BTreeMap::new();
    let mut driver = Driver::new("vendor_thing", "thing.c");
    driver.set_uclass_id(ClassId::new("UCLASS_MISC"));
    driver.compat_mut().insert("vendor,thing".to_string(), String::new());
    drivers.insert("vendor_thing".to_string(), driver);
    let mut uclasses = BTreeMap::new();
    let mut uclass = Uclass::new("misc");
    uclass.set_id(ClassId::new("UCLASS_MISC"));
    uclasses.insert("UCLASS_MISC".to_string(), uclass);
    let mut scan = ScanResult { drivers, uclasses, ..Default::default() };

    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();

    let structs = generate(&fdt, &binding, Command::Struct, false).unwrap();
    assert!(structs.contains("fdt32_t x[2];"));

    let plat = generate(&fdt, &binding, Command::Platdata, false).unwrap();
    assert!(plat.contains("static struct dtd_vendor_thing dtv_thing_at_0 = {\n\t.x\t\t= {0x1, 0x0},\n};"));
}

/// S4: a `reg` under a `#address-cells=2 #size-cells=2` parent promotes to
/// `fdt64_t reg[2]` with the exact widened pair, not the raw 32-bit cells.
#[test]
fn wide_reg_promotes_to_64_bit_pair() {
    let mut fdt = Fdt::empty();
    let root = fdt.root();
    let bus = fdt.add_subnode(root, "bus@0");
    fdt.node_mut(bus).add_prop(Prop::new("#address-cells", Value::Int(2)));
    fdt.node_mut(bus).add_prop(Prop::new("#size-cells", Value::Int(2)));

    let dev = fdt.add_subnode(bus, "dev@0");
    fdt.node_mut(dev).add_prop(Prop::new("compatible", Value::Str("vendor,dev".into())));
    fdt.node_mut(dev).add_prop(Prop::new("reg", Value::IntList(vec![0, 0x1000, 0, 0x20])));

    let mut drivers = BTreeMap::new();
    let mut driver = Driver::new("vendor_dev", "dev.c");
    driver.set_uclass_id(ClassId::new("UCLASS_MISC"));
    driver.compat_mut().insert("vendor,dev".to_string(), String::new());
    drivers.insert("vendor_dev".to_string(), driver);
    let mut uclasses = BTreeMap::new();
    let mut uclass = Uclass::new("misc");
    uclass.set_id(ClassId::new("UCLASS_MISC"));
    uclasses.insert("UCLASS_MISC".to_string(), uclass);
    let mut scan = ScanResult { drivers, uclasses, ..Default::default() };

    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();

    let structs = generate(&fdt, &binding, Command::Struct, false).unwrap();
    assert!(structs.contains("fdt64_t reg[2];"));

    let plat = generate(&fdt, &binding, Command::Platdata, false).unwrap();
    assert!(plat.contains("{0x1000, 0x20}"));
}

/// S6: two drivers declare the same compatible string; the scanner must
/// pick the alphabetically smallest driver name deterministically.
#[test]
fn duplicate_compatible_picks_alphabetically_smallest_driver() {
    let mut fdt = Fdt::empty();
    let root = fdt.root();
    let node = fdt.add_subnode(root, "thing@0");
    fdt.node_mut(node).add_prop(Prop::new("compatible", Value::Str("vendor,thing".into())));

    let mut drivers = BTreeMap::new();
    let mut drv_b = Driver::new("drvB", "b.c");
    drv_b.set_uclass_id(ClassId::new("UCLASS_MISC"));
    drivers.insert("drvB".to_string(), drv_b);
    let mut drv_a = Driver::new("drvA", "a.c");
    drv_a.set_uclass_id(ClassId::new("UCLASS_MISC"));
    drivers.insert("drvA".to_string(), drv_a);

    let mut compat_to_driver = BTreeMap::new();
    compat_to_driver.insert("vendor,thing".to_string(), "drvA".to_string());

    let mut uclasses = BTreeMap::new();
    let mut uclass = Uclass::new("misc");
    uclass.set_id(ClassId::new("UCLASS_MISC"));
    uclasses.insert("UCLASS_MISC".to_string(), uclass);

    let mut scan = ScanResult {
        drivers,
        uclasses,
        compat_to_driver,
        ..Default::default()
    };

    let binding = bind_tree(&mut fdt, &mut scan, false).unwrap();
    assert_eq!(fdt.node(node).struct_name(), Some("drvA"));
    assert_eq!(binding.bound.len(), 1);
}

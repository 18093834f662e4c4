use std::fs;
use std::path::PathBuf;

use scan::Scanner;

fn make_tree(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dtoc-scan-test-{tag}-{}", std::process::id()));
    let drivers_dir = dir.join("drivers/serial");
    let include_dir = dir.join("include");
    fs::create_dir_all(&drivers_dir).unwrap();
    fs::create_dir_all(&include_dir).unwrap();

    fs::write(
        drivers_dir.join("serial-vendor.c"),
        r#"
static const struct udevice_id vendor_serial_ids[] = {
	{ .compatible = "vendor,serial" },
	{ }
};

U_BOOT_DRIVER(vendor_serial) = {
	.name	= "vendor_serial",
	.id	= UCLASS_SERIAL,
	.of_match = vendor_serial_ids,
	.priv_auto	= sizeof(struct vendor_serial_priv),
};

UCLASS_DRIVER(serial) = {
	.id		= UCLASS_SERIAL,
	.priv_auto	= sizeof(struct serial_uc_priv),
};
"#,
    )
    .unwrap();

    fs::write(
        include_dir.join("serial.h"),
        r#"
struct vendor_serial_priv {
	int dummy;
};
"#,
    )
    .unwrap();

    dir
}

#[test]
fn scans_driver_uclass_and_struct() {
    let dir = make_tree("basic");
    let scanner = Scanner::new(&dir, vec![], None);
    let result = scanner.scan().unwrap();

    assert!(result.drivers.contains_key("vendor_serial"));
    let driver = &result.drivers["vendor_serial"];
    assert_eq!(driver.uclass_id().unwrap().as_str(), "UCLASS_SERIAL");
    assert!(driver.compat().contains_key("vendor,serial"));
    assert_eq!(driver.priv_auto(), Some("vendor_serial_priv"));

    assert!(result.uclasses.contains_key("UCLASS_SERIAL"));
    assert_eq!(
        result.compat_to_driver.get("vendor,serial").map(String::as_str),
        Some("vendor_serial")
    );
    assert!(result.structs.contains_key("vendor_serial_priv"));

    fs::remove_dir_all(&dir).ok();
}

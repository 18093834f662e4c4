use bind::Binding;
use fdt::Fdt;

use crate::util;

/// Emit the body of `dt-decl.h`: extern declarations for every bound
/// device/uclass (and, in instantiated mode, their `DM_*_INST` records).
pub fn generate_decl(fdt: &Fdt, binding: &Binding, instantiate: bool) -> String {
    let mut out = String::new();
    out.push_str("#include <dm/device-internal.h>\n");
    out.push_str("#include <dm/uclass-internal.h>\n\n");

    out.push_str("/* driver declarations - these allow DM_DRIVER_GET() to be used */\n");
    for &idx in &binding.bound {
        let struct_name = fdt.node(idx).struct_name().unwrap_or_default();
        out.push_str(&format!("extern U_BOOT_DRIVER({struct_name});\n"));
    }
    out.push('\n');

    if instantiate {
        out.push_str("/* device declarations - these allow DM_DEVICE_REF() to be used */\n");
        for &idx in &binding.bound {
            let var = util::var_name(fdt, idx);
            out.push_str(&format!("extern DM_DEVICE_INST({var});\n"));
        }
        out.push('\n');
    }

    out.push_str("/* uclass driver declarations - needed for DM_UCLASS_DRIVER_REF() */\n");
    for (_, ub) in &binding.uclasses {
        if let Some(uclass) = &ub.uclass {
            out.push_str(&format!("extern UCLASS_DRIVER({});\n", uclass.name()));
        }
    }

    if instantiate {
        out.push('\n');
        out.push_str("/* uclass declarations - needed for DM_UCLASS_REF() */\n");
        for (_, ub) in &binding.uclasses {
            if let Some(uclass) = &ub.uclass {
                out.push_str(&format!("extern DM_UCLASS_INST({});\n", uclass.name()));
            }
        }
    }
    out
}

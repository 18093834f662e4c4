//! Emits `dt-structs-gen.h`, `dt-decl.h`, and either `dt-plat.c` or
//! `dt-device.c`/`dt-uclass.c`, from a bound devicetree.

mod banner;
mod decl;
mod device;
mod error;
mod platdata;
mod shape;
mod struct_gen;
mod uclass;
mod util;

pub use error::{Error, Result};

use bind::Binding;
use fdt::Fdt;

/// One of the named output commands, plus the synthetic `all`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum Command {
    Decl,
    Struct,
    Platdata,
    Device,
    Uclass,
}

impl Command {
    fn parse_one(name: &str) -> Option<Self> {
        match name {
            "decl" => Some(Command::Decl),
            "struct" => Some(Command::Struct),
            "platdata" => Some(Command::Platdata),
            "device" => Some(Command::Device),
            "uclass" => Some(Command::Uclass),
            _ => None,
        }
    }

    /// The file this command writes, and which directory (source/header)
    /// it belongs in when output is split by `--output-dirs`.
    pub fn file_name(self) -> &'static str {
        match self {
            Command::Decl => "dt-decl.h",
            Command::Struct => "dt-structs-gen.h",
            Command::Platdata => "dt-plat.c",
            Command::Device => "dt-device.c",
            Command::Uclass => "dt-uclass.c",
        }
    }

    pub fn is_header(self) -> bool {
        matches!(self, Command::Decl | Command::Struct)
    }

    fn hdr_comment(self) -> &'static str {
        match self {
            Command::Decl => "Declares externs for all device/uclass instances",
            Command::Struct => "Defines the structs used to hold devicetree data",
            Command::Platdata => "Declares the U_BOOT_DRIVER() records and platform data",
            Command::Device => "Declares the DM_DEVICE_INST() records",
            Command::Uclass => "Declares the uclass instances (struct uclass)",
        }
    }
}

/// Parse a comma-separated command list (or the literal `all`) into the
/// commands valid for the given mode, rejecting unknown names up front so
/// a typo fails before any file is generated.
pub fn parse_commands(spec: &str, instantiate: bool) -> Result<Vec<Command>> {
    let available: &[Command] = if instantiate {
        &[Command::Decl, Command::Struct, Command::Device, Command::Uclass]
    } else {
        &[Command::Decl, Command::Struct, Command::Platdata]
    };

    if spec.split(',').any(|s| s == "all") {
        let mut all = available.to_vec();
        all.sort();
        return Ok(all);
    }

    spec.split(',')
        .map(|name| {
            Command::parse_one(name)
                .filter(|c| available.contains(c))
                .ok_or_else(|| Error::UnknownCommand(name.to_string()))
        })
        .collect()
}

/// Generate the content for one command against an already-bound tree.
pub fn generate(fdt: &Fdt, binding: &Binding, command: Command, instantiate: bool) -> Result<String> {
    log::debug!("generating {} for {} bound nodes", command.file_name(), binding.bound.len());
    let body = match command {
        Command::Decl => decl::generate_decl(fdt, binding, instantiate),
        Command::Struct => struct_gen::generate_structs(fdt, binding),
        Command::Platdata => platdata::generate_plat(fdt, binding),
        Command::Device => device::generate_device(fdt, binding)?,
        Command::Uclass => uclass::generate_uclass(fdt, binding),
    };
    Ok(format!("{}{body}", banner::banner(command.hdr_comment())))
}

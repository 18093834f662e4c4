use std::fs;

use crate::cli::Cli;
use crate::error::{Error, Result};

/// Run the fixed dtoc pipeline: scan the source tree, load the FDT, bind
/// nodes to drivers/uclasses, then emit every requested command's output.
pub fn run(cli: &Cli) -> Result<()> {
    if cli.output.is_some() && cli.parsed_output_dirs().is_some() {
        return Err(Error::ConflictingOutput);
    }

    let commands = codegen::parse_commands(&cli.command, cli.instantiate)?;

    log::info!("scanning source tree under {}", cli.basedir.display());
    let scanner = scan::Scanner::new(cli.basedir.clone(), cli.drivers_additional.clone(), cli.phase.clone());
    let mut scan_result = scanner.scan()?;

    log::info!("reading devicetree blob {}", cli.dtb.display());
    let mut fdt = fdt::Fdt::scan(&cli.dtb)?;

    let binding = bind::bind_tree(&mut fdt, &mut scan_result, cli.include_disabled)?;
    log::debug!("bound {} nodes", binding.bound.len());

    if !cli.warning_disabled {
        report_warnings(&scan_result, &binding);
    }

    if let Some((c_dir, h_dir)) = cli.parsed_output_dirs() {
        for &command in &commands {
            let content = codegen::generate(&fdt, &binding, command, cli.instantiate)?;
            let dir = if command.is_header() { &h_dir } else { &c_dir };
            let path = dir.join(command.file_name());
            fs::write(&path, content).map_err(|e| Error::Io(path.display().to_string(), e))?;
        }
    } else if let Some(output) = &cli.output {
        let mut combined = String::new();
        for &command in &commands {
            combined.push_str(&codegen::generate(&fdt, &binding, command, cli.instantiate)?);
        }
        fs::write(output, combined).map_err(|e| Error::Io(output.display().to_string(), e))?;
    } else {
        for &command in &commands {
            print!("{}", codegen::generate(&fdt, &binding, command, cli.instantiate)?);
        }
    }

    Ok(())
}

fn report_warnings(scan_result: &scan::ScanResult, binding: &bind::Binding) {
    for (driver, messages) in &scan_result.warnings {
        let used = scan_result.drivers.get(driver).map(|d| d.used()).unwrap_or(false);
        if used {
            for message in messages {
                log::warn!("{message}");
            }
        }
    }
    for compat in &binding.missing_drivers {
        log::warn!("no driver found for compatible '{compat}'");
    }
}

use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Compile a devicetree binary and a scanned C source tree into static
/// platform-data C declarations.
#[derive(Parser, Debug)]
#[command(name = "dtoc", version, about)]
pub struct Cli {
    /// Comma-separated list of {decl,struct,platdata,device,uclass,all}.
    pub command: String,

    /// Compiled FDT binary to read.
    #[arg(short = 'd', long = "dtb")]
    pub dtb: PathBuf,

    /// Root of the C/H source tree to scan.
    #[arg(short = 'B', long = "basedir", default_value = ".")]
    pub basedir: PathBuf,

    /// Single output file; mutually exclusive with --output-dirs.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Directory pair "C_DIR[,H_DIR]" for generated .c/.h files.
    #[arg(long = "output-dirs", value_name = "C_DIR[,H_DIR]")]
    pub output_dirs: Option<String>,

    /// Include nodes with status = "disabled".
    #[arg(short = 'i', long = "include-disabled")]
    pub include_disabled: bool,

    /// Build phase tag: spl, tpl, or empty for the main phase.
    #[arg(short = 'P', long = "phase")]
    pub phase: Option<String>,

    /// Emit instantiated-device output instead of platdata.
    #[arg(long = "instantiate")]
    pub instantiate: bool,

    /// Suppress driver/compatible warnings.
    #[arg(short = 'w', long = "warning-disabled")]
    pub warning_disabled: bool,

    /// Extra driver source files to scan beyond basedir.
    #[arg(short = 'a', long = "drivers-additional")]
    pub drivers_additional: Vec<String>,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Cli {
    /// The `(c_dir, h_dir)` pair parsed from `--output-dirs`, `h_dir`
    /// defaulting to `c_dir` when a second component isn't given.
    pub fn parsed_output_dirs(&self) -> Option<(PathBuf, PathBuf)> {
        let spec = self.output_dirs.as_ref()?;
        let mut parts = spec.splitn(2, ',');
        let c_dir = PathBuf::from(parts.next().unwrap_or_default());
        let h_dir = parts.next().map(PathBuf::from).unwrap_or_else(|| c_dir.clone());
        Some((c_dir, h_dir))
    }
}

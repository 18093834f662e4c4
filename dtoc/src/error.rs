use thiserror::Error;

/// Top-level error, aggregating every library crate's error type so `main`
/// has one thing to match on and map to a process exit code.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fdt(#[from] fdt::Error),

    #[error(transparent)]
    Scan(#[from] scan::Error),

    #[error(transparent)]
    Bind(#[from] bind::Error),

    #[error(transparent)]
    Codegen(#[from] codegen::Error),

    #[error("--output and --output-dirs are mutually exclusive")]
    ConflictingOutput,

    #[error("I/O error writing '{0}': {1}")]
    Io(String, #[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

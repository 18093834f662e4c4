use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fdt(#[from] fdt::Error),

    #[error("node '{0}' has no driver for compatible '{1}'")]
    NoDriver(String, String),

    #[error("alias '{0}' targets a phandle with no matching node")]
    DanglingAlias(String),
}

pub type Result<T> = std::result::Result<T, Error>;

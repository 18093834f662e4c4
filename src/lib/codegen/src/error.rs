use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown command '{0}' (use: decl, struct, platdata, device, uclass, all)")]
    UnknownCommand(String),

    #[error("node '{0}' requires parent node '{1}' but it is not in the valid list")]
    ParentMissing(String, String),
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error reading '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("{0}: cannot parse uclass ID in driver '{1}'")]
    MissingUclassId(String, String),

    #[error("{0}: unknown compatible var '{1}'")]
    UnknownCompatVar(String, String),
}

pub type Result<T> = std::result::Result<T, Error>;

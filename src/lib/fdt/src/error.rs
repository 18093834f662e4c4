use thiserror::Error;

/// Errors raised while reading, mutating or re-synchronizing an FDT tree.
#[derive(Debug, Error)]
pub enum Error {
    #[error("FDT blob too small ({0} bytes)")]
    TooSmall(usize),

    #[error("bad FDT magic number {0:#x}")]
    BadMagic(u32),

    #[error("unexpected end of FDT struct block")]
    TruncatedStruct,

    #[error("unknown FDT struct token {0:#x} at offset {1}")]
    UnknownToken(u32, usize),

    #[error("property '{0}' references a string table offset out of range")]
    BadStringOffset(String),

    #[error("duplicate phandle {0} (nodes '{1}' and '{2}')")]
    DuplicatePhandle(u32, String, String),

    #[error("node '{0}' name does not match blob during refresh (expected '{1}')")]
    InternalMismatch(String, String),

    #[error("subnode count for '{0}' does not match blob during refresh")]
    SubnodeCountMismatch(String),

    #[error("no space left in FDT blob while syncing '{0}'")]
    NoSpace(String),

    #[error("node '{0}' has no phandle target for property '{1}'")]
    InvalidPhandle(String, String),

    #[error("node '{0}' referenced by phandle has no '{1}' property")]
    MissingCells(String, String),

    #[error("node '{0}' reg property is not an int")]
    RegNotInt(String),

    #[error("node '{0}' (parent '{1}') reg property has {2} cells, not a multiple of na+ns ({3}+{4})")]
    RegMisaligned(String, String, usize, u32, u32),

    #[error("parent node '{0}' has no properties")]
    ParentHasNoProperties(String),

    #[error("node not found: '{0}'")]
    NodeNotFound(String),

    #[error("I/O error reading '{0}': {1}")]
    Io(String, #[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

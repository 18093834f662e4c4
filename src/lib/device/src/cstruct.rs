/// A `struct NAME { ... };` recovered from a scanned header, used to
/// resolve the header a `priv_auto`/`plat_auto` struct name should pull in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CStruct {
    /// Bare struct name (without the `struct` keyword).
    name: String,
    /// Path relative to an `include/` directory, or `asm/...` when the
    /// header lives under `arch/<arch>/include/asm`.
    fname: String,
}

impl CStruct {
    pub fn new(name: impl Into<String>, fname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fname: fname.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fname(&self) -> &str {
        &self.fname
    }
}

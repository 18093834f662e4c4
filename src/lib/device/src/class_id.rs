use std::fmt;

/// A uclass identifier, e.g. `UCLASS_I2C`, carried verbatim from scanned C
/// source.
///
/// Upstream headers are free to add new uclasses at any time, so this is not
/// a fixed enumeration the way a runtime driver-model implementation would
/// want it: it simply stores whatever identifier the scanner found after
/// `.id =`. Ordering is plain string comparison, matching the lexical sort
/// applied when uclasses are listed in generated output.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ClassId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

use std::collections::BTreeMap;

use crate::class_id::ClassId;

/// A driver for a feature or peripheral, as recovered from a
/// `U_BOOT_DRIVER(name) = { ... };` declaration.
///
/// Drivers all belong to a uclass, representing a class of devices of the
/// same type. A driver matches devicetree nodes through one or more
/// compatible strings, each optionally carrying a driver-data literal.
#[derive(Clone, Debug, Default)]
pub struct Driver {
    /// Driver name, the argument of `U_BOOT_DRIVER(name)`.
    name: String,
    /// Source file the driver was recovered from.
    fname: String,
    /// Uclass this driver belongs to, or `None` until `.id =` is seen.
    uclass_id: Option<ClassId>,
    /// compatible string -> driver-data literal, in declaration order.
    compat: BTreeMap<String, String>,
    /// `.priv_auto` struct name, e.g. `"struct foo_priv"`.
    priv_auto: Option<String>,
    /// `.plat_auto` struct name.
    plat_auto: Option<String>,
    /// `.per_child_auto` struct name.
    per_child_auto: Option<String>,
    /// `.per_child_plat_auto` struct name.
    per_child_plat_auto: Option<String>,
    /// Build phase this driver is restricted to (`spl`, `tpl`), if any.
    phase: Option<String>,
    /// Header files required by this driver (`DM_HEADER(...)`).
    headers: Vec<String>,
    /// Set once a valid devicetree node actually binds to this driver.
    used: bool,
    /// Names of drivers that lost a name collision to this one.
    dups: Vec<String>,
    /// Set when this driver won a name collision with no phase to
    /// disambiguate, so the collision should be warned about if used.
    warn_dups: bool,
}

impl Driver {
    pub fn new(name: impl Into<String>, fname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fname: fname.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fname(&self) -> &str {
        &self.fname
    }

    pub fn uclass_id(&self) -> Option<&ClassId> {
        self.uclass_id.as_ref()
    }

    pub fn set_uclass_id(&mut self, id: ClassId) {
        self.uclass_id = Some(id);
    }

    pub fn compat(&self) -> &BTreeMap<String, String> {
        &self.compat
    }

    pub fn compat_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.compat
    }

    pub fn priv_auto(&self) -> Option<&str> {
        self.priv_auto.as_deref()
    }

    pub fn set_priv_auto(&mut self, s: impl Into<String>) {
        self.priv_auto = Some(s.into());
    }

    pub fn plat_auto(&self) -> Option<&str> {
        self.plat_auto.as_deref()
    }

    pub fn set_plat_auto(&mut self, s: impl Into<String>) {
        self.plat_auto = Some(s.into());
    }

    pub fn per_child_auto(&self) -> Option<&str> {
        self.per_child_auto.as_deref()
    }

    pub fn set_per_child_auto(&mut self, s: impl Into<String>) {
        self.per_child_auto = Some(s.into());
    }

    pub fn per_child_plat_auto(&self) -> Option<&str> {
        self.per_child_plat_auto.as_deref()
    }

    pub fn set_per_child_plat_auto(&mut self, s: impl Into<String>) {
        self.per_child_plat_auto = Some(s.into());
    }

    pub fn phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    pub fn set_phase(&mut self, phase: impl Into<String>) {
        self.phase = Some(phase.into());
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn add_header(&mut self, header: impl Into<String>) {
        self.headers.push(header.into());
    }

    pub fn used(&self) -> bool {
        self.used
    }

    pub fn mark_used(&mut self) {
        self.used = true;
    }

    pub fn dups(&self) -> &[String] {
        &self.dups
    }

    pub fn add_dup(&mut self, name: impl Into<String>) {
        self.dups.push(name.into());
    }

    pub fn warn_dups(&self) -> bool {
        self.warn_dups
    }

    pub fn set_warn_dups(&mut self, warn: bool) {
        self.warn_dups = warn;
    }

    /// Whether this driver has both a uclass and at least one compatible
    /// string, or is the synthetic root driver (which needs neither).
    pub fn is_complete(&self, is_root: bool) -> bool {
        is_root || (self.uclass_id.is_some() && !self.compat.is_empty())
    }
}

use crate::class_id::ClassId;

/// A uclass driver, as recovered from a `UCLASS_DRIVER(name) = { ... };`
/// declaration.
///
/// A uclass provides a consistent interface to a set of related drivers
/// (e.g. all serial drivers). The per-device/per-child auto sizes here are
/// the uclass-level fallbacks used when a driver doesn't specify its own.
#[derive(Clone, Debug, Default)]
pub struct Uclass {
    /// Uclass name, the argument of `UCLASS_DRIVER(name)`.
    name: String,
    /// Uclass identifier (`.id = UCLASS_xxx`).
    id: Option<ClassId>,
    /// `.priv_auto` struct name.
    priv_auto: Option<String>,
    /// `.per_device_auto` struct name.
    per_device_auto: Option<String>,
    /// `.per_device_plat_auto` struct name.
    per_device_plat_auto: Option<String>,
    /// `.per_child_auto` struct name.
    per_child_auto: Option<String>,
    /// `.per_child_plat_auto` struct name.
    per_child_plat_auto: Option<String>,
}

impl Uclass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<&ClassId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: ClassId) {
        self.id = Some(id);
    }

    pub fn priv_auto(&self) -> Option<&str> {
        self.priv_auto.as_deref()
    }

    pub fn set_priv_auto(&mut self, s: impl Into<String>) {
        self.priv_auto = Some(s.into());
    }

    pub fn per_device_auto(&self) -> Option<&str> {
        self.per_device_auto.as_deref()
    }

    pub fn set_per_device_auto(&mut self, s: impl Into<String>) {
        self.per_device_auto = Some(s.into());
    }

    pub fn per_device_plat_auto(&self) -> Option<&str> {
        self.per_device_plat_auto.as_deref()
    }

    pub fn set_per_device_plat_auto(&mut self, s: impl Into<String>) {
        self.per_device_plat_auto = Some(s.into());
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
}

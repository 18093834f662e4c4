//! Joins scanned driver-model metadata with a devicetree: binds nodes to
//! drivers and uclasses, widens each driver's struct layout across all of
//! its instances, assigns uclass sequence numbers, and decodes phandle
//! arguments.

mod binder;
mod error;
mod names;

pub use binder::{bind_tree, Binding, UclassBinding};
pub use error::{Error, Result};
pub use names::{compat_list_c, is_ignored_prop, PROP_IGNORE_LIST};

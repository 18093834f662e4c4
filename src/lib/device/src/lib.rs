//! Plain data records describing the U-Boot-style driver model: drivers,
//! uclasses and the structs they reference. These are produced by the
//! source scanner and consumed by the binder and code emitter; none of
//! them hold any scanning or binding behavior themselves.

mod class_id;
mod cstruct;
mod driver;
mod uclass;

pub use class_id::ClassId;
pub use cstruct::CStruct;
pub use driver::Driver;
pub use uclass::Uclass;

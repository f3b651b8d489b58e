pub mod device;
pub mod heap;
pub mod sysfs;

pub use device::{Backend, DeviceClass, DeviceInfo, discover_devices};
pub use heap::HeapBlock;

//! A self-contained Unified Shared Memory (USM) runtime.
//!
//! The crate provides the allocation model of heterogeneous-compute
//! runtimes in pure user space: device discovery, queues bound to devices,
//! scoped device selection with a thread-current queue, and the three USM
//! allocation kinds (`shared`, `host`, `device`) with per-context kind
//! queries.
//!
//! ```no_run
//! use usm_rs::{UsmShared, device_context, get_current_queue};
//!
//! # fn main() -> usm_rs::UsmResult<()> {
//! let queue = get_current_queue()?;
//! let mem = UsmShared::with_queue(1024, &queue)?;
//! assert_eq!(mem.nbytes(), 1024);
//!
//! let _scope = device_context("opencl:cpu:0")?;
//! assert_eq!(mem.usm_type().as_str(), "shared");
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod runtime;

pub use error::{UsmError, UsmResult};

pub use driver::{Backend, DeviceClass, DeviceInfo, discover_devices};
pub use runtime::{
    Context, DeviceSelector, Queue, QueueGuard, UsmDevice, UsmHost, UsmKind, UsmShared,
    device_context, get_current_queue, has_cpu_queues, has_gpu_queues, has_platforms,
    num_activated_queues, release,
};

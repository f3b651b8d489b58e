pub mod context;
pub mod memory;
pub mod queue;
pub mod selector;

pub use context::Context;
pub use memory::{UsmDevice, UsmHost, UsmKind, UsmShared};
pub use queue::{
    Queue, QueueGuard, device_context, get_current_queue, has_cpu_queues, has_gpu_queues,
    has_platforms, num_activated_queues, release,
};
pub use selector::DeviceSelector;

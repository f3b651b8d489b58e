use crate::driver::{DeviceClass, DeviceInfo, discover_devices};
use crate::error::{UsmError, UsmResult};
use crate::runtime::context::Context;
use crate::runtime::selector::DeviceSelector;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ===============================================================================================
// Queue
// ===============================================================================================

/// An execution queue bound to one device and its context.
///
/// Queues are created and cached by the process-wide manager; user code
/// only ever sees them as `Arc<Queue>`, obtained from [`get_current_queue`]
/// or a [`device_context`] scope.
#[derive(Debug)]
pub struct Queue {
    id: u32,
    device: DeviceInfo,
    context: Arc<Context>,
}

impl Queue {
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub const fn device(&self) -> &DeviceInfo {
        &self.device
    }

    #[must_use]
    pub const fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Whether two queues share the same context (and thus the same USM
    /// pointer namespace).
    #[must_use]
    pub fn same_context(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.context, &other.context)
    }
}

// ===============================================================================================
// Global Queue Manager
// ===============================================================================================

/// Process-wide runtime state: the discovered device list plus per-device
/// queue and context caches.
#[derive(Debug)]
struct QueueManager {
    devices: Vec<DeviceInfo>,
    // One queue and one context per device, created on first use.
    queues: Mutex<HashMap<u32, Arc<Queue>>>,
    contexts: Mutex<HashMap<u32, Arc<Context>>>,
}

static GLOBAL_MANAGER: Mutex<Option<Arc<QueueManager>>> = Mutex::new(None);

impl QueueManager {
    fn context_for(&self, device_id: u32) -> Arc<Context> {
        let mut contexts = self.contexts.lock().unwrap();
        contexts
            .entry(device_id)
            .or_insert_with(|| Arc::new(Context::new(device_id, device_id)))
            .clone()
    }

    fn queue_for_device(&self, device: &DeviceInfo) -> Arc<Queue> {
        let context = self.context_for(device.id);
        let mut queues = self.queues.lock().unwrap();
        queues
            .entry(device.id)
            .or_insert_with(|| {
                Arc::new(Queue {
                    id: device.id,
                    device: device.clone(),
                    context,
                })
            })
            .clone()
    }

    fn queue_for_selector(&self, selector: &DeviceSelector, raw: &str) -> UsmResult<Arc<Queue>> {
        let device = self
            .devices
            .iter()
            .find(|dev| selector.matches(dev))
            .ok_or_else(|| UsmError::NoDeviceFound(raw.to_string()))?;

        Ok(self.queue_for_device(device))
    }

    fn default_queue(&self) -> UsmResult<Arc<Queue>> {
        let device = self
            .devices
            .iter()
            .find(|dev| dev.class == DeviceClass::Cpu)
            .or_else(|| self.devices.first())
            .ok_or(UsmError::NoQueueAvailable)?;

        Ok(self.queue_for_device(device))
    }
}

/// Acquires the global manager, running device discovery on first use.
///
/// # Panics
/// Panics if the internal mutex is poisoned.
fn manager() -> UsmResult<Arc<QueueManager>> {
    let mut guard = GLOBAL_MANAGER.lock().unwrap();

    if let Some(mgr) = guard.as_ref() {
        return Ok(mgr.clone());
    }

    let devices = discover_devices()?;
    let mgr = Arc::new(QueueManager {
        devices,
        queues: Mutex::new(HashMap::new()),
        contexts: Mutex::new(HashMap::new()),
    });

    *guard = Some(mgr.clone());
    drop(guard);

    Ok(mgr)
}

/// Releases the global manager and its queue/context caches.
///
/// Live allocations keep their contexts alive through their own `Arc`s, so
/// this is safe to call at shutdown with USM handles still outstanding.
///
/// # Panics
/// Panics if the internal mutex is poisoned.
pub fn release() {
    GLOBAL_MANAGER.lock().unwrap().take();
}

// ===============================================================================================
// Current-Queue Stack & Scoped Selection
// ===============================================================================================

thread_local! {
    // Scoped overrides are per-thread so guard drops restore the right
    // entry even when several threads hold overlapping scopes.
    static QUEUE_STACK: RefCell<Vec<Arc<Queue>>> = const { RefCell::new(Vec::new()) };
}

/// The queue new work and allocations are issued against: the innermost
/// active [`device_context`] scope on this thread, else the default CPU
/// queue.
///
/// # Errors
/// Returns an error if device discovery fails or no device exists at all.
pub fn get_current_queue() -> UsmResult<Arc<Queue>> {
    let scoped = QUEUE_STACK.with(|stack| stack.borrow().last().cloned());
    match scoped {
        Some(queue) => Ok(queue),
        None => manager()?.default_queue(),
    }
}

/// Makes the queue selected by `selector` current for the calling thread
/// until the returned guard is dropped.
///
/// The prior current queue is restored on every exit path, including
/// unwinding.
///
/// # Errors
/// Returns `UsmError::InvalidSelector` for a malformed selector and
/// `UsmError::NoDeviceFound` when no discovered device matches it.
pub fn device_context(selector: &str) -> UsmResult<QueueGuard> {
    let parsed: DeviceSelector = selector.parse()?;
    let queue = manager()?.queue_for_selector(&parsed, selector)?;

    QUEUE_STACK.with(|stack| stack.borrow_mut().push(queue.clone()));
    Ok(QueueGuard { queue })
}

/// RAII handle for one scoped device selection.
///
/// Dropping the guard pops this scope's queue off the thread's stack.
#[derive(Debug)]
pub struct QueueGuard {
    queue: Arc<Queue>,
}

impl QueueGuard {
    /// The queue made current by this scope.
    #[must_use]
    pub const fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }
}

impl Drop for QueueGuard {
    fn drop(&mut self) {
        QUEUE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            match popped {
                Some(queue) if Arc::ptr_eq(&queue, &self.queue) => {}
                _ => eprintln!("[QueueGuard] queue stack out of order on scope exit"),
            }
        });
    }
}

/// Depth of the calling thread's scoped-selection stack.
#[must_use]
pub fn num_activated_queues() -> usize {
    QUEUE_STACK.with(|stack| stack.borrow().len())
}

// ===============================================================================================
// Capability Queries
// ===============================================================================================

fn has_queues_of_class(class: DeviceClass) -> bool {
    manager().is_ok_and(|mgr| mgr.devices.iter().any(|dev| dev.class == class))
}

/// Whether any compute device was discovered. Discovery failures degrade
/// to `false` so callers can use this as a plain skip guard.
#[must_use]
pub fn has_platforms() -> bool {
    manager().is_ok_and(|mgr| !mgr.devices.is_empty())
}

/// Whether CPU-class queues can be created.
#[must_use]
pub fn has_cpu_queues() -> bool {
    has_queues_of_class(DeviceClass::Cpu)
}

/// Whether GPU-class queues can be created.
#[must_use]
pub fn has_gpu_queues() -> bool {
    has_queues_of_class(DeviceClass::Gpu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_queue_is_cpu() {
        let queue = get_current_queue().unwrap();
        assert_eq!(queue.device().class, DeviceClass::Cpu);
    }

    #[test]
    fn queues_are_cached_per_device() {
        let a = device_context("opencl:cpu:0").unwrap();
        let b = device_context("opencl:cpu:0").unwrap();
        assert!(Arc::ptr_eq(a.queue(), b.queue()));
        assert!(a.queue().same_context(b.queue()));
    }

    #[test]
    fn scoped_selection_overrides_and_restores() {
        assert_eq!(num_activated_queues(), 0);

        {
            let guard = device_context("opencl:cpu:0").unwrap();
            assert_eq!(num_activated_queues(), 1);

            let current = get_current_queue().unwrap();
            assert!(Arc::ptr_eq(&current, guard.queue()));

            {
                let inner = device_context("cpu:0").unwrap();
                assert_eq!(num_activated_queues(), 2);
                let current = get_current_queue().unwrap();
                assert!(Arc::ptr_eq(&current, inner.queue()));
            }

            assert_eq!(num_activated_queues(), 1);
        }

        assert_eq!(num_activated_queues(), 0);
        let after = get_current_queue().unwrap();
        assert_eq!(after.device().class, DeviceClass::Cpu);
    }

    #[test]
    fn stack_restores_across_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _guard = device_context("opencl:cpu:0").unwrap();
            panic!("scope body failed");
        });
        assert!(result.is_err());
        assert_eq!(num_activated_queues(), 0);
    }

    #[test]
    fn unmatched_selector_is_no_device() {
        let err = device_context("cuda:gpu:9").unwrap_err();
        assert!(matches!(err, UsmError::NoDeviceFound(_)));
    }

    #[test]
    fn malformed_selector_is_invalid() {
        let err = device_context("not a selector").unwrap_err();
        assert!(matches!(err, UsmError::InvalidSelector(_)));
    }

    #[test]
    fn cpu_capability_is_always_present() {
        assert!(has_platforms());
        assert!(has_cpu_queues());
    }
}

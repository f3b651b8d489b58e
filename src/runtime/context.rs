use crate::runtime::memory::UsmKind;
use crate::runtime::memory::registry::{UsmRecord, UsmRegistry};
use std::sync::Mutex;

/// An execution context owning USM allocations.
///
/// Each device gets one context, created lazily by the queue manager and
/// shared by every queue on that device. USM pointers are only meaningful
/// relative to the context that allocated them; queries through a foreign
/// context see nothing.
#[derive(Debug)]
pub struct Context {
    id: u32,
    device_id: u32,
    registry: Mutex<UsmRegistry>,
}

impl Context {
    #[must_use]
    pub fn new(id: u32, device_id: u32) -> Self {
        Self {
            id,
            device_id,
            registry: Mutex::new(UsmRegistry::new()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub const fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Records a new allocation owned by this context.
    ///
    /// # Panics
    /// Panics if the registry mutex is poisoned.
    pub fn register(&self, base: usize, record: UsmRecord) {
        self.registry.lock().unwrap().register(base, record);
    }

    /// Drops tracking for an allocation being freed.
    ///
    /// # Panics
    /// Panics if the registry mutex is poisoned.
    pub fn unregister(&self, base: usize) {
        self.registry.lock().unwrap().unregister(base);
    }

    /// Allocation kind of `addr` as visible from this context.
    ///
    /// `None` means the address was not allocated here; callers surface
    /// that as `UsmKind::Unknown`.
    ///
    /// # Panics
    /// Panics if the registry mutex is poisoned.
    #[must_use]
    pub fn usm_type_of(&self, addr: usize) -> Option<UsmKind> {
        self.registry.lock().unwrap().kind_of(addr)
    }

    /// Number of live allocations owned by this context.
    ///
    /// # Panics
    /// Panics if the registry mutex is poisoned.
    #[must_use]
    pub fn num_allocations(&self) -> usize {
        self.registry.lock().unwrap().len()
    }
}

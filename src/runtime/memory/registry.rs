use crate::runtime::memory::UsmKind;
use std::collections::BTreeMap;

/// Bookkeeping record for one live USM allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsmRecord {
    /// Size the caller requested, reported back through the handle.
    pub nbytes: usize,
    /// Page-rounded size of the backing mapping.
    pub backing: usize,
    pub kind: UsmKind,
}

/// Tracks the USM allocations owned by one context.
///
/// Keyed by base address so pointer lookups can find the enclosing
/// allocation, the same shape as a VA-range tracker.
#[derive(Debug, Default)]
pub struct UsmRegistry {
    allocations: BTreeMap<usize, UsmRecord>,
}

impl UsmRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, base: usize, record: UsmRecord) {
        if self.allocations.insert(base, record).is_some() {
            eprintln!("[UsmRegistry] base 0x{base:x} registered twice");
        }
    }

    pub fn unregister(&mut self, base: usize) -> Option<UsmRecord> {
        let removed = self.allocations.remove(&base);
        if removed.is_none() {
            eprintln!("[UsmRegistry] tried to free untracked base 0x{base:x}");
        }
        removed
    }

    /// Finds the allocation whose backing range contains `addr`.
    #[must_use]
    pub fn lookup(&self, addr: usize) -> Option<&UsmRecord> {
        let (&base, record) = self.allocations.range(..=addr).next_back()?;
        let end = base + record.backing;
        (addr < end).then_some(record)
    }

    /// Allocation kind as visible from this context, `None` for foreign
    /// pointers.
    #[must_use]
    pub fn kind_of(&self, addr: usize) -> Option<UsmKind> {
        self.lookup(addr).map(|record| record.kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(nbytes: usize, kind: UsmKind) -> UsmRecord {
        UsmRecord {
            nbytes,
            backing: nbytes.max(1).next_multiple_of(4096),
            kind,
        }
    }

    #[test]
    fn lookup_hits_base_and_interior() {
        let mut reg = UsmRegistry::new();
        reg.register(0x10000, record(1024, UsmKind::Shared));

        assert_eq!(reg.kind_of(0x10000), Some(UsmKind::Shared));
        assert_eq!(reg.kind_of(0x10000 + 512), Some(UsmKind::Shared));
    }

    #[test]
    fn lookup_respects_backing_bounds() {
        let mut reg = UsmRegistry::new();
        reg.register(0x10000, record(1024, UsmKind::Host));

        // Interior of the backing page still resolves, one past it does not.
        assert_eq!(reg.kind_of(0x10000 + 4095), Some(UsmKind::Host));
        assert_eq!(reg.kind_of(0x10000 + 4096), None);
        assert_eq!(reg.kind_of(0xFFFF), None);
    }

    #[test]
    fn neighbouring_allocations_stay_distinct() {
        let mut reg = UsmRegistry::new();
        reg.register(0x10000, record(4096, UsmKind::Device));
        reg.register(0x11000, record(4096, UsmKind::Shared));

        assert_eq!(reg.kind_of(0x10FFF), Some(UsmKind::Device));
        assert_eq!(reg.kind_of(0x11000), Some(UsmKind::Shared));
    }

    #[test]
    fn unregister_removes_tracking() {
        let mut reg = UsmRegistry::new();
        reg.register(0x10000, record(64, UsmKind::Shared));
        assert_eq!(reg.len(), 1);

        let removed = reg.unregister(0x10000).unwrap();
        assert_eq!(removed.nbytes, 64);
        assert!(reg.is_empty());
        assert_eq!(reg.kind_of(0x10000), None);
    }

    #[test]
    fn unregister_unknown_base_is_none() {
        let mut reg = UsmRegistry::new();
        assert!(reg.unregister(0xDEAD000).is_none());
    }
}

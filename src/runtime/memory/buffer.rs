use crate::driver::HeapBlock;
use crate::error::{UsmError, UsmResult};
use crate::runtime::context::Context;
use crate::runtime::memory::UsmKind;
use crate::runtime::memory::registry::UsmRecord;
use crate::runtime::queue::{Queue, get_current_queue};
use std::slice;
use std::sync::Arc;

// ===============================================================================================
// Allocation Core
// ===============================================================================================

/// One live USM allocation: backing pages plus the owning context.
///
/// Registers itself with the context on construction; `Drop` unregisters
/// and then releases the mapping (field order keeps the registry entry
/// alive until the pages go away).
#[derive(Debug)]
struct UsmAllocation {
    context: Arc<Context>,
    block: HeapBlock,
    nbytes: usize,
    kind: UsmKind,
}

impl UsmAllocation {
    fn with_queue(nbytes: usize, kind: UsmKind, queue: &Queue) -> UsmResult<Self> {
        let block = HeapBlock::alloc(nbytes)?;
        let context = queue.context().clone();

        context.register(
            block.base(),
            UsmRecord {
                nbytes,
                backing: block.backing(),
                kind,
            },
        );

        Ok(Self {
            context,
            block,
            nbytes,
            kind,
        })
    }

    fn on_current_queue(nbytes: usize, kind: UsmKind) -> UsmResult<Self> {
        let queue = get_current_queue()?;
        Self::with_queue(nbytes, kind, &queue)
    }

    /// Kind as visible from `queue`'s context: the intrinsic kind for the
    /// allocating context, `Unknown` anywhere else.
    fn usm_type_for(&self, queue: &Queue) -> UsmKind {
        queue
            .context()
            .usm_type_of(self.block.base())
            .unwrap_or(UsmKind::Unknown)
    }

    fn as_bytes(&self) -> &[u8] {
        // SAFETY: the mapping is readable, nbytes <= backing, and &self
        // excludes a live mutable view.
        unsafe { slice::from_raw_parts(self.block.as_ptr(), self.nbytes) }
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, with &mut self guaranteeing exclusivity.
        unsafe { slice::from_raw_parts_mut(self.block.as_ptr(), self.nbytes) }
    }

    fn copy_from_host(&mut self, src: &[u8]) -> UsmResult<()> {
        if src.len() > self.nbytes {
            return Err(UsmError::CopyOutOfBounds {
                requested: src.len(),
                nbytes: self.nbytes,
            });
        }
        self.as_bytes_mut()[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn copy_to_host(&self, dst: &mut [u8]) -> UsmResult<()> {
        if dst.len() > self.nbytes {
            return Err(UsmError::CopyOutOfBounds {
                requested: dst.len(),
                nbytes: self.nbytes,
            });
        }
        dst.copy_from_slice(&self.as_bytes()[..dst.len()]);
        Ok(())
    }
}

impl Drop for UsmAllocation {
    fn drop(&mut self) {
        self.context.unregister(self.block.base());
    }
}

// ===============================================================================================
// Public Handles
// ===============================================================================================

// The three kinds share construction, size/kind reporting, and the host
// copy surface; only host visibility differs.
macro_rules! usm_memory_common {
    ($ty:ident, $kind:expr) => {
        impl $ty {
            /// Allocates against the calling thread's current queue.
            ///
            /// # Errors
            /// Fails if no queue is available or the mapping cannot be
            /// created.
            pub fn new(nbytes: usize) -> UsmResult<Self> {
                Ok(Self {
                    inner: UsmAllocation::on_current_queue(nbytes, $kind)?,
                })
            }

            /// Allocates against an explicit queue.
            ///
            /// # Errors
            /// Fails if the mapping cannot be created.
            pub fn with_queue(nbytes: usize, queue: &Queue) -> UsmResult<Self> {
                Ok(Self {
                    inner: UsmAllocation::with_queue(nbytes, $kind, queue)?,
                })
            }

            /// Requested size in bytes, exactly as passed at construction.
            #[must_use]
            pub const fn nbytes(&self) -> usize {
                self.inner.nbytes
            }

            /// Intrinsic allocation kind, independent of any ambient queue.
            #[must_use]
            pub const fn usm_type(&self) -> UsmKind {
                self.inner.kind
            }

            /// Allocation kind as visible from `queue`'s context.
            ///
            /// Reports `UsmKind::Unknown` when the queue belongs to a
            /// context other than the allocating one.
            #[must_use]
            pub fn usm_type_for(&self, queue: &Queue) -> UsmKind {
                self.inner.usm_type_for(queue)
            }

            /// The context this allocation was made in.
            #[must_use]
            pub fn context(&self) -> &Arc<Context> {
                &self.inner.context
            }

            /// Copies `src` into the start of the allocation.
            ///
            /// # Errors
            /// Fails with `UsmError::CopyOutOfBounds` if `src` is larger
            /// than the allocation.
            pub fn copy_from_host(&mut self, src: &[u8]) -> UsmResult<()> {
                self.inner.copy_from_host(src)
            }

            /// Copies the start of the allocation into `dst`.
            ///
            /// # Errors
            /// Fails with `UsmError::CopyOutOfBounds` if `dst` is larger
            /// than the allocation.
            pub fn copy_to_host(&self, dst: &mut [u8]) -> UsmResult<()> {
                self.inner.copy_to_host(dst)
            }
        }
    };
}

// Direct byte views only exist for host-visible kinds; device memory is
// reached through the copy surface.
macro_rules! usm_memory_host_visible {
    ($ty:ident) => {
        impl $ty {
            /// Contiguous byte view of the allocation.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8] {
                self.inner.as_bytes()
            }

            /// Mutable contiguous byte view of the allocation.
            #[must_use]
            pub fn as_bytes_mut(&mut self) -> &mut [u8] {
                self.inner.as_bytes_mut()
            }
        }
    };
}

/// USM allocation migratable between host and device.
#[derive(Debug)]
pub struct UsmShared {
    inner: UsmAllocation,
}

/// USM allocation pinned in host memory but visible to devices.
#[derive(Debug)]
pub struct UsmHost {
    inner: UsmAllocation,
}

/// USM allocation resident on the device, reached via explicit copies.
#[derive(Debug)]
pub struct UsmDevice {
    inner: UsmAllocation,
}

usm_memory_common!(UsmShared, UsmKind::Shared);
usm_memory_common!(UsmHost, UsmKind::Host);
usm_memory_common!(UsmDevice, UsmKind::Device);

usm_memory_host_visible!(UsmShared);
usm_memory_host_visible!(UsmHost);

use crate::error::{UsmError, UsmResult};
use std::io;
use std::ptr::NonNull;

/// Size of one backing page, queried once per call site from libc.
#[must_use]
pub fn page_size() -> usize {
    // SAFETY: sysconf with a valid name has no preconditions.
    let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if ret <= 0 { 4096 } else { ret as usize }
}

/// A page-granular block of anonymous memory backing one USM allocation.
///
/// The mapping is released when the block is dropped.
#[derive(Debug)]
pub struct HeapBlock {
    ptr: NonNull<u8>,
    backing: usize,
}

impl HeapBlock {
    /// Maps a fresh anonymous block large enough for `nbytes`.
    ///
    /// The backing size is rounded up to the page size; a zero-byte request
    /// still reserves one page so every live allocation has a unique base
    /// address.
    ///
    /// # Errors
    /// Returns `UsmError::OutOfMemory` when the kernel refuses the mapping
    /// for lack of memory, or the underlying I/O error otherwise.
    pub fn alloc(nbytes: usize) -> UsmResult<Self> {
        let page = page_size();
        let backing = nbytes.div_ceil(page).max(1) * page;

        // SAFETY: anonymous private mapping, no fd, fixed prot flags.
        let ret = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                backing,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ret == libc::MAP_FAILED {
            let err = io::Error::last_os_error();
            return Err(if err.raw_os_error() == Some(libc::ENOMEM) {
                UsmError::OutOfMemory
            } else {
                UsmError::Io(err)
            });
        }

        // mmap never returns null on success.
        let ptr = NonNull::new(ret.cast::<u8>()).ok_or(UsmError::OutOfMemory)?;
        Ok(Self { ptr, backing })
    }

    #[must_use]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Base address of the mapping, used as the registry key.
    #[must_use]
    pub fn base(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Mapped size in bytes (>= the requested size, page aligned).
    #[must_use]
    pub const fn backing(&self) -> usize {
        self.backing
    }
}

impl Drop for HeapBlock {
    fn drop(&mut self) {
        // SAFETY: ptr/backing describe exactly the mapping from alloc().
        let ret = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.backing) };
        if ret != 0 {
            eprintln!(
                "[HeapBlock] munmap of {} bytes at 0x{:x} failed: {:?}",
                self.backing,
                self.base(),
                io::Error::last_os_error()
            );
        }
    }
}

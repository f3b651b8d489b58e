pub mod buffer;
pub mod registry;

use std::fmt;

/// Placement category of a USM allocation.
///
/// `Unknown` is never an intrinsic kind; it is what a query reports when
/// the pointer was not allocated by the queried queue's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsmKind {
    Shared,
    Host,
    Device,
    Unknown,
}

impl UsmKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Host => "host",
            Self::Device => "device",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UsmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub use buffer::{UsmDevice, UsmHost, UsmShared};
pub use registry::{UsmRecord, UsmRegistry};

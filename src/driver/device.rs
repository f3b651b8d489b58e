use crate::driver::sysfs;
use crate::error::UsmResult;
use std::fmt;

// ===============================================================================================
// Device Identity
// ===============================================================================================

/// Compute backend a device is exposed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    OpenCl,
    LevelZero,
    Cuda,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenCl => "opencl",
            Self::LevelZero => "level_zero",
            Self::Cuda => "cuda",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "opencl" => Some(Self::OpenCl),
            "level_zero" => Some(Self::LevelZero),
            "cuda" => Some(Self::Cuda),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of compute device a queue can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Cpu,
    Gpu,
}

impl DeviceClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "cpu" => Some(Self::Cpu),
            "gpu" => Some(Self::Gpu),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A processed snapshot of one discovered device, ready for runtime use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Global device ID (index in the discovery list).
    pub id: u32,
    pub backend: Backend,
    pub class: DeviceClass,
    /// Index within (backend, class), the last selector component.
    pub index: u32,
    /// Human-readable device name.
    pub name: String,
    /// Compute unit count reported by the driver layer.
    pub compute_units: u32,
}

// ===============================================================================================
// Discovery
// ===============================================================================================

/// Enumerates the devices the built-in driver can serve.
///
/// The host CPU is always present, exposed through the OpenCL backend in the
/// manner of a POCL-style CPU driver. One GPU entry is added per DRM render
/// node found in sysfs; a machine without render nodes simply has no GPU
/// devices.
///
/// # Errors
/// Currently infallible in practice; the signature reserves the error path
/// for driver layers that can fail to open their control device.
pub fn discover_devices() -> UsmResult<Vec<DeviceInfo>> {
    let mut devices = Vec::new();

    let cores = sysfs::cpu_core_count();
    devices.push(DeviceInfo {
        id: 0,
        backend: Backend::OpenCl,
        class: DeviceClass::Cpu,
        index: 0,
        name: format!("Software CPU driver ({cores} cores)"),
        compute_units: cores,
    });

    for (gpu_index, node) in sysfs::render_nodes().into_iter().enumerate() {
        let name = match sysfs::render_node_driver(&node) {
            Some(driver) => format!("{node} ({driver})"),
            None => node,
        };

        devices.push(DeviceInfo {
            id: devices.len() as u32,
            backend: Backend::OpenCl,
            class: DeviceClass::Gpu,
            index: gpu_index as u32,
            name,
            compute_units: 1,
        });
    }

    Ok(devices)
}

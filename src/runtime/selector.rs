use crate::driver::{Backend, DeviceClass, DeviceInfo};
use crate::error::UsmError;
use std::fmt;
use std::str::FromStr;

/// A parsed device filter of the form `"<backend>:<class>:<index>"`.
///
/// The backend and index components are optional: `"gpu"`, `"cpu:1"`, and
/// `"opencl:gpu:0"` are all valid. A missing index selects index 0 within
/// the matching (backend, class) group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSelector {
    pub backend: Option<Backend>,
    pub class: DeviceClass,
    pub index: u32,
}

impl DeviceSelector {
    /// Whether `dev` satisfies this filter.
    #[must_use]
    pub fn matches(&self, dev: &DeviceInfo) -> bool {
        if let Some(backend) = self.backend
            && backend != dev.backend
        {
            return false;
        }

        self.class == dev.class && self.index == dev.index
    }
}

impl FromStr for DeviceSelector {
    type Err = UsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UsmError::InvalidSelector(s.to_string());
        let tokens: Vec<&str> = s.split(':').map(str::trim).collect();

        let (backend, class_token, index_token) = match tokens.as_slice() {
            [class] => (None, *class, None),
            [first, second] => {
                // Two tokens are either "backend:class" or "class:index".
                if let Some(backend) = Backend::parse(first) {
                    (Some(backend), *second, None)
                } else {
                    (None, *first, Some(*second))
                }
            }
            [backend, class, index] => {
                (Some(Backend::parse(backend).ok_or_else(invalid)?), *class, Some(*index))
            }
            _ => return Err(invalid()),
        };

        let class = DeviceClass::parse(class_token).ok_or_else(invalid)?;
        let index = match index_token {
            Some(token) => token.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };

        Ok(Self {
            backend,
            class,
            index,
        })
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.backend {
            Some(backend) => write!(f, "{}:{}:{}", backend, self.class, self.index),
            None => write!(f, "{}:{}", self.class, self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu0() -> DeviceInfo {
        DeviceInfo {
            id: 0,
            backend: Backend::OpenCl,
            class: DeviceClass::Cpu,
            index: 0,
            name: "cpu".to_string(),
            compute_units: 4,
        }
    }

    #[test]
    fn full_selector() {
        let sel: DeviceSelector = "opencl:cpu:0".parse().unwrap();
        assert_eq!(sel.backend, Some(Backend::OpenCl));
        assert_eq!(sel.class, DeviceClass::Cpu);
        assert_eq!(sel.index, 0);
        assert!(sel.matches(&cpu0()));
    }

    #[test]
    fn class_only_defaults_to_index_zero() {
        let sel: DeviceSelector = "gpu".parse().unwrap();
        assert_eq!(sel.backend, None);
        assert_eq!(sel.class, DeviceClass::Gpu);
        assert_eq!(sel.index, 0);
    }

    #[test]
    fn class_and_index() {
        let sel: DeviceSelector = "cpu:1".parse().unwrap();
        assert_eq!(sel.backend, None);
        assert_eq!(sel.index, 1);
        assert!(!sel.matches(&cpu0()));
    }

    #[test]
    fn backend_and_class() {
        let sel: DeviceSelector = "opencl:gpu".parse().unwrap();
        assert_eq!(sel.backend, Some(Backend::OpenCl));
        assert_eq!(sel.class, DeviceClass::Gpu);
        assert_eq!(sel.index, 0);
    }

    #[test]
    fn backend_mismatch_rejects() {
        let sel: DeviceSelector = "cuda:cpu:0".parse().unwrap();
        assert!(!sel.matches(&cpu0()));
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        for bad in ["", "opencl", "opencl:cpu:x", "opencl:cpu:0:0", "fpga:0"] {
            assert!(
                bad.parse::<DeviceSelector>().is_err(),
                "selector {bad:?} should not parse"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for text in ["opencl:cpu:0", "cpu:1", "opencl:gpu:2"] {
            let sel: DeviceSelector = text.parse().unwrap();
            let again: DeviceSelector = sel.to_string().parse().unwrap();
            assert_eq!(sel, again);
        }
    }
}

// crates/platerec-core/src/version.rs

use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// Engine release version. Ordering is lexicographic on (major, minor, patch).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Version of the engine crate linked into this binary.
    pub fn imported() -> Self {
        Self {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parses `M`, `M.m` or `M.m.p`; missing components are zero.
impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(format!("bad version {s:?}"));
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| format!("bad version {s:?}"))?;
        }
        Ok(Version::new(nums[0], nums[1], nums[2]))
    }
}

/// What this engine build can do. Callers negotiate against it at startup.
#[derive(Clone, Debug)]
pub struct Capabilities {
    pub version: Version,
}

impl Capabilities {
    pub fn current() -> Self {
        Self {
            version: Version::imported(),
        }
    }

    pub fn require(&self, min: Version) -> Result<()> {
        if self.version < min {
            return Err(EngineError::VersionTooOld {
                found: self.version,
                required: min,
            });
        }
        Ok(())
    }
}

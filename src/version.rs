//! Per-module version reporting
//!
//! Every backend module reports a version triple. Modules that ship as
//! uncompiled stubs report the sentinel `1.0.0 (not compiled)` instead of a
//! real version, so callers can distinguish a stub from a functional module
//! without triggering its error path.

use std::fmt;

/// Version of one backend module
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
    /// Extra tag; `"not compiled"` marks a stub module
    pub tag: &'static str,
}

impl Version {
    /// Sentinel reported by stub modules
    pub const fn not_compiled() -> Self {
        Self {
            major: 1,
            minor: 0,
            patch: 0,
            tag: "not compiled",
        }
    }

    /// True if this module is a stub
    pub fn is_compiled(&self) -> bool {
        self.tag != "not compiled"
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.tag.is_empty() {
            write!(f, " ({})", self.tag)?;
        }
        Ok(())
    }
}

fn crate_version(tag: &'static str) -> Version {
    // CARGO_PKG_VERSION_* are always valid integers
    Version {
        major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
        minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
        patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        tag,
    }
}

/// Version of the core module
pub fn core_version() -> Version {
    crate_version("")
}

/// Version of the reference backend
pub fn reference_version() -> Version {
    crate_version("")
}

/// Version of the host-parallel backend
pub fn host_parallel_version() -> Version {
    crate_version("")
}

/// Version of the accelerator backend (stub in this build)
pub fn accelerator_version() -> Version {
    Version::not_compiled()
}

/// Version of the distributed backend (stub in this build)
pub fn distributed_version() -> Version {
    Version::not_compiled()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_modules_report_not_compiled() {
        assert!(!accelerator_version().is_compiled());
        assert!(!distributed_version().is_compiled());
        assert_eq!(accelerator_version().to_string(), "1.0.0 (not compiled)");
    }

    #[test]
    fn compiled_modules_report_crate_version() {
        assert!(core_version().is_compiled());
        assert_eq!(core_version(), reference_version());
    }
}

//! Raw reads from the kernel pseudo-filesystems.
//!
//! All paths are derived from a [`Sources`] value so that a synthetic tree
//! (tests, fixtures, containers with bind-mounted hosts) can stand in for
//! the live `/proc` and `/sys`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_SYS_ROOT: &str = "/sys";

/// Roots of the procfs and sysfs trees the probe reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sources {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            sys_root: PathBuf::from(DEFAULT_SYS_ROOT),
        }
    }
}

impl Sources {
    pub fn new(proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            sys_root: sys_root.into(),
        }
    }

    /// `<proc>/cpuinfo`
    pub fn cpuinfo(&self) -> PathBuf {
        self.proc_root.join("cpuinfo")
    }

    /// `<proc>/stat`
    pub fn stat(&self) -> PathBuf {
        self.proc_root.join("stat")
    }

    /// `<sys>/devices/system/cpu`
    pub fn cpu_root(&self) -> PathBuf {
        self.sys_root.join("devices/system/cpu")
    }

    /// `<sys>/devices/system/cpu/cpu<N>`
    pub fn cpu_dir(&self, core: i64) -> PathBuf {
        self.cpu_root().join(format!("cpu{core}"))
    }

    /// `<sys>/devices/system/cpu/cpufreq/policy<N>`
    pub fn cpufreq_policy_dir(&self, core: i64) -> PathBuf {
        self.cpu_root().join("cpufreq").join(format!("policy{core}"))
    }

    /// `<sys>/devices/system/cpu/cpu<N>/topology/core_id`
    pub fn core_id(&self, core: i64) -> PathBuf {
        self.cpu_dir(core).join("topology/core_id")
    }
}

/// Reads a whole pseudo-file. Missing or unreadable files yield `None`.
pub fn read_text(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => {
            trace!("Read {} bytes from {}", content.len(), path.display());
            Some(content)
        }
        Err(e) => {
            debug!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

/// Reads a single-integer pseudo-file such as `scaling_max_freq`.
///
/// Only the first whitespace-separated token is considered.
pub fn read_integer(path: &Path) -> Option<i64> {
    let content = read_text(path)?;
    let token = content.split_whitespace().next()?;
    match token.parse::<i64>() {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Unparsable integer in {}: {:?} ({})", path.display(), token, e);
            None
        }
    }
}

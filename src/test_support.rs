//! Helpers shared by the unit tests of several modules.

use crate::config::Config;
use crate::env::Environment;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serializes tests that read or change the process working directory.
pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Restores the process working directory when dropped.
pub(crate) struct CwdGuard {
    original: PathBuf,
}

impl CwdGuard {
    pub(crate) fn new() -> Self {
        Self {
            original: std::env::current_dir().unwrap(),
        }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// An environment working in `dir`, keeping its history in `dir/history.txt`
/// and looking programs up in `bin_dir`.
pub(crate) fn env_in(dir: &Path, bin_dir: &Path) -> Environment {
    let mut config = Config::for_start_dir(dir);
    config.bin_dir = bin_dir.to_path_buf();
    Environment {
        vars: std::env::vars().collect::<HashMap<_, _>>(),
        current_dir: dir.to_path_buf(),
        should_exit: false,
        config,
    }
}

/// Directory holding symlinks to the named system programs, so tests don't
/// depend on whether a distribution ships them in `/bin` or `/usr/bin`.
pub(crate) fn bin_dir_with(programs: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for program in programs {
        let source = ["/usr/bin", "/bin"]
            .iter()
            .map(|d| Path::new(d).join(program))
            .find(|p| p.is_file())
            .unwrap_or_else(|| panic!("{} not installed", program));
        std::os::unix::fs::symlink(source, dir.path().join(program)).unwrap();
    }
    dir
}

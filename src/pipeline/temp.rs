//! Scoped temporary directories with a process-wide cleanup hook.
//!
//! Build tools write their reports into a [`ScopedTempDir`]. The directory
//! is removed when the handle drops; the registry catches the ones a Ctrl-C
//! would otherwise leave behind.

use crate::error::{DepBomError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Exit status used after an interrupt (128 + SIGINT)
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn registry() -> MutexGuard<'static, Vec<PathBuf>> {
    static REGISTRY: OnceLock<Mutex<Vec<PathBuf>>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Mutex::new(Vec::new()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A temporary directory that is deleted on drop and tracked until then.
#[derive(Debug)]
pub struct ScopedTempDir {
    dir: TempDir,
}

impl ScopedTempDir {
    /// Create a new directory with the `depbom-` prefix.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("depbom-")
            .tempdir()
            .map_err(|e| DepBomError::io(std::env::temp_dir(), e))?;
        registry().push(dir.path().to_path_buf());
        debug!("Created temp dir {}", dir.path().display());
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the directory
    #[must_use]
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Drop for ScopedTempDir {
    fn drop(&mut self) {
        let path = self.dir.path();
        registry().retain(|p| p != path);
    }
}

/// Remove every registered temp directory that still exists.
///
/// Returns the number of directories removed.
pub fn cleanup_registered() -> usize {
    let paths: Vec<PathBuf> = registry().drain(..).collect();
    remove_dirs(paths)
}

fn remove_dirs(paths: Vec<PathBuf>) -> usize {
    let mut removed = 0;
    for path in paths {
        if !path.exists() {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove temp dir {}: {e}", path.display()),
        }
    }
    removed
}

/// Number of temp directories currently alive
#[must_use]
pub fn registered_count() -> usize {
    registry().len()
}

/// Install a Ctrl-C handler that removes registered temp dirs and exits.
///
/// Installing twice is harmless; the second attempt is ignored.
pub fn install_interrupt_cleanup() {
    let installed = ctrlc::set_handler(|| {
        let removed = cleanup_registered();
        if removed > 0 {
            eprintln!("Interrupted; removed {removed} temporary director(ies)");
        }
        std::process::exit(INTERRUPTED_EXIT_CODE);
    });
    if let Err(e) = installed {
        debug!("Interrupt handler not installed: {e}");
    }
}

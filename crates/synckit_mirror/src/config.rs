//! Shared run configuration: roots, ignore set and the enabled flag.
//!
//! Writers (UI/CLI) and the scheduler thread share one [`RunConfig`]. Settings
//! are replaced as a whole `Arc` under a short write lock; a cycle clones the
//! current `Arc` once at its start and never sees later writes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::info;

use crate::filter::SpecIgnorePatterns;
use crate::spec::{EnumSchedulerState, Result};
use crate::util::{absolutize_path, validate_roots};

/// Immutable view of the settings one cycle runs with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSettings {
    /// Absolute source root.
    pub path_dir_src: PathBuf,
    /// Absolute target root.
    pub path_dir_dst: PathBuf,
    /// Compiled ignore patterns.
    pub spec_ignore: SpecIgnorePatterns,
}

impl SyncSettings {
    /// Settings with both roots absolutized.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        dir_src: P,
        dir_dst: Q,
        spec_ignore: SpecIgnorePatterns,
    ) -> Self {
        Self {
            path_dir_src: absolutize_path(dir_src.as_ref()),
            path_dir_dst: absolutize_path(dir_dst.as_ref()),
            spec_ignore,
        }
    }

    /// Check both roots exist, are directories and do not overlap.
    pub fn validate(&self) -> Result<()> {
        validate_roots(&self.path_dir_src, &self.path_dir_dst)
    }
}

#[derive(Debug, Default)]
struct RunConfigInner {
    settings: RwLock<Arc<SyncSettings>>,
    b_if_enabled: AtomicBool,
}

/// Cloneable handle to the process-wide run configuration.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    inner: Arc<RunConfigInner>,
}

impl RunConfig {
    /// Stopped configuration holding `settings`.
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            inner: Arc::new(RunConfigInner {
                settings: RwLock::new(Arc::new(settings)),
                b_if_enabled: AtomicBool::new(false),
            }),
        }
    }

    /// Current settings; the returned `Arc` is not affected by later writes.
    pub fn settings(&self) -> Arc<SyncSettings> {
        Arc::clone(&*self.inner.settings.read())
    }

    fn update<F: FnOnce(&mut SyncSettings)>(&self, apply: F) {
        let mut guard = self.inner.settings.write();
        let mut settings_next = (**guard).clone();
        apply(&mut settings_next);
        *guard = Arc::new(settings_next);
    }

    /// Replace the source root. Relative paths are resolved against the
    /// current directory.
    pub fn set_source_root<P: AsRef<Path>>(&self, dir_src: P) {
        let path_dir_src = absolutize_path(dir_src.as_ref());
        self.update(|s| s.path_dir_src = path_dir_src);
    }

    /// Replace the target root. Relative paths are resolved against the
    /// current directory.
    pub fn set_target_root<P: AsRef<Path>>(&self, dir_dst: P) {
        let path_dir_dst = absolutize_path(dir_dst.as_ref());
        self.update(|s| s.path_dir_dst = path_dir_dst);
    }

    /// Replace the ignore set.
    pub fn set_ignore_patterns(&self, spec_ignore: SpecIgnorePatterns) {
        self.update(|s| s.spec_ignore = spec_ignore);
    }

    /// Enable cycles after validating both roots.
    ///
    /// On error the state is left unchanged. Calling it while running only
    /// re-validates.
    pub fn start(&self) -> Result<()> {
        self.settings().validate()?;
        if !self.inner.b_if_enabled.swap(true, Ordering::SeqCst) {
            info!("Sync started");
        }
        Ok(())
    }

    /// Disable cycles from the next tick on. The in-flight cycle, if any,
    /// runs to completion.
    pub fn stop(&self) {
        if self.inner.b_if_enabled.swap(false, Ordering::SeqCst) {
            info!("Sync stopped");
        }
    }

    /// Whether cycles are enabled.
    pub fn is_running(&self) -> bool {
        self.inner.b_if_enabled.load(Ordering::SeqCst)
    }

    /// [`Self::is_running`] as a scheduler state.
    pub fn state(&self) -> EnumSchedulerState {
        if self.is_running() {
            EnumSchedulerState::Running
        } else {
            EnumSchedulerState::Stopped
        }
    }
}

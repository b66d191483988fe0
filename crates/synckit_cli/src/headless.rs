//! Non-interactive modes: `nogui` (poll until killed) and `once`.

use std::io::{self, Write};

use synckit_mirror::{
    RunConfig, Scheduler, SpecIgnorePatterns, SpecSchedulerOptions, SyncSettings,
    format_ignore_list, parse_ignore_list, plan_cycle, run_cycle,
};
use tracing::info;

use crate::error::{CliError, Result};
use crate::settings::SettingsStore;

/// Roots and ignore list given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RootArgs {
    pub source: Option<String>,
    pub target: Option<String>,
    pub ignore: Option<String>,
}

impl RootArgs {
    /// Fill unset values from the store and build the engine settings.
    ///
    /// Roots are validated before anything is written; only then are the
    /// explicit values persisted, the ignore list in its normalised form.
    pub fn resolve(&self, store: &mut SettingsStore) -> Result<SyncSettings> {
        let values = store.values();
        let source = self
            .source
            .clone()
            .or_else(|| values.source.clone())
            .ok_or_else(|| CliError::user("source folder is not set"))?;
        let target = self
            .target
            .clone()
            .or_else(|| values.target.clone())
            .ok_or_else(|| CliError::user("target folder is not set"))?;
        let l_patterns = parse_ignore_list(
            self.ignore
                .as_deref()
                .or(values.ignore.as_deref())
                .unwrap_or(""),
        );

        let settings = SyncSettings::new(
            &source,
            &target,
            SpecIgnorePatterns::new(l_patterns.clone()),
        );
        settings.validate()?;

        if self.source.is_some() {
            store.set_source(&source)?;
        }
        if self.target.is_some() {
            store.set_target(&target)?;
        }
        if self.ignore.is_some() {
            store.set_ignore(&format_ignore_list(&l_patterns))?;
        }
        Ok(settings)
    }
}

/// Validate roots, enable syncing and poll until the process is terminated.
pub fn run_nogui(settings: SyncSettings, options: SpecSchedulerOptions) -> Result<()> {
    let run_config = RunConfig::new(settings);
    run_config.start()?;

    let handle = Scheduler::spawn(run_config, options)?;
    handle.wait();
    Ok(())
}

/// Run a single cycle. With `b_if_dry_run`, print the plan instead of
/// applying it.
pub fn run_once(settings: &SyncSettings, b_if_dry_run: bool) -> Result<()> {
    settings.validate()?;

    let mut stdout = io::stdout().lock();
    if b_if_dry_run {
        let plan = plan_cycle(settings)?;
        for entry in &plan.to_delete {
            writeln!(stdout, "- {entry}")?;
        }
        for entry in &plan.to_add {
            writeln!(stdout, "+ {entry}")?;
        }
        info!(
            "Dry run: {} to add, {} to delete",
            plan.to_add.len(),
            plan.to_delete.len()
        );
        return Ok(());
    }

    let report = run_cycle(settings)?;
    for err in &report.errors {
        writeln!(stdout, "! {} ({})", err.path.display(), err.exception)?;
    }
    writeln!(stdout, "{report}")?;
    info!("Single cycle finished");
    Ok(())
}

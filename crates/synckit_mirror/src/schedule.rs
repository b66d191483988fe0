//! Poll cycle orchestration and the fixed-interval scheduler thread.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::apply::apply_plan;
use crate::config::{RunConfig, SyncSettings};
use crate::diff::diff_snapshots;
use crate::report::{ReportSync, ReportSyncBuilder};
use crate::snapshot::{build_snapshot, build_snapshot_with};
use crate::spec::{EnumSymlinkStrategy, Result, SpecSchedulerOptions, SpecSnapshot, SpecSyncPlan};

////////////////////////////////////////////////////////////////////////////////
// #region Cycle

/// Source links are followed; target links are listed as plain entries so a
/// cycle never reads, writes or deletes past the target root.
fn build_snapshots(settings: &SyncSettings) -> Result<(SpecSnapshot, SpecSnapshot)> {
    let snapshot_src = build_snapshot(&settings.path_dir_src)?;
    let snapshot_dst =
        build_snapshot_with(&settings.path_dir_dst, EnumSymlinkStrategy::ListSymlinks)?;
    Ok((snapshot_src, snapshot_dst))
}

/// Snapshot both roots and diff them, without touching the target.
pub fn plan_cycle(settings: &SyncSettings) -> Result<SpecSyncPlan> {
    let (snapshot_src, snapshot_dst) = build_snapshots(settings)?;
    Ok(diff_snapshots(
        &snapshot_src,
        &snapshot_dst,
        &settings.spec_ignore,
    ))
}

/// Run one full cycle: snapshot source, snapshot target, diff, apply.
///
/// `Err` means the cycle was abandoned before anything was applied (a root
/// could not be traversed). Per-entry apply failures are in the report.
pub fn run_cycle(settings: &SyncSettings) -> Result<ReportSync> {
    let (snapshot_src, snapshot_dst) = build_snapshots(settings)?;
    let plan = diff_snapshots(&snapshot_src, &snapshot_dst, &settings.spec_ignore);

    let mut builder_sync_report = ReportSyncBuilder::default();
    builder_sync_report.set_scanned(snapshot_src.len(), snapshot_dst.len());
    builder_sync_report.extend_warnings(snapshot_src.warnings.iter().cloned());
    builder_sync_report.extend_warnings(snapshot_dst.warnings.iter().cloned());

    if !plan.is_empty() {
        apply_plan(
            &plan,
            &snapshot_src,
            &settings.path_dir_src,
            &settings.path_dir_dst,
            &mut builder_sync_report,
        );
    }
    Ok(builder_sync_report.build())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Scheduler

/// Background poll loop driving [`run_cycle`].
#[derive(Debug)]
pub struct Scheduler;

impl Scheduler {
    /// Start the poll thread.
    ///
    /// Each tick sleeps `options.interval`, then runs one cycle with the
    /// settings current at that moment if `run_config` is running. Cycles
    /// never overlap. The thread exits when the returned handle is shut down
    /// or dropped.
    pub fn spawn(run_config: RunConfig, options: SpecSchedulerOptions) -> io::Result<SchedulerHandle> {
        let (tx_stop, rx_stop) = mpsc::channel::<()>();
        let cnt_cycles = Arc::new(AtomicU64::new(0));
        let cnt_cycles_thread = Arc::clone(&cnt_cycles);

        let handle_join = thread::Builder::new()
            .name("synckit-scheduler".to_string())
            .spawn(move || poll_loop(&run_config, &options, &rx_stop, &cnt_cycles_thread))?;

        Ok(SchedulerHandle {
            tx_stop: Some(tx_stop),
            handle_join: Some(handle_join),
            cnt_cycles,
        })
    }
}

fn is_stop_requested(rx_stop: &Receiver<()>) -> bool {
    matches!(rx_stop.try_recv(), Ok(()) | Err(TryRecvError::Disconnected))
}

fn poll_loop(
    run_config: &RunConfig,
    options: &SpecSchedulerOptions,
    rx_stop: &Receiver<()>,
    cnt_cycles: &AtomicU64,
) {
    info!("Listening...");
    loop {
        if is_stop_requested(rx_stop) {
            break;
        }
        match rx_stop.recv_timeout(options.interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        if is_stop_requested(rx_stop) {
            break;
        }
        if !run_config.is_running() {
            continue;
        }

        let settings = run_config.settings();
        match run_cycle(&settings) {
            Ok(report) => debug!("{report}"),
            Err(e) => warn!("Cycle skipped: {e}"),
        }
        cnt_cycles.fetch_add(1, Ordering::SeqCst);
    }
    debug!("Scheduler thread exiting");
}

/// Owner of the scheduler thread.
#[derive(Debug)]
pub struct SchedulerHandle {
    tx_stop: Option<Sender<()>>,
    handle_join: Option<JoinHandle<()>>,
    cnt_cycles: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Cycles executed so far (including abandoned ones).
    pub fn cycles(&self) -> u64 {
        self.cnt_cycles.load(Ordering::SeqCst)
    }

    /// Signal the thread and wait for the in-flight cycle, if any, to finish.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    /// Block until the thread exits without signalling it.
    pub fn wait(mut self) {
        if let Some(handle_join) = self.handle_join.take()
            && handle_join.join().is_err()
        {
            warn!("Scheduler thread panicked");
        }
    }

    fn stop_and_join(&mut self) {
        if let Some(tx_stop) = self.tx_stop.take() {
            let _ = tx_stop.send(());
        }
        if let Some(handle_join) = self.handle_join.take()
            && handle_join.join().is_err()
        {
            warn!("Scheduler thread panicked");
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

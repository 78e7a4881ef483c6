//! Periodic driver of the pipeline.
//!
//! A cycle never starts while another is still running; the overlapping
//! trigger is skipped.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::pipeline::{CycleReport, Pipeline};
use crate::config::SchedulerConfig;

/// Whether a cycle is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next tick.
    Idle,
    /// A cycle is running.
    Running,
}

/// Result of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The cycle ran to completion.
    Completed(CycleReport),
    /// The cycle aborted with an error.
    Failed(String),
    /// Another cycle was running.
    Skipped,
}

/// Runs the pipeline on a fixed interval.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    interval: Duration,
    first_delay: Duration,
    running: Mutex<()>,
}

impl Scheduler {
    /// Create a scheduler from the configuration.
    pub fn new(pipeline: Arc<Pipeline>, config: &SchedulerConfig) -> Self {
        Self {
            pipeline,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            first_delay: Duration::from_secs(config.first_delay_secs),
            running: Mutex::new(()),
        }
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        match self.running.try_lock() {
            Ok(_) => SchedulerState::Idle,
            Err(_) => SchedulerState::Running,
        }
    }

    /// Run one cycle unless one is already running.
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Previous cycle still running, skipping this tick");
            return TickOutcome::Skipped;
        };

        debug!("Cycle started");
        match self.pipeline.run_cycle().await {
            Ok(report) => TickOutcome::Completed(report),
            Err(e) => {
                error!("Cycle failed: {}", e);
                TickOutcome::Failed(e.to_string())
            }
        }
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    ///
    /// A running cycle is finished before the loop exits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Scheduler started (interval: {} seconds, first cycle in {} seconds)",
            self.interval.as_secs(),
            self.first_delay.as_secs()
        );

        let mut timer = interval_at(Instant::now() + self.first_delay, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = timer.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Scheduler stopped");
    }
}

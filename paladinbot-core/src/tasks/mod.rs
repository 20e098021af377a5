// paladinbot-core/src/tasks/mod.rs

pub mod catalog_sync;
pub mod cooldown_sweep;
pub mod go_live_reminder;
pub mod token_refresh;

use std::future::Future;
use std::time::Duration;
use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Owns the periodic maintenance tasks. Every task exits once the shared
/// shutdown flag flips.
pub struct Scheduler {
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<(String, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new(shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    /// Runs `job` every `period`, first tick one period from now. A tick
    /// that fires while the previous run is still going is skipped.
    pub fn every<F, Fut>(&mut self, name: &str, period: Duration, job: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let task_name = name.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(task = %task_name, ?period, "scheduled task started");

            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!(task = %task_name, "running scheduled task");
                        job().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(task = %task_name, "scheduled task stopped");
        });

        self.handles.push((name.to_string(), handle));
    }

    /// Runs `job` once a day at wall-clock time `at` in `tz`. The delay is
    /// recomputed after every run so DST shifts are followed.
    pub fn daily_at<F, Fut>(&mut self, name: &str, tz: Tz, at: NaiveTime, job: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let task_name = name.to_string();

        let handle = tokio::spawn(async move {
            debug!(task = %task_name, %at, %tz, "daily task started");
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                let now = Utc::now();
                let next = next_daily_run(now, tz, at);
                let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
                debug!(task = %task_name, next_run = %next, "daily task waiting");

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        debug!(task = %task_name, "running daily task");
                        job().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(task = %task_name, "daily task stopped");
        });

        self.handles.push((name.to_string(), handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every task to observe the shutdown flag.
    pub async fn shutdown_and_join(self) {
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(task = %name, "scheduled task panicked: {}", e);
            }
        }
        info!("scheduler stopped");
    }
}

/// First instant strictly after `now` whose local time in `tz` is `at`.
/// A local time skipped by a DST jump moves to the next day; an ambiguous
/// one resolves to its earlier instant.
pub fn next_daily_run(now: DateTime<Utc>, tz: Tz, at: NaiveTime) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    (0..=2u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|day| tz.from_local_datetime(&day.and_time(at)).earliest())
        .map(|local| local.with_timezone(&Utc))
        .find(|candidate| *candidate > now)
        .unwrap_or(now + chrono::Duration::days(1))
}

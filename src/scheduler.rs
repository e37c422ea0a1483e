//! Live-refresh and playback timers.
//!
//! At most one timer runs at a time: starting either kind replaces whatever
//! was running. A timer task awaits each tick to completion before it waits
//! for the next interval, and every tick goes through the orchestrator's
//! assessment gate, so two assessments never overlap. Stopping sends a
//! signal that the task observes before its next tick; an in-flight tick is
//! allowed to finish and render.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::assess::{AssessOptions, Orchestrator};
use crate::error::Result;
use crate::logging::{log_tick_failure, log_timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    LiveRefresh,
    Playback,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::LiveRefresh => "live_refresh",
            TimerKind::Playback => "playback",
        }
    }
}

struct TimerHandle {
    stop: watch::Sender<bool>,
    interval: Duration,
    _task: JoinHandle<()>,
}

pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    timers: Mutex<HashMap<TimerKind, TimerHandle>>,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Re-assess the active cell every `interval`. Must be called inside a
    /// tokio runtime.
    pub fn start_live(&self, interval: Duration) {
        self.start(TimerKind::LiveRefresh, interval);
    }

    /// Step the simulator by the session's step size, then re-assess, every
    /// `interval`.
    pub fn start_playback(&self, interval: Duration) {
        self.start(TimerKind::Playback, interval);
    }

    /// Stop one timer. The last rendered state stays on screen.
    pub fn stop(&self, kind: TimerKind) -> bool {
        let removed = self.lock_timers().remove(&kind);
        match removed {
            Some(handle) => {
                let _ = handle.stop.send(true);
                log_timer(kind.as_str(), "stopped", handle.interval.as_millis() as u64);
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        for kind in [TimerKind::LiveRefresh, TimerKind::Playback] {
            self.stop(kind);
        }
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.lock_timers().contains_key(&kind)
    }

    pub fn active_timers(&self) -> Vec<TimerKind> {
        let timers = self.lock_timers();
        [TimerKind::LiveRefresh, TimerKind::Playback]
            .into_iter()
            .filter(|k| timers.contains_key(k))
            .collect()
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<TimerKind, TimerHandle>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn start(&self, kind: TimerKind, interval: Duration) {
        // Clear the same kind first, then the other mode.
        self.stop(kind);
        for other in [TimerKind::LiveRefresh, TimerKind::Playback] {
            if other != kind {
                self.stop(other);
            }
        }

        let interval = interval.max(Duration::from_millis(1));
        let (stop_tx, stop_rx) = watch::channel(false);
        let orchestrator = self.orchestrator.clone();
        let task = tokio::spawn(run_timer(kind, interval, stop_rx, orchestrator));

        self.lock_timers().insert(
            kind,
            TimerHandle {
                stop: stop_tx,
                interval,
                _task: task,
            },
        );
        log_timer(kind.as_str(), "started", interval.as_millis() as u64);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn run_timer(kind: TimerKind, period: Duration, mut stop_rx: watch::Receiver<bool>, orchestrator: Arc<Orchestrator>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }
        if *stop_rx.borrow() {
            break;
        }
        if let Err(err) = tick(kind, &orchestrator).await {
            log_tick_failure(kind.as_str(), &err);
        }
    }
}

/// One tick. Errors are returned to the timer loop, which logs and drops them.
pub async fn tick(kind: TimerKind, orchestrator: &Orchestrator) -> Result<()> {
    if kind == TimerKind::Playback {
        let (scenario_id, minutes) = {
            let s = orchestrator.session().lock();
            (s.scenario_id.clone(), s.step_minutes)
        };
        orchestrator.services().simulator.step(&scenario_id, minutes).await?;
    }
    orchestrator
        .assess_active(AssessOptions { force_agent: false })
        .await?;
    Ok(())
}

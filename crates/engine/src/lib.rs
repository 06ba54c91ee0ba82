//! Fixed-step driver between a host and a [`Session`].
//!
//! The host owns the clock and the presentation. It hands intents to the driver with
//! [`Driver::send_intent`] / [`Driver::request_reset`] and calls [`Driver::advance`]
//! with wall-clock elapsed time; the driver replays queued commands in order, runs the
//! session in whole `tick_ms` steps, and hands changed snapshots to a [`SnapshotSink`].
//!
//! ```
//! use arcade_blocks_core::{GameSnapshot, Session};
//! use arcade_blocks_engine::{Driver, DriverConfig};
//! use arcade_blocks_types::Intent;
//!
//! let mut driver = Driver::new(Session::new(7), DriverConfig::default());
//! let mut frames = Vec::new();
//!
//! driver.send_intent(Intent::HardDrop);
//! driver.advance(16, &mut |snap: &GameSnapshot| frames.push(*snap));
//!
//! assert_eq!(frames.len(), 1);
//! ```

use std::collections::VecDeque;

use tracing::{debug, info};

use arcade_blocks_core::{GameSnapshot, PieceSource, RandomPieces, Session};
use arcade_blocks_types::{Intent, Status, TICK_MS};

pub use arcade_blocks_core as core;
pub use arcade_blocks_types as types;

/// Default cap on session steps per [`Driver::advance`] call
pub const MAX_CATCH_UP_STEPS: u32 = 8;

/// Receives snapshots published by a driver
pub trait SnapshotSink {
    fn on_snapshot(&mut self, snapshot: &GameSnapshot);
}

impl<F: FnMut(&GameSnapshot)> SnapshotSink for F {
    fn on_snapshot(&mut self, snapshot: &GameSnapshot) {
        self(snapshot)
    }
}

/// Queued host request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Intent(Intent),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Session step length in milliseconds
    pub tick_ms: u32,
    /// Steps beyond this per advance call are dropped (host stalled)
    pub max_catch_up_steps: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            max_catch_up_steps: MAX_CATCH_UP_STEPS,
        }
    }
}

/// Owns one session and paces it
#[derive(Debug)]
pub struct Driver<S = RandomPieces> {
    session: Session<S>,
    config: DriverConfig,
    pending: VecDeque<Command>,
    accumulator_ms: u32,
    last_published: Option<GameSnapshot>,
    last_status: Status,
}

impl<S: PieceSource> Driver<S> {
    pub fn new(session: Session<S>, config: DriverConfig) -> Self {
        let last_status = session.status();
        Self {
            session,
            config: DriverConfig {
                tick_ms: config.tick_ms.max(1),
                max_catch_up_steps: config.max_catch_up_steps.max(1),
            },
            pending: VecDeque::new(),
            accumulator_ms: 0,
            last_published: None,
            last_status,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn config(&self) -> DriverConfig {
        self.config
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.session.snapshot()
    }

    /// Number of commands waiting for the next advance
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue an intent for the next [`advance`](Self::advance)
    pub fn send_intent(&mut self, intent: Intent) {
        self.pending.push_back(Command::Intent(intent));
    }

    /// Queue a reset for the next [`advance`](Self::advance)
    pub fn request_reset(&mut self) {
        self.pending.push_back(Command::Reset);
    }

    /// Apply every queued command in FIFO order. Returns how many ran.
    pub fn execute_pending(&mut self) -> usize {
        let count = self.pending.len();
        while let Some(command) = self.pending.pop_front() {
            match command {
                Command::Intent(intent) => {
                    self.session.apply_intent(intent);
                }
                Command::Reset => {
                    self.session.reset();
                    self.accumulator_ms = 0;
                }
            }
            self.observe();
        }
        count
    }

    /// Run queued commands, then as many whole steps as `elapsed_ms` covers, then publish
    /// the snapshot if it changed. Returns the number of steps run.
    pub fn advance(&mut self, elapsed_ms: u32, sink: &mut impl SnapshotSink) -> u32 {
        self.execute_pending();

        self.accumulator_ms = self.accumulator_ms.saturating_add(elapsed_ms);
        let mut steps = self.accumulator_ms / self.config.tick_ms;
        if steps > self.config.max_catch_up_steps {
            debug!(
                dropped = steps - self.config.max_catch_up_steps,
                "driver_catch_up_capped"
            );
            steps = self.config.max_catch_up_steps;
            self.accumulator_ms %= self.config.tick_ms;
        } else {
            self.accumulator_ms -= steps * self.config.tick_ms;
        }

        for _ in 0..steps {
            self.session.tick(self.config.tick_ms);
            self.observe();
        }

        let snapshot = self.session.snapshot();
        if self.last_published.as_ref() != Some(&snapshot) {
            sink.on_snapshot(&snapshot);
            self.last_published = Some(snapshot);
        }
        steps
    }

    /// Publish the current snapshot unconditionally
    pub fn publish(&mut self, sink: &mut impl SnapshotSink) -> GameSnapshot {
        let snapshot = self.session.snapshot();
        sink.on_snapshot(&snapshot);
        self.last_published = Some(snapshot);
        snapshot
    }

    fn observe(&mut self) {
        if let Some(event) = self.session.take_last_event() {
            if event.lines_cleared > 0 {
                debug!(
                    lines = event.lines_cleared,
                    points = event.points,
                    level_up = event.level_up,
                    "lines_cleared"
                );
            }
        }

        let status = self.session.status();
        if status != self.last_status {
            info!(
                from = self.last_status.as_str(),
                to = status.as_str(),
                score = self.session.score(),
                lines = self.session.lines(),
                "status_changed"
            );
            self.last_status = status;
        }
    }
}

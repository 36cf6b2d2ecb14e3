//! Frame Driver
//!
//! Fixed-rate async loop around a [`MatchSession`]: sample input, run one
//! frame, hand the result to the presenter. Stops on the shutdown signal,
//! when the presenter asks to, or when the session is left.

use std::ops::ControlFlow;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::game::input::InputSample;
use crate::game::state::FrameView;
use crate::network::session::{FrameReport, MatchSession};

/// Frame loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Frames per second
    pub tick_rate_hz: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { tick_rate_hz: 60 }
    }
}

impl DriverConfig {
    /// Time between frames.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.tick_rate_hz.max(1) as u64)
    }
}

/// Produces this device's input once per frame.
pub trait InputSource: Send {
    /// Sample input for the coming frame. `view` is the last presented frame.
    fn sample(&mut self, frame: u64, view: FrameView<'_>) -> InputSample;
}

/// Consumes each finished frame (renderer, UI, recorder).
pub trait FrameSink: Send {
    /// Present a frame. Return `Break` to stop the loop.
    fn present(&mut self, session: &mut MatchSession, report: &FrameReport) -> ControlFlow<()>;
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown signal received
    Shutdown,
    /// Presenter asked to stop
    Presenter,
    /// Session was left
    Left,
}

/// Drive `session` until stopped. Returns why it stopped.
pub async fn run(
    session: &mut MatchSession,
    input: &mut dyn InputSource,
    sink: &mut dyn FrameSink,
    config: &DriverConfig,
    mut shutdown: watch::Receiver<bool>,
) -> StopReason {
    let mut ticker = interval(config.frame_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(mode = ?session.mode(), tick_rate = config.tick_rate_hz, "Frame loop started");

    let reason = loop {
        if !session.is_active() {
            break StopReason::Left;
        }
        if *shutdown.borrow() {
            break StopReason::Shutdown;
        }

        tokio::select! {
            _ = ticker.tick() => {
                let sample = input.sample(session.frame_count() + 1, session.view());
                let report = session.frame(sample);
                if sink.present(session, &report).is_break() {
                    break StopReason::Presenter;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break StopReason::Shutdown;
                }
            }
        }
    };

    if reason != StopReason::Left {
        session.leave();
    }
    debug!(?reason, frames = session.frame_count(), "Frame loop stopped");
    reason
}

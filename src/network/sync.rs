//! Host-Authoritative Sync
//!
//! The host simulates and broadcasts a full snapshot every tick; the client
//! forwards its raw input every tick and overwrites its mirror with whatever
//! snapshot arrives. There is no prediction and no reconciliation: a late or
//! reordered snapshot simply overwrites, and any drift lasts until the next
//! one.

use tracing::{debug, info};

use crate::game::input::InputFrame;
use crate::game::state::SimulationState;
use crate::network::protocol::{InputPayload, NetMessage, StateSnapshot};

/// Host side: remembers the client's last input and builds snapshots.
#[derive(Debug, Default)]
pub struct HostSync {
    remote_input: Option<InputFrame>,
    inputs_received: u64,
}

impl HostSync {
    /// Create with no remote input yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an INPUT from the client. Replaces the previous one.
    pub fn on_input(&mut self, payload: &InputPayload) {
        if self.remote_input.is_none() {
            info!("First remote input received");
        }
        self.remote_input = Some(payload.to_input_frame());
        self.inputs_received += 1;
    }

    /// Last known remote input, or an idle frame if nothing arrived yet.
    pub fn remote_input(&self) -> InputFrame {
        self.remote_input.unwrap_or_default()
    }

    /// Whether the client has sent anything yet.
    pub fn has_remote_input(&self) -> bool {
        self.remote_input.is_some()
    }

    /// INPUT messages received so far.
    pub fn inputs_received(&self) -> u64 {
        self.inputs_received
    }

    /// STATE message for the current simulation.
    pub fn snapshot(&self, state: &SimulationState) -> NetMessage {
        NetMessage::State(StateSnapshot::capture(state))
    }
}

/// Client side: applies snapshots to the local mirror.
#[derive(Debug, Default)]
pub struct ClientMirror {
    last_tick: Option<u32>,
    applied: u64,
    out_of_order: u64,
}

impl ClientMirror {
    /// Create an empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the mirrored bodies and bullets with `snapshot`.
    ///
    /// Applied regardless of tick order.
    pub fn apply(&mut self, state: &mut SimulationState, snapshot: &StateSnapshot) {
        if let Some(last) = self.last_tick {
            if snapshot.tick < last {
                self.out_of_order += 1;
                debug!(last, tick = snapshot.tick, "Applying out-of-order snapshot");
            }
        }

        state.tick = snapshot.tick;
        snapshot.p1.apply(&mut state.p1);
        snapshot.p2.apply(&mut state.p2);
        state.projectiles.clone_from(&snapshot.bullets);
        state.round_ended = snapshot.round_ended;
        state.screen_shake = snapshot.screen_shake;

        self.last_tick = Some(snapshot.tick);
        self.applied += 1;
    }

    /// INPUT message for this device's controls.
    pub fn input_message(&self, frame: &InputFrame) -> NetMessage {
        NetMessage::Input(InputPayload::from(frame))
    }

    /// Snapshots applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Snapshots that arrived with an older tick than the previous one.
    pub fn out_of_order(&self) -> u64 {
        self.out_of_order
    }

    /// Start a new round: tick numbering restarts.
    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}

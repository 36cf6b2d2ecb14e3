//! Match Session
//!
//! Owns one match end to end: the simulation, the round controller, the
//! card dealer and the link to the peer. In `Local` and `Host` mode it is
//! the authoritative writer; in `Client` mode it only mirrors what the host
//! sends and forwards this device's input.

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::rng::derive_seed;
use crate::game::cards::{CardDealer, CardSource};
use crate::game::events::GameEvent;
use crate::game::input::{ControlScheme, InputSample};
use crate::game::round::{RoundController, RoundError, RoundPhase, RoundTransition, Session};
use crate::game::state::{FrameView, Side, SimulationState};
use crate::game::stats::Card;
use crate::game::tick::{tick, MatchConfig};
use crate::network::dispatch::{Dispatcher, MessageListener};
use crate::network::protocol::NetMessage;
use crate::network::sync::{ClientMirror, HostSync};
use crate::network::transport::{MessageQueue, Transport};

/// Session errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Round-flow operation invalid in the current phase.
    #[error("Round error: {0}")]
    Round(#[from] RoundError),

    /// Only the host or a local session may drive the match.
    #[error("Not authoritative")]
    NotAuthoritative,

    /// This device does not control the side that has to act.
    #[error("{0} is not controlled here")]
    WrongSide(Side),
}

/// Who simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetMode {
    /// Both players on this device.
    Local,
    /// Authoritative peer, plays p1.
    Host,
    /// Mirroring peer, plays p2.
    Client,
}

impl NetMode {
    /// Whether this side runs the simulation.
    pub fn is_authoritative(self) -> bool {
        !matches!(self, NetMode::Client)
    }

    /// Side controlled by this device's primary input, if only one.
    pub fn local_side(self) -> Option<Side> {
        match self {
            NetMode::Local => None,
            NetMode::Host => Some(Side::P1),
            NetMode::Client => Some(Side::P2),
        }
    }
}

/// What happened during one frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Frame number
    pub frame: u64,
    /// Simulation events (authoritative side only)
    pub events: Vec<GameEvent>,
    /// Round decided this frame
    pub round_winner: Option<Side>,
    /// Post-round state exposed this frame
    pub transition: Option<RoundTransition>,
    /// A new round started this frame
    pub new_round: bool,
}

/// A running match.
pub struct MatchSession {
    mode: NetMode,
    config: MatchConfig,
    room: String,
    state: SimulationState,
    rounds: RoundController,
    dealer: CardDealer,
    transport: Option<Box<dyn Transport>>,
    outbox: MessageQueue,
    host_sync: HostSync,
    mirror: ClientMirror,
    dispatcher: Dispatcher,
    frame: u64,
    active: bool,
    disconnected: bool,
    status: String,
}

impl MatchSession {
    /// Create a session. `transport` is ignored in `Local` mode.
    pub fn new(mode: NetMode, config: MatchConfig, transport: Option<Box<dyn Transport>>) -> Self {
        let rounds = RoundController::new(config.target_wins, config.round_end_grace_frames);
        let dealer = CardDealer::from_seed(config.seed);
        let room = Uuid::new_v4().to_string();
        let transport = if mode == NetMode::Local { None } else { transport };

        let status = match (mode, transport.is_some()) {
            (NetMode::Local, _) => "Local match",
            (NetMode::Host, true) => "Hosting",
            (NetMode::Client, true) => "Connected to host",
            (_, false) => "Not connected",
        };

        let mut session = Self {
            mode,
            state: build_state(&config, &room, rounds.session()),
            config,
            room,
            rounds,
            dealer,
            transport,
            outbox: MessageQueue::new(),
            host_sync: HostSync::new(),
            mirror: ClientMirror::new(),
            dispatcher: Dispatcher::new(),
            frame: 0,
            active: true,
            disconnected: false,
            status: status.to_string(),
        };

        info!(mode = ?mode, room = %session.room, "Match session created");
        session.announce_session();
        session
    }

    /// Both players on this device.
    pub fn local(config: MatchConfig) -> Self {
        Self::new(NetMode::Local, config, None)
    }

    /// Authoritative host over `transport`.
    pub fn host(config: MatchConfig, transport: Box<dyn Transport>) -> Self {
        Self::new(NetMode::Host, config, Some(transport))
    }

    /// Mirroring client over `transport`.
    pub fn client(config: MatchConfig, transport: Box<dyn Transport>) -> Self {
        Self::new(NetMode::Client, config, Some(transport))
    }

    /// Use a fixed room code. Round seeds are derived from it.
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self.state = build_state(&self.config, &self.room, self.rounds.session());
        self
    }

    /// Ask `source` for card offers before falling back to the built-in pool.
    pub fn with_card_source(mut self, source: Box<dyn CardSource>) -> Self {
        self.dealer = CardDealer::with_source(source, self.config.seed);
        self
    }

    /// Observe every inbound message.
    pub fn subscribe(&mut self, listener: Box<dyn MessageListener>) {
        self.dispatcher.subscribe(listener);
    }

    // -------------------------------------------------------------------------
    // Frame
    // -------------------------------------------------------------------------

    /// Run one frame: ingest peer messages, simulate (authoritative side)
    /// or forward input (client), then flush outgoing messages.
    pub fn frame(&mut self, sample: InputSample) -> FrameReport {
        let mut report = FrameReport::default();
        if !self.active {
            return report;
        }

        self.frame += 1;
        report.frame = self.frame;

        let inbound = self.transport.as_mut().map(|t| t.drain()).unwrap_or_default();
        for msg in &inbound {
            self.handle_message(msg, &mut report);
            self.dispatcher.dispatch(msg);
        }
        self.check_connection();

        if self.mode.is_authoritative() {
            self.simulate(sample, &mut report);
        } else {
            let input = self.mirror.input_message(&sample.local);
            self.outbox.push(input);
        }

        self.flush();
        report
    }

    fn simulate(&mut self, sample: InputSample, report: &mut FrameReport) {
        let (opponent, scheme) = match self.mode {
            NetMode::Host => (self.host_sync.remote_input(), ControlScheme::Networked),
            _ => (sample.opponent, ControlScheme::LocalTwoPlayer),
        };
        let inputs = InputSample::new(sample.local, opponent).commands(scheme);

        if matches!(self.rounds.phase(), RoundPhase::Playing | RoundPhase::RoundEnding { .. }) {
            let result = tick(&mut self.state, &inputs, &self.config.physics);
            report.events = result.events;

            if let Some(winner) = result.round_winner {
                report.round_winner = Some(winner);
                if self.rounds.on_round_winner(winner, self.frame) {
                    self.broadcast(NetMessage::RoundEnd { winner });
                }
            }

            if self.mode == NetMode::Host {
                let snapshot = self.host_sync.snapshot(&self.state);
                self.outbox.push(snapshot);
            }
        }

        if let Some(transition) = self.rounds.poll(self.frame, &mut self.dealer) {
            // Scores reach the client only once the grace period is over
            self.announce_session();
            if let RoundTransition::CardsOffered { cards, .. } = &transition {
                self.broadcast(NetMessage::CardsGenerated(cards.clone()));
            }
            report.transition = Some(transition);
        }
    }

    fn handle_message(&mut self, msg: &NetMessage, report: &mut FrameReport) {
        match (self.mode, msg) {
            (NetMode::Host, NetMessage::Input(payload)) => self.host_sync.on_input(payload),
            (NetMode::Host, NetMessage::CardSelect(card)) => match self.apply_pick(Side::P2, &card.id) {
                Ok(()) => report.new_round = true,
                Err(e) => warn!(card = %card.id, "Rejected remote card pick: {}", e),
            },
            (NetMode::Client, NetMessage::State(snapshot)) => self.mirror.apply(&mut self.state, snapshot),
            (NetMode::Client, NetMessage::RoundEnd { winner }) => {
                info!(%winner, "Host reported round end");
                self.rounds.mirror_round_end(*winner);
            }
            (NetMode::Client, NetMessage::CardsGenerated(cards)) => self.rounds.mirror_offer(cards.clone()),
            (NetMode::Client, NetMessage::SessionUpdate(session)) => {
                if self.rounds.mirror_session(session.clone()) {
                    self.rebuild_round();
                    report.new_round = true;
                }
            }
            (mode, other) => debug!(?mode, kind = other.kind(), "Ignoring message"),
        }
    }

    // -------------------------------------------------------------------------
    // Round flow
    // -------------------------------------------------------------------------

    /// Pick an offered card with this device's controls.
    ///
    /// On the client the pick is sent to the host; the new round starts
    /// when the host's session update arrives.
    pub fn pick_card(&mut self, card_id: &str) -> Result<(), SessionError> {
        let (loser, card) = match self.rounds.phase() {
            RoundPhase::Continuing { loser, offered } => (*loser, offered.iter().find(|c| c.id == card_id).cloned()),
            _ => return Err(RoundError::NoOffer.into()),
        };

        if let Some(side) = self.mode.local_side() {
            if side != loser {
                return Err(SessionError::WrongSide(loser));
            }
        }

        if self.mode.is_authoritative() {
            self.apply_pick(loser, card_id)?;
        } else {
            let card = card.ok_or_else(|| RoundError::UnknownCard(card_id.to_string()))?;
            self.outbox.push(NetMessage::CardSelect(card));
        }
        self.flush();
        Ok(())
    }

    /// Keep cards, reset scores and keep playing after a match is won.
    pub fn continue_match(&mut self) -> Result<(), SessionError> {
        self.require_authority()?;
        self.rounds.continue_match()?;
        info!("Match continued");
        self.rebuild_round();
        self.announce_session();
        self.flush();
        Ok(())
    }

    /// Throw the session away and start from scratch.
    pub fn new_match(&mut self) -> Result<(), SessionError> {
        self.require_authority()?;
        self.rounds.new_match();
        info!("New match");
        self.rebuild_round();
        self.announce_session();
        self.flush();
        Ok(())
    }

    /// Stop the match: no more frames, pending round resolution dropped,
    /// connection closed.
    pub fn leave(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.rounds.cancel();
        self.outbox.drain();
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        self.status = "Left match".to_string();
        info!(frames = self.frame, "Left match");
    }

    fn apply_pick(&mut self, side: Side, card_id: &str) -> Result<(), SessionError> {
        self.rounds.choose_card(side, card_id)?;
        self.rebuild_round();
        self.announce_session();
        Ok(())
    }

    fn require_authority(&self) -> Result<(), SessionError> {
        if self.mode.is_authoritative() {
            Ok(())
        } else {
            Err(SessionError::NotAuthoritative)
        }
    }

    fn rebuild_round(&mut self) {
        self.state = build_state(&self.config, &self.room, self.rounds.session());
        self.mirror.reset();
        info!(round = self.state.round, "Round started");
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    fn broadcast(&mut self, msg: NetMessage) {
        if self.mode == NetMode::Host {
            self.outbox.push(msg);
        }
    }

    fn announce_session(&mut self) {
        let session = self.rounds.session().clone();
        self.broadcast(NetMessage::SessionUpdate(session));
    }

    fn flush(&mut self) {
        let pending = self.outbox.drain();
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        for msg in pending {
            if let Err(e) = transport.send(msg) {
                debug!("Dropping outgoing message: {}", e);
                break;
            }
        }
        self.check_connection();
    }

    fn check_connection(&mut self) {
        let Some(transport) = self.transport.as_ref() else {
            return;
        };
        if transport.is_open() || self.disconnected {
            return;
        }

        self.disconnected = true;
        self.status = match self.mode {
            NetMode::Host => "Client disconnected, holding last input".to_string(),
            _ => "Lost connection to host".to_string(),
        };
        warn!(mode = ?self.mode, "{}", self.status);
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Network role.
    pub fn mode(&self) -> NetMode {
        self.mode
    }

    /// Room code.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Current (or mirrored) simulation.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Read-only frame for rendering.
    pub fn view(&self) -> FrameView<'_> {
        self.state.view()
    }

    /// Scores, history and cards.
    pub fn session(&self) -> &Session {
        self.rounds.session()
    }

    /// Round phase.
    pub fn phase(&self) -> &RoundPhase {
        self.rounds.phase()
    }

    /// Cards on offer, if a pick is open.
    pub fn offered_cards(&self) -> Option<&[Card]> {
        match self.rounds.phase() {
            RoundPhase::Continuing { offered, .. } => Some(offered),
            _ => None,
        }
    }

    /// Human-readable connection status.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// False after `leave`.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

impl std::fmt::Debug for MatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSession")
            .field("mode", &self.mode)
            .field("room", &self.room)
            .field("frame", &self.frame)
            .field("round", &self.state.round)
            .field("phase", self.rounds.phase())
            .field("status", &self.status)
            .finish()
    }
}

/// Fresh round state for the session's current round and cards.
fn build_state(config: &MatchConfig, room: &str, session: &Session) -> SimulationState {
    let round = session.round;
    let seed = derive_seed(room, round) ^ config.seed;
    SimulationState::new_round(
        round,
        session.stats_for(Side::P1, &config.base_stats),
        session.stats_for(Side::P2, &config.base_stats),
        seed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::input::InputFrame;
    use crate::network::transport::ChannelTransport;

    const GRACE: u64 = 3;

    fn config() -> MatchConfig {
        MatchConfig {
            round_end_grace_frames: GRACE,
            ..Default::default()
        }
    }

    fn idle() -> InputSample {
        InputSample::default()
    }

    fn linked() -> (MatchSession, MatchSession) {
        let (host_link, client_link) = ChannelTransport::pair();
        let host = MatchSession::host(config(), Box::new(host_link)).with_room("test-room");
        let client = MatchSession::client(config(), Box::new(client_link)).with_room("test-room");
        (host, client)
    }

    fn run_until_transition(session: &mut MatchSession) -> RoundTransition {
        for _ in 0..=GRACE + 1 {
            if let Some(t) = session.frame(idle()).transition {
                return t;
            }
        }
        panic!("no transition after grace period");
    }

    #[test]
    fn test_local_round_flow() {
        let mut session = MatchSession::local(config()).with_room("local");
        session.state.p2.health = 0.0;

        let report = session.frame(idle());
        assert_eq!(report.round_winner, Some(Side::P1));
        assert_eq!(session.session().p1_score, 1);

        let RoundTransition::CardsOffered { loser, cards } = run_until_transition(&mut session) else {
            panic!("expected a card offer");
        };
        assert_eq!(loser, Side::P2);
        assert_eq!(cards.len(), 3);

        session.pick_card(&cards[0].id).unwrap();
        assert_eq!(session.phase(), &RoundPhase::Playing);
        assert_eq!(session.state().round, 2);
        assert_eq!(session.session().p2_cards.len(), 1);
        assert_eq!(session.state().p2.health, session.state().p2.max_health());
    }

    #[test]
    fn test_pick_without_offer_fails() {
        let mut session = MatchSession::local(config());
        assert_eq!(session.pick_card("nope"), Err(SessionError::Round(RoundError::NoOffer)));
    }

    #[test]
    fn test_host_streams_state_and_reads_input() {
        let (mut host, mut client) = linked();

        host.frame(idle());
        let client_input = InputSample::new(InputFrame::new().with_flags(InputFrame::FLAG_RIGHT), InputFrame::default());
        client.frame(client_input);

        assert_eq!(client.state().tick, host.state().tick);
        assert_eq!(client.state().p1.position, host.state().p1.position);

        // Host sees the client's right input on its next frame
        let before = host.state().p2.position.x;
        host.frame(idle());
        assert!(host.host_sync.has_remote_input());
        assert!(host.state().p2.position.x > before);
    }

    #[test]
    fn test_remote_pick_starts_next_round_on_both_sides() {
        let (mut host, mut client) = linked();
        host.state.p2.health = 0.0;

        host.frame(idle());
        let RoundTransition::CardsOffered { loser, cards } = run_until_transition(&mut host) else {
            panic!("expected a card offer");
        };
        assert_eq!(loser, Side::P2);

        client.frame(idle());
        assert_eq!(client.offered_cards().map(|c| c.len()), Some(3));
        assert_eq!(client.session().p1_score, 1);

        // Host cannot pick for the client
        assert_eq!(host.pick_card(&cards[0].id), Err(SessionError::WrongSide(Side::P2)));

        client.pick_card(&cards[1].id).unwrap();
        let report = host.frame(idle());
        assert!(report.new_round);
        assert_eq!(host.state().round, 2);
        assert_eq!(host.session().p2_cards[0].id, cards[1].id);

        let report = client.frame(idle());
        assert!(report.new_round);
        assert_eq!(client.state().round, 2);
        assert_eq!(client.phase(), &RoundPhase::Playing);
    }

    #[test]
    fn test_fifth_win_ends_match_without_cards_generated() {
        use std::sync::{Arc, Mutex};

        let (mut host, mut client) = linked();
        let offers = Arc::new(Mutex::new(0usize));
        let counter = offers.clone();
        client.subscribe(Box::new(move |msg: &NetMessage| {
            if matches!(msg, NetMessage::CardsGenerated(_)) {
                *counter.lock().unwrap() += 1;
            }
        }));

        for round in 1..=5u32 {
            host.state.p2.health = 0.0;
            host.frame(idle());
            let transition = run_until_transition(&mut host);
            client.frame(idle());

            match transition {
                RoundTransition::CardsOffered { cards, .. } => {
                    assert!(round < 5);
                    client.pick_card(&cards[0].id).unwrap();
                    assert!(host.frame(idle()).new_round);
                    client.frame(idle());
                }
                RoundTransition::MatchOver { winner } => {
                    assert_eq!(round, 5);
                    assert_eq!(winner, Side::P1);
                }
            }
        }

        assert_eq!(*offers.lock().unwrap(), 4);
        assert_eq!(host.session().p1_score, 5);
        assert!(matches!(client.phase(), RoundPhase::MatchOver { winner: Side::P1 }));

        // Nothing more is offered however long the host keeps running
        for _ in 0..20 {
            assert!(host.frame(idle()).transition.is_none());
        }
        client.frame(idle());
        assert_eq!(*offers.lock().unwrap(), 4);

        host.continue_match().unwrap();
        client.frame(idle());
        assert_eq!(client.session().p1_score, 0);
        assert_eq!(client.phase(), &RoundPhase::Playing);
        assert_eq!(client.session().p2_cards.len(), 4);
    }

    #[test]
    fn test_client_waits_out_grace_before_match_over() {
        let (mut host, mut client) = linked();
        for _ in 0..4 {
            host.state.p2.health = 0.0;
            host.frame(idle());
            let RoundTransition::CardsOffered { cards, .. } = run_until_transition(&mut host) else {
                panic!("expected a card offer");
            };
            client.frame(idle());
            client.pick_card(&cards[0].id).unwrap();
            host.frame(idle());
            client.frame(idle());
        }

        host.state.p2.health = 0.0;
        host.frame(idle());
        client.frame(idle());
        assert_eq!(host.phase(), &RoundPhase::RoundEnding { winner: Side::P1 });
        assert_eq!(client.phase(), &RoundPhase::RoundEnding { winner: Side::P1 });
        assert_eq!(client.session().p1_score, 4);

        for _ in 1..GRACE {
            host.frame(idle());
            client.frame(idle());
            assert_eq!(client.phase(), &RoundPhase::RoundEnding { winner: Side::P1 });
        }

        host.frame(idle());
        client.frame(idle());
        assert_eq!(host.phase(), &RoundPhase::MatchOver { winner: Side::P1 });
        assert_eq!(client.phase(), &RoundPhase::MatchOver { winner: Side::P1 });
        assert_eq!(client.session().p1_score, 5);
    }

    #[test]
    fn test_client_is_not_authoritative() {
        let (_host, mut client) = linked();
        assert_eq!(client.continue_match(), Err(SessionError::NotAuthoritative));
        assert_eq!(client.new_match(), Err(SessionError::NotAuthoritative));
    }

    #[test]
    fn test_host_keeps_simulating_after_disconnect() {
        let (mut host, client) = linked();
        drop(client);

        host.frame(idle());
        host.frame(idle());
        assert_eq!(host.state().tick, 2);
        assert!(host.status().contains("disconnected"));
    }

    #[test]
    fn test_leave_stops_frames_and_pending_resolution() {
        let mut session = MatchSession::local(config());
        session.state.p1.health = 0.0;
        session.frame(idle());
        assert!(matches!(session.phase(), RoundPhase::RoundEnding { .. }));

        session.leave();
        assert!(!session.is_active());
        for _ in 0..10 {
            let report = session.frame(idle());
            assert!(report.transition.is_none());
        }
        assert_eq!(session.frame_count(), 1);
        assert!(matches!(session.phase(), RoundPhase::RoundEnding { .. }));
    }
}

//! Neon Rounds
//!
//! Headless runner for the simulation. Scripted bots stand in for players.
//!
//! ```text
//! neon-rounds [local]        play a full local match
//! neon-rounds verify         replay a round twice and compare hashes
//! neon-rounds loopback       host and client over an in-process link
//! neon-rounds host <addr>    host over WebSocket (e.g. 127.0.0.1:9000)
//! neon-rounds join <url>     join a host (e.g. ws://127.0.0.1:9000)
//! ```
//!
//! Set `NEON_ROUNDS_CONFIG` to a JSON file to override match settings.

use std::ops::ControlFlow;

use anyhow::{bail, Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use neon_rounds::{
    TICK_RATE, VERSION,
    game::{
        events::GameEventData,
        input::{ControlScheme, InputFrame, InputSample, TickInputs},
        round::{RoundPhase, RoundTransition},
        state::{FrameView, Side, SimulationState},
        tick::{replay_round, tick, MatchConfig},
    },
    network::{
        driver::{self, DriverConfig, FrameSink, InputSource},
        session::{FrameReport, MatchSession},
        transport::{self, ChannelTransport},
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Neon Rounds v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = load_config()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("local") => demo_local(config).await,
        Some("verify") => verify_determinism(&config),
        Some("loopback") => demo_loopback(config),
        Some("host") => {
            let addr = args.get(1).context("usage: neon-rounds host <addr>")?;
            host(config, addr).await
        }
        Some("join") => {
            let url = args.get(1).context("usage: neon-rounds join <url>")?;
            join(config, url).await
        }
        Some(other) => bail!("unknown command: {}", other),
    }
}

fn load_config() -> Result<MatchConfig> {
    let Ok(path) = std::env::var("NEON_ROUNDS_CONFIG") else {
        return Ok(MatchConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading config {}", path))?;
    let config = serde_json::from_str(&text).with_context(|| format!("parsing config {}", path))?;
    info!(%path, "Loaded config");
    Ok(config)
}

// =============================================================================
// BOTS
// =============================================================================

/// Strafes, hops and fires at the opponent.
struct Bot;

impl Bot {
    fn frame(side: Side, frame: u64, view: &FrameView<'_>) -> InputFrame {
        let (me, them) = match side {
            Side::P1 => (view.p1, view.p2),
            Side::P2 => (view.p2, view.p1),
        };
        let phase = frame + if side == Side::P2 { 37 } else { 0 };

        let mut input = InputFrame::new().with_pointer(them.center().x, them.center().y);
        let toward_right = them.center().x > me.center().x;
        let advance = phase % 90 < 45;
        input.set(InputFrame::FLAG_RIGHT, toward_right == advance);
        input.set(InputFrame::FLAG_LEFT, toward_right != advance);
        input.set(InputFrame::FLAG_JUMP, phase % 70 == 0);
        input.set(InputFrame::FLAG_UP, phase % 70 == 0);
        input.set(InputFrame::FLAG_SHOOT, true);
        input
    }
}

impl InputSource for Bot {
    fn sample(&mut self, frame: u64, view: FrameView<'_>) -> InputSample {
        InputSample::new(Self::frame(Side::P1, frame, &view), Self::frame(Side::P2, frame, &view))
    }
}

/// Client bot: its primary controls drive p2.
struct ClientBot;

impl InputSource for ClientBot {
    fn sample(&mut self, frame: u64, view: FrameView<'_>) -> InputSample {
        InputSample::new(Bot::frame(Side::P2, frame, &view), InputFrame::default())
    }
}

/// Logs the match and answers card offers with the first card.
#[derive(Default)]
struct AutoPilot {
    picked_for: Option<(u32, usize)>,
    stop_at_match_over: bool,
}

impl FrameSink for AutoPilot {
    fn present(&mut self, session: &mut MatchSession, report: &FrameReport) -> ControlFlow<()> {
        for event in &report.events {
            match &event.data {
                GameEventData::PlayerDied { side } => debug!(tick = event.tick, %side, "Player died"),
                GameEventData::PlayerFell { side } => debug!(tick = event.tick, %side, "Player fell out"),
                _ => {}
            }
        }

        if let Some(RoundTransition::MatchOver { winner }) = &report.transition {
            info!(%winner, p1 = session.session().p1_score, p2 = session.session().p2_score, "Match won");
        }
        if self.stop_at_match_over && matches!(session.phase(), RoundPhase::MatchOver { .. }) {
            return ControlFlow::Break(());
        }

        let key = (session.session().round, session.session().history.len());
        if self.picked_for != Some(key) {
            if let Some(card_id) = session.offered_cards().and_then(|cards| cards.first()).map(|c| c.id.clone()) {
                match session.pick_card(&card_id) {
                    Ok(()) => self.picked_for = Some(key),
                    Err(e) => debug!("Not picking: {}", e),
                }
            }
        }

        ControlFlow::Continue(())
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Full local match between two bots, as fast as the loop allows.
async fn demo_local(config: MatchConfig) -> Result<()> {
    info!("=== Starting Local Match ===");

    let mut session = MatchSession::local(config).with_room("demo");
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut pilot = AutoPilot {
        stop_at_match_over: true,
        ..Default::default()
    };

    let reason = driver::run(
        &mut session,
        &mut Bot,
        &mut pilot,
        &DriverConfig { tick_rate_hz: 1000 },
        shutdown_rx,
    )
    .await;

    let s = session.session();
    info!("=== Match Results ===");
    info!(?reason, rounds = s.history.len(), p1 = s.p1_score, p2 = s.p2_score, "Finished");
    for (side, cards) in [(Side::P1, &s.p1_cards), (Side::P2, &s.p2_cards)] {
        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        info!(%side, cards = ?names, "Collected cards");
    }
    Ok(())
}

/// Replay one scripted round twice and compare final hashes.
fn verify_determinism(config: &MatchConfig) -> Result<()> {
    info!("=== Verifying Determinism ===");

    let initial = SimulationState::new_round(1, config.base_stats.clone(), config.base_stats.clone(), config.seed);
    let mut probe = initial.clone();
    let mut inputs = Vec::new();
    for frame in 0..3600u64 {
        let sample = Bot.sample(frame, probe.view());
        let tick_inputs: TickInputs = sample.commands(ControlScheme::LocalTwoPlayer);
        tick(&mut probe, &tick_inputs, &config.physics);
        inputs.push(tick_inputs);
        if probe.round_ended {
            break;
        }
    }

    let (first, winner, events) = replay_round(initial.clone(), &inputs, &config.physics);
    let (second, _, _) = replay_round(initial, &inputs, &config.physics);

    let hash = first.compute_hash();
    let replay_hash = second.compute_hash();
    info!(ticks = first.tick, ?winner, events = events.len(), "Round replayed");
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash || hash != probe.compute_hash() {
        bail!("DETERMINISM FAILURE: Hashes differ!");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}

/// Host and client in one process, stepped in lockstep.
fn demo_loopback(config: MatchConfig) -> Result<()> {
    info!("=== Loopback Host/Client ===");

    let (host_link, client_link) = ChannelTransport::pair();
    let mut host = MatchSession::host(config.clone(), Box::new(host_link)).with_room("loopback");
    let mut client = MatchSession::client(config, Box::new(client_link)).with_room("loopback");
    let mut host_pilot = AutoPilot::default();
    let mut client_pilot = AutoPilot::default();

    for frame in 1..=3000u64 {
        let sample = HostBot.sample(frame, host.view());
        let report = host.frame(sample);
        let _ = host_pilot.present(&mut host, &report);

        let sample = ClientBot.sample(frame, client.view());
        let report = client.frame(sample);
        let _ = client_pilot.present(&mut client, &report);

        if matches!(host.phase(), RoundPhase::MatchOver { .. }) {
            break;
        }
    }

    let drift = host.state().p1.position - client.state().p1.position;
    info!(
        host_round = host.state().round,
        client_round = client.state().round,
        drift = drift.length(),
        status = client.status(),
        "Loopback finished"
    );
    if host.session() != client.session() {
        warn!("Client session lags the host");
    }
    Ok(())
}

async fn host(config: MatchConfig, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {}", addr))?;
    info!("Waiting for a client on {}", addr);

    let (link, peer) = transport::accept(&listener).await?;
    let room = format!("{}", peer);
    let session = MatchSession::host(config, Box::new(link)).with_room(room);
    run_networked(session, HostBot).await
}

async fn join(config: MatchConfig, url: &str) -> Result<()> {
    let link = transport::connect(url).await?;
    let session = MatchSession::client(config, Box::new(link));
    run_networked(session, ClientBot).await
}

/// Host bot: p1 from this device, p2 comes from the network.
struct HostBot;

impl InputSource for HostBot {
    fn sample(&mut self, frame: u64, view: FrameView<'_>) -> InputSample {
        InputSample::new(Bot::frame(Side::P1, frame, &view), InputFrame::default())
    }
}

async fn run_networked(mut session: MatchSession, mut input: impl InputSource) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut pilot = AutoPilot {
        stop_at_match_over: true,
        ..Default::default()
    };
    let reason = driver::run(&mut session, &mut input, &mut pilot, &DriverConfig::default(), shutdown_rx).await;

    info!(?reason, mode = ?session.mode(), status = session.status(), "Session ended");
    Ok(())
}

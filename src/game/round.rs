//! Round Lifecycle
//!
//! ```text
//! Playing ──(a player dies)──▶ RoundEnding ──(grace elapsed)──┬──▶ Continuing ──(card picked)──▶ Playing
//!                                                              └──▶ MatchOver ──(continue / new match)──▶ Playing
//! ```
//!
//! The round is awarded the moment RoundEnding is entered. The follow-up
//! state is held back for a grace period so the death burst can play; that
//! delay is a pending deadline polled by the frame loop, never a blocking
//! wait, and `cancel` drops it.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::game::cards::CardDealer;
use crate::game::state::Side;
use crate::game::stats::{resolve_stats, Card, PlayerStats};

/// Errors from round-flow operations attempted in the wrong phase.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    /// No card offer is open.
    #[error("no card offer is open")]
    NoOffer,

    /// Only the round loser may pick.
    #[error("{0} did not lose the round")]
    NotLoser(Side),

    /// The picked card was not offered.
    #[error("card {0} was not offered")]
    UnknownCard(String),

    /// Continue is only valid after a match is won.
    #[error("match is not over")]
    MatchNotOver,
}

/// Outcome of one finished round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round winner
    pub winner: Side,
}

/// Scores, history and accumulated cards for a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Player 1 round wins
    pub p1_score: u32,
    /// Player 2 round wins
    pub p2_score: u32,
    /// Current 1-based round
    pub round: u32,
    /// Finished rounds, oldest first
    pub history: Vec<RoundResult>,
    /// Cards collected by player 1
    pub p1_cards: Vec<Card>,
    /// Cards collected by player 2
    pub p2_cards: Vec<Card>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh match: no score, round 1, no cards.
    pub fn new() -> Self {
        Self {
            p1_score: 0,
            p2_score: 0,
            round: 1,
            history: Vec::new(),
            p1_cards: Vec::new(),
            p2_cards: Vec::new(),
        }
    }

    /// Round wins for a side.
    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::P1 => self.p1_score,
            Side::P2 => self.p2_score,
        }
    }

    /// Cards collected by a side.
    pub fn cards(&self, side: Side) -> &[Card] {
        match side {
            Side::P1 => &self.p1_cards,
            Side::P2 => &self.p2_cards,
        }
    }

    /// Resolved stats for a side.
    pub fn stats_for(&self, side: Side, base: &PlayerStats) -> PlayerStats {
        resolve_stats(base, self.cards(side))
    }

    /// Side that reached `target` wins, if any (p1 checked first).
    pub fn match_winner(&self, target: u32) -> Option<Side> {
        Side::ALL.into_iter().find(|side| self.score(*side) >= target)
    }

    fn record_win(&mut self, winner: Side) {
        match winner {
            Side::P1 => self.p1_score += 1,
            Side::P2 => self.p2_score += 1,
        }
        self.history.push(RoundResult { winner });
    }

    fn add_card(&mut self, side: Side, card: Card) {
        match side {
            Side::P1 => self.p1_cards.push(card),
            Side::P2 => self.p2_cards.push(card),
        }
    }

    /// Zero the scores and history and go back to round 1. Cards are kept.
    pub fn reset_for_continue(&mut self) {
        self.p1_score = 0;
        self.p2_score = 0;
        self.round = 1;
        self.history.clear();
    }
}

/// Public round phase.
#[derive(Clone, Debug, PartialEq)]
pub enum RoundPhase {
    /// Round in progress
    Playing,
    /// Round decided, waiting out the grace period
    RoundEnding {
        /// Round winner
        winner: Side,
    },
    /// Loser is choosing an upgrade
    Continuing {
        /// Side choosing
        loser: Side,
        /// Offered cards
        offered: Vec<Card>,
    },
    /// A side reached the target win count
    MatchOver {
        /// Match winner
        winner: Side,
    },
}

/// State exposed when a grace period elapses.
#[derive(Clone, Debug, PartialEq)]
pub enum RoundTransition {
    /// Cards were dealt to the loser.
    CardsOffered {
        /// Side choosing
        loser: Side,
        /// Offered cards
        cards: Vec<Card>,
    },
    /// The match is decided.
    MatchOver {
        /// Match winner
        winner: Side,
    },
}

#[derive(Clone, Copy, Debug)]
struct PendingResolution {
    due: u64,
    winner: Side,
    match_over: bool,
}

/// Drives the round state machine and owns the session.
#[derive(Debug)]
pub struct RoundController {
    session: Session,
    phase: RoundPhase,
    target_wins: u32,
    grace_frames: u64,
    ended_latch: bool,
    pending: Option<PendingResolution>,
}

impl RoundController {
    /// Create a controller for a fresh match.
    pub fn new(target_wins: u32, grace_frames: u64) -> Self {
        Self {
            session: Session::new(),
            phase: RoundPhase::Playing,
            target_wins,
            grace_frames,
            ended_latch: false,
            pending: None,
        }
    }

    /// Current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current phase.
    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    /// Wins needed to take the match.
    pub fn target_wins(&self) -> u32 {
        self.target_wins
    }

    /// A grace period is running.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Report a round winner observed at frame `now`.
    ///
    /// Fires at most once per round. Returns true when the round was
    /// awarded by this call.
    pub fn on_round_winner(&mut self, winner: Side, now: u64) -> bool {
        if self.ended_latch || self.phase != RoundPhase::Playing {
            return false;
        }
        self.ended_latch = true;

        self.session.record_win(winner);
        let match_over = self.session.match_winner(self.target_wins).is_some();

        info!(
            round = self.session.round,
            %winner,
            p1_score = self.session.p1_score,
            p2_score = self.session.p2_score,
            "Round ended"
        );

        self.phase = RoundPhase::RoundEnding { winner };
        self.pending = Some(PendingResolution {
            due: now + self.grace_frames,
            winner,
            match_over,
        });
        true
    }

    /// Expose the post-round state once the grace period has elapsed.
    pub fn poll(&mut self, now: u64, dealer: &mut CardDealer) -> Option<RoundTransition> {
        let pending = self.pending?;
        if now < pending.due {
            return None;
        }
        self.pending = None;

        if pending.match_over {
            info!(winner = %pending.winner, "Match over");
            self.phase = RoundPhase::MatchOver { winner: pending.winner };
            return Some(RoundTransition::MatchOver { winner: pending.winner });
        }

        let loser = pending.winner.opponent();
        let cards = dealer.deal(&self.session, loser);
        debug!(%loser, offered = ?cards.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), "Cards offered");

        self.phase = RoundPhase::Continuing {
            loser,
            offered: cards.clone(),
        };
        Some(RoundTransition::CardsOffered { loser, cards })
    }

    /// Apply the loser's pick and start the next round.
    ///
    /// Returns the new round number.
    pub fn choose_card(&mut self, side: Side, card_id: &str) -> Result<u32, RoundError> {
        let (loser, offered) = match &self.phase {
            RoundPhase::Continuing { loser, offered } => (*loser, offered),
            _ => return Err(RoundError::NoOffer),
        };
        if side != loser {
            return Err(RoundError::NotLoser(side));
        }
        let card = offered
            .iter()
            .find(|c| c.id == card_id)
            .cloned()
            .ok_or_else(|| RoundError::UnknownCard(card_id.to_string()))?;

        info!(%side, card = %card.name, "Card picked");
        self.session.add_card(side, card);
        self.session.round += 1;
        self.start_playing();
        Ok(self.session.round)
    }

    /// Keep cards, reset scores and play on after a match is won.
    pub fn continue_match(&mut self) -> Result<(), RoundError> {
        if !matches!(self.phase, RoundPhase::MatchOver { .. }) {
            return Err(RoundError::MatchNotOver);
        }
        self.session.reset_for_continue();
        self.start_playing();
        Ok(())
    }

    /// Discard the session and start over.
    pub fn new_match(&mut self) {
        self.session = Session::new();
        self.start_playing();
    }

    /// Drop any pending grace-period resolution.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!("Pending round resolution cancelled");
        }
    }

    fn start_playing(&mut self) {
        self.phase = RoundPhase::Playing;
        self.ended_latch = false;
        self.pending = None;
    }

    // -------------------------------------------------------------------------
    // Mirror updates (non-authoritative side)
    // -------------------------------------------------------------------------

    /// Host announced a round winner.
    pub fn mirror_round_end(&mut self, winner: Side) {
        self.ended_latch = true;
        self.phase = RoundPhase::RoundEnding { winner };
    }

    /// Host announced the loser's card offer.
    pub fn mirror_offer(&mut self, cards: Vec<Card>) {
        let loser = match (&self.phase, self.session.history.last()) {
            (RoundPhase::RoundEnding { winner }, _) => winner.opponent(),
            (_, Some(last)) => last.winner.opponent(),
            (_, None) => return,
        };
        self.phase = RoundPhase::Continuing { loser, offered: cards };
    }

    /// Host sent a session. Returns true if a new round begins.
    pub fn mirror_session(&mut self, session: Session) -> bool {
        let new_round = session.round != self.session.round
            || session.history.len() < self.session.history.len();
        self.session = session;

        if let Some(winner) = self.session.match_winner(self.target_wins) {
            self.phase = RoundPhase::MatchOver { winner };
            return false;
        }
        if new_round {
            self.start_playing();
        }
        new_round
    }
}

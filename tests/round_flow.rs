//! Match lifecycle through the round controller and card dealer.

use neon_rounds::game::cards::{CardDealer, CardError, CardSource, CARDS_PER_OFFER};
use neon_rounds::game::round::{RoundController, RoundError, RoundPhase, RoundTransition, Session};
use neon_rounds::game::state::Side;
use neon_rounds::game::stats::{Card, PlayerStats};

const GRACE: u64 = 10;

/// Award a round to `winner`, wait out the grace period, and return what
/// the controller exposed.
fn finish_round(rc: &mut RoundController, dealer: &mut CardDealer, winner: Side, now: &mut u64) -> RoundTransition {
    assert!(rc.on_round_winner(winner, *now));
    *now += GRACE;
    rc.poll(*now, dealer).expect("grace period elapsed")
}

#[test]
fn test_five_wins_ends_match_without_offer() {
    let mut rc = RoundController::new(5, GRACE);
    let mut dealer = CardDealer::from_seed(3);
    let mut now = 0;
    let mut offers = 0;

    for round in 1..=5 {
        assert_eq!(rc.session().round, round);
        match finish_round(&mut rc, &mut dealer, Side::P1, &mut now) {
            RoundTransition::CardsOffered { loser, cards } => {
                assert!(round < 5, "offer after the deciding round");
                assert_eq!(loser, Side::P2);
                assert_eq!(cards.len(), CARDS_PER_OFFER);
                offers += 1;
                rc.choose_card(Side::P2, &cards[0].id).unwrap();
            }
            RoundTransition::MatchOver { winner } => {
                assert_eq!(round, 5);
                assert_eq!(winner, Side::P1);
            }
        }
    }

    assert_eq!(offers, 4);
    assert_eq!(rc.session().p1_score, 5);
    assert_eq!(rc.session().p2_cards.len(), 4);
    assert_eq!(rc.phase(), &RoundPhase::MatchOver { winner: Side::P1 });

    // Terminal until continued: nothing else is exposed
    assert!(rc.poll(now + 1000, &mut dealer).is_none());
    assert_eq!(rc.choose_card(Side::P2, "anything"), Err(RoundError::NoOffer));
}

#[test]
fn test_cards_accumulate_into_stats() {
    let mut rc = RoundController::new(5, GRACE);
    let mut dealer = CardDealer::from_seed(8);
    let mut now = 0;
    let base = PlayerStats::default();

    let mut picked = Vec::new();
    for _ in 0..3 {
        let RoundTransition::CardsOffered { cards, .. } = finish_round(&mut rc, &mut dealer, Side::P2, &mut now) else {
            panic!("expected an offer");
        };
        picked.push(cards[2].clone());
        rc.choose_card(Side::P1, &cards[2].id).unwrap();
    }

    assert_eq!(rc.session().round, 4);
    assert_eq!(rc.session().p1_cards, picked);
    let stats = rc.session().stats_for(Side::P1, &base);
    assert_eq!(stats, neon_rounds::game::stats::resolve_stats(&base, &picked));
    assert!(stats.fire_rate >= 2.0);
    assert!(stats.move_speed >= 0.2);

    // Winner's stats are untouched
    assert_eq!(rc.session().stats_for(Side::P2, &base), base);
}

#[test]
fn test_continue_keeps_cards_and_new_match_clears_them() {
    let mut rc = RoundController::new(2, GRACE);
    let mut dealer = CardDealer::from_seed(5);
    let mut now = 0;

    let RoundTransition::CardsOffered { cards, .. } = finish_round(&mut rc, &mut dealer, Side::P2, &mut now) else {
        panic!("expected an offer");
    };
    rc.choose_card(Side::P1, &cards[0].id).unwrap();
    assert!(matches!(
        finish_round(&mut rc, &mut dealer, Side::P2, &mut now),
        RoundTransition::MatchOver { winner: Side::P2 }
    ));

    rc.continue_match().unwrap();
    assert_eq!(rc.phase(), &RoundPhase::Playing);
    assert_eq!(rc.session().p2_score, 0);
    assert_eq!(rc.session().round, 1);
    assert!(rc.session().history.is_empty());
    assert_eq!(rc.session().p1_cards.len(), 1);

    assert_eq!(rc.continue_match(), Err(RoundError::MatchNotOver));

    rc.new_match();
    assert_eq!(rc.session(), &Session::new());
}

struct Broken;

impl CardSource for Broken {
    fn generate(&mut self, _session: &Session, _loser: Side) -> Result<Vec<Card>, CardError> {
        Err(CardError::Unavailable("offline".to_string()))
    }
}

#[test]
fn test_failing_card_source_falls_back() {
    let mut rc = RoundController::new(5, GRACE);
    let mut dealer = CardDealer::with_source(Box::new(Broken), 1);
    let mut now = 0;

    let RoundTransition::CardsOffered { cards, .. } = finish_round(&mut rc, &mut dealer, Side::P1, &mut now) else {
        panic!("expected an offer");
    };
    assert_eq!(cards.len(), CARDS_PER_OFFER);
}

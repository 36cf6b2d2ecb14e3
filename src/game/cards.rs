//! Upgrade Card Pool and Dealing
//!
//! After each round the loser is offered three cards. Offers come from a
//! pluggable [`CardSource`]; whenever that source fails or returns the
//! wrong number of cards, the [`CardDealer`] silently falls back to the
//! built-in pool so the round flow never stalls on card generation.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::rng::DeterministicRng;
use crate::game::round::Session;
use crate::game::state::Side;
use crate::game::stats::{Card, Rarity, StatModifiers};

/// Cards offered to a round loser.
pub const CARDS_PER_OFFER: usize = 3;

/// Errors raised by a card source.
#[derive(Debug, Error)]
pub enum CardError {
    /// The source could not produce cards at all.
    #[error("card source unavailable: {0}")]
    Unavailable(String),

    /// The source produced an offer of the wrong size.
    #[error("expected {expected} cards, got {got}")]
    WrongCount {
        /// Required offer size
        expected: usize,
        /// Offer size received
        got: usize,
    },
}

/// Produces card offers for a round loser.
pub trait CardSource: Send {
    /// Produce exactly [`CARDS_PER_OFFER`] cards for `loser`.
    fn generate(&mut self, session: &Session, loser: Side) -> Result<Vec<Card>, CardError>;
}

fn pool_card(id: &str, name: &str, description: &str, rarity: Rarity, stats: StatModifiers) -> Card {
    Card {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        rarity,
        stats,
    }
}

/// The built-in card pool.
pub fn default_pool() -> Vec<Card> {
    use Rarity::*;

    vec![
        pool_card("bulk_up", "Bulk Up", "More health, but you are larger.", Common, StatModifiers {
            health_mult: Some(1.5),
            size_mult: Some(1.25),
            ..Default::default()
        }),
        pool_card("glass_cannon", "Glass Cannon", "Massive damage, but minimal health.", Rare, StatModifiers {
            damage_mult: Some(2.5),
            health_mult: Some(0.5),
            ..Default::default()
        }),
        pool_card("spray_pray", "Minigun", "Shoot incredibly fast with less accuracy and damage.", Rare, StatModifiers {
            fire_rate_mult: Some(0.25),
            damage_mult: Some(0.5),
            ammo_mult: Some(4.0),
            bullet_speed_mult: Some(1.2),
            ..Default::default()
        }),
        pool_card("sniper", "Sniper Rounds", "Fast, high damage bullets. Slow reload.", Rare, StatModifiers {
            bullet_speed_mult: Some(2.5),
            damage_mult: Some(2.0),
            fire_rate_mult: Some(2.0),
            ammo_mult: Some(0.5),
            ..Default::default()
        }),
        pool_card("vampire", "Vampirism", "Heal on hit.", Legendary, StatModifiers {
            life_steal: Some(0.25),
            ..Default::default()
        }),
        pool_card("explosive", "Explosive Rounds", "Bullets explode on impact.", Legendary, StatModifiers {
            explosive_radius: Some(70.0),
            damage_mult: Some(0.85),
            ..Default::default()
        }),
        pool_card("heavy_rounds", "Heavy Rounds", "Bullets push enemies back significantly.", Common, StatModifiers {
            knockback_mult: Some(3.0),
            damage_mult: Some(1.1),
            ..Default::default()
        }),
        pool_card("moon_boots", "Moon Boots", "Low gravity jumps.", Rare, StatModifiers {
            gravity_mult: Some(0.5),
            jump_mult: Some(1.2),
            ..Default::default()
        }),
        pool_card("tank", "Tank", "Slow, heavy, and very hard to kill.", Common, StatModifiers {
            speed_mult: Some(0.7),
            health_mult: Some(2.5),
            size_mult: Some(1.3),
            ..Default::default()
        }),
        pool_card("ricochet", "Ricochet", "Bullets bounce off walls.", Common, StatModifiers {
            bullet_bounces: Some(2.0),
            damage_mult: Some(0.9),
            ..Default::default()
        }),
        pool_card("homing", "Homing Bullets", "Bullets slightly steer towards the target.", Legendary, StatModifiers {
            homing: Some(0.05),
            bullet_speed_mult: Some(0.8),
            ..Default::default()
        }),
        pool_card("tiny", "Tiny", "Small, hard to hit, but fast.", Rare, StatModifiers {
            size_mult: Some(0.6),
            speed_mult: Some(1.3),
            health_mult: Some(0.7),
            ..Default::default()
        }),
        pool_card("shotgun", "Shotgun", "Slow, heavy blasts that shove targets away.", Rare, StatModifiers {
            fire_rate_mult: Some(2.0),
            damage_mult: Some(1.5),
            bullet_size_mult: Some(1.5),
            knockback_mult: Some(2.0),
            ..Default::default()
        }),
        pool_card("poison", "Toxic", "Deal more damage, move slower.", Common, StatModifiers {
            damage_mult: Some(1.3),
            speed_mult: Some(0.9),
            ..Default::default()
        }),
        pool_card("jumper", "Springs", "Jump incredible heights.", Common, StatModifiers {
            jump_mult: Some(1.6),
            ..Default::default()
        }),
        pool_card("infinite", "Bottomless Clip", "Huge ammo capacity.", Rare, StatModifiers {
            ammo_mult: Some(5.0),
            ..Default::default()
        }),
    ]
}

/// Draws distinct cards from the built-in pool with a seeded RNG.
#[derive(Clone, Debug)]
pub struct DefaultPool {
    pool: Vec<Card>,
    rng: DeterministicRng,
}

impl DefaultPool {
    /// Create a pool drawer from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            pool: default_pool(),
            rng: DeterministicRng::new(seed),
        }
    }

    /// Draw `count` distinct cards, each with a fresh instance id.
    pub fn draw(&mut self, count: usize) -> Vec<Card> {
        let mut order: Vec<usize> = (0..self.pool.len()).collect();
        self.rng.shuffle(&mut order);

        order
            .into_iter()
            .take(count)
            .map(|idx| {
                let mut card = self.pool[idx].clone();
                card.id = format!("{}_{:08x}", card.id, self.rng.next_u32());
                card
            })
            .collect()
    }
}

impl CardSource for DefaultPool {
    fn generate(&mut self, _session: &Session, _loser: Side) -> Result<Vec<Card>, CardError> {
        Ok(self.draw(CARDS_PER_OFFER))
    }
}

/// Deals offers from an optional external source with pool fallback.
pub struct CardDealer {
    source: Option<Box<dyn CardSource>>,
    fallback: DefaultPool,
}

impl CardDealer {
    /// Dealer backed only by the built-in pool.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: None,
            fallback: DefaultPool::new(seed),
        }
    }

    /// Dealer that asks `source` first.
    pub fn with_source(source: Box<dyn CardSource>, seed: u64) -> Self {
        Self {
            source: Some(source),
            fallback: DefaultPool::new(seed),
        }
    }

    /// Produce an offer of exactly [`CARDS_PER_OFFER`] cards.
    ///
    /// Never fails: source errors and wrong-sized offers fall back to the
    /// built-in pool.
    pub fn deal(&mut self, session: &Session, loser: Side) -> Vec<Card> {
        if let Some(source) = self.source.as_mut() {
            let offer = source.generate(session, loser).and_then(|cards| {
                if cards.len() == CARDS_PER_OFFER {
                    Ok(cards)
                } else {
                    Err(CardError::WrongCount {
                        expected: CARDS_PER_OFFER,
                        got: cards.len(),
                    })
                }
            });

            match offer {
                Ok(cards) => {
                    debug!(?loser, round = session.round, "Card source produced offer");
                    return cards;
                }
                Err(e) => {
                    warn!(?loser, error = %e, "Card source failed, using default pool");
                }
            }
        }

        self.fallback.draw(CARDS_PER_OFFER)
    }
}

//! Fortune wheel prize allocation.
//!
//! The wheel is a fixed table of six prizes. Each prize unlocks at a
//! lifetime spin count, and a draw is a weighted pick over the unlocked
//! prefix only, so probabilities renormalize within the player's tier.
//! The jackpot sits behind the 6-spin threshold.
//!
//! Randomness comes from the caller. Handlers pass [`rand::rng`], which is
//! OS-seeded and cryptographically secure; tests pass a seeded [`StdRng`]
//! (`rand::rngs::StdRng`) for reproducible draws.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use sweet_delights_core::{CertificateCode, Money, PrizeKind, PromoCode};

use crate::db::wheel::DrawnPrize;

/// One slot of the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrizeTier {
    /// The prize in this slot.
    pub kind: PrizeKind,
    /// Lifetime spins required before this slot can come up.
    pub min_spins: u32,
    /// Relative weight within the unlocked prefix.
    pub weight: u32,
}

/// The wheel, ordered by unlock threshold. The ordering is what makes
/// `available_prizes` a simple prefix: every entry unlocks no earlier
/// than the one before it.
pub const PRIZE_TABLE: [PrizeTier; 6] = [
    PrizeTier {
        kind: PrizeKind::DiscountFive,
        min_spins: 1,
        weight: 40,
    },
    PrizeTier {
        kind: PrizeKind::FreeLollipop,
        min_spins: 1,
        weight: 30,
    },
    PrizeTier {
        kind: PrizeKind::DiscountTen,
        min_spins: 2,
        weight: 15,
    },
    PrizeTier {
        kind: PrizeKind::FreeShipping,
        min_spins: 3,
        weight: 8,
    },
    PrizeTier {
        kind: PrizeKind::GiftBox,
        min_spins: 4,
        weight: 5,
    },
    PrizeTier {
        kind: PrizeKind::Jackpot,
        min_spins: 6,
        weight: 2,
    },
];

/// Clamp bounds for spin counts taken from user records.
const MIN_SPINS: u32 = 1;
const MAX_SPINS: u32 = 9999;

/// How long a won promo prize stays applicable.
const PRIZE_VALIDITY_DAYS: i64 = 30;

/// How long a jackpot certificate stays redeemable.
const JACKPOT_VALIDITY_DAYS: i64 = 180;

/// Face value of the jackpot certificate.
#[must_use]
pub fn jackpot_value() -> Money {
    Money::from_rubles(1000)
}

/// Normalize a raw spin count from storage or input.
///
/// Zero, negative, and out-of-range values degrade to the clamp bounds;
/// the caller always ends up inside `[1, 9999]` and therefore with a
/// non-empty prize set.
#[must_use]
pub fn effective_spins(raw: i64) -> u32 {
    u32::try_from(raw.clamp(i64::from(MIN_SPINS), i64::from(MAX_SPINS))).unwrap_or(MIN_SPINS)
}

/// The unlocked prefix of the wheel for a given lifetime spin count.
///
/// Monotonic: more spins never unlock fewer prizes. Never empty for
/// clamped input.
#[must_use]
pub fn available_prizes(spins: u32) -> &'static [PrizeTier] {
    let unlocked = PRIZE_TABLE.partition_point(|tier| tier.min_spins <= spins);
    PRIZE_TABLE.get(..unlocked).unwrap_or(&PRIZE_TABLE)
}

/// Draw a prize for the given lifetime spin count.
///
/// Weighted pick over the unlocked prefix. Weights don't need to sum to
/// anything in particular; the cumulative walk renormalizes over whatever
/// subset is unlocked.
pub fn draw_prize(spins: u32, rng: &mut impl Rng) -> PrizeKind {
    let unlocked = available_prizes(spins);
    let total: u32 = unlocked.iter().map(|tier| tier.weight).sum();

    let roll = rng.random_range(0..total);
    let mut cumulative = 0;
    for tier in unlocked {
        cumulative += tier.weight;
        if roll < cumulative {
            return tier.kind;
        }
    }

    // roll < total, so the walk above always returns
    PrizeKind::DiscountFive
}

/// Materialize a drawn prize: discounts and add-ons get a promo code,
/// the jackpot mints a gift certificate.
pub fn materialize(kind: PrizeKind, now: DateTime<Utc>, rng: &mut impl Rng) -> DrawnPrize {
    match kind {
        PrizeKind::Jackpot => DrawnPrize {
            kind,
            promo_code: None,
            certificate: Some((CertificateCode::generate(rng), jackpot_value())),
            expires_at: now + Duration::days(JACKPOT_VALIDITY_DAYS),
        },
        PrizeKind::DiscountFive
        | PrizeKind::FreeLollipop
        | PrizeKind::DiscountTen
        | PrizeKind::FreeShipping
        | PrizeKind::GiftBox => DrawnPrize {
            kind,
            promo_code: Some(PromoCode::generate(rng)),
            certificate: None,
            expires_at: now + Duration::days(PRIZE_VALIDITY_DAYS),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn unlocked_kinds(spins: u32) -> Vec<PrizeKind> {
        available_prizes(spins).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_available_prizes_grows_as_prefix() {
        // (a) the unlocked set is a monotonically growing prefix
        let mut previous_len = 0;
        for spins in 1..=7 {
            let unlocked = available_prizes(spins);
            assert!(unlocked.len() >= previous_len, "shrank at {spins} spins");
            // prefix property: the first entries match the full table
            assert_eq!(
                unlocked,
                PRIZE_TABLE.get(..unlocked.len()).unwrap(),
                "not a prefix at {spins} spins"
            );
            previous_len = unlocked.len();
        }
    }

    #[test]
    fn test_tier_unlock_counts() {
        assert_eq!(available_prizes(1).len(), 2);
        assert_eq!(available_prizes(2).len(), 3);
        assert_eq!(available_prizes(3).len(), 4);
        assert_eq!(available_prizes(4).len(), 5);
        assert_eq!(available_prizes(5).len(), 5);
        assert_eq!(available_prizes(6).len(), 6);
        assert_eq!(available_prizes(9999).len(), 6);
    }

    #[test]
    fn test_draw_stays_inside_unlocked_set() {
        // (b) a draw never returns a prize outside the unlocked set
        let mut rng = StdRng::seed_from_u64(1234);
        for spins in 1..=6 {
            let unlocked = unlocked_kinds(spins);
            for _ in 0..1000 {
                let kind = draw_prize(spins, &mut rng);
                assert!(
                    unlocked.contains(&kind),
                    "{kind:?} drawn with {spins} spins"
                );
            }
        }
    }

    #[test]
    fn test_jackpot_unreachable_below_six_spins() {
        // (c) first half: no jackpot below the threshold
        let mut rng = StdRng::seed_from_u64(99);
        for spins in 1..=5 {
            for _ in 0..10_000 {
                assert_ne!(draw_prize(spins, &mut rng), PrizeKind::Jackpot);
            }
        }
    }

    #[test]
    fn test_jackpot_reachable_at_six_spins() {
        // (c) second half: jackpot hits at >= 6 over many trials
        // (weight 2/100; 10k seeded draws are far past certain)
        let mut rng = StdRng::seed_from_u64(7);
        let hits = (0..10_000)
            .filter(|_| draw_prize(6, &mut rng) == PrizeKind::Jackpot)
            .count();
        assert!(hits > 0, "jackpot never hit in 10k draws at 6 spins");
    }

    #[test]
    fn test_invalid_spin_counts_degrade_to_base_tier() {
        // (d) invalid inputs clamp instead of panicking
        assert_eq!(effective_spins(0), 1);
        assert_eq!(effective_spins(-1), 1);
        assert_eq!(effective_spins(-9_000_000), 1);
        assert_eq!(effective_spins(1), 1);
        assert_eq!(effective_spins(42), 42);
        assert_eq!(effective_spins(9999), 9999);
        assert_eq!(effective_spins(10_000), 9999);
        assert_eq!(effective_spins(i64::MAX), 9999);

        // and the base tier never includes the jackpot
        assert_eq!(available_prizes(effective_spins(-5)).len(), 2);
    }

    #[test]
    fn test_weights_renormalize_within_tier() {
        // At 1 spin only the two base prizes exist; the heavier one
        // should come up more often and both should appear.
        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts: HashMap<PrizeKind, usize> = HashMap::new();
        for _ in 0..10_000 {
            *counts.entry(draw_prize(1, &mut rng)).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), 2);
        let five = counts.get(&PrizeKind::DiscountFive).copied().unwrap_or(0);
        let lollipop = counts.get(&PrizeKind::FreeLollipop).copied().unwrap_or(0);
        assert_eq!(five + lollipop, 10_000);
        // 40:30 weights; with 10k draws the gap is far outside noise
        assert!(five > lollipop, "weights ignored: {five} vs {lollipop}");
    }

    #[test]
    fn test_materialize_jackpot_mints_certificate() {
        let mut rng = StdRng::seed_from_u64(5);
        let now = Utc::now();
        let drawn = materialize(PrizeKind::Jackpot, now, &mut rng);
        assert!(drawn.promo_code.is_none());
        let (code, value) = drawn.certificate.unwrap();
        assert!(code.as_str().starts_with("SD-"));
        assert_eq!(value, jackpot_value());
        assert_eq!(drawn.expires_at, now + Duration::days(180));
    }

    #[test]
    fn test_materialize_discount_gets_promo_code() {
        let mut rng = StdRng::seed_from_u64(6);
        let now = Utc::now();
        for kind in [
            PrizeKind::DiscountFive,
            PrizeKind::FreeLollipop,
            PrizeKind::DiscountTen,
            PrizeKind::FreeShipping,
            PrizeKind::GiftBox,
        ] {
            let drawn = materialize(kind, now, &mut rng);
            assert!(drawn.certificate.is_none());
            assert!(
                drawn
                    .promo_code
                    .as_ref()
                    .is_some_and(|c| c.as_str().starts_with("SWEET-"))
            );
            assert_eq!(drawn.expires_at, now + Duration::days(30));
        }
    }
}

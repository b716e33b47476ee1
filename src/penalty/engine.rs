//! Penalty scoring: intrinsic condition multipliers and preference mismatches.
//!
//! Scoring is a pure per-row function. [`apply`] is the batch form: it maps
//! [`score_one`] over the listing pool (in parallel for large pools) and is
//! referentially identical to calling `score_one` row by row; the batch
//! path exists for throughput only.

use rayon::prelude::*;
use std::collections::HashMap;

use super::config::PenaltyConfig;
use crate::model::{Listing, WishlistItem};

/// Dominant reason for a listing's penalty.
///
/// When several contributions apply, the most severe wins:
/// `StrictMismatch` > `Preference` > `Condition` > `Clean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyReason {
    /// No penalty applied.
    Clean,
    /// Only the intrinsic condition-grade multiplier applied.
    Condition,
    /// At least one declared preference mismatched (graduated penalty).
    Preference,
    /// Strict mode excluded the listing outright.
    StrictMismatch,
}

/// A listing plus its derived effective price.
///
/// The source [`Listing`] is carried unmodified; the derived fields are
/// attached here rather than mutated into the input.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredListing {
    pub listing: Listing,
    /// Price after all multipliers, or the sentinel under strict mismatch.
    pub effective_price: f64,
    /// `effective_price / price` (sentinel-derived under strict mismatch).
    pub multiplier: f64,
    pub reason: PenaltyReason,
}

impl ScoredListing {
    /// Whether the listing may appear in an allocation at all.
    ///
    /// Strict-mode mismatches are priced at the sentinel and excluded from
    /// candidate sets; everything else is merely more or less expensive.
    pub fn is_usable(&self, config: &PenaltyConfig) -> bool {
        self.effective_price < config.high_cost_sentinel
    }
}

/// Scores one listing against the preferences of its wishlist entry.
///
/// The multiplier starts at the listing's intrinsic condition-grade
/// multiplier. Attribute preferences are then compared only when declared:
/// language and printing mismatches are asymmetric (upgrades free,
/// downgrades on a graduated scale), finish and set mismatches use fixed
/// multipliers. Under `strict_mode`, any mismatch prices the listing at the
/// sentinel instead.
pub fn score_one(
    listing: &Listing,
    preferences: Option<&WishlistItem>,
    config: &PenaltyConfig,
) -> ScoredListing {
    let mut multiplier = listing.quality_grade.price_multiplier();
    let mut preference_hit = false;
    let mut strict_hit = false;

    if let Some(prefs) = preferences {
        if let Some(preferred) = prefs.preferred_quality {
            if !listing.quality_grade.satisfies(preferred) {
                // No extra multiplier: the intrinsic grade table already
                // prices the downgrade. Strict mode still rejects it.
                strict_hit = true;
            }
        }

        if let Some(preferred) = prefs.preferred_language {
            if listing.language != preferred {
                strict_hit = true;
                let from = preferred.commonality_rank() as i32;
                let to = listing.language.commonality_rank() as i32;
                if to > from {
                    multiplier *= 1.0 + config.language_step * (to - from) as f64;
                    preference_hit = true;
                } else if to == from {
                    // Sideways move between equally common languages.
                    multiplier *= 1.0 + config.language_step;
                    preference_hit = true;
                }
                // to < from: upgrade toward a more common language, free.
            }
        }

        if let Some(preferred) = prefs.preferred_printing {
            if listing.printing != preferred {
                strict_hit = true;
                let from = preferred as i32;
                let to = listing.printing as i32;
                if to > from {
                    multiplier *= 1.0 + config.printing_step * (to - from) as f64;
                    preference_hit = true;
                }
                // to < from: a more desirable printing, free upgrade.
            }
        }

        if let Some(preferred) = prefs.preferred_finish {
            if listing.is_special_finish != preferred {
                strict_hit = true;
                multiplier *= config.finish_mismatch;
                preference_hit = true;
            }
        }

        if let Some(preferred) = prefs.preferred_set.as_deref() {
            if listing.set_name != preferred {
                strict_hit = true;
                multiplier *= config.set_mismatch;
                preference_hit = true;
            }
        }
    }

    if config.strict_mode && strict_hit {
        let effective_price = config.high_cost_sentinel;
        let multiplier = if listing.price > 0.0 {
            effective_price / listing.price
        } else {
            effective_price
        };
        return ScoredListing {
            listing: listing.clone(),
            effective_price,
            multiplier,
            reason: PenaltyReason::StrictMismatch,
        };
    }

    let reason = if preference_hit {
        PenaltyReason::Preference
    } else if multiplier > 1.0 {
        PenaltyReason::Condition
    } else {
        PenaltyReason::Clean
    };

    ScoredListing {
        listing: listing.clone(),
        effective_price: listing.price * multiplier,
        multiplier,
        reason,
    }
}

/// Threshold above which the batch path evaluates in parallel.
const PARALLEL_THRESHOLD: usize = 256;

/// Scores the full listing pool against the wishlist.
///
/// Rows are independent; large pools are scored on the rayon pool.
/// Output order matches input order either way, and every row equals the
/// corresponding [`score_one`] call exactly.
pub fn apply(
    listings: &[Listing],
    wishlist: &[WishlistItem],
    config: &PenaltyConfig,
) -> Vec<ScoredListing> {
    let prefs_by_item: HashMap<&str, &WishlistItem> = wishlist
        .iter()
        .map(|item| (item.item_name.as_str(), item))
        .collect();

    let score = |listing: &Listing| {
        score_one(
            listing,
            prefs_by_item.get(listing.item_name.as_str()).copied(),
            config,
        )
    };

    if listings.len() >= PARALLEL_THRESHOLD {
        listings.par_iter().map(score).collect()
    } else {
        listings.iter().map(score).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConditionGrade, Language, Printing};
    use proptest::prelude::*;

    fn listing(grade: ConditionGrade, price: f64) -> Listing {
        Listing {
            item_name: "CardA".into(),
            source_id: 1,
            source_name: "ShopX".into(),
            price,
            quantity_available: 4,
            quality_grade: grade,
            language: Language::English,
            printing: Printing::Unlimited,
            is_special_finish: false,
            set_name: "Alpha".into(),
        }
    }

    fn prefs() -> WishlistItem {
        WishlistItem::new("CardA", 2)
    }

    // ---- Intrinsic condition multiplier ----

    #[test]
    fn test_clean_listing_keeps_price() {
        let config = PenaltyConfig::default();
        let scored = score_one(&listing(ConditionGrade::NearMint, 2.0), None, &config);
        assert_eq!(scored.reason, PenaltyReason::Clean);
        assert!((scored.effective_price - 2.0).abs() < 1e-12);
        assert!((scored.multiplier - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_condition_multiplier_applies_without_preferences() {
        let config = PenaltyConfig::default();
        let scored = score_one(&listing(ConditionGrade::Played, 2.0), None, &config);
        assert_eq!(scored.reason, PenaltyReason::Condition);
        assert!((scored.effective_price - 3.2).abs() < 1e-12);
    }

    #[test]
    fn test_poor_grade_dominates_any_price() {
        let config = PenaltyConfig::default();
        let poor = score_one(&listing(ConditionGrade::Poor, 0.05), None, &config);
        let played = score_one(&listing(ConditionGrade::Played, 10.0), None, &config);
        assert!(poor.effective_price > played.effective_price);
    }

    // ---- Language asymmetry ----

    #[test]
    fn test_language_upgrade_is_free() {
        let config = PenaltyConfig::default();
        let mut wish = prefs();
        wish.preferred_language = Some(Language::Japanese);
        // English offered, Japanese preferred: English is more common.
        let scored = score_one(&listing(ConditionGrade::NearMint, 2.0), Some(&wish), &config);
        assert!((scored.effective_price - 2.0).abs() < 1e-12);
        assert_eq!(scored.reason, PenaltyReason::Clean);
    }

    #[test]
    fn test_language_downgrade_is_graduated() {
        let config = PenaltyConfig::default();
        let mut wish = prefs();
        wish.preferred_language = Some(Language::English);

        let mut german = listing(ConditionGrade::NearMint, 2.0);
        german.language = Language::German;
        let mut korean = listing(ConditionGrade::NearMint, 2.0);
        korean.language = Language::Korean;

        let scored_german = score_one(&german, Some(&wish), &config);
        let scored_korean = score_one(&korean, Some(&wish), &config);
        assert!(scored_german.effective_price > 2.0);
        assert!(scored_korean.effective_price > scored_german.effective_price);
        assert_eq!(scored_korean.reason, PenaltyReason::Preference);
    }

    // ---- Printing asymmetry ----

    #[test]
    fn test_printing_upgrade_is_free_downgrade_is_not() {
        let config = PenaltyConfig::default();
        let mut wish = prefs();
        wish.preferred_printing = Some(Printing::Unlimited);

        let mut first = listing(ConditionGrade::NearMint, 2.0);
        first.printing = Printing::FirstEdition;
        let mut reprint = listing(ConditionGrade::NearMint, 2.0);
        reprint.printing = Printing::Reprint;

        assert!((score_one(&first, Some(&wish), &config).effective_price - 2.0).abs() < 1e-12);
        assert!(score_one(&reprint, Some(&wish), &config).effective_price > 2.0);
    }

    // ---- Fixed mismatches ----

    #[test]
    fn test_finish_and_set_mismatch_multiply() {
        let config = PenaltyConfig::default();
        let mut wish = prefs();
        wish.preferred_finish = Some(true);
        wish.preferred_set = Some("Beta".into());

        let scored = score_one(&listing(ConditionGrade::NearMint, 2.0), Some(&wish), &config);
        let expected = 2.0 * config.finish_mismatch * config.set_mismatch;
        assert!((scored.effective_price - expected).abs() < 1e-9);
    }

    // ---- Strict mode ----

    #[test]
    fn test_strict_mismatch_prices_at_sentinel() {
        let config = PenaltyConfig::default().with_strict_mode(true);
        let mut wish = prefs();
        wish.preferred_finish = Some(true);

        let scored = score_one(&listing(ConditionGrade::NearMint, 2.0), Some(&wish), &config);
        assert_eq!(scored.reason, PenaltyReason::StrictMismatch);
        assert_eq!(scored.effective_price, config.high_cost_sentinel);
        assert!(!scored.is_usable(&config));
    }

    #[test]
    fn test_strict_match_is_untouched() {
        let config = PenaltyConfig::default().with_strict_mode(true);
        let mut wish = prefs();
        wish.preferred_language = Some(Language::English);
        wish.preferred_finish = Some(false);

        let scored = score_one(&listing(ConditionGrade::NearMint, 2.0), Some(&wish), &config);
        assert_eq!(scored.reason, PenaltyReason::Clean);
        assert!(scored.is_usable(&config));
    }

    #[test]
    fn test_strict_quality_below_preference_rejected() {
        let config = PenaltyConfig::default().with_strict_mode(true);
        let mut wish = prefs();
        wish.preferred_quality = Some(ConditionGrade::Excellent);

        let scored = score_one(&listing(ConditionGrade::Played, 2.0), Some(&wish), &config);
        assert_eq!(scored.reason, PenaltyReason::StrictMismatch);
    }

    // ---- Batch identity ----

    #[test]
    fn test_batch_equals_per_row() {
        let config = PenaltyConfig::default();
        let mut wish = prefs();
        wish.preferred_language = Some(Language::English);
        let wishlist = vec![wish.clone()];

        let listings: Vec<Listing> = (0..600)
            .map(|i| {
                let mut l = listing(
                    if i % 3 == 0 {
                        ConditionGrade::Good
                    } else {
                        ConditionGrade::NearMint
                    },
                    0.5 + i as f64 * 0.01,
                );
                if i % 2 == 0 {
                    l.language = Language::German;
                }
                l
            })
            .collect();

        // Past the parallel threshold, so this exercises the rayon path.
        let batch = apply(&listings, &wishlist, &config);
        for (listing, scored) in listings.iter().zip(batch.iter()) {
            let single = score_one(listing, Some(&wish), &config);
            assert_eq!(&single, scored);
        }
    }

    // ---- Property: grade monotonicity ----

    proptest! {
        #[test]
        fn prop_worse_grade_never_cheaper(price in 0.01f64..500.0) {
            let config = PenaltyConfig::default();
            let grades = [
                ConditionGrade::Mint,
                ConditionGrade::NearMint,
                ConditionGrade::Excellent,
                ConditionGrade::Good,
                ConditionGrade::LightPlayed,
                ConditionGrade::Played,
                ConditionGrade::Poor,
            ];
            let mut previous = 0.0f64;
            for grade in grades {
                let scored = score_one(&listing(grade, price), None, &config);
                prop_assert!(scored.effective_price >= previous);
                previous = scored.effective_price;
            }
        }
    }
}

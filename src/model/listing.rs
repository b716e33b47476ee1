//! Listing and wishlist records.
//!
//! These are the data-only inputs to the engine. A [`Listing`] is immutable
//! once ingested; the penalty engine derives an effective price without
//! mutating it (see [`crate::penalty`]).

use serde::{Deserialize, Serialize};

/// Condition grade of a physical item, best first.
///
/// Grades are ordinal: a strictly worse grade never yields a lower
/// effective price than a better grade, all else equal. `Poor` carries a
/// multiplier far outside the normal range and is effectively excluded
/// from any cost-minimizing allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionGrade {
    Mint,
    NearMint,
    Excellent,
    Good,
    LightPlayed,
    Played,
    Poor,
}

impl ConditionGrade {
    /// Fixed price multiplier for this grade.
    pub fn price_multiplier(self) -> f64 {
        match self {
            ConditionGrade::Mint => 1.0,
            ConditionGrade::NearMint => 1.0,
            ConditionGrade::Excellent => 1.05,
            ConditionGrade::Good => 1.15,
            ConditionGrade::LightPlayed => 1.30,
            ConditionGrade::Played => 1.60,
            // Out of the normal range on purpose: a Poor copy should lose
            // to any alternative, including paying several times the price.
            ConditionGrade::Poor => 1_000.0,
        }
    }

    /// Quality score in `[0, 1]`, higher is better.
    ///
    /// Used by the quality objective of the metaheuristic optimizers.
    pub fn quality_score(self) -> f64 {
        match self {
            ConditionGrade::Mint => 1.0,
            ConditionGrade::NearMint => 0.95,
            ConditionGrade::Excellent => 0.85,
            ConditionGrade::Good => 0.70,
            ConditionGrade::LightPlayed => 0.55,
            ConditionGrade::Played => 0.40,
            ConditionGrade::Poor => 0.10,
        }
    }

    /// Whether this grade meets or exceeds `preferred`.
    pub fn satisfies(self, preferred: ConditionGrade) -> bool {
        self <= preferred
    }
}

/// Listing language.
///
/// Languages carry a commonality rank used by the asymmetric language
/// penalty: receiving a more common language than asked for is a free
/// upgrade, a less common one is penalized on a graduated scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    English,
    German,
    French,
    Spanish,
    Italian,
    Japanese,
    Korean,
    Russian,
    ChineseSimplified,
    Portuguese,
}

impl Language {
    /// Commonality rank, 0 = most common.
    pub fn commonality_rank(self) -> u8 {
        match self {
            Language::English => 0,
            Language::German => 1,
            Language::French => 1,
            Language::Spanish => 1,
            Language::Italian => 1,
            Language::Japanese => 2,
            Language::Portuguese => 2,
            Language::Korean => 3,
            Language::Russian => 3,
            Language::ChineseSimplified => 3,
        }
    }
}

/// Printing variant, most desirable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Printing {
    FirstEdition,
    Unlimited,
    Reprint,
}

/// One candidate listing offered by a source.
///
/// Owned by the caller and read-only inside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Name of the offered item.
    pub item_name: String,

    /// Stable identifier of the offering source.
    pub source_id: u64,

    /// Human-readable source name.
    pub source_name: String,

    /// Unit price before any penalty.
    pub price: f64,

    /// Units available from this source.
    pub quantity_available: u32,

    /// Condition grade of the offered copies.
    pub quality_grade: ConditionGrade,

    /// Language of the offered copies.
    pub language: Language,

    /// Printing variant of the offered copies.
    pub printing: Printing,

    /// Whether the copies have a special finish (foil or equivalent).
    pub is_special_finish: bool,

    /// Set the copies belong to.
    pub set_name: String,
}

/// One required item with optional attribute preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Name of the required item.
    pub item_name: String,

    /// Units required; at least 1.
    pub required_quantity: u32,

    /// Minimum acceptable condition grade, if any.
    #[serde(default)]
    pub preferred_quality: Option<ConditionGrade>,

    /// Preferred language, if any.
    #[serde(default)]
    pub preferred_language: Option<Language>,

    /// Preferred printing variant, if any.
    #[serde(default)]
    pub preferred_printing: Option<Printing>,

    /// Preferred set, if any.
    #[serde(default)]
    pub preferred_set: Option<String>,

    /// Preferred finish, if any (`true` = special finish).
    #[serde(default)]
    pub preferred_finish: Option<bool>,
}

impl WishlistItem {
    /// Creates a wishlist entry with no attribute preferences.
    pub fn new(item_name: impl Into<String>, required_quantity: u32) -> Self {
        Self {
            item_name: item_name.into(),
            required_quantity,
            preferred_quality: None,
            preferred_language: None,
            preferred_printing: None,
            preferred_set: None,
            preferred_finish: None,
        }
    }

    /// Whether any attribute preference is declared.
    pub fn has_preferences(&self) -> bool {
        self.preferred_quality.is_some()
            || self.preferred_language.is_some()
            || self.preferred_printing.is_some()
            || self.preferred_set.is_some()
            || self.preferred_finish.is_some()
    }
}

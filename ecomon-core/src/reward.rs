//! Reward Calculator — eco-action catalog and points/XP policy.
//!
//! Two pure functions:
//! - [`for_verified_action`]: base (points, xp) for one of ten action kinds,
//!   scaled by the verifier's confidence and rounded to nearest.
//! - [`QuizRewardPolicy::for_quiz`]: per-correct rewards plus a bonus tier
//!   for perfect and high scores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EcomonError, Result};

// ---------------------------------------------------------------------------
// Action catalog
// ---------------------------------------------------------------------------

/// Grouping used for UI filters and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    /// Sorting, reusing and composting.
    Recycling,
    /// Power consumption.
    Energy,
    /// Water usage.
    Water,
    /// Commuting.
    Transport,
    /// Ecosystems and wildlife.
    Nature,
}

/// The ten verifiable eco-action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EcoAction {
    /// Properly sort and recycle materials.
    Recycle,
    /// Plant a tree or seedling.
    PlantTree,
    /// Clean up trash from beaches or waterways.
    CleanBeach,
    /// Use public transport instead of driving.
    PublicTransit,
    /// Cycle instead of driving.
    BikeCommute,
    /// Compost organic waste.
    Compost,
    /// Use reusable shopping bags.
    ReusableBag,
    /// Reduce energy consumption.
    EnergySaving,
    /// Reduce water usage.
    WaterSaving,
    /// Help local wildlife.
    WildlifeHelp,
}

impl EcoAction {
    /// All actions in catalog order.
    pub const ALL: [Self; 10] = [
        Self::Recycle,
        Self::PlantTree,
        Self::CleanBeach,
        Self::PublicTransit,
        Self::BikeCommute,
        Self::Compost,
        Self::ReusableBag,
        Self::EnergySaving,
        Self::WaterSaving,
        Self::WildlifeHelp,
    ];

    /// Stable kebab-case key used on the wire.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Recycle => "recycle",
            Self::PlantTree => "plant-tree",
            Self::CleanBeach => "clean-beach",
            Self::PublicTransit => "public-transit",
            Self::BikeCommute => "bike-commute",
            Self::Compost => "compost",
            Self::ReusableBag => "reusable-bag",
            Self::EnergySaving => "energy-saving",
            Self::WaterSaving => "water-saving",
            Self::WildlifeHelp => "wildlife-help",
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recycle => "Recycle",
            Self::PlantTree => "Plant a Tree",
            Self::CleanBeach => "Beach Cleanup",
            Self::PublicTransit => "Public Transit",
            Self::BikeCommute => "Bike Commute",
            Self::Compost => "Compost",
            Self::ReusableBag => "Reusable Bag",
            Self::EnergySaving => "Energy Saving",
            Self::WaterSaving => "Water Conservation",
            Self::WildlifeHelp => "Wildlife Support",
        }
    }

    /// One-line description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Recycle => "Properly sort and recycle materials",
            Self::PlantTree => "Plant a tree or seedling",
            Self::CleanBeach => "Clean up trash from beaches or waterways",
            Self::PublicTransit => "Use bus, train, or subway instead of driving",
            Self::BikeCommute => "Cycle instead of driving",
            Self::Compost => "Compost organic waste",
            Self::ReusableBag => "Use reusable bags for shopping",
            Self::EnergySaving => "Reduce energy consumption",
            Self::WaterSaving => "Reduce water usage",
            Self::WildlifeHelp => "Help local wildlife (bird feeders, bee houses, etc.)",
        }
    }

    /// Category.
    #[must_use]
    pub fn category(self) -> ActionCategory {
        match self {
            Self::Recycle | Self::Compost | Self::ReusableBag => ActionCategory::Recycling,
            Self::PlantTree | Self::CleanBeach | Self::WildlifeHelp => ActionCategory::Nature,
            Self::PublicTransit | Self::BikeCommute => ActionCategory::Transport,
            Self::EnergySaving => ActionCategory::Energy,
            Self::WaterSaving => ActionCategory::Water,
        }
    }

    /// Unscaled reward at full confidence.
    #[must_use]
    pub fn base_reward(self) -> Reward {
        let (points, xp) = match self {
            Self::Recycle => (10, 5),
            Self::PlantTree => (50, 25),
            Self::CleanBeach => (40, 20),
            Self::PublicTransit => (15, 8),
            Self::BikeCommute => (20, 10),
            Self::Compost => (15, 8),
            Self::ReusableBag => (5, 3),
            Self::EnergySaving => (25, 12),
            Self::WaterSaving => (20, 10),
            Self::WildlifeHelp => (30, 15),
        };
        Reward { points, xp }
    }
}

impl fmt::Display for EcoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EcoAction {
    type Err = EcomonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.key() == s)
            .ok_or_else(|| EcomonError::UnknownActionType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

/// Points and XP granted for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Eco-points credited to the guardian.
    pub points: u32,
    /// Experience fed to the evolution ledger.
    pub xp: u32,
}

impl Reward {
    /// No reward.
    pub const NONE: Self = Self { points: 0, xp: 0 };
}

fn check_confidence(confidence: f64) -> Result<()> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(EcomonError::InvalidInput(format!(
            "confidence must be within [0, 1], got {confidence}"
        )))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(base: u32, confidence: f64) -> u32 {
    // confidence is in [0, 1], so the product stays within u32.
    (f64::from(base) * confidence).round() as u32
}

/// Reward for a verified action given by its wire key.
///
/// # Errors
///
/// [`EcomonError::UnknownActionType`] for a key outside the catalog;
/// [`EcomonError::InvalidInput`] for confidence outside `[0, 1]` or NaN.
pub fn for_verified_action(action_type: &str, confidence: f64) -> Result<Reward> {
    let action: EcoAction = action_type.parse()?;
    for_action(action, confidence)
}

/// Reward for a verified action.
///
/// # Errors
///
/// [`EcomonError::InvalidInput`] for confidence outside `[0, 1]` or NaN.
pub fn for_action(action: EcoAction, confidence: f64) -> Result<Reward> {
    check_confidence(confidence)?;
    let base = action.base_reward();
    Ok(Reward {
        points: scale(base.points, confidence),
        xp: scale(base.xp, confidence),
    })
}

/// `round(correct / total * 100)`, halves rounded up.
///
/// Callers must ensure `total > 0` and `correct <= total`.
#[must_use]
pub fn quiz_percentage(correct: u32, total: u32) -> u8 {
    let (c, t) = (u64::from(correct), u64::from(total.max(1)));
    let pct = (c * 200 + t) / (2 * t);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Quiz scoring policy. Defaults: 10 points and 5 XP per correct answer;
/// +50/+25 for a perfect score; +25/+10 at 80% or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRewardPolicy {
    /// Points per correct answer.
    #[serde(default = "default_points_per_correct")]
    pub points_per_correct: u32,
    /// XP per correct answer.
    #[serde(default = "default_xp_per_correct")]
    pub xp_per_correct: u32,
    /// Minimum percentage for the high-score bonus.
    #[serde(default = "default_high_score_percent")]
    pub high_score_percent: u8,
    /// Bonus points at 100%.
    #[serde(default = "default_perfect_points")]
    pub perfect_bonus_points: u32,
    /// Bonus XP at 100%.
    #[serde(default = "default_perfect_xp")]
    pub perfect_bonus_xp: u32,
    /// Bonus points at or above `high_score_percent`.
    #[serde(default = "default_high_points")]
    pub high_bonus_points: u32,
    /// Bonus XP at or above `high_score_percent`.
    #[serde(default = "default_high_xp")]
    pub high_bonus_xp: u32,
}

fn default_points_per_correct() -> u32 { 10 }
fn default_xp_per_correct() -> u32 { 5 }
fn default_high_score_percent() -> u8 { 80 }
fn default_perfect_points() -> u32 { 50 }
fn default_perfect_xp() -> u32 { 25 }
fn default_high_points() -> u32 { 25 }
fn default_high_xp() -> u32 { 10 }

impl Default for QuizRewardPolicy {
    fn default() -> Self {
        Self {
            points_per_correct: 10,
            xp_per_correct: 5,
            high_score_percent: 80,
            perfect_bonus_points: 50,
            perfect_bonus_xp: 25,
            high_bonus_points: 25,
            high_bonus_xp: 10,
        }
    }
}

impl QuizRewardPolicy {
    /// Reward for `correct` right answers out of `total`.
    ///
    /// # Errors
    ///
    /// [`EcomonError::InvalidInput`] when `total == 0` or `correct > total`.
    pub fn for_quiz(&self, correct: u32, total: u32) -> Result<Reward> {
        validate_quiz(correct, total)?;
        let pct = quiz_percentage(correct, total);
        let (bonus_points, bonus_xp) = if pct == 100 {
            (self.perfect_bonus_points, self.perfect_bonus_xp)
        } else if pct >= self.high_score_percent {
            (self.high_bonus_points, self.high_bonus_xp)
        } else {
            (0, 0)
        };
        Ok(Reward {
            points: correct
                .saturating_mul(self.points_per_correct)
                .saturating_add(bonus_points),
            xp: correct
                .saturating_mul(self.xp_per_correct)
                .saturating_add(bonus_xp),
        })
    }
}

/// Reward for a quiz under the default policy.
///
/// # Errors
///
/// See [`QuizRewardPolicy::for_quiz`].
pub fn for_quiz(correct: u32, total: u32) -> Result<Reward> {
    QuizRewardPolicy::default().for_quiz(correct, total)
}

/// Reject empty quizzes and impossible tallies.
///
/// # Errors
///
/// [`EcomonError::InvalidInput`] when `total == 0` or `correct > total`.
pub fn validate_quiz(correct: u32, total: u32) -> Result<()> {
    if total == 0 {
        return Err(EcomonError::InvalidInput("quiz has no questions".to_string()));
    }
    if correct > total {
        return Err(EcomonError::InvalidInput(format!(
            "{correct} correct answers out of {total} questions"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plant_tree_at_eighty_percent() {
        let r = for_verified_action("plant-tree", 0.8).expect("known action");
        assert_eq!(r, Reward { points: 40, xp: 20 });
    }

    #[test]
    fn confidence_rounds_to_nearest() {
        // 8 * 0.5 = 4, 15 * 0.5 = 7.5 → 8
        let r = for_action(EcoAction::PublicTransit, 0.5).expect("valid");
        assert_eq!(r, Reward { points: 8, xp: 4 });
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(matches!(
            for_verified_action("litter", 1.0),
            Err(EcomonError::UnknownActionType(t)) if t == "litter"
        ));
    }

    #[test]
    fn confidence_out_of_range_is_rejected() {
        for c in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                for_verified_action("recycle", c),
                Err(EcomonError::InvalidInput(_))
            ));
        }
        assert_eq!(for_action(EcoAction::Recycle, 0.0).expect("zero ok"), Reward::NONE);
    }

    #[test]
    fn perfect_quiz() {
        assert_eq!(quiz_percentage(5, 5), 100);
        assert_eq!(for_quiz(5, 5).expect("valid"), Reward { points: 100, xp: 50 });
    }

    #[test]
    fn high_score_quiz() {
        // 4/5 = 80%
        assert_eq!(for_quiz(4, 5).expect("valid"), Reward { points: 65, xp: 30 });
        // 3/5 = 60%
        assert_eq!(for_quiz(3, 5).expect("valid"), Reward { points: 30, xp: 15 });
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(quiz_percentage(1, 8), 13); // 12.5
        assert_eq!(quiz_percentage(2, 3), 67);
        assert_eq!(quiz_percentage(0, 7), 0);
    }

    #[test]
    fn bonus_tier_uses_rounded_percentage() {
        // 199/200 = 99.5% rounds to 100 and earns the perfect bonus.
        assert_eq!(quiz_percentage(199, 200), 100);
        assert_eq!(for_quiz(199, 200).expect("valid").points, 199 * 10 + 50);
        assert_eq!(quiz_percentage(99, 100), 99);
    }

    #[test]
    fn invalid_tallies() {
        assert!(matches!(for_quiz(0, 0), Err(EcomonError::InvalidInput(_))));
        assert!(matches!(for_quiz(6, 5), Err(EcomonError::InvalidInput(_))));
    }

    #[test]
    fn custom_policy() {
        let policy = QuizRewardPolicy { high_score_percent: 50, ..QuizRewardPolicy::default() };
        assert_eq!(policy.for_quiz(3, 5).expect("valid"), Reward { points: 55, xp: 25 });
    }

    #[test]
    fn catalog_is_consistent() {
        for a in EcoAction::ALL {
            assert_eq!(a.key().parse::<EcoAction>().expect("key"), a);
            let json = serde_json::to_string(&a).expect("serialize");
            assert_eq!(json, format!("\"{}\"", a.key()));
        }
    }
}

//! Achievement collectibles.
//!
//! Nine achievement kinds, each with a rarity that sets the bonus points
//! credited after a successful mint. Minting is fire-and-forget: the service
//! marks an achievement awarded before the mint call, and a failed mint
//! never rolls back companion or guardian state.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ecomon_core::{ActivityStats, EcomonError, UserId};

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// How rare an achievement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    /// Gray.
    Common,
    /// Green.
    Uncommon,
    /// Blue.
    Rare,
    /// Purple.
    Epic,
    /// Gold.
    Legendary,
}

impl Rarity {
    /// Points credited to the guardian after a successful mint.
    #[must_use]
    pub fn bonus_points(self) -> u32 {
        match self {
            Self::Common => 10,
            Self::Uncommon => 25,
            Self::Rare => 50,
            Self::Epic => 100,
            Self::Legendary => 250,
        }
    }

    /// Relative drop rate in percent.
    #[must_use]
    pub fn drop_rate(self) -> u8 {
        match self {
            Self::Common => 50,
            Self::Uncommon => 25,
            Self::Rare => 15,
            Self::Epic => 8,
            Self::Legendary => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// NftType
// ---------------------------------------------------------------------------

/// Achievement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NftType {
    /// 10 verified eco-actions.
    EcoWarrior,
    /// 5 trees planted.
    TreePlanter,
    /// 3 beach cleanups.
    OceanGuardian,
    /// 50 items recycled.
    RecyclingChampion,
    /// 100 kg CO2 offset. Never awarded automatically.
    CarbonNeutral,
    /// 30-day streak.
    StreakMaster,
    /// 10 perfect quizzes.
    QuizGenius,
    /// Companion reached stage 3.
    VerdleafCompanion,
    /// Every automatically awarded achievement.
    LegendaryGuardian,
}

impl NftType {
    /// All kinds in catalog order.
    pub const ALL: [Self; 9] = [
        Self::EcoWarrior,
        Self::TreePlanter,
        Self::OceanGuardian,
        Self::RecyclingChampion,
        Self::CarbonNeutral,
        Self::StreakMaster,
        Self::QuizGenius,
        Self::VerdleafCompanion,
        Self::LegendaryGuardian,
    ];

    /// Kinds that count toward [`NftType::LegendaryGuardian`].
    pub const LEGENDARY_PREREQUISITES: [Self; 7] = [
        Self::EcoWarrior,
        Self::TreePlanter,
        Self::OceanGuardian,
        Self::RecyclingChampion,
        Self::StreakMaster,
        Self::QuizGenius,
        Self::VerdleafCompanion,
    ];

    /// Kebab-case key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::EcoWarrior => "eco-warrior",
            Self::TreePlanter => "tree-planter",
            Self::OceanGuardian => "ocean-guardian",
            Self::RecyclingChampion => "recycling-champion",
            Self::CarbonNeutral => "carbon-neutral",
            Self::StreakMaster => "streak-master",
            Self::QuizGenius => "quiz-genius",
            Self::VerdleafCompanion => "verdleaf-companion",
            Self::LegendaryGuardian => "legendary-guardian",
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::EcoWarrior => "Eco Warrior",
            Self::TreePlanter => "Tree Planter",
            Self::OceanGuardian => "Ocean Guardian",
            Self::RecyclingChampion => "Recycling Champion",
            Self::CarbonNeutral => "Carbon Neutral Hero",
            Self::StreakMaster => "Streak Master",
            Self::QuizGenius => "Eco Quiz Genius",
            Self::VerdleafCompanion => "Verdleaf Companion",
            Self::LegendaryGuardian => "Legendary Guardian",
        }
    }

    /// Flavor text.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::EcoWarrior => "Awarded for completing 10 verified eco-actions. You are a true defender of the planet!",
            Self::TreePlanter => "Awarded for planting or verifying 5 trees. Every tree counts in the fight against climate change!",
            Self::OceanGuardian => "Awarded for participating in 3 beach cleanups. Protecting our oceans from pollution!",
            Self::RecyclingChampion => "Awarded for recycling 50 items. Master of the three Rs: Reduce, Reuse, Recycle!",
            Self::CarbonNeutral => "Awarded for offsetting 100kg of CO2 through eco-actions. Climate champion!",
            Self::StreakMaster => "Awarded for maintaining a 30-day eco-action streak. Consistency is key!",
            Self::QuizGenius => "Awarded for achieving perfect scores on 10 eco quizzes. Knowledge is power!",
            Self::VerdleafCompanion => "Your unique Verdleaf AI companion as an NFT. Evolution stage and traits preserved forever!",
            Self::LegendaryGuardian => "The ultimate achievement. Awarded to those who have mastered all aspects of sustainable living.",
        }
    }

    /// Rarity tier.
    #[must_use]
    pub fn rarity(self) -> Rarity {
        match self {
            Self::EcoWarrior | Self::RecyclingChampion => Rarity::Common,
            Self::TreePlanter | Self::QuizGenius => Rarity::Uncommon,
            Self::OceanGuardian | Self::StreakMaster | Self::VerdleafCompanion => Rarity::Rare,
            Self::CarbonNeutral => Rarity::Epic,
            Self::LegendaryGuardian => Rarity::Legendary,
        }
    }

    /// What earns it.
    #[must_use]
    pub fn requirement(self) -> &'static str {
        match self {
            Self::EcoWarrior => "10 verified eco-actions",
            Self::TreePlanter => "5 trees planted",
            Self::OceanGuardian => "3 beach cleanups",
            Self::RecyclingChampion => "50 items recycled",
            Self::CarbonNeutral => "100kg CO2 offset",
            Self::StreakMaster => "30-day streak",
            Self::QuizGenius => "10 perfect quiz scores",
            Self::VerdleafCompanion => "Reach Evolution Stage 3",
            Self::LegendaryGuardian => "Complete all achievements",
        }
    }
}

impl fmt::Display for NftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for NftType {
    type Err = EcomonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.key() == s)
            .ok_or_else(|| EcomonError::InvalidInput(format!("unknown achievement type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Everything achievement checks look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementProgress {
    /// Lifetime tallies.
    pub stats: ActivityStats,
    /// Current daily streak.
    pub streak: u32,
    /// Companion evolution stage (0 without a companion).
    pub stage: u8,
}

impl AchievementProgress {
    /// The tally an achievement is measured by, if it has one.
    #[must_use]
    pub fn value_for(&self, nft: NftType) -> Option<u64> {
        let v = match nft {
            NftType::EcoWarrior => self.stats.verified_actions,
            NftType::TreePlanter => self.stats.trees_planted,
            NftType::OceanGuardian => self.stats.beach_cleanups,
            NftType::RecyclingChampion => self.stats.items_recycled,
            NftType::StreakMaster => self.streak,
            NftType::QuizGenius => self.stats.perfect_quizzes,
            NftType::VerdleafCompanion => u32::from(self.stage),
            NftType::CarbonNeutral | NftType::LegendaryGuardian => return None,
        };
        Some(u64::from(v))
    }
}

/// Achievements earned by `progress` that are not in `awarded` yet, in
/// catalog order. [`NftType::LegendaryGuardian`] is included once every
/// prerequisite is either already awarded or earned in the same call.
#[must_use]
pub fn newly_earned(progress: &AchievementProgress, awarded: &BTreeSet<String>) -> Vec<NftType> {
    let threshold = |nft: NftType| -> Option<u64> {
        match nft {
            NftType::EcoWarrior | NftType::QuizGenius => Some(10),
            NftType::TreePlanter => Some(5),
            NftType::OceanGuardian | NftType::VerdleafCompanion => Some(3),
            NftType::RecyclingChampion => Some(50),
            NftType::StreakMaster => Some(30),
            NftType::CarbonNeutral | NftType::LegendaryGuardian => None,
        }
    };

    let mut earned: Vec<NftType> = NftType::LEGENDARY_PREREQUISITES
        .into_iter()
        .filter(|nft| !awarded.contains(nft.key()))
        .filter(|nft| match (progress.value_for(*nft), threshold(*nft)) {
            (Some(v), Some(t)) => v >= t,
            _ => false,
        })
        .collect();

    let legendary = NftType::LegendaryGuardian;
    if !awarded.contains(legendary.key())
        && NftType::LEGENDARY_PREREQUISITES
            .iter()
            .all(|p| awarded.contains(p.key()) || earned.contains(p))
    {
        earned.push(legendary);
    }
    earned
}

// ---------------------------------------------------------------------------
// Mint contract
// ---------------------------------------------------------------------------

/// What an achievement was earned for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementData {
    /// Achievement key.
    #[serde(rename = "type")]
    pub kind: String,
    /// Tally at the time it was earned.
    pub value: u64,
    /// Human-readable requirement.
    pub description: String,
    /// When it was earned.
    pub earned_at: DateTime<Utc>,
}

impl AchievementData {
    /// Describe `nft` as earned from `progress` at `at`.
    #[must_use]
    pub fn for_award(nft: NftType, progress: &AchievementProgress, at: DateTime<Utc>) -> Self {
        Self {
            kind: nft.key().to_string(),
            value: progress.value_for(nft).unwrap_or_default(),
            description: nft.requirement().to_string(),
            earned_at: at,
        }
    }
}

/// Proof of a successful mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    /// Address of the minted token.
    pub mint_address: String,
    /// Transaction signature.
    pub tx_signature: String,
}

/// Mint failures.
#[derive(Debug, Clone, Error)]
pub enum MintError {
    /// The mint service refused the request.
    #[error("Mint rejected: {0}")]
    Rejected(String),

    /// The mint service could not be reached.
    #[error("Mint service unavailable: {0}")]
    Unavailable(String),
}

/// Mints achievement collectibles.
pub trait MintService: Send + Sync + 'static {
    /// Mint `nft` for `owner`.
    fn mint(
        &self,
        owner: UserId,
        nft: NftType,
        achievement: AchievementData,
    ) -> impl Future<Output = Result<MintReceipt, MintError>> + Send;
}

/// Demo-mode minter: succeeds with synthetic addresses.
#[derive(Debug, Default)]
pub struct SimulatedMint {
    next: AtomicU64,
}

impl SimulatedMint {
    /// A fresh simulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MintService for SimulatedMint {
    fn mint(
        &self,
        owner: UserId,
        nft: NftType,
        _achievement: AchievementData,
    ) -> impl Future<Output = Result<MintReceipt, MintError>> + Send {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let receipt = MintReceipt {
            mint_address: format!("sim-{}-{n:06}", nft.key()),
            tx_signature: format!("sim-tx-{owner}-{n:06}"),
        };
        async move { Ok(receipt) }
    }
}

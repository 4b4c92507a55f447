//! Evolution Ledger — XP, stage and branch commitment.
//!
//! A companion starts at stage 1 with no branch. XP accumulates through
//! rewards but never advances the stage on its own: advancing is an explicit
//! caller action gated by [`EvolutionLedger::can_advance`]. The first advance
//! commits the companion to one of five [`Branch`]es for the rest of its life.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EcomonError, Result};
use crate::types::Species;

/// Highest reachable stage.
pub const MAX_STAGE: u8 = 5;

// ---------------------------------------------------------------------------
// Branch catalog
// ---------------------------------------------------------------------------

/// One of the five mutually exclusive evolution paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Branch {
    /// Forests and plant life.
    ForestGuardian,
    /// Seas and marine life.
    OceanKeeper,
    /// Sustainable city living.
    UrbanSage,
    /// Clean air and atmosphere.
    SkyWatcher,
    /// Sustainable energy and climate action.
    FlameKeeper,
}

/// Static metadata for one (branch, stage) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageInfo {
    /// Stage number, 1-based.
    pub stage: u8,
    /// Form name.
    pub name: &'static str,
    /// Flavour text.
    pub description: &'static str,
    /// Sprite asset path.
    pub sprite: &'static str,
    /// Abilities unlocked at this stage.
    pub abilities: &'static [&'static str],
}

const fn stage(
    stage: u8,
    name: &'static str,
    description: &'static str,
    sprite: &'static str,
    abilities: &'static [&'static str],
) -> StageInfo {
    StageInfo { stage, name, description, sprite, abilities }
}

static FOREST_GUARDIAN: [StageInfo; 5] = [
    stage(1, "Sproutling", "A tiny sprout full of potential", "/ecomon/sproutling.png",
        &["Photosynthesis", "Root Connection"]),
    stage(2, "Bloomkin", "Growing stronger with each eco-action", "/ecomon/bloomkin.png",
        &["Leaf Shield", "Growth Burst"]),
    stage(3, "Florazen", "Branches reaching for the sky", "/ecomon/florazen.png",
        &["Forest Whisper", "Bark Armor"]),
    stage(4, "Terravine", "Wise and powerful guardian of the forest", "/ecomon/terravine.png",
        &["Forest Call", "Nature's Embrace", "Root Network"]),
    stage(5, "Gaiabloom", "Legendary protector, connected to all forests", "/ecomon/gaiabloom.png",
        &["Global Canopy", "Life Bloom", "Ancient Wisdom", "Ecosystem Bond"]),
];

static OCEAN_KEEPER: [StageInfo; 5] = [
    stage(1, "Droplet", "A single drop with ocean dreams", "/ecomon/ocean/stage-1.png",
        &["Water Sense", "Purify"]),
    stage(2, "Stream", "Flowing with purpose", "/ecomon/ocean/stage-2.png",
        &["Current Control", "Splash"]),
    stage(3, "Wave Rider", "Dancing with the tides", "/ecomon/ocean/stage-3.png",
        &["Tidal Force", "Marine Call"]),
    stage(4, "Ocean Spirit", "One with the deep blue", "/ecomon/ocean/stage-4.png",
        &["Storm Surge", "Coral Shield", "Deep Dive"]),
    stage(5, "Leviathan Guardian", "Legendary keeper of all waters", "/ecomon/ocean/stage-5.png",
        &["Ocean's Wrath", "Marine Sanctuary", "Tsunami Shield", "Abyss Connection"]),
];

static URBAN_SAGE: [StageInfo; 5] = [
    stage(1, "Recycling Sprite", "Finding treasures in trash", "/ecomon/urban/stage-1.png",
        &["Sort Sense", "Upcycle"]),
    stage(2, "Green Commuter", "Mastering sustainable travel", "/ecomon/urban/stage-2.png",
        &["Transit Link", "Carbon Counter"]),
    stage(3, "Eco Citizen", "Role model for urban sustainability", "/ecomon/urban/stage-3.png",
        &["Community Inspire", "Waste Warrior"]),
    stage(4, "City Transformer", "Reshaping urban landscapes", "/ecomon/urban/stage-4.png",
        &["Urban Garden", "Zero Waste Zone", "Green Infrastructure"]),
    stage(5, "Metropolitan Guardian", "Legendary protector of sustainable cities", "/ecomon/urban/stage-5.png",
        &["City Harmony", "Industrial Revolution", "Smart Grid", "Circular Economy"]),
];

static SKY_WATCHER: [StageInfo; 5] = [
    stage(1, "Breeze", "A gentle whisper of wind", "/ecomon/sky/stage-1.png",
        &["Air Sense", "Fresh Gust"]),
    stage(2, "Wind Dancer", "Playing with the currents", "/ecomon/sky/stage-2.png",
        &["Wind Ride", "Pollution Filter"]),
    stage(3, "Cloud Shaper", "Master of atmospheric balance", "/ecomon/sky/stage-3.png",
        &["Weather Influence", "Carbon Capture"]),
    stage(4, "Storm Caller", "Commanding the skies", "/ecomon/sky/stage-4.png",
        &["Cleansing Storm", "Ozone Shield", "Jet Stream"]),
    stage(5, "Atmosphere Sentinel", "Legendary guardian of Earth's blanket", "/ecomon/sky/stage-5.png",
        &["Climate Harmony", "Aurora Shield", "Stratosphere Command", "Global Breath"]),
];

static FLAME_KEEPER: [StageInfo; 5] = [
    stage(1, "Ember Sprite", "A small flame of hope", "/ecomon/flame/stage-1.png",
        &["Warm Heart", "Energy Sense"]),
    stage(2, "Solar Keeper", "Harnessing the sun's power", "/ecomon/flame/stage-2.png",
        &["Solar Charge", "Heat Shield"]),
    stage(3, "Climate Champion", "Fighting for a cooler tomorrow", "/ecomon/flame/stage-3.png",
        &["Carbon Capture", "Green Energy"]),
    stage(4, "Renewable Guardian", "Master of sustainable power", "/ecomon/flame/stage-4.png",
        &["Power Grid", "Climate Shield", "Energy Flow"]),
    stage(5, "Phoenix Guardian", "Legendary symbol of Earth's renewal", "/ecomon/flame/stage-5.png",
        &["Rebirth Fire", "Climate Harmony", "Eternal Flame", "Zero Carbon"]),
];

impl Branch {
    /// All branches in catalog order.
    pub const ALL: [Self; 5] = [
        Self::ForestGuardian,
        Self::OceanKeeper,
        Self::UrbanSage,
        Self::SkyWatcher,
        Self::FlameKeeper,
    ];

    /// Stable kebab-case key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::ForestGuardian => "forest-guardian",
            Self::OceanKeeper => "ocean-keeper",
            Self::UrbanSage => "urban-sage",
            Self::SkyWatcher => "sky-watcher",
            Self::FlameKeeper => "flame-keeper",
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ForestGuardian => "Forest Guardian",
            Self::OceanKeeper => "Ocean Keeper",
            Self::UrbanSage => "Urban Sage",
            Self::SkyWatcher => "Sky Watcher",
            Self::FlameKeeper => "Flame Keeper",
        }
    }

    /// Flavour text for the branch-choice screen.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::ForestGuardian => {
                "Protector of forests and plant life. Evolves through tree planting and nature conservation."
            }
            Self::OceanKeeper => {
                "Guardian of seas and marine life. Evolves through water conservation and beach cleanups."
            }
            Self::UrbanSage => {
                "Master of sustainable city living. Evolves through recycling and public transit."
            }
            Self::SkyWatcher => {
                "Keeper of clean air and atmosphere. Evolves through energy saving and carbon reduction."
            }
            Self::FlameKeeper => {
                "Guardian of sustainable energy. Evolves through carbon reduction and climate action."
            }
        }
    }

    /// Element affinity, expressed as the matching species.
    #[must_use]
    pub fn element(self) -> Species {
        match self {
            Self::ForestGuardian => Species::Leaf,
            Self::OceanKeeper => Species::Water,
            Self::UrbanSage | Self::FlameKeeper => Species::Earth,
            Self::SkyWatcher => Species::Air,
        }
    }

    /// The branch's five-entry stage table.
    #[must_use]
    pub fn stages(self) -> &'static [StageInfo; 5] {
        match self {
            Self::ForestGuardian => &FOREST_GUARDIAN,
            Self::OceanKeeper => &OCEAN_KEEPER,
            Self::UrbanSage => &URBAN_SAGE,
            Self::SkyWatcher => &SKY_WATCHER,
            Self::FlameKeeper => &FLAME_KEEPER,
        }
    }

    /// Metadata for `stage` (clamped into 1..=5).
    #[must_use]
    pub fn stage_info(self, stage: u8) -> &'static StageInfo {
        let idx = usize::from(stage.clamp(1, MAX_STAGE) - 1);
        &self.stages()[idx]
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Branch {
    type Err = EcomonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.key() == s)
            .ok_or_else(|| EcomonError::InvalidInput(format!("unknown evolution branch '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// XP curve
// ---------------------------------------------------------------------------

/// XP needed to leave each stage.
///
/// Stage 1 uses `initial`; every later stage `s` needs
/// `s * per_stage + base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpCurve {
    /// Threshold for leaving stage 1.
    #[serde(default = "default_100")]
    pub initial: u32,
    /// Constant term.
    #[serde(default = "default_100")]
    pub base: u32,
    /// Per-stage multiplier.
    #[serde(default = "default_100")]
    pub per_stage: u32,
}

fn default_100() -> u32 { 100 }

impl Default for XpCurve {
    fn default() -> Self {
        Self { initial: 100, base: 100, per_stage: 100 }
    }
}

impl XpCurve {
    /// Threshold for leaving `stage`. Always positive.
    #[must_use]
    pub fn threshold(&self, stage: u8) -> u32 {
        let raw = if stage <= 1 {
            self.initial
        } else {
            u32::from(stage)
                .saturating_mul(self.per_stage)
                .saturating_add(self.base)
        };
        raw.max(1)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Progression state of one companion.
///
/// Loading clamps the stage to `1..=MAX_STAGE`, drops a branch stored at
/// stage 1, sends a branchless ledger back to stage 1 and recomputes the
/// threshold from the curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LedgerRecord")]
pub struct EvolutionLedger {
    stage: u8,
    branch: Option<Branch>,
    xp: u32,
    threshold: u32,
    curve: XpCurve,
}

#[derive(Deserialize)]
struct LedgerRecord {
    #[serde(default = "first_stage")]
    stage: u8,
    #[serde(default)]
    branch: Option<Branch>,
    #[serde(default)]
    xp: u32,
    #[serde(default)]
    curve: XpCurve,
}

fn first_stage() -> u8 { 1 }

impl From<LedgerRecord> for EvolutionLedger {
    fn from(r: LedgerRecord) -> Self {
        let (stage, branch) = match (r.stage.clamp(1, MAX_STAGE), r.branch) {
            (1, _) | (_, None) => (1, None),
            (stage, branch) => (stage, branch),
        };
        Self {
            stage,
            branch,
            xp: r.xp,
            threshold: r.curve.threshold(stage),
            curve: r.curve,
        }
    }
}

impl Default for EvolutionLedger {
    fn default() -> Self {
        Self::new(XpCurve::default())
    }
}

impl EvolutionLedger {
    /// Fresh ledger at stage 1, no branch, 0 XP.
    #[must_use]
    pub fn new(curve: XpCurve) -> Self {
        Self {
            stage: 1,
            branch: None,
            xp: 0,
            threshold: curve.threshold(1),
            curve,
        }
    }

    /// Current stage, 1..=5.
    #[must_use]
    pub fn stage(&self) -> u8 {
        self.stage
    }

    /// Committed branch, if any.
    #[must_use]
    pub fn branch(&self) -> Option<Branch> {
        self.branch
    }

    /// XP accumulated since the last advance.
    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    /// XP required to leave the current stage.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether the ledger is at the final stage.
    #[must_use]
    pub fn is_max_stage(&self) -> bool {
        self.stage >= MAX_STAGE
    }

    /// Add XP. Never changes the stage.
    pub fn add_xp(&mut self, amount: u32) {
        self.xp = self.xp.saturating_add(amount);
    }

    /// `xp >= threshold` and not yet at the final stage.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.xp >= self.threshold && self.stage < MAX_STAGE
    }

    /// Advance one stage.
    ///
    /// The first advance must name a branch and commits it. Later advances
    /// may omit the branch or repeat the committed one.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::InvalidTransition`] when the ledger cannot
    /// advance, when no branch is given on the first advance, or when the
    /// given branch conflicts with the committed one. The ledger is
    /// unchanged on error.
    pub fn advance(&mut self, chosen: Option<Branch>) -> Result<()> {
        if self.is_max_stage() {
            return Err(EcomonError::InvalidTransition(format!(
                "already at max stage {MAX_STAGE}"
            )));
        }
        if self.xp < self.threshold {
            return Err(EcomonError::InvalidTransition(format!(
                "need {} XP to leave stage {}, have {}",
                self.threshold, self.stage, self.xp
            )));
        }

        let branch = match (self.branch, chosen) {
            (None, None) => {
                return Err(EcomonError::InvalidTransition(
                    "a branch must be chosen on the first evolution".to_string(),
                ));
            }
            (None, Some(b)) => b,
            (Some(committed), Some(b)) if committed != b => {
                return Err(EcomonError::InvalidTransition(format!(
                    "already committed to {committed}, cannot switch to {b}"
                )));
            }
            (Some(committed), _) => committed,
        };

        self.branch = Some(branch);
        self.stage += 1;
        self.xp = 0;
        self.threshold = self.curve.threshold(self.stage);
        Ok(())
    }

    /// `min(100, xp / threshold * 100)`, floored.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        let pct = u64::from(self.xp) * 100 / u64::from(self.threshold.max(1));
        u8::try_from(pct.min(100)).unwrap_or(100)
    }

    /// Stage metadata for the committed branch. `None` before the first
    /// advance.
    #[must_use]
    pub fn stage_info(&self) -> Option<&'static StageInfo> {
        self.branch.map(|b| b.stage_info(self.stage))
    }

    /// Clear branch, stage and XP. Administrative only.
    pub fn reset(&mut self) {
        *self = Self::new(self.curve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ledger() {
        let l = EvolutionLedger::default();
        assert_eq!(l.stage(), 1);
        assert_eq!(l.branch(), None);
        assert_eq!(l.threshold(), 100);
        assert!(!l.can_advance());
    }

    #[test]
    fn add_xp_never_advances() {
        let mut l = EvolutionLedger::default();
        l.add_xp(10_000);
        assert_eq!(l.stage(), 1);
        assert!(l.can_advance());
    }

    #[test]
    fn advance_commits_branch_and_resets_xp() {
        let mut l = EvolutionLedger::default();
        l.add_xp(120);
        l.advance(Some(Branch::OceanKeeper)).expect("advance");
        assert_eq!(l.stage(), 2);
        assert_eq!(l.xp(), 0);
        assert_eq!(l.threshold(), 300);
        assert_eq!(l.branch(), Some(Branch::OceanKeeper));
        assert_eq!(l.stage_info().map(|s| s.name), Some("Stream"));
    }

    #[test]
    fn failed_advance_leaves_ledger_unchanged() {
        let mut l = EvolutionLedger::default();
        l.add_xp(99);
        let before = l.clone();
        assert!(matches!(
            l.advance(Some(Branch::ForestGuardian)),
            Err(EcomonError::InvalidTransition(_))
        ));
        assert_eq!(l, before);
    }

    #[test]
    fn first_advance_requires_branch() {
        let mut l = EvolutionLedger::default();
        l.add_xp(100);
        assert!(l.advance(None).is_err());
        assert_eq!(l.stage(), 1);
    }

    #[test]
    fn branch_commits_once() {
        let mut l = EvolutionLedger::default();
        l.add_xp(100);
        l.advance(Some(Branch::ForestGuardian)).expect("first");
        l.add_xp(300);
        let before = l.clone();
        assert!(matches!(
            l.advance(Some(Branch::OceanKeeper)),
            Err(EcomonError::InvalidTransition(_))
        ));
        assert_eq!(l, before);
        l.advance(Some(Branch::ForestGuardian)).expect("same branch ok");
        assert_eq!(l.stage(), 3);
    }

    #[test]
    fn max_stage_blocks_advance() {
        let mut l = EvolutionLedger::default();
        l.add_xp(100);
        l.advance(Some(Branch::SkyWatcher)).expect("to 2");
        for _ in 0..3 {
            l.add_xp(l.threshold());
            l.advance(None).expect("advance");
        }
        assert_eq!(l.stage(), MAX_STAGE);
        l.add_xp(u32::MAX);
        assert!(!l.can_advance());
        assert!(l.advance(None).is_err());
        assert_eq!(l.stage_info().map(|s| s.name), Some("Atmosphere Sentinel"));
    }

    #[test]
    fn thresholds_increase_with_stage() {
        let c = XpCurve::default();
        let t: Vec<_> = (1..=MAX_STAGE).map(|s| c.threshold(s)).collect();
        assert_eq!(t, vec![100, 300, 400, 500, 600]);
    }

    #[test]
    fn progress_caps_at_hundred() {
        let mut l = EvolutionLedger::default();
        l.add_xp(55);
        assert_eq!(l.progress_percent(), 55);
        l.add_xp(500);
        assert_eq!(l.progress_percent(), 100);
    }

    #[test]
    fn stored_stage_is_clamped_on_load() {
        let mut l = EvolutionLedger::default();
        l.add_xp(100);
        l.advance(Some(Branch::OceanKeeper)).expect("to 2");
        let stored = serde_json::to_value(&l).expect("serialize");

        let mut high = stored.clone();
        high["stage"] = serde_json::json!(9);
        high["threshold"] = serde_json::json!(0);
        let loaded: EvolutionLedger = serde_json::from_value(high).expect("parse");
        assert_eq!(loaded.stage(), MAX_STAGE);
        assert_eq!(loaded.threshold(), XpCurve::default().threshold(MAX_STAGE));
        assert!(loaded.stage_info().is_some());

        let mut low = stored.clone();
        low["stage"] = serde_json::json!(0);
        let loaded: EvolutionLedger = serde_json::from_value(low).expect("parse");
        assert_eq!(loaded.stage(), 1);
        assert_eq!(loaded.branch(), None);
        assert_eq!(loaded.threshold(), 100);

        let mut branchless = stored;
        branchless["branch"] = serde_json::Value::Null;
        let loaded: EvolutionLedger = serde_json::from_value(branchless).expect("parse");
        assert_eq!(loaded.stage(), 1);
    }

    #[test]
    fn every_branch_has_five_ordered_stages() {
        for b in Branch::ALL {
            for (i, info) in b.stages().iter().enumerate() {
                assert_eq!(usize::from(info.stage), i + 1);
                assert!(!info.abilities.is_empty());
            }
            assert_eq!(b.key().parse::<Branch>().expect("key"), b);
        }
    }
}

//! Engine configuration, loadable from TOML.
//!
//! Every section and field has a default, so a partial file (or an empty
//! one) yields the standard rules.
//!
//! ```toml
//! [memory]
//! capacity = 50
//!
//! [mood]
//! low = 30
//! medium = 60
//! high = 80
//!
//! [evolution]
//! initial = 100
//! base = 100
//! per_stage = 100
//!
//! [corruption]
//! inactivity_grace_days = 3
//! per_idle_day = 10
//!
//! [reactions.chat]
//! joy = 2
//! trust = 1
//! ```

use serde::{Deserialize, Serialize};

use crate::emotion::EmotionDelta;
use crate::error::{EcomonError, Result};
use crate::evolution::XpCurve;
use crate::memory::DEFAULT_MEMORY_CAPACITY;
use crate::mood::MoodThresholds;
use crate::reward::{EcoAction, QuizRewardPolicy};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Memory log settings.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Mood classification thresholds.
    #[serde(default)]
    pub mood: MoodThresholds,
    /// XP curve.
    #[serde(default)]
    pub evolution: XpCurve,
    /// Neglect and redemption tuning.
    #[serde(default)]
    pub corruption: CorruptionConfig,
    /// Quiz reward policy.
    #[serde(default)]
    pub rewards: QuizRewardPolicy,
    /// Per-event emotion reactions.
    #[serde(default)]
    pub reactions: ReactionTable,
}

impl EngineConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `EcomonError::Config` if the TOML is invalid or inconsistent.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| EcomonError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `EcomonError::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let t = &self.mood;
        if !(t.low <= t.medium && t.medium <= t.high && t.high <= 100) {
            return Err(EcomonError::Config(format!(
                "mood thresholds must satisfy low <= medium <= high <= 100, got {}/{}/{}",
                t.low, t.medium, t.high
            )));
        }
        if self.memory.capacity == 0 {
            return Err(EcomonError::Config("memory.capacity must be positive".to_string()));
        }
        if self.rewards.high_score_percent > 100 {
            return Err(EcomonError::Config(
                "rewards.high_score_percent must be at most 100".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Memory log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Entries kept per companion.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_MEMORY_CAPACITY }
    }
}

/// Neglect and redemption tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionConfig {
    /// Idle days before inactivity starts to corrupt.
    #[serde(default = "default_grace_days")]
    pub inactivity_grace_days: u32,
    /// Corruption added per idle day once past the grace period.
    #[serde(default = "default_per_idle_day")]
    pub per_idle_day: u8,
    /// Corruption removed by one verified tree planting.
    #[serde(default = "default_plant_tree")]
    pub plant_tree_redemption: u8,
    /// Corruption removed by one verified beach cleanup.
    #[serde(default = "default_clean_beach")]
    pub clean_beach_redemption: u8,
    /// Corruption removed by one verified recycle.
    #[serde(default = "default_recycle")]
    pub recycle_redemption: u8,
}

impl Default for CorruptionConfig {
    fn default() -> Self {
        Self {
            inactivity_grace_days: 3,
            per_idle_day: 10,
            plant_tree_redemption: 20,
            clean_beach_redemption: 34,
            recycle_redemption: 5,
        }
    }
}

impl CorruptionConfig {
    /// Corruption decrement for a verified action (0 if not redemptive).
    #[must_use]
    pub fn redemption_for(&self, action: EcoAction) -> u8 {
        match action {
            EcoAction::PlantTree => self.plant_tree_redemption,
            EcoAction::CleanBeach => self.clean_beach_redemption,
            EcoAction::Recycle => self.recycle_redemption,
            _ => 0,
        }
    }

    /// Corruption increment for `days` of inactivity.
    #[must_use]
    pub fn neglect_for(&self, days: u32) -> i32 {
        if days < self.inactivity_grace_days {
            return 0;
        }
        i32::try_from(days)
            .unwrap_or(i32::MAX)
            .saturating_mul(i32::from(self.per_idle_day))
    }
}

/// Emotion delta per event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTable {
    /// One chat turn.
    #[serde(default = "default_chat")]
    pub chat: EmotionDelta,
    /// A verified action at full confidence (scaled by confidence).
    #[serde(default = "default_verified_action")]
    pub verified_action: EmotionDelta,
    /// A 100% quiz.
    #[serde(default = "default_quiz_perfect")]
    pub quiz_perfect: EmotionDelta,
    /// Any other completed quiz.
    #[serde(default = "default_quiz_completed")]
    pub quiz_completed: EmotionDelta,
    /// One idle day (multiplied by days elapsed).
    #[serde(default = "default_inactivity_per_day")]
    pub inactivity_per_day: EmotionDelta,
    /// A stage advance.
    #[serde(default = "default_evolution")]
    pub evolution: EmotionDelta,
}

impl Default for ReactionTable {
    fn default() -> Self {
        Self {
            chat: default_chat(),
            verified_action: default_verified_action(),
            quiz_perfect: default_quiz_perfect(),
            quiz_completed: default_quiz_completed(),
            inactivity_per_day: default_inactivity_per_day(),
            evolution: default_evolution(),
        }
    }
}

/// SQLite store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Number of rotating backups to keep.
    #[serde(default = "default_backup_count")]
    pub backup_count: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_mode: true,
            checksum_enabled: true,
            backup_count: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_backup_count() -> u32 { 3 }
fn default_capacity() -> usize { DEFAULT_MEMORY_CAPACITY }
fn default_grace_days() -> u32 { 3 }
fn default_per_idle_day() -> u8 { 10 }
fn default_plant_tree() -> u8 { 20 }
fn default_clean_beach() -> u8 { 34 }
fn default_recycle() -> u8 { 5 }
fn default_chat() -> EmotionDelta { EmotionDelta::new().joy(2).trust(1) }
fn default_verified_action() -> EmotionDelta { EmotionDelta::new().joy(10).pride(15).trust(5) }
fn default_quiz_perfect() -> EmotionDelta { EmotionDelta::new().joy(20).pride(15).curiosity(5) }
fn default_quiz_completed() -> EmotionDelta { EmotionDelta::new().joy(5).pride(5).curiosity(5) }
fn default_inactivity_per_day() -> EmotionDelta { EmotionDelta::new().worry(5).trust(-2) }
fn default_evolution() -> EmotionDelta { EmotionDelta::new().joy(10).pride(10) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml("").expect("empty is valid");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.memory.capacity, 50);
        assert_eq!(config.mood, MoodThresholds::STANDARD);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_toml(
            r"
            [corruption]
            per_idle_day = 15

            [reactions.chat]
            joy = 4
            ",
        )
        .expect("valid");
        assert_eq!(config.corruption.per_idle_day, 15);
        assert_eq!(config.corruption.inactivity_grace_days, 3);
        assert_eq!(config.reactions.chat, EmotionDelta::new().joy(4));
        assert_eq!(config.reactions.evolution, EmotionDelta::new().joy(10).pride(10));
    }

    #[test]
    fn inconsistent_thresholds_rejected() {
        let err = EngineConfig::from_toml("[mood]\nlow = 70\nmedium = 60\n").unwrap_err();
        assert!(matches!(err, EcomonError::Config(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            EngineConfig::from_toml("[memory\ncapacity = "),
            Err(EcomonError::Config(_))
        ));
    }

    #[test]
    fn redemption_and_neglect() {
        let c = CorruptionConfig::default();
        assert_eq!(c.redemption_for(EcoAction::PlantTree), 20);
        assert_eq!(c.redemption_for(EcoAction::BikeCommute), 0);
        assert_eq!(c.neglect_for(2), 0);
        assert_eq!(c.neglect_for(3), 30);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ecomon.toml");
        std::fs::write(&path, "[memory]\ncapacity = 10\n").expect("write");
        let config = EngineConfig::from_file(&path).expect("load");
        assert_eq!(config.memory.capacity, 10);
    }
}

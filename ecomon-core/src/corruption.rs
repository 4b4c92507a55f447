//! Corruption Tracker and the dark-form display override.
//!
//! Neglect raises a bounded corruption level; redemptive eco-actions lower
//! it. At 100 the companion shows its dark form. Corruption never touches
//! the evolution ledger, only what is displayed.

use serde::{Deserialize, Serialize};

use crate::evolution::{Branch, EvolutionLedger, StageInfo};

/// Level at or above which the dark form is shown.
pub const DARK_THRESHOLD: u8 = 100;

/// Number of dark-form stages.
pub const DARK_STAGES: u8 = 3;

/// A change in dark-form status caused by one adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionTransition {
    /// Level reached the threshold.
    EnteredDarkForm,
    /// Level dropped below the threshold.
    Redeemed,
}

/// Bounded neglect counter.
///
/// Invariant: `is_corrupted_form() == (level() >= 100)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CorruptionRecord")]
pub struct CorruptionTracker {
    level: u8,
    is_corrupted_form: bool,
}

/// Persisted shape; the flag is recomputed on load so it can never disagree
/// with the level.
#[derive(Deserialize)]
struct CorruptionRecord {
    #[serde(default)]
    level: i64,
}

impl From<CorruptionRecord> for CorruptionTracker {
    fn from(r: CorruptionRecord) -> Self {
        Self::with_level(r.level)
    }
}

impl CorruptionTracker {
    /// Clean tracker at level 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_level(level: i64) -> Self {
        let level = u8::try_from(level.clamp(0, i64::from(DARK_THRESHOLD))).unwrap_or(0);
        Self {
            level,
            is_corrupted_form: level >= DARK_THRESHOLD,
        }
    }

    /// Current level, 0..=100.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Whether the dark form is active.
    #[must_use]
    pub fn is_corrupted_form(&self) -> bool {
        self.is_corrupted_form
    }

    /// Add `delta` (clamped into 0..=100) and report any dark-form change.
    pub fn adjust(&mut self, delta: i32) -> Option<CorruptionTransition> {
        let was = self.is_corrupted_form;
        *self = Self::with_level(i64::from(self.level) + i64::from(delta));
        match (was, self.is_corrupted_form) {
            (false, true) => Some(CorruptionTransition::EnteredDarkForm),
            (true, false) => Some(CorruptionTransition::Redeemed),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dark form catalog
// ---------------------------------------------------------------------------

/// Metadata for one dark-form stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DarkStageInfo {
    /// Dark stage, 1..=3.
    pub stage: u8,
    /// Corruption name.
    pub name: &'static str,
    /// Sprite asset path.
    pub sprite: &'static str,
}

static DARK_FORM: [DarkStageInfo; 3] = [
    DarkStageInfo { stage: 1, name: "Withering", sprite: "/ecomon/dark/stage-1.png" },
    DarkStageInfo { stage: 2, name: "Fading", sprite: "/ecomon/dark/stage-2.png" },
    DarkStageInfo { stage: 3, name: "Corrupted", sprite: "/ecomon/dark/stage-3.png" },
];

/// Metadata for dark stage `stage` (clamped into 1..=3).
#[must_use]
pub fn dark_stage_info(stage: u8) -> &'static DarkStageInfo {
    &DARK_FORM[usize::from(stage.clamp(1, DARK_STAGES) - 1)]
}

/// What to display for a companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayForm {
    /// Corrupted: dark progression keyed by `min(stage, 3)`.
    Dark {
        /// Dark stage, 1..=3.
        stage: u8,
    },
    /// Normal form of a committed branch.
    Branch {
        /// Committed branch.
        branch: Branch,
        /// Ledger stage.
        stage: u8,
    },
    /// Stage 1 before any branch is chosen.
    Unbranched {
        /// Ledger stage.
        stage: u8,
    },
}

impl DisplayForm {
    /// Stage number shown to the user.
    #[must_use]
    pub fn stage(&self) -> u8 {
        match *self {
            Self::Dark { stage } | Self::Branch { stage, .. } | Self::Unbranched { stage } => stage,
        }
    }

    /// Form name shown to the user.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match *self {
            Self::Dark { stage } => dark_stage_info(stage).name,
            Self::Branch { branch, stage } => branch.stage_info(stage).name,
            Self::Unbranched { .. } => "Hatchling",
        }
    }

    /// Branch stage metadata, when a branch form is shown.
    #[must_use]
    pub fn branch_stage_info(&self) -> Option<&'static StageInfo> {
        match *self {
            Self::Branch { branch, stage } => Some(branch.stage_info(stage)),
            _ => None,
        }
    }

    /// Whether this is the dark form.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark { .. })
    }
}

/// Resolve the displayed form from ledger and corruption state.
#[must_use]
pub fn effective_display_stage(ledger: &EvolutionLedger, corruption: &CorruptionTracker) -> DisplayForm {
    let stage = ledger.stage();
    if corruption.is_corrupted_form() {
        return DisplayForm::Dark { stage: stage.min(DARK_STAGES) };
    }
    match ledger.branch() {
        Some(branch) => DisplayForm::Branch { branch, stage },
        None => DisplayForm::Unbranched { stage },
    }
}

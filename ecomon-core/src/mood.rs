//! Mood Classifier — maps an [`EmotionalState`] to one discrete [`Mood`].
//!
//! Rules are evaluated in a fixed priority order and the first match wins.
//! The ordering is the tie-break policy: a companion that is both very
//! worried and very happy is *worried*.
//!
//! ```text
//! 1. worry > high                      → worried
//! 2. joy > high AND pride > medium     → excited
//! 3. pride > high                      → proud
//! 4. joy > high                        → happy
//! 5. curiosity > high                  → curious
//! 6. trust < low AND joy < low         → sad
//! 7. avg(trust, joy, curiosity, 100-worry, pride)
//!      > high → energetic, > medium → content, > low → thoughtful, else sleepy
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::emotion::EmotionalState;

/// Discrete mood tag. Closed set of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Joyful and content.
    Happy,
    /// A bit down.
    Sad,
    /// Bursting with excitement.
    Excited,
    /// Pondering and wondering.
    Curious,
    /// Concerned about something.
    Worried,
    /// Feeling accomplished.
    Proud,
    /// Peaceful and satisfied.
    Content,
    /// Getting drowsy.
    Sleepy,
    /// Full of energy.
    Energetic,
    /// Deep in thought.
    Thoughtful,
}

impl Mood {
    /// All moods.
    pub const ALL: [Self; 10] = [
        Self::Happy,
        Self::Sad,
        Self::Excited,
        Self::Curious,
        Self::Worried,
        Self::Proud,
        Self::Content,
        Self::Sleepy,
        Self::Energetic,
        Self::Thoughtful,
    ];

    /// Human-readable description for UI and prompts.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Happy => "Feeling joyful and content",
            Self::Sad => "Feeling a bit down",
            Self::Excited => "Bursting with excitement!",
            Self::Curious => "Pondering and wondering",
            Self::Worried => "Concerned about something",
            Self::Proud => "Feeling accomplished",
            Self::Content => "Peaceful and satisfied",
            Self::Sleepy => "Getting drowsy",
            Self::Energetic => "Full of energy!",
            Self::Thoughtful => "Deep in thought",
        }
    }

    /// Tone hint handed to content generators.
    #[must_use]
    pub fn dialogue_modifier(self) -> &'static str {
        match self {
            Self::Happy => "cheerful and warm",
            Self::Sad => "subdued and gentle",
            Self::Excited => "enthusiastic and energetic",
            Self::Curious => "inquisitive and thoughtful",
            Self::Worried => "anxious and caring",
            Self::Proud => "confident and encouraging",
            Self::Content => "calm and balanced",
            Self::Sleepy => "drowsy and peaceful",
            Self::Energetic => "dynamic and lively",
            Self::Thoughtful => "contemplative and wise",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Excited => "excited",
            Self::Curious => "curious",
            Self::Worried => "worried",
            Self::Proud => "proud",
            Self::Content => "content",
            Self::Sleepy => "sleepy",
            Self::Energetic => "energetic",
            Self::Thoughtful => "thoughtful",
        };
        f.write_str(s)
    }
}

/// The three thresholds shared by every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodThresholds {
    /// "Low" bound (default 30).
    #[serde(default = "default_low")]
    pub low: u8,
    /// "Medium" bound (default 60).
    #[serde(default = "default_medium")]
    pub medium: u8,
    /// "High" bound (default 80).
    #[serde(default = "default_high")]
    pub high: u8,
}

impl MoodThresholds {
    /// The standard 30 / 60 / 80 thresholds.
    pub const STANDARD: Self = Self {
        low: 30,
        medium: 60,
        high: 80,
    };
}

impl Default for MoodThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn default_low() -> u8 { 30 }
fn default_medium() -> u8 { 60 }
fn default_high() -> u8 { 80 }

/// Classify with the standard thresholds.
#[must_use]
pub fn classify(emotion: &EmotionalState) -> Mood {
    classify_with(emotion, &MoodThresholds::STANDARD)
}

/// Classify with explicit thresholds. Total: every state maps to one mood.
#[must_use]
pub fn classify_with(emotion: &EmotionalState, t: &MoodThresholds) -> Mood {
    let (trust, joy, curiosity, worry, pride) = (
        emotion.trust(),
        emotion.joy(),
        emotion.curiosity(),
        emotion.worry(),
        emotion.pride(),
    );

    if worry > t.high {
        return Mood::Worried;
    }
    if joy > t.high && pride > t.medium {
        return Mood::Excited;
    }
    if pride > t.high {
        return Mood::Proud;
    }
    if joy > t.high {
        return Mood::Happy;
    }
    if curiosity > t.high {
        return Mood::Curious;
    }
    if trust < t.low && joy < t.low {
        return Mood::Sad;
    }

    // avg > x  ⇔  sum > 5x, compared exactly in integers.
    let sum = emotion.wellbeing_sum();
    match sum {
        s if s > u32::from(t.high) * 5 => Mood::Energetic,
        s if s > u32::from(t.medium) * 5 => Mood::Content,
        s if s > u32::from(t.low) * 5 => Mood::Thoughtful,
        _ => Mood::Sleepy,
    }
}

//! Core type definitions shared across the engine.
//!
//! Identity newtypes plus the two creation-time attributes of a companion
//! (species and personality), which are immutable for its whole life.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EcomonError;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a guardian (user account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanionId(pub Uuid);

impl CompanionId {
    /// Create a new random companion ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CompanionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    /// Create a new random memory ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CompanionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

/// Elemental species, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Species {
    /// Connected to forests and plant life.
    Leaf,
    /// Guardian of rivers, lakes, and seas.
    Water,
    /// Master of sustainable energy.
    Fire,
    /// Protector of soil and minerals.
    Earth,
    /// Keeper of clean air and atmosphere.
    Air,
}

impl Species {
    /// All species in catalog order.
    pub const ALL: [Self; 5] = [Self::Leaf, Self::Water, Self::Fire, Self::Earth, Self::Air];

    /// Stable kebab-case key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Water => "water",
            Self::Fire => "fire",
            Self::Earth => "earth",
            Self::Air => "air",
        }
    }

    /// Element name shown alongside the species.
    #[must_use]
    pub fn element(self) -> &'static str {
        match self {
            Self::Leaf => "Nature",
            Self::Water => "Ocean",
            Self::Fire => "Energy",
            Self::Earth => "Ground",
            Self::Air => "Sky",
        }
    }

    /// Short description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Leaf => "Connected to forests and plant life",
            Self::Water => "Guardian of rivers, lakes, and seas",
            Self::Fire => "Master of sustainable energy",
            Self::Earth => "Protector of soil and minerals",
            Self::Air => "Keeper of clean air and atmosphere",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Species {
    type Err = EcomonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sp| sp.key() == s)
            .ok_or_else(|| EcomonError::InvalidInput(format!("unknown species '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// Personality archetype, fixed at creation. Shapes generated dialogue only;
/// the engine's rules are the same for every archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Personality {
    /// Wise and philosophical.
    Sage,
    /// Energetic and motivating.
    Cheerleader,
    /// Data-driven and precise.
    Scientist,
    /// Deeply caring and emotionally connected.
    Empath,
}

impl Personality {
    /// All personalities in catalog order.
    pub const ALL: [Self; 4] = [Self::Sage, Self::Cheerleader, Self::Scientist, Self::Empath];

    /// Stable kebab-case key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Sage => "sage",
            Self::Cheerleader => "cheerleader",
            Self::Scientist => "scientist",
            Self::Empath => "empath",
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sage => "Sage",
            Self::Cheerleader => "Cheerleader",
            Self::Scientist => "Scientist",
            Self::Empath => "Empath",
        }
    }

    /// Short description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Sage => "Wise and philosophical, offers deep insights",
            Self::Cheerleader => "Energetic and motivating, celebrates every win",
            Self::Scientist => "Data-driven and precise, loves facts",
            Self::Empath => "Deeply caring and emotionally connected",
        }
    }

    /// Three defining strengths.
    #[must_use]
    pub fn strengths(self) -> [&'static str; 3] {
        match self {
            Self::Sage => ["Wisdom", "Patience", "Insight"],
            Self::Cheerleader => ["Enthusiasm", "Motivation", "Positivity"],
            Self::Scientist => ["Analysis", "Precision", "Knowledge"],
            Self::Empath => ["Empathy", "Connection", "Nurturing"],
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Personality {
    type Err = EcomonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| EcomonError::InvalidInput(format!("unknown personality '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_round_trip_through_key() {
        for sp in Species::ALL {
            assert_eq!(sp.key().parse::<Species>().expect("known key"), sp);
        }
        assert!("lava".parse::<Species>().is_err());
    }

    #[test]
    fn personality_serializes_kebab_case() {
        let json = serde_json::to_string(&Personality::Cheerleader).expect("serialize");
        assert_eq!(json, "\"cheerleader\"");
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(MemoryId::new(), MemoryId::new());
    }
}

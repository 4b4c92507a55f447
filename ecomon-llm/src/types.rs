//! Request and response contracts shared by all collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

use ecomon_core::emotion::EmotionalState;
use ecomon_core::memory::MemoryCategory;
use ecomon_core::mood::Mood;
use ecomon_core::reward::EcoAction;
use ecomon_core::{Companion, Personality, Species};

/// Number of options every quiz question carries.
pub const QUIZ_OPTIONS: usize = 4;

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Who said a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The guardian.
    User,
    /// The companion.
    Companion,
}

/// One turn of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Speaker.
    pub role: ChatRole,
    /// Text.
    pub content: String,
}

impl ChatTurn {
    /// A guardian turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    /// A companion turn.
    #[must_use]
    pub fn companion(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Companion, content: content.into() }
    }
}

/// The subset of companion state a generator sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    /// Guardian display name.
    pub guardian_name: String,
    /// Companion name.
    pub companion_name: String,
    /// Personality archetype.
    pub personality: Personality,
    /// Species.
    pub species: Species,
    /// Current mood.
    pub mood: Mood,
    /// Current emotions.
    pub emotions: EmotionalState,
    /// Evolution stage.
    pub stage: u8,
    /// Whether the dark form is showing.
    pub corrupted: bool,
    /// Recent shared memories, oldest first.
    pub memories: Vec<String>,
    /// Recent verified actions, oldest first.
    pub recent_actions: Vec<String>,
}

impl ChatContext {
    /// Memories included in a chat context.
    pub const MEMORY_WINDOW: usize = 5;
    /// Actions included in a chat context.
    pub const ACTION_WINDOW: usize = 3;

    /// Snapshot a companion for a generator call.
    #[must_use]
    pub fn from_companion(companion: &Companion, guardian_name: &str) -> Self {
        let memories = companion
            .memories()
            .recent(Self::MEMORY_WINDOW)
            .map(|m| m.summary.clone())
            .collect();
        let actions: Vec<String> = companion
            .memories()
            .iter()
            .filter(|m| m.category == MemoryCategory::Action)
            .map(|m| m.summary.clone())
            .collect();
        let skip = actions.len().saturating_sub(Self::ACTION_WINDOW);

        Self {
            guardian_name: guardian_name.to_string(),
            companion_name: companion.name.clone(),
            personality: companion.personality,
            species: companion.species,
            mood: companion.mood(),
            emotions: *companion.emotions(),
            stage: companion.evolution().stage(),
            corrupted: companion.corruption().is_corrupted_form(),
            memories,
            recent_actions: actions.into_iter().skip(skip).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Quiz
// ---------------------------------------------------------------------------

/// Quiz topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizCategory {
    /// Recycling and waste.
    Recycling,
    /// Energy use.
    Energy,
    /// Water.
    Water,
    /// Wildlife and ecosystems.
    Wildlife,
    /// Climate change.
    Climate,
    /// Anything else.
    General,
}

impl QuizCategory {
    /// The topics used when none is requested.
    pub const DEFAULT_MIX: [Self; 5] = [
        Self::Recycling,
        Self::Energy,
        Self::Water,
        Self::Wildlife,
        Self::Climate,
    ];

    /// Lowercase key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Recycling => "recycling",
            Self::Energy => "energy",
            Self::Water => "water",
            Self::Wildlife => "wildlife",
            Self::Climate => "climate",
            Self::General => "general",
        }
    }
}

impl fmt::Display for QuizCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Quiz difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizDifficulty {
    /// Straightforward facts.
    Easy,
    /// Requires some environmental knowledge.
    #[default]
    Medium,
    /// Challenging, nuanced questions.
    Hard,
}

impl QuizDifficulty {
    /// Lowercase key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Guidance line for the generator.
    #[must_use]
    pub fn guidance(self) -> &'static str {
        match self {
            Self::Easy => "straightforward facts",
            Self::Medium => "require some environmental knowledge",
            Self::Hard => "challenging, nuanced questions",
        }
    }
}

/// Parameters for quiz generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    /// Restrict to one topic, or mix the defaults.
    pub category: Option<QuizCategory>,
    /// Difficulty.
    #[serde(default)]
    pub difficulty: QuizDifficulty,
    /// Number of questions.
    pub count: usize,
}

impl Default for QuizRequest {
    fn default() -> Self {
        Self { category: None, difficulty: QuizDifficulty::Medium, count: 5 }
    }
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Question text.
    pub question: String,
    /// Exactly four options.
    pub options: Vec<String>,
    /// Index of the right option, `< 4`.
    pub correct_index: usize,
    /// Why the answer is right.
    pub explanation: String,
    /// Topic.
    pub category: QuizCategory,
}

// ---------------------------------------------------------------------------
// Image verification
// ---------------------------------------------------------------------------

/// An uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data_base64: String,
    /// Optional description supplied by the guardian.
    pub description: Option<String>,
}

/// Verifier verdict. Only `is_verified`, `action_type` and `confidence`
/// reach the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Whether the photo shows a genuine eco-action.
    pub is_verified: bool,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Detected action key, if any.
    pub action_type: Option<String>,
    /// What the verifier saw.
    #[serde(default)]
    pub description: String,
    /// Improvement hints or rejection reasons.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Objects detected in the image.
    #[serde(default)]
    pub detected_objects: Vec<String>,
}

impl VerificationReport {
    /// A rejection with one suggestion.
    #[must_use]
    pub fn rejected(suggestion: impl Into<String>) -> Self {
        Self {
            is_verified: false,
            confidence: 0.0,
            action_type: None,
            description: String::new(),
            suggestions: vec![suggestion.into()],
            detected_objects: Vec::new(),
        }
    }

    /// The catalog action, if the report names a known one.
    #[must_use]
    pub fn action(&self) -> Option<EcoAction> {
        self.action_type.as_deref().and_then(|t| t.parse().ok())
    }
}

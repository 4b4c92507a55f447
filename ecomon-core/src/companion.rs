//! Companion aggregate and the event fold.
//!
//! [`Companion::apply_event`] is the single entry point for life events.
//! Each event is first turned into a [`Reaction`] by a table lookup, which
//! validates all input, and only then folded into the companion state:
//!
//! 1. apply the emotion delta
//! 2. reclassify the mood
//! 3. append a memory carrying the new mood
//! 4. feed the reward XP into the evolution ledger
//! 5. adjust corruption (redemption or neglect)
//!
//! A rejected event leaves the companion untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::corruption::{effective_display_stage, CorruptionTracker, CorruptionTransition, DisplayForm};
use crate::emotion::{EmotionDelta, EmotionalState};
use crate::error::{EcomonError, Result};
use crate::evolution::{Branch, EvolutionLedger};
use crate::memory::{MemoryCategory, MemoryLog};
use crate::mood::{classify, classify_with, Mood};
use crate::reward::{self, quiz_percentage, EcoAction, Reward};
use crate::types::{CompanionId, Personality, Species, UserId};

/// Characters of a chat message kept in its memory summary.
const CHAT_SUMMARY_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A life event that changes companion state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompanionEvent {
    /// The guardian sent a chat message.
    Chat {
        /// Message text.
        message: String,
    },
    /// An eco-action confirmed by the image verifier.
    VerifiedAction {
        /// Action kind.
        action: EcoAction,
        /// Verifier confidence in `[0, 1]`.
        confidence: f64,
    },
    /// A completed quiz.
    QuizResult {
        /// Correct answers.
        correct: u32,
        /// Questions asked.
        total: u32,
    },
    /// Days elapsed without any activity.
    Inactivity {
        /// Whole idle days, at least 1.
        days: u32,
    },
}

impl CompanionEvent {
    /// Build a verified-action event from the verifier's action key.
    ///
    /// # Errors
    ///
    /// [`EcomonError::UnknownActionType`] for a key outside the catalog.
    pub fn verified_action(action_type: &str, confidence: f64) -> Result<Self> {
        Ok(Self::VerifiedAction {
            action: action_type.parse()?,
            confidence,
        })
    }

    /// Short event-kind label for logs and counters.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::VerifiedAction { .. } => "verified_action",
            Self::QuizResult { .. } => "quiz_result",
            Self::Inactivity { .. } => "inactivity",
        }
    }
}

/// Everything one event does, computed before any state changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Emotion change.
    pub delta: EmotionDelta,
    /// Memory category.
    pub category: MemoryCategory,
    /// Memory summary.
    pub summary: String,
    /// Points and XP earned.
    pub reward: Reward,
    /// Signed corruption change.
    pub corruption: i32,
}

impl Reaction {
    /// Look up the reaction for `event` under `config`.
    ///
    /// # Errors
    ///
    /// [`EcomonError::InvalidInput`] for out-of-range confidence, malformed
    /// quiz tallies or a zero-day inactivity tick.
    pub fn for_event(event: &CompanionEvent, config: &EngineConfig) -> Result<Self> {
        let reactions = &config.reactions;
        match event {
            CompanionEvent::Chat { message } => Ok(Self {
                delta: reactions.chat,
                category: MemoryCategory::Chat,
                summary: chat_summary(message),
                reward: Reward::NONE,
                corruption: 0,
            }),
            CompanionEvent::VerifiedAction { action, confidence } => {
                let reward = reward::for_action(*action, *confidence)?;
                Ok(Self {
                    delta: reactions.verified_action.scaled(*confidence),
                    category: MemoryCategory::Action,
                    summary: format!("Verified {}: {}", action.key(), action.description()),
                    reward,
                    corruption: -i32::from(config.corruption.redemption_for(*action)),
                })
            }
            CompanionEvent::QuizResult { correct, total } => {
                let reward = config.rewards.for_quiz(*correct, *total)?;
                let pct = quiz_percentage(*correct, *total);
                let delta = if pct == 100 {
                    reactions.quiz_perfect
                } else {
                    reactions.quiz_completed
                };
                Ok(Self {
                    delta,
                    category: MemoryCategory::Milestone,
                    summary: format!("Quiz: {correct}/{total} correct ({pct}%)"),
                    reward,
                    corruption: 0,
                })
            }
            CompanionEvent::Inactivity { days } => {
                if *days == 0 {
                    return Err(EcomonError::InvalidInput(
                        "inactivity tick must cover at least one day".to_string(),
                    ));
                }
                Ok(Self {
                    delta: reactions.inactivity_per_day.times(*days),
                    category: MemoryCategory::Milestone,
                    summary: format!("Missed my guardian for {days} day(s)"),
                    reward: Reward::NONE,
                    corruption: config.corruption.neglect_for(*days),
                })
            }
        }
    }
}

fn chat_summary(message: &str) -> String {
    let trimmed = message.trim();
    let mut chars = trimmed.chars();
    let head: String = chars.by_ref().take(CHAT_SUMMARY_CHARS).collect();
    if chars.next().is_some() {
        format!("User: \"{head}...\"")
    } else {
        format!("User: \"{head}\"")
    }
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Mood after the event.
    pub mood: Mood,
    /// ID of the memory recorded for the event.
    pub memory_id: crate::types::MemoryId,
    /// Reward earned (zero for chat and inactivity).
    pub reward: Reward,
    /// Dark-form change, if the event crossed the threshold.
    pub corruption: Option<CorruptionTransition>,
    /// Whether the ledger now allows an advance.
    pub can_evolve: bool,
}

// ---------------------------------------------------------------------------
// Companion
// ---------------------------------------------------------------------------

/// A guardian's virtual companion.
///
/// The stored mood is ignored on load and reclassified from the emotions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CompanionRecord")]
pub struct Companion {
    /// Companion ID.
    pub id: CompanionId,
    /// Owning guardian.
    pub owner: UserId,
    /// Name chosen at adoption.
    pub name: String,
    /// Elemental species (immutable).
    pub species: Species,
    /// Personality archetype (immutable).
    pub personality: Personality,
    emotions: EmotionalState,
    mood: Mood,
    memories: MemoryLog,
    evolution: EvolutionLedger,
    corruption: CorruptionTracker,
    /// Adoption time.
    pub created_at: DateTime<Utc>,
    /// Last state change.
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct CompanionRecord {
    id: CompanionId,
    owner: UserId,
    name: String,
    species: Species,
    personality: Personality,
    emotions: EmotionalState,
    #[serde(default)]
    memories: MemoryLog,
    evolution: EvolutionLedger,
    #[serde(default)]
    corruption: CorruptionTracker,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanionRecord> for Companion {
    fn from(r: CompanionRecord) -> Self {
        Self {
            id: r.id,
            owner: r.owner,
            name: r.name,
            species: r.species,
            personality: r.personality,
            mood: classify(&r.emotions),
            emotions: r.emotions,
            memories: r.memories,
            evolution: r.evolution,
            corruption: r.corruption,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Companion {
    /// Adopt a new companion with neutral emotions.
    ///
    /// # Errors
    ///
    /// [`EcomonError::InvalidInput`] if `name` is blank.
    pub fn new(
        owner: UserId,
        name: impl Into<String>,
        species: Species,
        personality: Personality,
        config: &EngineConfig,
    ) -> Result<Self> {
        Self::new_at(owner, name, species, personality, config, Utc::now())
    }

    /// As [`Companion::new`], with an explicit adoption time.
    ///
    /// # Errors
    ///
    /// [`EcomonError::InvalidInput`] if `name` is blank.
    pub fn new_at(
        owner: UserId,
        name: impl Into<String>,
        species: Species,
        personality: Personality,
        config: &EngineConfig,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(EcomonError::InvalidInput("companion name must not be blank".to_string()));
        }
        let emotions = EmotionalState::NEUTRAL;
        Ok(Self {
            id: CompanionId::new(),
            owner,
            name,
            species,
            personality,
            emotions,
            mood: classify_with(&emotions, &config.mood),
            memories: MemoryLog::with_capacity(config.memory.capacity),
            evolution: EvolutionLedger::new(config.evolution),
            corruption: CorruptionTracker::new(),
            created_at: at,
            updated_at: at,
        })
    }

    /// Current emotions.
    #[must_use]
    pub fn emotions(&self) -> &EmotionalState {
        &self.emotions
    }

    /// Current mood (always the classification of [`Companion::emotions`]).
    #[must_use]
    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Recent notable events, oldest first.
    #[must_use]
    pub fn memories(&self) -> &MemoryLog {
        &self.memories
    }

    /// Stage, branch and XP. Advance only through [`Companion::evolve_at`].
    #[must_use]
    pub fn evolution(&self) -> &EvolutionLedger {
        &self.evolution
    }

    /// Neglect counter.
    #[must_use]
    pub fn corruption(&self) -> &CorruptionTracker {
        &self.corruption
    }

    /// Recompute the mood under `config`'s thresholds, e.g. after loading a
    /// companion saved under a different configuration.
    pub fn reclassify(&mut self, config: &EngineConfig) {
        self.mood = classify_with(&self.emotions, &config.mood);
    }

    /// What the UI should show, with the dark-form override applied.
    #[must_use]
    pub fn display_form(&self) -> DisplayForm {
        effective_display_stage(&self.evolution, &self.corruption)
    }

    /// Apply an event stamped with the current time.
    ///
    /// # Errors
    ///
    /// See [`Reaction::for_event`]. The companion is unchanged on error.
    pub fn apply_event(&mut self, event: &CompanionEvent, config: &EngineConfig) -> Result<EventOutcome> {
        self.apply_event_at(event, Utc::now(), config)
    }

    /// Apply an event at an explicit time.
    ///
    /// # Errors
    ///
    /// See [`Reaction::for_event`]. The companion is unchanged on error.
    pub fn apply_event_at(
        &mut self,
        event: &CompanionEvent,
        at: DateTime<Utc>,
        config: &EngineConfig,
    ) -> Result<EventOutcome> {
        let reaction = Reaction::for_event(event, config)?;
        let outcome = self.fold(reaction, at, config);
        debug!(
            companion = %self.id,
            event = event.kind(),
            mood = %outcome.mood,
            xp = self.evolution.xp(),
            corruption = self.corruption.level(),
            "Applied companion event"
        );
        Ok(outcome)
    }

    fn fold(&mut self, reaction: Reaction, at: DateTime<Utc>, config: &EngineConfig) -> EventOutcome {
        self.emotions.apply(&reaction.delta);
        self.mood = classify_with(&self.emotions, &config.mood);
        let memory_id = self
            .memories
            .append_at(reaction.category, reaction.summary, self.mood, at);
        self.evolution.add_xp(reaction.reward.xp);

        let transition = if reaction.corruption == 0 {
            None
        } else {
            self.corruption.adjust(reaction.corruption)
        };
        match transition {
            Some(CorruptionTransition::EnteredDarkForm) => {
                info!(companion = %self.id, stage = self.evolution.stage(), "Companion fell into its dark form");
            }
            Some(CorruptionTransition::Redeemed) => {
                info!(companion = %self.id, level = self.corruption.level(), "Companion redeemed from its dark form");
            }
            None => {}
        }
        self.updated_at = at;

        EventOutcome {
            mood: self.mood,
            memory_id,
            reward: reaction.reward,
            corruption: transition,
            can_evolve: self.evolution.can_advance(),
        }
    }

    /// Advance one evolution stage now.
    ///
    /// # Errors
    ///
    /// See [`Companion::evolve_at`].
    pub fn evolve(&mut self, branch: Option<Branch>, config: &EngineConfig) -> Result<EventOutcome> {
        self.evolve_at(branch, Utc::now(), config)
    }

    /// Advance one evolution stage, committing `branch` on the first advance,
    /// then celebrate: evolution reaction, new mood and an evolution memory.
    ///
    /// # Errors
    ///
    /// [`EcomonError::InvalidTransition`] from the ledger; the companion is
    /// unchanged on error.
    pub fn evolve_at(
        &mut self,
        branch: Option<Branch>,
        at: DateTime<Utc>,
        config: &EngineConfig,
    ) -> Result<EventOutcome> {
        self.evolution.advance(branch)?;
        let stage = self.evolution.stage();
        let form = self
            .evolution
            .stage_info()
            .map_or("a new form", |info| info.name);
        let committed = self.evolution.branch().map_or("", |b| b.name());

        info!(
            companion = %self.id,
            stage,
            branch = committed,
            "Companion evolved"
        );

        let reaction = Reaction {
            delta: config.reactions.evolution,
            category: MemoryCategory::Evolution,
            summary: format!("Evolved to stage {stage}: {form} ({committed})"),
            reward: Reward::NONE,
            corruption: 0,
        };
        Ok(self.fold(reaction, at, config))
    }
}

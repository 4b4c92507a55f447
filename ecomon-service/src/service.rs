//! Service orchestration.
//!
//! [`CompanionService`] wires the registry to the collaborators:
//!
//! ```text
//! chat ──────▶ ContentGenerator (template fallback) ──▶ Chat event
//! photo ─────▶ ImageVerifier ──▶ hooks::on_verification ──▶ VerifiedAction event
//! quiz ──────▶ ContentGenerator (question bank fallback) ──▶ served quiz
//! answers ───▶ hooks::on_quiz_submitted ──▶ QuizResult event
//! idle check ▶ hooks::on_idle_check ──▶ Inactivity event
//! every event ─▶ new achievements ──▶ MintService (spawned, fire-and-forget)
//! ```
//!
//! Collaborator calls are awaited with no account lock held.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use ecomon_core::evolution::Branch;
use ecomon_core::{AccountRecord, Companion, CompanionEvent, CompanionStore, Personality, Species, UserId};
use ecomon_llm::{
    ChatContext, ChatTurn, ContentGenerator, ImagePayload, ImageVerifier, QuizCategory, QuizQuestion,
    QuizRequest, QuizScore, TemplateGenerator, VerificationReport,
};

use crate::config::{ServiceConfig, ServiceSettings};
use crate::error::{Result, ServiceError};
use crate::hooks;
use crate::metrics::{CounterSnapshot, EcomonCounters};
use crate::mint::{AchievementData, MintService};
use crate::registry::{Applied, CompanionRegistry};

/// A companion's chat reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Reply text.
    pub reply: String,
    /// Whether the template fallback produced the reply.
    pub degraded: bool,
    /// The chat event's effect.
    pub applied: Applied,
}

/// A photo verification.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoVerification {
    /// The verifier's verdict.
    pub report: VerificationReport,
    /// The verified-action event's effect, if the verdict was accepted.
    pub applied: Option<Applied>,
}

/// A scored quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    /// Per-question results.
    pub score: QuizScore,
    /// The quiz-result event's effect.
    pub applied: Applied,
}

/// The EcoMon service.
pub struct CompanionService<G, V, M> {
    registry: Arc<CompanionRegistry>,
    generator: G,
    verifier: V,
    mint: Arc<M>,
    fallback: TemplateGenerator,
    settings: ServiceSettings,
    counters: Arc<EcomonCounters>,
}

impl<G, V, M> CompanionService<G, V, M>
where
    G: ContentGenerator,
    V: ImageVerifier,
    M: MintService,
{
    /// Build the service, opening the store if `db_path` is set.
    ///
    /// # Errors
    ///
    /// Configuration validation errors, or the store's open error.
    pub fn new(config: ServiceConfig, generator: G, verifier: V, mint: M) -> Result<Self> {
        config.validate()?;
        let counters = Arc::new(EcomonCounters::new());
        let registry = match &config.service.db_path {
            Some(path) => {
                let store = CompanionStore::open(path, &config.persistence)?;
                info!(path = %path.display(), "Opened companion store");
                CompanionRegistry::with_store(config.engine, Arc::clone(&counters), store)
            }
            None => CompanionRegistry::new(config.engine, Arc::clone(&counters)),
        };
        info!(
            generator = generator.name(),
            verifier = verifier.name(),
            min_confidence = config.service.min_verification_confidence,
            "Companion service ready"
        );
        Ok(Self {
            registry: Arc::new(registry),
            generator,
            verifier,
            mint: Arc::new(mint),
            fallback: TemplateGenerator::new(),
            settings: config.service,
            counters,
        })
    }

    /// The account registry.
    #[must_use]
    pub fn registry(&self) -> &CompanionRegistry {
        &self.registry
    }

    /// Current counter values.
    #[must_use]
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Counters as Prometheus text.
    #[must_use]
    pub fn metrics_text(&self) -> String {
        self.counters.snapshot().to_prometheus()
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// [`ServiceError::AlreadyRegistered`].
    pub fn register(&self, user: UserId, name: &str) -> Result<()> {
        self.registry.register_at(user, name, Utc::now()).map(|_| ())
    }

    /// Adopt a companion.
    ///
    /// # Errors
    ///
    /// [`ServiceError::AlreadyAdopted`], or a blank name.
    pub fn adopt(&self, user: UserId, name: &str, species: Species, personality: Personality) -> Result<Companion> {
        self.registry.adopt_at(user, name, species, personality, Utc::now())
    }

    /// The persisted state of an account.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownGuardian`].
    pub fn account(&self, user: UserId) -> Result<AccountRecord> {
        self.registry.snapshot(user)
    }

    /// Talk to the companion. A failing generator degrades to a template
    /// reply; the chat still counts.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoCompanion`] or [`ServiceError::UnknownGuardian`].
    pub async fn chat(&self, user: UserId, message: &str, history: &[ChatTurn]) -> Result<ChatReply> {
        let context = {
            let handle = self.registry.get(user)?;
            let account = handle.lock();
            let companion = account.record.companion.as_ref().ok_or(ServiceError::NoCompanion(user))?;
            ChatContext::from_companion(companion, &account.record.guardian.name)
        };

        let (reply, degraded) = match self.generator.chat_reply(&context, history, message).await {
            Ok(reply) => (reply, false),
            Err(e) => {
                EcomonCounters::incr(&self.counters.collaborator_failures);
                warn!(generator = self.generator.name(), error = %e, "Chat generation failed, using template reply");
                (self.fallback.compose_reply(&context, message), true)
            }
        };

        let applied = self.apply(user, &hooks::on_chat(message), Utc::now())?;
        Ok(ChatReply { reply, degraded, applied })
    }

    /// Verify an eco-action photo and, if accepted, apply it.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Collaborator`] if the verifier fails; nothing is
    /// applied in that case.
    pub async fn verify_photo(&self, user: UserId, image: &ImagePayload) -> Result<PhotoVerification> {
        self.require_companion(user)?;

        let report = match self.verifier.verify(image).await {
            Ok(report) => report,
            Err(e) => {
                EcomonCounters::incr(&self.counters.collaborator_failures);
                warn!(verifier = self.verifier.name(), error = %e, "Photo verification failed");
                return Err(e.into());
            }
        };

        let Some(event) = hooks::on_verification(&report, self.settings.min_verification_confidence) else {
            EcomonCounters::incr(&self.counters.verifications_rejected);
            return Ok(PhotoVerification { report, applied: None });
        };
        let applied = self.apply(user, &event, Utc::now())?;
        Ok(PhotoVerification { report, applied: Some(applied) })
    }

    /// Serve a quiz. Malformed or failed generations fall back to the
    /// built-in question bank.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoCompanion`].
    pub async fn start_quiz(&self, user: UserId, category: Option<QuizCategory>) -> Result<Vec<QuizQuestion>> {
        self.require_companion(user)?;
        let request = QuizRequest {
            category,
            difficulty: self.settings.quiz_difficulty,
            count: self.settings.quiz_size,
        };

        let questions = match self.generator.quiz_questions(&request).await {
            Ok(questions) if well_formed(&questions) => questions,
            Ok(_) => {
                EcomonCounters::incr(&self.counters.collaborator_failures);
                warn!(generator = self.generator.name(), "Generated quiz is malformed, using question bank");
                self.fallback.pick_questions(&request)?
            }
            Err(e) => {
                EcomonCounters::incr(&self.counters.collaborator_failures);
                warn!(generator = self.generator.name(), error = %e, "Quiz generation failed, using question bank");
                self.fallback.pick_questions(&request)?
            }
        };

        self.registry.start_quiz(user, questions.clone())?;
        Ok(questions)
    }

    /// Score answers for the served quiz. `None` marks an unanswered question.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoActiveQuiz`].
    pub fn submit_quiz(&self, user: UserId, answers: &[Option<usize>]) -> Result<QuizSubmission> {
        let now = Utc::now();
        let (score, applied) = self.registry.submit_quiz_at(user, answers, now)?;
        self.dispatch_awards(user, &applied, now);
        Ok(QuizSubmission { score, applied })
    }

    /// Charge uncharged idle days, if a grace period's worth has piled up.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoCompanion`].
    pub fn check_inactivity_at(&self, user: UserId, now: DateTime<Utc>) -> Result<Option<Applied>> {
        let applied = self.registry.check_inactivity_at(user, now)?;
        if let Some(applied) = &applied {
            self.dispatch_awards(user, applied, now);
        }
        Ok(applied)
    }

    /// Evolve the companion, committing `branch` on the first advance.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from the ledger.
    pub fn evolve(&self, user: UserId, branch: Option<Branch>) -> Result<Applied> {
        let now = Utc::now();
        let applied = self.registry.evolve_at(user, branch, now)?;
        self.dispatch_awards(user, &applied, now);
        Ok(applied)
    }

    /// Apply an event directly.
    ///
    /// # Errors
    ///
    /// As [`CompanionRegistry::apply_at`].
    pub fn apply(&self, user: UserId, event: &CompanionEvent, at: DateTime<Utc>) -> Result<Applied> {
        let applied = self.registry.apply_at(user, event, at)?;
        self.dispatch_awards(user, &applied, at);
        Ok(applied)
    }

    fn require_companion(&self, user: UserId) -> Result<()> {
        let handle = self.registry.get(user)?;
        if handle.lock().record.companion.is_none() {
            return Err(ServiceError::NoCompanion(user));
        }
        Ok(())
    }

    fn dispatch_awards(&self, user: UserId, applied: &Applied, at: DateTime<Utc>) {
        if !self.settings.mint_enabled || applied.new_awards.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(user = %user, awards = applied.new_awards.len(), "No async runtime, skipping mints");
            for _ in &applied.new_awards {
                EcomonCounters::incr(&self.counters.mint_failures);
            }
            return;
        };

        for nft in applied.new_awards.iter().copied() {
            let achievement = AchievementData::for_award(nft, &applied.progress, at);
            let mint = Arc::clone(&self.mint);
            let registry = Arc::clone(&self.registry);
            let counters = Arc::clone(&self.counters);
            EcomonCounters::incr(&counters.mints_requested);

            runtime.spawn(async move {
                match mint.mint(user, nft, achievement).await {
                    Ok(receipt) => {
                        let bonus = nft.rarity().bonus_points();
                        info!(user = %user, achievement = %nft, mint = %receipt.mint_address, bonus, "Achievement minted");
                        if let Err(e) = registry.credit_bonus(user, bonus) {
                            warn!(user = %user, error = %e, "Failed to credit mint bonus");
                        }
                    }
                    Err(e) => {
                        EcomonCounters::incr(&counters.mint_failures);
                        warn!(user = %user, achievement = %nft, error = %e, "Mint failed, achievement stays awarded");
                    }
                }
            });
        }
    }
}

fn well_formed(questions: &[QuizQuestion]) -> bool {
    !questions.is_empty()
        && questions
            .iter()
            .all(|q| q.options.len() == ecomon_llm::types::QUIZ_OPTIONS && q.correct_index < q.options.len())
}

//! Per-user account registry.
//!
//! Each account sits behind its own `parking_lot::Mutex`, so events for one
//! companion apply one at a time in arrival order while different companions
//! proceed in parallel. Account locks are never held across an `.await`;
//! the lock order is always account, then store.
//!
//! Every change is built on a copy of the account record and only replaces
//! the live record once the store has accepted it, so a failed save leaves
//! memory and disk in agreement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use ecomon_core::corruption::CorruptionTransition;
use ecomon_core::evolution::Branch;
use ecomon_core::{
    AccountRecord, Companion, CompanionEvent, CompanionStore, EngineConfig, EventOutcome, Guardian,
    Personality, Species, UserId,
};
use ecomon_llm::QuizQuestion;

use crate::error::{Result, ServiceError};
use crate::hooks;
use crate::metrics::EcomonCounters;
use crate::mint::{newly_earned, AchievementProgress, NftType};

/// One guardian's live state.
#[derive(Debug, Clone)]
pub struct Account {
    /// Persisted part.
    pub record: AccountRecord,
    /// Questions served and not yet answered.
    pub active_quiz: Option<Vec<QuizQuestion>>,
}

impl Account {
    fn new(record: AccountRecord) -> Self {
        Self { record, active_quiz: None }
    }

    /// What achievement checks see.
    #[must_use]
    pub fn progress(&self) -> AchievementProgress {
        progress_of(&self.record)
    }
}

fn progress_of(record: &AccountRecord) -> AchievementProgress {
    AchievementProgress {
        stats: record.guardian.stats,
        streak: record.guardian.streak,
        stage: record.companion.as_ref().map_or(0, |c| c.evolution().stage()),
    }
}

/// Shared handle to one account.
pub type AccountHandle = Arc<Mutex<Account>>;

/// What applying one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Engine outcome.
    pub outcome: EventOutcome,
    /// Achievements earned by this event, already marked awarded.
    pub new_awards: Vec<NftType>,
    /// Achievement progress after the event.
    pub progress: AchievementProgress,
}

/// All accounts, keyed by user.
pub struct CompanionRegistry {
    accounts: DashMap<UserId, AccountHandle>,
    store: Option<Mutex<CompanionStore>>,
    engine: EngineConfig,
    counters: Arc<EcomonCounters>,
}

impl std::fmt::Debug for CompanionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanionRegistry")
            .field("accounts", &self.accounts.len())
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl CompanionRegistry {
    /// An in-memory registry.
    #[must_use]
    pub fn new(engine: EngineConfig, counters: Arc<EcomonCounters>) -> Self {
        Self { accounts: DashMap::new(), store: None, engine, counters }
    }

    /// A registry that loads accounts on demand from `store` and saves every
    /// change back.
    #[must_use]
    pub fn with_store(engine: EngineConfig, counters: Arc<EcomonCounters>, store: CompanionStore) -> Self {
        Self { accounts: DashMap::new(), store: Some(Mutex::new(store)), engine, counters }
    }

    /// Engine rules in force.
    #[must_use]
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Accounts currently loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether no accounts are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// [`ServiceError::AlreadyRegistered`] if the user is loaded or stored.
    pub fn register_at(&self, user: UserId, name: &str, at: DateTime<Utc>) -> Result<AccountHandle> {
        if self.load_stored(user)?.is_some() {
            return Err(ServiceError::AlreadyRegistered(user));
        }
        let record = AccountRecord::new(Guardian::new_at(user, name, at));
        let handle = match self.accounts.entry(user) {
            Entry::Occupied(_) => return Err(ServiceError::AlreadyRegistered(user)),
            Entry::Vacant(slot) => {
                self.persist(user, &record)?;
                let inserted = slot.insert(Arc::new(Mutex::new(Account::new(record))));
                Arc::clone(inserted.value())
            }
        };
        info!(user = %user, "Registered guardian");
        Ok(handle)
    }

    /// Look up an account, loading it from the store on first use.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownGuardian`] if the user is neither loaded nor stored.
    pub fn get(&self, user: UserId) -> Result<AccountHandle> {
        if let Some(handle) = self.accounts.get(&user) {
            return Ok(Arc::clone(handle.value()));
        }
        let mut record = self.load_stored(user)?.ok_or(ServiceError::UnknownGuardian(user))?;
        if let Some(companion) = record.companion.as_mut() {
            companion.reclassify(&self.engine);
        }
        let handle = self
            .accounts
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(Account::new(record))));
        Ok(Arc::clone(handle.value()))
    }

    /// A copy of the persisted part of an account.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownGuardian`].
    pub fn snapshot(&self, user: UserId) -> Result<AccountRecord> {
        Ok(self.get(user)?.lock().record.clone())
    }

    /// Adopt a companion for a guardian.
    ///
    /// # Errors
    ///
    /// [`ServiceError::AlreadyAdopted`], or the engine's error for a blank name.
    pub fn adopt_at(
        &self,
        user: UserId,
        name: &str,
        species: Species,
        personality: Personality,
        at: DateTime<Utc>,
    ) -> Result<Companion> {
        let handle = self.get(user)?;
        let mut account = handle.lock();
        if account.record.companion.is_some() {
            return Err(ServiceError::AlreadyAdopted(user));
        }
        let companion = Companion::new_at(user, name, species, personality, &self.engine, at)?;
        let mut record = account.record.clone();
        record.companion = Some(companion.clone());
        self.persist(user, &record)?;
        account.record = record;
        info!(user = %user, companion = %companion.id, %species, %personality, "Companion adopted");
        Ok(companion)
    }

    /// Apply one event: fold it into the companion, credit the reward,
    /// update streak and tallies, mark new achievements and save.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoCompanion`], or the engine's rejection (state is
    /// unchanged in that case).
    pub fn apply_at(&self, user: UserId, event: &CompanionEvent, at: DateTime<Utc>) -> Result<Applied> {
        let handle = self.get(user)?;
        let mut account = handle.lock();
        self.apply_locked(&mut account, user, event, at)
    }

    /// Run the idle check and apply the tick if one is due.
    ///
    /// # Errors
    ///
    /// As [`CompanionRegistry::apply_at`].
    pub fn check_inactivity_at(&self, user: UserId, now: DateTime<Utc>) -> Result<Option<Applied>> {
        let handle = self.get(user)?;
        let mut account = handle.lock();
        if account.record.companion.is_none() {
            return Err(ServiceError::NoCompanion(user));
        }
        let mut record = account.record.clone();
        let Some(event) = hooks::on_idle_check(&mut record.guardian, now, &self.engine.corruption) else {
            return Ok(None);
        };
        self.apply_to(&mut account, record, user, &event, now).map(Some)
    }

    /// Advance the companion one stage.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoCompanion`], or `InvalidTransition` from the ledger.
    pub fn evolve_at(&self, user: UserId, branch: Option<Branch>, at: DateTime<Utc>) -> Result<Applied> {
        let handle = self.get(user)?;
        let mut account = handle.lock();
        let mut record = account.record.clone();
        let companion = record.companion.as_mut().ok_or(ServiceError::NoCompanion(user))?;
        let evicts = companion.memories().len() == companion.memories().capacity();
        let outcome = companion.evolve_at(branch, at, &self.engine)?;
        let applied = self.commit(&mut account, record, user, outcome, at)?;
        EcomonCounters::incr(&self.counters.evolutions);
        if evicts {
            EcomonCounters::incr(&self.counters.memories_evicted);
        }
        Ok(applied)
    }

    /// Store the served quiz for later scoring.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoCompanion`].
    pub fn start_quiz(&self, user: UserId, questions: Vec<QuizQuestion>) -> Result<()> {
        let handle = self.get(user)?;
        let mut account = handle.lock();
        if account.record.companion.is_none() {
            return Err(ServiceError::NoCompanion(user));
        }
        account.active_quiz = Some(questions);
        Ok(())
    }

    /// Score answers against the served quiz and apply the result.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoActiveQuiz`] if no quiz was served.
    pub fn submit_quiz_at(
        &self,
        user: UserId,
        answers: &[Option<usize>],
        at: DateTime<Utc>,
    ) -> Result<(ecomon_llm::QuizScore, Applied)> {
        let handle = self.get(user)?;
        let mut account = handle.lock();
        let questions = account.active_quiz.as_deref().ok_or(ServiceError::NoActiveQuiz(user))?;
        let (score, event) = hooks::on_quiz_submitted(questions, answers)?;
        let applied = self.apply_locked(&mut account, user, &event, at)?;
        account.active_quiz = None;
        Ok((score, applied))
    }

    /// Credit bonus points outside an event, e.g. after a mint lands.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownGuardian`].
    pub fn credit_bonus(&self, user: UserId, points: u32) -> Result<()> {
        let handle = self.get(user)?;
        let mut account = handle.lock();
        let mut record = account.record.clone();
        record.guardian.credit(ecomon_core::reward::Reward { points, xp: points });
        self.persist(user, &record)?;
        account.record = record;
        Ok(())
    }

    fn apply_locked(
        &self,
        account: &mut Account,
        user: UserId,
        event: &CompanionEvent,
        at: DateTime<Utc>,
    ) -> Result<Applied> {
        let record = account.record.clone();
        self.apply_to(account, record, user, event, at)
    }

    /// Fold `event` into `record`, a working copy of `account.record`, and
    /// commit it.
    fn apply_to(
        &self,
        account: &mut Account,
        mut record: AccountRecord,
        user: UserId,
        event: &CompanionEvent,
        at: DateTime<Utc>,
    ) -> Result<Applied> {
        let companion = record.companion.as_mut().ok_or(ServiceError::NoCompanion(user))?;
        let evicts = companion.memories().len() == companion.memories().capacity();
        let outcome = companion.apply_event_at(event, at, &self.engine)?;

        let guardian = &mut record.guardian;
        guardian.credit(outcome.reward);
        match event {
            CompanionEvent::Inactivity { .. } => {}
            CompanionEvent::VerifiedAction { action, .. } => {
                guardian.stats.record_action(*action);
                guardian.record_activity_at(at);
            }
            CompanionEvent::QuizResult { correct, total } => {
                guardian.stats.record_quiz(correct == total);
                guardian.record_activity_at(at);
            }
            CompanionEvent::Chat { .. } => guardian.record_activity_at(at),
        }

        let applied = self.commit(account, record, user, outcome, at)?;
        EcomonCounters::incr(self.counters.for_event(event));
        if evicts {
            EcomonCounters::incr(&self.counters.memories_evicted);
        }
        match applied.outcome.corruption {
            Some(CorruptionTransition::EnteredDarkForm) => EcomonCounters::incr(&self.counters.dark_form_entries),
            Some(CorruptionTransition::Redeemed) => EcomonCounters::incr(&self.counters.dark_form_exits),
            None => {}
        }
        Ok(applied)
    }

    /// Mark new achievements on `record`, save it, then make it live.
    fn commit(
        &self,
        account: &mut Account,
        mut record: AccountRecord,
        user: UserId,
        outcome: EventOutcome,
        at: DateTime<Utc>,
    ) -> Result<Applied> {
        let progress = progress_of(&record);
        let new_awards = newly_earned(&progress, &record.awards);
        for nft in &new_awards {
            record.awards.insert(nft.key().to_string());
        }
        self.persist(user, &record)?;
        account.record = record;
        for nft in &new_awards {
            info!(user = %user, achievement = %nft, at = %at, "Achievement earned");
        }
        Ok(Applied { outcome, new_awards, progress })
    }

    fn load_stored(&self, user: UserId) -> Result<Option<AccountRecord>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let record = store.lock().load(&user)?;
        if record.is_some() {
            debug!(user = %user, "Loaded account from store");
        }
        Ok(record)
    }

    fn persist(&self, user: UserId, record: &AccountRecord) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        if let Err(e) = store.lock().save(&user, record) {
            warn!(user = %user, error = %e, "Failed to save account");
            return Err(e.into());
        }
        EcomonCounters::incr(&self.counters.saves_completed);
        Ok(())
    }
}

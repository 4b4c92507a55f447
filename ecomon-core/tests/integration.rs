//! Integration tests for ecomon-core.
//!
//! End-to-end flows across modules: a companion's life from adoption to
//! evolution, neglect and redemption, and saving it all to disk.

use chrono::{DateTime, Duration, TimeZone, Utc};

use ecomon_core::companion::{Companion, CompanionEvent};
use ecomon_core::config::{EngineConfig, PersistenceConfig};
use ecomon_core::corruption::{CorruptionTransition, DisplayForm};
use ecomon_core::evolution::Branch;
use ecomon_core::memory::MemoryCategory;
use ecomon_core::mood::Mood;
use ecomon_core::persistence::{AccountRecord, CompanionStore};
use ecomon_core::reward::{self, EcoAction, Reward};
use ecomon_core::{EcomonError, Guardian, Personality, Species, UserId};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).single().expect("valid date")
}

fn adopt(config: &EngineConfig) -> (Guardian, Companion) {
    let user = UserId::new();
    let guardian = Guardian::new_at(user, "Ari", start());
    let companion = Companion::new_at(user, "Sprig", Species::Leaf, Personality::Empath, config, start())
        .expect("valid companion");
    (guardian, companion)
}

#[test]
fn documented_fold_scenario() {
    let config = EngineConfig::default();
    let (_, mut companion) = adopt(&config);

    let events = [
        CompanionEvent::Chat { message: "Hi Sprig!".into() },
        CompanionEvent::verified_action("recycle", 1.0).expect("known"),
        CompanionEvent::QuizResult { correct: 5, total: 5 },
    ];
    let mut outcomes = Vec::new();
    for e in &events {
        outcomes.push(companion.apply_event_at(e, start(), &config).expect("valid"));
    }

    assert_eq!(outcomes[1].reward, Reward { points: 10, xp: 5 });
    assert_eq!(outcomes[2].reward, Reward { points: 100, xp: 50 });
    assert_eq!(companion.mood(), Mood::Excited);
    assert_eq!(companion.evolution().xp(), 55);

    let categories: Vec<_> = companion.memories().recent(3).map(|m| m.category).collect();
    assert_eq!(
        categories,
        vec![MemoryCategory::Chat, MemoryCategory::Action, MemoryCategory::Milestone]
    );
    let moods: Vec<_> = companion.memories().recent(3).map(|m| m.mood).collect();
    assert_eq!(moods, outcomes.iter().map(|o| o.mood).collect::<Vec<_>>());
}

#[test]
fn life_cycle_through_evolution() {
    let config = EngineConfig::default();
    let (mut guardian, mut companion) = adopt(&config);
    let mut now = start();

    // Plant trees until the first evolution unlocks.
    while !companion.evolution().can_advance() {
        let out = companion
            .apply_event_at(
                &CompanionEvent::VerifiedAction { action: EcoAction::PlantTree, confidence: 1.0 },
                now,
                &config,
            )
            .expect("valid");
        guardian.credit(out.reward);
        guardian.record_activity_at(now);
        now += Duration::days(1);
    }
    // 25 XP per tree, 100 to leave stage 1.
    assert_eq!(guardian.total_xp, 100);
    assert_eq!(guardian.eco_points, 200);
    assert_eq!(guardian.streak, 4);
    assert_eq!(guardian.level(), 2);

    assert!(matches!(companion.evolve_at(None, now, &config), Err(EcomonError::InvalidTransition(_))));
    companion
        .evolve_at(Some(Branch::ForestGuardian), now, &config)
        .expect("evolve");
    assert_eq!(
        companion.display_form(),
        DisplayForm::Branch { branch: Branch::ForestGuardian, stage: 2 }
    );
    assert_eq!(companion.display_form().name(), "Bloomkin");
    assert_eq!(companion.evolution().threshold(), 300);
}

#[test]
fn neglect_and_redemption_quest() {
    let config = EngineConfig::default();
    let (_, mut companion) = adopt(&config);

    let out = companion
        .apply_event_at(&CompanionEvent::Inactivity { days: 12 }, start(), &config)
        .expect("valid");
    assert_eq!(out.corruption, Some(CorruptionTransition::EnteredDarkForm));
    assert_eq!(companion.display_form(), DisplayForm::Dark { stage: 1 });
    assert_eq!(companion.display_form().name(), "Withering");

    // Three beach cleanups clear a full bar.
    let mut redeemed = false;
    for i in 0..3 {
        let out = companion
            .apply_event_at(
                &CompanionEvent::VerifiedAction { action: EcoAction::CleanBeach, confidence: 1.0 },
                start() + Duration::hours(i + 1),
                &config,
            )
            .expect("valid");
        redeemed |= out.corruption == Some(CorruptionTransition::Redeemed);
    }
    assert!(redeemed);
    assert_eq!(companion.corruption().level(), 0);
    assert!(!companion.display_form().is_dark());
}

#[test]
fn custom_config_changes_rules() {
    let config = EngineConfig::from_toml(
        r"
        [memory]
        capacity = 3

        [rewards]
        perfect_bonus_points = 0
        perfect_bonus_xp = 0

        [reactions.chat]
        joy = 40
        ",
    )
    .expect("valid config");
    let (_, mut companion) = adopt(&config);

    for _ in 0..5 {
        companion
            .apply_event_at(&CompanionEvent::Chat { message: "yay".into() }, start(), &config)
            .expect("chat");
    }
    assert_eq!(companion.memories().len(), 3);
    assert_eq!(companion.emotions().joy(), 100);
    assert_eq!(companion.mood(), Mood::Happy);

    let out = companion
        .apply_event_at(&CompanionEvent::QuizResult { correct: 4, total: 4 }, start(), &config)
        .expect("quiz");
    assert_eq!(out.reward, Reward { points: 40, xp: 20 });
}

#[test]
fn reward_calculator_contract() {
    assert_eq!(reward::for_quiz(5, 5).expect("valid"), Reward { points: 100, xp: 50 });
    assert_eq!(
        reward::for_verified_action("plant-tree", 0.8).expect("valid"),
        Reward { points: 40, xp: 20 }
    );
    assert!(matches!(
        reward::for_verified_action("carbon-footprint", 1.0),
        Err(EcomonError::UnknownActionType(_))
    ));
}

#[test]
fn persist_account_to_disk() {
    let config = EngineConfig::default();
    let (guardian, mut companion) = adopt(&config);
    companion
        .apply_event_at(&CompanionEvent::Chat { message: "save me".into() }, start(), &config)
        .expect("chat");
    let user = guardian.id;
    let mut record = AccountRecord::new(guardian);
    record.companion = Some(companion);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ecomon.db");
    {
        let store = CompanionStore::open(&path, &PersistenceConfig::default()).expect("open");
        store.save(&user, &record).expect("save");
        store.create_rotating_backup().expect("backup");
    }

    let store = CompanionStore::open(&path, &PersistenceConfig::default()).expect("reopen");
    let loaded = store.load(&user).expect("load").expect("present");
    assert_eq!(loaded, record);
    assert!(store.integrity_check().expect("integrity"));

    let backup = CompanionStore::open(dir.path().join("ecomon.db.bak.1"), &PersistenceConfig::default())
        .expect("open backup");
    assert_eq!(backup.count().expect("count"), 1);
}

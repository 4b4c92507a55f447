//! Property-based tests for the companion engine.
//!
//! Verifies bounds, totality and determinism under random inputs.

use proptest::prelude::*;

use ecomon_core::companion::{Companion, CompanionEvent};
use ecomon_core::config::EngineConfig;
use ecomon_core::corruption::{CorruptionTracker, DARK_THRESHOLD};
use ecomon_core::emotion::{EmotionDelta, EmotionalState};
use ecomon_core::evolution::{Branch, EvolutionLedger, XpCurve};
use ecomon_core::memory::{MemoryCategory, MemoryLog};
use ecomon_core::mood::{classify, Mood};
use ecomon_core::reward::{self, EcoAction};
use ecomon_core::{Personality, Species, UserId};

use chrono::{DateTime, TimeZone, Utc};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_delta() -> impl Strategy<Value = EmotionDelta> {
    (
        -300..300i32,
        -300..300i32,
        -300..300i32,
        -300..300i32,
        -300..300i32,
    )
        .prop_map(|(t, j, c, w, p)| EmotionDelta::new().trust(t).joy(j).curiosity(c).worry(w).pride(p))
}

fn arb_state() -> impl Strategy<Value = EmotionalState> {
    (0..=100i32, 0..=100i32, 0..=100i32, 0..=100i32, 0..=100i32)
        .prop_map(|(t, j, c, w, p)| EmotionalState::new(t, j, c, w, p))
}

fn arb_event() -> impl Strategy<Value = CompanionEvent> {
    prop_oneof![
        "[a-z ]{0,80}".prop_map(|message| CompanionEvent::Chat { message }),
        (0..EcoAction::ALL.len(), 0.0..=1.0f64).prop_map(|(i, confidence)| {
            CompanionEvent::VerifiedAction { action: EcoAction::ALL[i], confidence }
        }),
        (1..20u32).prop_flat_map(|total| (0..=total, Just(total)))
            .prop_map(|(correct, total)| CompanionEvent::QuizResult { correct, total }),
        (1..15u32).prop_map(|days| CompanionEvent::Inactivity { days }),
    ]
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid date")
}

fn all_channels_in_range(s: &EmotionalState) -> bool {
    [s.trust(), s.joy(), s.curiosity(), s.worry(), s.pride()]
        .iter()
        .all(|v| *v <= 100)
}

// ---------------------------------------------------------------------------
// Emotion clamping
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn emotions_stay_clamped(deltas in prop::collection::vec(arb_delta(), 0..50)) {
        let mut state = EmotionalState::NEUTRAL;
        for d in &deltas {
            state.apply(d);
            prop_assert!(all_channels_in_range(&state));
        }
    }

    #[test]
    fn zero_delta_is_identity(state in arb_state()) {
        prop_assert_eq!(state.apply_delta(&EmotionDelta::ZERO), state);
    }
}

// ---------------------------------------------------------------------------
// Mood totality and determinism
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn mood_is_total_and_deterministic(state in arb_state()) {
        let a = classify(&state);
        let b = classify(&state);
        prop_assert_eq!(a, b);
        prop_assert!(Mood::ALL.contains(&a));
    }

    #[test]
    fn high_worry_always_wins(state in arb_state(), worry in 81..=100i32) {
        let s = EmotionalState::new(
            i32::from(state.trust()),
            i32::from(state.joy()),
            i32::from(state.curiosity()),
            worry,
            i32::from(state.pride()),
        );
        prop_assert_eq!(classify(&s), Mood::Worried);
    }
}

// ---------------------------------------------------------------------------
// Memory bound
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn memory_log_never_exceeds_capacity(n in 0..200usize, cap in 1..80usize) {
        let mut log = MemoryLog::with_capacity(cap);
        for i in 0..n {
            log.append_at(MemoryCategory::Chat, format!("m{i}"), Mood::Content, epoch());
        }
        prop_assert_eq!(log.len(), n.min(cap));
        if n > 0 {
            prop_assert_eq!(log.latest().map(|e| e.summary.clone()), Some(format!("m{}", n - 1)));
        }
    }
}

// ---------------------------------------------------------------------------
// Evolution ledger
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn failed_advance_is_idempotent(xp in 0..100u32, branch in 0..5usize) {
        let mut ledger = EvolutionLedger::new(XpCurve::default());
        ledger.add_xp(xp);
        let before = ledger.clone();
        prop_assert!(ledger.advance(Some(Branch::ALL[branch])).is_err());
        prop_assert_eq!(ledger, before);
    }

    #[test]
    fn progress_is_bounded(xp in any::<u32>()) {
        let mut ledger = EvolutionLedger::new(XpCurve::default());
        ledger.add_xp(xp);
        prop_assert!(ledger.progress_percent() <= 100);
    }
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn corruption_flag_tracks_level(deltas in prop::collection::vec(-150..150i32, 0..40)) {
        let mut c = CorruptionTracker::new();
        for d in deltas {
            c.adjust(d);
            prop_assert!(c.level() <= DARK_THRESHOLD);
            prop_assert_eq!(c.is_corrupted_form(), c.level() >= DARK_THRESHOLD);
        }
    }
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn action_reward_never_exceeds_base(i in 0..10usize, confidence in 0.0..=1.0f64) {
        let action = EcoAction::ALL[i];
        let r = reward::for_action(action, confidence).expect("valid confidence");
        let base = action.base_reward();
        prop_assert!(r.points <= base.points);
        prop_assert!(r.xp <= base.xp);
    }

    #[test]
    fn quiz_reward_is_monotonic(total in 1..50u32) {
        let mut last = 0;
        for correct in 0..=total {
            let r = reward::for_quiz(correct, total).expect("valid tally");
            prop_assert!(r.points >= last);
            last = r.points;
        }
    }
}

// ---------------------------------------------------------------------------
// Fold determinism
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn fold_is_deterministic(events in prop::collection::vec(arb_event(), 0..40)) {
        let config = EngineConfig::default();
        let owner = UserId::new();
        let base = Companion::new_at(owner, "Pip", Species::Fire, Personality::Cheerleader, &config, epoch())
            .expect("valid companion");

        let mut a = base.clone();
        let mut b = base;
        for e in &events {
            let oa = a.apply_event_at(e, epoch(), &config).expect("valid event");
            let ob = b.apply_event_at(e, epoch(), &config).expect("valid event");
            prop_assert_eq!(oa.mood, ob.mood);
            prop_assert_eq!(oa.reward, ob.reward);
            prop_assert_eq!(a.mood(), classify(a.emotions()));
        }
        prop_assert_eq!(a.emotions(), b.emotions());
        prop_assert_eq!(a.evolution(), b.evolution());
        prop_assert_eq!(a.corruption(), b.corruption());
        prop_assert_eq!(a.memories().len(), events.len().min(50));
        prop_assert!(all_channels_in_range(a.emotions()));
    }
}

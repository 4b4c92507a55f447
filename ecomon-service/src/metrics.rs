//! Runtime counters.
//!
//! Lock-free `AtomicU64` counters bumped on the hot path and read on export,
//! either as a [`CounterSnapshot`] or as Prometheus text.

use std::sync::atomic::{AtomicU64, Ordering};

use ecomon_core::CompanionEvent;

/// Service-wide counters.
#[derive(Debug)]
pub struct EcomonCounters {
    /// Chat events applied.
    pub chat_events: AtomicU64,
    /// Verified-action events applied.
    pub action_events: AtomicU64,
    /// Quiz-result events applied.
    pub quiz_events: AtomicU64,
    /// Inactivity ticks applied.
    pub inactivity_events: AtomicU64,
    /// Successful evolutions.
    pub evolutions: AtomicU64,
    /// Companions that fell into their dark form.
    pub dark_form_entries: AtomicU64,
    /// Companions redeemed from their dark form.
    pub dark_form_exits: AtomicU64,
    /// Memory entries evicted from full logs.
    pub memories_evicted: AtomicU64,
    /// Verifications that produced no event.
    pub verifications_rejected: AtomicU64,
    /// Generator or verifier failures.
    pub collaborator_failures: AtomicU64,
    /// Mints dispatched.
    pub mints_requested: AtomicU64,
    /// Mints that failed.
    pub mint_failures: AtomicU64,
    /// Account saves.
    pub saves_completed: AtomicU64,
}

impl EcomonCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chat_events: AtomicU64::new(0),
            action_events: AtomicU64::new(0),
            quiz_events: AtomicU64::new(0),
            inactivity_events: AtomicU64::new(0),
            evolutions: AtomicU64::new(0),
            dark_form_entries: AtomicU64::new(0),
            dark_form_exits: AtomicU64::new(0),
            memories_evicted: AtomicU64::new(0),
            verifications_rejected: AtomicU64::new(0),
            collaborator_failures: AtomicU64::new(0),
            mints_requested: AtomicU64::new(0),
            mint_failures: AtomicU64::new(0),
            saves_completed: AtomicU64::new(0),
        }
    }

    /// Bump one counter.
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// The per-kind counter for an event.
    #[must_use]
    pub fn for_event(&self, event: &CompanionEvent) -> &AtomicU64 {
        match event {
            CompanionEvent::Chat { .. } => &self.chat_events,
            CompanionEvent::VerifiedAction { .. } => &self.action_events,
            CompanionEvent::QuizResult { .. } => &self.quiz_events,
            CompanionEvent::Inactivity { .. } => &self.inactivity_events,
        }
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CounterSnapshot {
            events: [
                load(&self.chat_events),
                load(&self.action_events),
                load(&self.quiz_events),
                load(&self.inactivity_events),
            ],
            evolutions: load(&self.evolutions),
            dark_form_entries: load(&self.dark_form_entries),
            dark_form_exits: load(&self.dark_form_exits),
            memories_evicted: load(&self.memories_evicted),
            verifications_rejected: load(&self.verifications_rejected),
            collaborator_failures: load(&self.collaborator_failures),
            mints_requested: load(&self.mints_requested),
            mint_failures: load(&self.mint_failures),
            saves_completed: load(&self.saves_completed),
        }
    }
}

impl Default for EcomonCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Events applied by kind: chat, verified action, quiz, inactivity.
    pub events: [u64; 4],
    /// Successful evolutions.
    pub evolutions: u64,
    /// Dark-form entries.
    pub dark_form_entries: u64,
    /// Dark-form exits.
    pub dark_form_exits: u64,
    /// Evicted memories.
    pub memories_evicted: u64,
    /// Verifications without an event.
    pub verifications_rejected: u64,
    /// Collaborator failures.
    pub collaborator_failures: u64,
    /// Mints dispatched.
    pub mints_requested: u64,
    /// Failed mints.
    pub mint_failures: u64,
    /// Account saves.
    pub saves_completed: u64,
}

impl CounterSnapshot {
    /// Total events across kinds.
    #[must_use]
    pub fn total_events(&self) -> u64 {
        self.events.iter().sum()
    }

    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP ecomon_events_total Companion events applied by kind\n\
             # TYPE ecomon_events_total counter\n\
             ecomon_events_total{{kind=\"chat\"}} {}\n\
             ecomon_events_total{{kind=\"verified_action\"}} {}\n\
             ecomon_events_total{{kind=\"quiz_result\"}} {}\n\
             ecomon_events_total{{kind=\"inactivity\"}} {}\n\
             # HELP ecomon_evolutions_total Successful evolutions\n\
             # TYPE ecomon_evolutions_total counter\n\
             ecomon_evolutions_total {}\n\
             # HELP ecomon_dark_form_transitions_total Dark-form entries and exits\n\
             # TYPE ecomon_dark_form_transitions_total counter\n\
             ecomon_dark_form_transitions_total{{direction=\"entered\"}} {}\n\
             ecomon_dark_form_transitions_total{{direction=\"redeemed\"}} {}\n\
             # HELP ecomon_memories_evicted_total Memories evicted from full logs\n\
             # TYPE ecomon_memories_evicted_total counter\n\
             ecomon_memories_evicted_total {}\n\
             # HELP ecomon_verifications_rejected_total Verifications that produced no event\n\
             # TYPE ecomon_verifications_rejected_total counter\n\
             ecomon_verifications_rejected_total {}\n\
             # HELP ecomon_collaborator_failures_total Generator and verifier failures\n\
             # TYPE ecomon_collaborator_failures_total counter\n\
             ecomon_collaborator_failures_total {}\n\
             # HELP ecomon_mints_requested_total Achievement mints dispatched\n\
             # TYPE ecomon_mints_requested_total counter\n\
             ecomon_mints_requested_total {}\n\
             # HELP ecomon_mint_failures_total Achievement mints that failed\n\
             # TYPE ecomon_mint_failures_total counter\n\
             ecomon_mint_failures_total {}\n\
             # HELP ecomon_saves_completed_total Account saves\n\
             # TYPE ecomon_saves_completed_total counter\n\
             ecomon_saves_completed_total {}\n",
            self.events[0],
            self.events[1],
            self.events[2],
            self.events[3],
            self.evolutions,
            self.dark_form_entries,
            self.dark_form_exits,
            self.memories_evicted,
            self.verifications_rejected,
            self.collaborator_failures,
            self.mints_requested,
            self.mint_failures,
            self.saves_completed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_default_zero() {
        let snap = EcomonCounters::new().snapshot();
        assert_eq!(snap.total_events(), 0);
        assert_eq!(snap.mint_failures, 0);
    }

    #[test]
    fn event_counters_by_kind() {
        let c = EcomonCounters::new();
        EcomonCounters::incr(c.for_event(&CompanionEvent::Chat { message: String::new() }));
        EcomonCounters::incr(c.for_event(&CompanionEvent::Inactivity { days: 3 }));
        EcomonCounters::incr(c.for_event(&CompanionEvent::Inactivity { days: 1 }));
        let snap = c.snapshot();
        assert_eq!(snap.events, [1, 0, 0, 2]);
        assert_eq!(snap.total_events(), 3);
    }

    #[test]
    fn prometheus_format_valid() {
        let c = EcomonCounters::new();
        c.evolutions.fetch_add(2, Ordering::Relaxed);
        let prom = c.snapshot().to_prometheus();
        assert!(prom.contains("ecomon_evolutions_total 2"));
        assert!(prom.contains("ecomon_events_total{kind=\"chat\"} 0"));
        assert!(prom.contains("# TYPE"));
        assert!(prom.contains("# HELP"));
    }
}

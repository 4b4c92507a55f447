//! Guardian (user) progress: eco-points, lifetime XP, level and streak.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reward::{EcoAction, Reward};
use crate::types::UserId;

/// Lifetime activity tallies used for achievement checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityStats {
    /// All verified eco-actions.
    pub verified_actions: u32,
    /// Verified tree plantings.
    pub trees_planted: u32,
    /// Verified beach cleanups.
    pub beach_cleanups: u32,
    /// Verified recycling actions.
    pub items_recycled: u32,
    /// Quizzes answered without a mistake.
    pub perfect_quizzes: u32,
}

impl ActivityStats {
    /// Count one verified action.
    pub fn record_action(&mut self, action: EcoAction) {
        self.verified_actions = self.verified_actions.saturating_add(1);
        let counter = match action {
            EcoAction::PlantTree => &mut self.trees_planted,
            EcoAction::CleanBeach => &mut self.beach_cleanups,
            EcoAction::Recycle => &mut self.items_recycled,
            _ => return,
        };
        *counter = counter.saturating_add(1);
    }

    /// Count one finished quiz.
    pub fn record_quiz(&mut self, perfect: bool) {
        if perfect {
            self.perfect_quizzes = self.perfect_quizzes.saturating_add(1);
        }
    }
}

/// A user account's progress. The companion's evolution XP is separate;
/// every reward is credited to both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    /// Account ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Spendable eco-points.
    pub eco_points: u64,
    /// Lifetime XP.
    pub total_xp: u64,
    /// Consecutive active days.
    pub streak: u32,
    /// Last day with any activity.
    pub last_active_at: Option<DateTime<Utc>>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Last time idle days were charged to the companion.
    #[serde(default)]
    pub neglect_checked_at: Option<DateTime<Utc>>,
    /// Lifetime tallies.
    #[serde(default)]
    pub stats: ActivityStats,
}

impl Guardian {
    /// New guardian with no progress.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self::new_at(id, name, Utc::now())
    }

    /// As [`Guardian::new`], with an explicit creation time.
    #[must_use]
    pub fn new_at(id: UserId, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            eco_points: 0,
            total_xp: 0,
            streak: 0,
            last_active_at: None,
            created_at: at,
            neglect_checked_at: None,
            stats: ActivityStats::default(),
        }
    }

    /// Add a reward to the running totals.
    pub fn credit(&mut self, reward: Reward) {
        self.eco_points = self.eco_points.saturating_add(u64::from(reward.points));
        self.total_xp = self.total_xp.saturating_add(u64::from(reward.xp));
    }

    /// `floor(sqrt(total_xp / 100)) + 1`.
    #[must_use]
    pub fn level(&self) -> u32 {
        let root = (self.total_xp / 100).isqrt();
        u32::try_from(root).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// Update the streak for activity at `at`.
    ///
    /// Same calendar day: unchanged. Next day: +1. Any longer gap (or the
    /// first activity ever): reset to 1. Timestamps older than the last
    /// recorded activity are ignored.
    pub fn record_activity_at(&mut self, at: DateTime<Utc>) {
        let today = at.date_naive();
        match self.last_active_at.map(|t| t.date_naive()) {
            Some(last) if today < last => return,
            Some(last) if today == last => {}
            Some(last) if last.succ_opt() == Some(today) => {
                self.streak = self.streak.saturating_add(1);
            }
            _ => self.streak = 1,
        }
        self.last_active_at = Some(at);
    }

    /// Whole days since the last activity, or `None` if never active.
    #[must_use]
    pub fn idle_days_at(&self, now: DateTime<Utc>) -> Option<u32> {
        self.last_active_at.map(|last| {
            let days = (now.date_naive() - last.date_naive()).num_days().max(0);
            u32::try_from(days).unwrap_or(u32::MAX)
        })
    }

    /// Idle days not yet charged as neglect, counted from the later of the
    /// last activity, the last charge and account creation.
    ///
    /// Returns 0 and charges nothing until at least `min_days` have piled
    /// up, so a daily check charges whole blocks and never the same day twice.
    pub fn take_idle_days_at(&mut self, now: DateTime<Utc>, min_days: u32) -> u32 {
        let since = [self.last_active_at, self.neglect_checked_at]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(self.created_at);
        let days = u32::try_from((now.date_naive() - since.date_naive()).num_days().max(0))
            .unwrap_or(u32::MAX);
        if days == 0 || days < min_days {
            return 0;
        }
        self.neglect_checked_at = Some(now);
        days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, 9, 30, 0).single().expect("valid date")
    }

    #[test]
    fn level_formula() {
        let mut g = Guardian::new_at(UserId::new(), "Ari", day(1));
        assert_eq!(g.level(), 1);
        g.total_xp = 99;
        assert_eq!(g.level(), 1);
        g.total_xp = 100;
        assert_eq!(g.level(), 2);
        g.total_xp = 399;
        assert_eq!(g.level(), 2);
        g.total_xp = 400;
        assert_eq!(g.level(), 3);
    }

    #[test]
    fn credit_accumulates() {
        let mut g = Guardian::new_at(UserId::new(), "Ari", day(1));
        g.credit(Reward { points: 40, xp: 20 });
        g.credit(Reward { points: 10, xp: 5 });
        assert_eq!((g.eco_points, g.total_xp), (50, 25));
    }

    #[test]
    fn streak_bookkeeping() {
        let mut g = Guardian::new_at(UserId::new(), "Ari", day(1));
        g.record_activity_at(day(1));
        assert_eq!(g.streak, 1);
        g.record_activity_at(day(1) + Duration::hours(5));
        assert_eq!(g.streak, 1);
        g.record_activity_at(day(2));
        g.record_activity_at(day(3));
        assert_eq!(g.streak, 3);
        g.record_activity_at(day(6));
        assert_eq!(g.streak, 1);
        assert_eq!(g.idle_days_at(day(10)), Some(4));
    }

    #[test]
    fn idle_days_charged_once() {
        let mut g = Guardian::new_at(UserId::new(), "Ari", day(1));
        assert_eq!(g.take_idle_days_at(day(1), 1), 0);
        assert_eq!(g.take_idle_days_at(day(4), 1), 3);
        assert_eq!(g.take_idle_days_at(day(4) + Duration::hours(3), 1), 0);
        assert_eq!(g.take_idle_days_at(day(5), 1), 1);

        g.record_activity_at(day(8));
        assert_eq!(g.take_idle_days_at(day(8), 1), 0);
        assert_eq!(g.take_idle_days_at(day(12), 1), 4);
    }

    #[test]
    fn idle_days_charged_in_blocks() {
        let mut g = Guardian::new_at(UserId::new(), "Ari", day(1));
        let charged: u32 = (2..=13).map(|d| g.take_idle_days_at(day(d), 3)).sum();
        // Blocks on days 4, 7, 10 and 13.
        assert_eq!(charged, 12);
        assert_eq!(g.neglect_checked_at, Some(day(13)));
    }

    #[test]
    fn activity_stats_tally() {
        let mut stats = ActivityStats::default();
        for a in [EcoAction::PlantTree, EcoAction::PlantTree, EcoAction::Recycle, EcoAction::Compost] {
            stats.record_action(a);
        }
        stats.record_quiz(true);
        stats.record_quiz(false);
        assert_eq!(stats.verified_actions, 4);
        assert_eq!(stats.trees_planted, 2);
        assert_eq!(stats.items_recycled, 1);
        assert_eq!(stats.beach_cleanups, 0);
        assert_eq!(stats.perfect_quizzes, 1);
    }

    #[test]
    fn stale_activity_ignored() {
        let mut g = Guardian::new_at(UserId::new(), "Ari", day(1));
        g.record_activity_at(day(5));
        g.record_activity_at(day(3));
        assert_eq!(g.last_active_at, Some(day(5)));
        assert_eq!(g.streak, 1);
    }
}

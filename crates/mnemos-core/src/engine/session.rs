//! Per-user session state: load detector, streak, topic history, RNG.

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::cognitive::{CognitiveLoadConfig, CognitiveLoadDetector, LoadLevel, ResponseEvent};
use crate::fsrs::FsrsScheduler;

/// Topics remembered for interleaving decisions
const HISTORY_LEN: usize = 50;

/// Answers used for "recent accuracy"
pub const RECENT_WINDOW: usize = 10;

/// A session idle longer than this starts over
pub const SESSION_IDLE_MINUTES: i64 = 30;

/// Mix a user id into the configured seed so users get distinct streams
pub(crate) fn session_seed(seed: u64, user_id: &str) -> u64 {
    user_id
        .bytes()
        .fold(seed ^ 0xcbf2_9ce4_8422_2325, |h, b| {
            (h ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

/// Mutable state for one learner's study session
#[derive(Debug)]
pub struct UserSession {
    user_id: String,
    detector: CognitiveLoadDetector,
    last_activity: DateTime<Utc>,
    streak: i32,
    history: VecDeque<String>,
    answered: u32,
    xp: u32,
    rng: ChaCha8Rng,
    fsrs: Option<FsrsScheduler>,
}

impl UserSession {
    pub(crate) fn new(
        user_id: &str,
        now: DateTime<Utc>,
        load_config: CognitiveLoadConfig,
        rng_seed: Option<u64>,
        fsrs: Option<FsrsScheduler>,
    ) -> Self {
        let rng = match rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(session_seed(seed, user_id)),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            user_id: user_id.to_string(),
            detector: CognitiveLoadDetector::with_config(now, load_config),
            last_activity: now,
            streak: 0,
            history: VecDeque::with_capacity(HISTORY_LEN),
            answered: 0,
            xp: 0,
            rng,
            fsrs,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn detector(&self) -> &CognitiveLoadDetector {
        &self.detector
    }

    /// Positive for a run of successes, negative for a run of failures
    pub fn streak(&self) -> i32 {
        self.streak
    }

    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    /// Personalized scheduler, when the review history supports one
    pub fn fsrs(&self) -> Option<&FsrsScheduler> {
        self.fsrs.as_ref()
    }

    pub(crate) fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Scheduler and RNG borrowed together for one scheduling call
    pub(crate) fn scheduling_parts(&mut self) -> (Option<&FsrsScheduler>, &mut ChaCha8Rng) {
        (self.fsrs.as_ref(), &mut self.rng)
    }

    /// Topics answered this session, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    /// How many of the latest answers in a row were on `topic`
    pub fn consecutive_on(&self, topic: &str) -> usize {
        self.history.iter().rev().take_while(|t| t.as_str() == topic).count()
    }

    /// Accuracy over the last few answers, 1.0 before any answer
    pub fn recent_accuracy(&self) -> f64 {
        self.detector.recent_success_rate(RECENT_WINDOW).unwrap_or(1.0)
    }

    pub fn load_level(&self, now: DateTime<Utc>) -> LoadLevel {
        self.detector.assess(now).level
    }

    /// Start over if the learner has been away too long
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now - self.last_activity > Duration::minutes(SESSION_IDLE_MINUTES) {
            tracing::debug!(user_id = %self.user_id, "Session idle, starting a new one");
            self.detector.reset(now);
            self.streak = 0;
            self.history.clear();
        }
        self.last_activity = now;
    }

    /// Streak the next answer would leave behind
    pub fn streak_after(&self, is_correct: bool) -> i32 {
        if is_correct {
            self.streak.max(0) + 1
        } else {
            self.streak.min(0) - 1
        }
    }

    /// Feed the detector and history; returns the updated streak
    pub(crate) fn record_answer(&mut self, topic: &str, event: &ResponseEvent) -> i32 {
        self.detector.add_response(event);
        self.streak = self.streak_after(event.is_correct);
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(topic.to_string());
        self.answered = self.answered.saturating_add(1);
        self.streak
    }

    pub(crate) fn credit_xp(&mut self, xp: u32) {
        self.xp = self.xp.saturating_add(xp);
    }

    /// Snapshot for summaries
    pub fn summary(&self, now: DateTime<Utc>) -> SessionSummary {
        let assessment = self.detector.assess(now);
        SessionSummary {
            started_at: self.detector.session_start(),
            answered: self.answered,
            xp: self.xp,
            streak: self.streak,
            recent_accuracy: self.recent_accuracy(),
            load: assessment.level,
            session_minutes: assessment.session_minutes,
            personalized: self.fsrs.is_some(),
        }
    }
}

/// Read-only view of a live session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub answered: u32,
    pub xp: u32,
    pub streak: i32,
    pub recent_accuracy: f64,
    pub load: LoadLevel,
    pub session_minutes: f64,
    pub personalized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyBand;
    use chrono::TimeZone;
    use rand::Rng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap()
    }

    fn event(is_correct: bool) -> ResponseEvent {
        ResponseEvent {
            timestamp: now(),
            response_time_secs: 20.0,
            is_correct,
            difficulty: DifficultyBand::Medium,
            confidence: None,
        }
    }

    #[test]
    fn test_streak_flips_sign() {
        let mut session = UserSession::new("u", now(), CognitiveLoadConfig::default(), Some(1), None);
        assert_eq!(session.streak_after(false), -1);
        session.record_answer("a", &event(true));
        assert_eq!(session.streak_after(true), 2);
        assert_eq!(session.streak(), 1);
        assert_eq!(session.record_answer("a", &event(true)), 2);
        assert_eq!(session.record_answer("b", &event(false)), -1);
        assert_eq!(session.record_answer("b", &event(false)), -2);
        assert_eq!(session.record_answer("b", &event(true)), 1);

        assert_eq!(session.consecutive_on("b"), 3);
        assert_eq!(session.consecutive_on("a"), 0);
        session.credit_xp(20);
        session.credit_xp(24);
        assert_eq!(session.xp(), 44);
        assert_eq!(session.answered(), 5);
    }

    #[test]
    fn test_seeded_sessions_are_reproducible_per_user() {
        let draw = |user: &str| {
            let mut s = UserSession::new(user, now(), CognitiveLoadConfig::default(), Some(99), None);
            s.rng().r#gen::<u64>()
        };
        assert_eq!(draw("ada"), draw("ada"));
        assert_ne!(draw("ada"), draw("bob"));
    }

    #[test]
    fn test_idle_session_resets() {
        let mut session = UserSession::new("u", now(), CognitiveLoadConfig::default(), Some(1), None);
        session.record_answer("a", &event(true));
        session.touch(now() + Duration::minutes(SESSION_IDLE_MINUTES + 5));
        assert_eq!(session.streak(), 0);
        assert!(session.history().is_empty());
        assert_eq!(session.detector().total_responses(), 0);
    }
}

//! Adaptive Engine
//!
//! The facade the surrounding product calls. Composes the schedulers, the
//! load detector, transfer credit, interleaving and the skill graph over a
//! [`LearnerStore`].
//!
//! Same-user calls are serialized by a per-user `Mutex`; the outer map lock is
//! held only long enough to find or create that mutex, so different users
//! proceed in parallel. A slot is dropped again once its session ends.
//! Background decay sweeps take the per-user lock of users with a live slot
//! and write through a compare-and-swap on `last_practiced`.

mod session;
mod types;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::cognitive::{LoadLevel, ResponseEvent};
use crate::config::EngineConfig;
use crate::decay::{ConceptItem, DecayBatch, DecayEngine};
use crate::difficulty::{DifficultyBand, DifficultyLevel};
use crate::fsrs::{FsrsOptimizer, FsrsScheduler, MemoryCard, ReviewLog};
use crate::interleaving::{InterleavingPlan, InterleavingSelector, TopicSnapshot};
use crate::legacy::{mastery_change, select_difficulty, ZpdContext};
use crate::record::MasteryRecord;
use crate::skills::{
    update_user_skill, GapAnalysis, SkillGraph, SkillNode, SkillPlanner, SkillRecommendation,
    UserSkillState,
};
use crate::storage::{AnswerCommit, LearnerStore, StorageError};
use crate::strategy::{ReviewItem, ReviewOutcome, ScheduledReview, SchedulerStrategy, Schedulers};
use crate::transfer::{TransferBonus, TransferCalculator, TransferMatrix};

pub use session::{SessionSummary, UserSession, RECENT_WINDOW, SESSION_IDLE_MINUTES};
pub use types::{AnswerInput, AnswerResult, QuestionParams, SweepReport, TopicSummary, UserSummary};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// A session or engine lock was poisoned by a panicking thread
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

/// Streak that earns the XP bonus
const XP_STREAK_THRESHOLD: i32 = 3;
const XP_STREAK_MULTIPLIER: f64 = 1.2;

/// Below this recall probability the next question gets easier
const LOW_RETRIEVABILITY: f64 = 0.4;

/// Chance a high-level question on a mastered topic is swapped for a medium one
const CONSOLIDATION_PROBABILITY: f64 = 0.2;

#[derive(Debug, Default)]
struct UserSlot {
    session: Option<UserSession>,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Adaptive memory and scheduling engine
pub struct AdaptiveEngine {
    config: EngineConfig,
    store: Arc<dyn LearnerStore>,
    schedulers: Schedulers,
    transfer: TransferCalculator,
    planner: SkillPlanner,
    interleaving: InterleavingSelector,
    decay: DecayEngine,
    optimizer: FsrsOptimizer,
    /// Jitter source for calls that are not tied to a user
    rng: Mutex<ChaCha8Rng>,
    users: Mutex<HashMap<String, Arc<Mutex<UserSlot>>>>,
}

impl std::fmt::Debug for AdaptiveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveEngine")
            .field("scheduler", &self.config.scheduler)
            .field("skills", &self.planner.graph().len())
            .finish_non_exhaustive()
    }
}

impl AdaptiveEngine {
    /// Engine over `store` with the built-in transfer matrix and skill map
    pub fn new(config: EngineConfig, store: Arc<dyn LearnerStore>) -> Self {
        let config = config.validate();
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            schedulers: Schedulers::new(
                config.fsrs.clone(),
                config.legacy.clone(),
                config.expected_response_secs,
            ),
            transfer: TransferCalculator::new(config.transfer.clone()),
            planner: SkillPlanner::new(Arc::new(SkillGraph::programming_seed()), config.skills.clone()),
            interleaving: InterleavingSelector::new(config.interleaving.clone()),
            decay: DecayEngine::new(config.decay.clone()),
            optimizer: FsrsOptimizer::new(),
            rng: Mutex::new(rng),
            users: Mutex::new(HashMap::new()),
            store,
            config,
        }
    }

    /// Replace the skill graph
    pub fn with_skill_graph(mut self, graph: Arc<SkillGraph>) -> Self {
        self.planner = SkillPlanner::new(graph, self.config.skills.clone());
        self
    }

    /// Replace the transfer matrix
    pub fn with_transfer_matrix(mut self, matrix: Arc<TransferMatrix>) -> Self {
        self.transfer = TransferCalculator::with_matrix(matrix, self.config.transfer.clone());
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn LearnerStore> {
        &self.store
    }

    pub fn transfer(&self) -> &TransferCalculator {
        &self.transfer
    }

    pub fn planner(&self) -> &SkillPlanner {
        &self.planner
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    fn slot(&self, user_id: &str) -> Result<Arc<Mutex<UserSlot>>> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| EngineError::LockPoisoned("users"))?;
        Ok(Arc::clone(users.entry(user_id.to_string()).or_default()))
    }

    fn existing_slot(&self, user_id: &str) -> Result<Option<Arc<Mutex<UserSlot>>>> {
        let users = self
            .users
            .lock()
            .map_err(|_| EngineError::LockPoisoned("users"))?;
        Ok(users.get(user_id).cloned())
    }

    /// Forget a slot with no session that nobody else holds
    fn release_slot(&self, user_id: &str, slot: Arc<Mutex<UserSlot>>) -> Result<()> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| EngineError::LockPoisoned("users"))?;
        // Callers can only reach a slot through the map, so with the map
        // locked the count cannot grow: one for the map, one for `slot`
        if Arc::strong_count(&slot) > 2 {
            return Ok(());
        }
        let idle = slot
            .lock()
            .map_err(|_| EngineError::LockPoisoned("session"))?
            .session
            .is_none();
        if idle && users.get(user_id).is_some_and(|held| Arc::ptr_eq(held, &slot)) {
            users.remove(user_id);
        }
        Ok(())
    }

    /// Users with live per-user state
    pub fn active_users(&self) -> Result<usize> {
        Ok(self
            .users
            .lock()
            .map_err(|_| EngineError::LockPoisoned("users"))?
            .len())
    }

    fn open_session(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserSession> {
        let logs = self.store.list_review_logs(user_id)?;
        let optimized = self.optimizer.optimize(&logs, &self.config.fsrs);
        let fsrs = optimized
            .adjusted
            .then(|| FsrsScheduler::new(optimized.params));
        tracing::debug!(
            user_id = %user_id,
            reviews = logs.len(),
            personalized = fsrs.is_some(),
            "Session opened"
        );
        Ok(UserSession::new(
            user_id,
            now,
            self.config.cognitive.clone(),
            self.config.rng_seed,
            fsrs,
        ))
    }

    fn ensure_session<'a>(
        &self,
        slot: &'a mut UserSlot,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<&'a mut UserSession> {
        let session = match slot.session.take() {
            Some(session) => session,
            None => self.open_session(user_id, now)?,
        };
        let session = slot.session.insert(session);
        session.touch(now);
        Ok(session)
    }

    /// Drop the user's session state. Returns its final summary, if any.
    pub fn end_session(&self, user_id: &str, now: DateTime<Utc>) -> Result<Option<SessionSummary>> {
        let Some(slot) = self.existing_slot(user_id)? else {
            return Ok(None);
        };
        let summary = {
            let mut guard = slot
                .lock()
                .map_err(|_| EngineError::LockPoisoned("session"))?;
            guard.session.take().map(|s| s.summary(now))
        };
        self.release_slot(user_id, slot)?;
        if let Some(summary) = &summary {
            tracing::info!(
                user_id = %user_id,
                answered = summary.answered,
                xp = summary.xp,
                "Session ended"
            );
        }
        Ok(summary)
    }

    // ------------------------------------------------------------------------
    // Stateless operations
    // ------------------------------------------------------------------------

    /// Advance a single item with the engine's scheduler configuration
    pub fn compute_next_review(
        &self,
        item: &ReviewItem,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReview> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| EngineError::LockPoisoned("rng"))?;
        Ok(self
            .schedulers
            .compute_next_review(item, outcome, now, None, &mut *rng))
    }

    /// Decay a batch of concepts as of `now`
    pub fn apply_decay_batch(&self, items: &[ConceptItem], now: DateTime<Utc>) -> DecayBatch {
        self.decay.apply_decay_batch(items, now)
    }

    /// Transfer credit for `target` from the given topic masteries
    pub fn calculate_transfer_bonus(
        &self,
        masteries: &BTreeMap<String, f64>,
        target: &str,
    ) -> Option<TransferBonus> {
        self.transfer.calculate_bonus(masteries, target)
    }

    // ------------------------------------------------------------------------
    // Answers
    // ------------------------------------------------------------------------

    /// Record one answer: schedule, credit mastery and XP, persist.
    pub fn process_answer(
        &self,
        user_id: &str,
        answer: &AnswerInput,
        now: DateTime<Utc>,
    ) -> Result<AnswerResult> {
        let topic = answer.topic_id.as_str();
        let level = DifficultyLevel::from_level(answer.difficulty);
        if level.level() as i64 != answer.difficulty {
            tracing::debug!(
                requested = answer.difficulty,
                level = level.level(),
                "Clamping difficulty level"
            );
        }
        let response_time = if answer.response_time_secs.is_finite() {
            answer.response_time_secs.max(0.0)
        } else {
            0.0
        };
        if response_time != answer.response_time_secs {
            tracing::debug!(
                requested = answer.response_time_secs,
                "Clamping response time to a non-negative value"
            );
        }
        let band = level.band();
        let is_correct = answer.is_correct;

        let slot = self.slot(user_id)?;
        let mut guard = slot
            .lock()
            .map_err(|_| EngineError::LockPoisoned("session"))?;
        let session = self.ensure_session(&mut guard, user_id, now)?;

        let mut record = self
            .store
            .load_mastery_record(user_id, topic)?
            .unwrap_or_else(|| MasteryRecord::new(user_id, topic));

        // An item stays on the model that produced it
        let item = match self.store.load_card(user_id, topic)? {
            Some(card) => ReviewItem::Fsrs(card),
            None if record.total_attempts > 0 => ReviewItem::Legacy(record.legacy.clone()),
            None => match self.config.scheduler {
                SchedulerStrategy::Fsrs => ReviewItem::Fsrs(MemoryCard::new()),
                SchedulerStrategy::Legacy => ReviewItem::Legacy(record.legacy.clone()),
            },
        };
        // Logged in whole days, the unit the optimizer reads
        let elapsed_days = match &item {
            ReviewItem::Fsrs(card) => card.elapsed_whole_days(now),
            ReviewItem::Legacy(_) => record
                .last_practiced
                .map(|last| (now - last).num_days().max(0) as f64)
                .unwrap_or(0.0),
        };

        let outcome = ReviewOutcome::Answer {
            is_correct,
            response_time_secs: response_time,
            confidence: answer.confidence,
        };
        let scheduled = {
            let (fsrs, rng) = session.scheduling_parts();
            self.schedulers
                .compute_next_review(&item, &outcome, now, fsrs, rng)
        };
        let card = match &scheduled.item {
            ReviewItem::Fsrs(card) => Some(card.clone()),
            ReviewItem::Legacy(card) => {
                record.legacy = card.clone();
                None
            }
        };

        // The session only moves once the answer is stored
        let streak = session.streak_after(is_correct);

        let before = record.mastery;
        let delta = mastery_change(
            band,
            is_correct,
            response_time,
            self.config.expected_response_secs,
            before,
        );
        let mut after = before + delta as f64;

        let transfer_bonus = if record.transfer_credited {
            None
        } else {
            record.transfer_credited = true;
            let masteries: BTreeMap<String, f64> = self
                .store
                .list_mastery_records(user_id)?
                .into_iter()
                .filter(|r| r.topic_id != topic)
                .map(|r| (r.topic_id, r.mastery))
                .collect();
            let bonus = self.transfer.calculate_bonus(&masteries, topic);
            if let Some(bonus) = &bonus {
                after += bonus.bonus_mastery as f64;
            }
            bonus
        };
        let after = after.clamp(0.0, 100.0);

        let xp_earned = if is_correct {
            let base = level.xp();
            if streak >= XP_STREAK_THRESHOLD {
                (base as f64 * XP_STREAK_MULTIPLIER) as u32
            } else {
                base
            }
        } else {
            0
        };

        record.mastery = after;
        record.review_mastery = after;
        record.total_attempts = record.total_attempts.saturating_add(1);
        if is_correct {
            record.correct_attempts = record.correct_attempts.saturating_add(1);
        }
        record.bands.record(band, is_correct);
        record.last_practiced = Some(now);
        record.next_review = Some(scheduled.next_review);

        let skill = match self.planner.graph().skill(topic) {
            Some(_) => {
                let state = self
                    .store
                    .load_user_skill_state(user_id, topic)?
                    .unwrap_or_else(|| UserSkillState::new(user_id, topic));
                Some(update_user_skill(&state, after - before, true, now, &self.config.skills))
            }
            None => None,
        };

        self.store.commit_answer(&AnswerCommit {
            user_id: user_id.to_string(),
            topic_id: topic.to_string(),
            card,
            record,
            log: ReviewLog {
                topic_id: topic.to_string(),
                rating: scheduled
                    .rating
                    .unwrap_or_else(|| outcome.to_rating(self.config.expected_response_secs)),
                reviewed_at: now,
                elapsed_days,
                interval_days: scheduled.interval_days,
            },
            skill,
        })?;

        if let Some(bonus) = &transfer_bonus {
            tracing::info!(
                user_id = %user_id,
                topic = %topic,
                bonus = bonus.bonus_mastery,
                "Transfer credit applied"
            );
        }
        session.record_answer(
            topic,
            &ResponseEvent {
                timestamp: now,
                response_time_secs: response_time,
                is_correct,
                difficulty: band,
                confidence: answer.confidence,
            },
        );
        session.credit_xp(xp_earned);

        let assessment = session.detector().assess(now);
        let break_suggestion = session.detector().suggest_break(now);
        let accuracy_recent = session.recent_accuracy();

        tracing::debug!(
            user_id = %user_id,
            topic = %topic,
            is_correct,
            level = level.level(),
            mastery = after,
            interval_days = scheduled.interval_days,
            load = %assessment.level,
            "Answer processed"
        );

        Ok(AnswerResult {
            topic_id: topic.to_string(),
            scheduler: scheduled.item.strategy(),
            mastery_before: before,
            mastery_after: after,
            mastery_change: (after - before).round() as i32,
            transfer_bonus,
            xp_earned,
            streak,
            next_review: scheduled.next_review,
            next_review_days: scheduled.interval_days,
            rating: scheduled.rating,
            accuracy_recent,
            cognitive_load: assessment.level,
            should_pause: assessment.should_pause,
            should_reduce_difficulty: assessment.should_reduce_difficulty,
            break_suggestion,
            feedback: feedback(assessment.should_pause, is_correct, streak).to_string(),
        })
    }

    // ------------------------------------------------------------------------
    // Question planning
    // ------------------------------------------------------------------------

    /// Difficulty and pacing for the next question on `topic`.
    ///
    /// `current_mastery` overrides the stored mastery when the caller tracks
    /// its own.
    pub fn get_next_question_params(
        &self,
        user_id: &str,
        topic: &str,
        current_mastery: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<QuestionParams> {
        let slot = self.slot(user_id)?;
        let mut guard = slot
            .lock()
            .map_err(|_| EngineError::LockPoisoned("session"))?;
        let session = self.ensure_session(&mut guard, user_id, now)?;

        let record = self
            .store
            .load_mastery_record(user_id, topic)?
            .unwrap_or_else(|| MasteryRecord::new(user_id, topic));
        let mastery = current_mastery
            .filter(|m| m.is_finite())
            .map(|m| m.clamp(0.0, 100.0))
            .unwrap_or(record.mastery);

        let band = select_difficulty(
            &ZpdContext {
                mastery,
                success_rate: if record.total_attempts > 0 {
                    record.success_rate()
                } else {
                    0.5
                },
                bands: record.bands,
                skip_days: record.skip_days(now),
            },
            self.config.legacy.skip_decay_rate,
        );

        let mut level: i64 = match band {
            DifficultyBand::Easy if mastery < 15.0 => 1,
            DifficultyBand::Easy => 2,
            DifficultyBand::Medium => 3,
            DifficultyBand::Hard => 4,
        };

        let card = self
            .store
            .load_card(user_id, topic)?
            .filter(|card| !card.is_new());
        let retrievability = card.as_ref().map(|c| c.retrievability_at(now));
        if retrievability.is_some_and(|r| r < LOW_RETRIEVABILITY) {
            level -= 1;
        }

        let assessment = session.detector().assess(now);
        match assessment.level {
            LoadLevel::Overload => level = 1,
            LoadLevel::High => level -= 1,
            _ => {}
        }

        let streak = session.streak();
        if streak <= -4 {
            level = 1;
        } else if streak <= -2 {
            level -= 1;
        } else if streak >= 6 && session.recent_accuracy() > 0.85 {
            level += 1;
        }
        let mut level = level.clamp(1, 5);

        let mut consolidation = false;
        if mastery >= 80.0 && level >= 4 && session.rng().gen_bool(CONSOLIDATION_PROBABILITY) {
            level = 3;
            consolidation = true;
        }

        let (interleave_suggested, suggested_topic) =
            if session.consecutive_on(topic) >= self.config.interleaving.switch_frequency {
                self.interleave_target(user_id, topic, &session.history(), now)?
            } else {
                (false, None)
            };

        let difficulty = DifficultyLevel::from_level(level);
        tracing::debug!(
            user_id = %user_id,
            topic = %topic,
            band = %band,
            level = difficulty.level(),
            load = %assessment.level,
            streak,
            interleave_suggested,
            "Question params"
        );

        Ok(QuestionParams {
            topic_id: topic.to_string(),
            difficulty,
            level: difficulty.level(),
            band,
            mastery,
            retrievability,
            stability_days: card.map(|c| c.stability),
            cognitive_load: assessment.level,
            should_take_break: assessment.should_pause,
            interleave_suggested,
            suggested_topic,
            consolidation,
        })
    }

    fn topic_snapshots(&self, user_id: &str) -> Result<Vec<TopicSnapshot>> {
        Ok(self
            .store
            .list_mastery_records(user_id)?
            .iter()
            .map(MasteryRecord::to_snapshot)
            .collect())
    }

    fn interleave_target(
        &self,
        user_id: &str,
        topic: &str,
        history: &[String],
        now: DateTime<Utc>,
    ) -> Result<(bool, Option<String>)> {
        let snapshots = self.topic_snapshots(user_id)?;
        if !self.interleaving.should_use_interleaving(&snapshots) {
            return Ok((false, None));
        }
        let plan = self.interleaving.select_topics(&snapshots, now);
        let next = self
            .interleaving
            .next_topic(history, &plan.topics)
            .filter(|t| t != topic)
            .or_else(|| {
                plan.topics
                    .iter()
                    .find(|t| t.topic_id != topic)
                    .map(|t| t.topic_id.clone())
            });
        Ok((next.is_some(), next))
    }

    /// Topics to mix in the user's next session
    pub fn plan_interleaving(&self, user_id: &str, now: DateTime<Utc>) -> Result<InterleavingPlan> {
        let snapshots = self.topic_snapshots(user_id)?;
        if !self.interleaving.should_use_interleaving(&snapshots) {
            let mut plan = self.interleaving.select_topics(&snapshots, now);
            plan.topics.truncate(1);
            plan.single_topic_focus = true;
            return Ok(plan);
        }
        Ok(self.interleaving.select_topics(&snapshots, now))
    }

    // ------------------------------------------------------------------------
    // Skills
    // ------------------------------------------------------------------------

    fn skill_states(&self, user_id: &str) -> Result<BTreeMap<String, UserSkillState>> {
        Ok(self
            .store
            .list_user_skill_states(user_id)?
            .into_iter()
            .map(|s| (s.skill_id.clone(), s))
            .collect())
    }

    /// Gaps blocking `target_skill`, or `None` for an unknown skill
    pub fn analyze_skill_gaps(
        &self,
        user_id: &str,
        target_skill: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<GapAnalysis>> {
        let states = self.skill_states(user_id)?;
        Ok(self.planner.analyze_gaps(target_skill, &states, now))
    }

    /// Skills to learn for `target_skill`, prerequisites first
    pub fn skill_learning_path(
        &self,
        user_id: &str,
        target_skill: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SkillNode>> {
        let states = self.skill_states(user_id)?;
        Ok(self.planner.learning_path(target_skill, &states, now))
    }

    pub fn recommended_skills(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SkillRecommendation>> {
        let states = self.skill_states(user_id)?;
        Ok(self.planner.recommended_next_skills(&states, now, limit))
    }

    /// Apply a mastery change to one skill outside of answer processing
    pub fn record_skill_practice(
        &self,
        user_id: &str,
        skill_id: &str,
        delta: f64,
        now: DateTime<Utc>,
    ) -> Result<UserSkillState> {
        let slot = self.slot(user_id)?;
        let updated = {
            let _guard = slot
                .lock()
                .map_err(|_| EngineError::LockPoisoned("session"))?;
            let state = self
                .store
                .load_user_skill_state(user_id, skill_id)?
                .unwrap_or_else(|| UserSkillState::new(user_id, skill_id));
            let updated = update_user_skill(&state, delta, true, now, &self.config.skills);
            self.store.save_user_skill_state(&updated)?;
            updated
        };
        self.release_slot(user_id, slot)?;
        Ok(updated)
    }

    // ------------------------------------------------------------------------
    // Decay sweep
    // ------------------------------------------------------------------------

    /// Decay every stale concept in the store.
    ///
    /// Decay starts from `review_mastery`, so repeated sweeps at the same
    /// `now` write nothing new.
    pub fn run_decay_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let started = Instant::now();
        if !self.config.decay.enabled {
            tracing::info!("Decay disabled, sweep skipped");
            return Ok(SweepReport::default());
        }

        let snapshot = self.store.list_concepts_due_for_decay(now)?;
        let mut report = SweepReport {
            scanned: snapshot.len(),
            ..Default::default()
        };

        let mut by_user: BTreeMap<String, Vec<ConceptItem>> = BTreeMap::new();
        for item in snapshot {
            by_user.entry(item.user_id.clone()).or_default().push(item);
        }
        report.users = by_user.len();

        for (user_id, items) in by_user {
            // Only users with live state need their lock; for everyone else
            // the compare-and-swap on last_practiced is the guard
            let slot = self.existing_slot(&user_id)?;
            let _guard = match &slot {
                Some(slot) => Some(
                    slot.lock()
                        .map_err(|_| EngineError::LockPoisoned("session"))?,
                ),
                None => None,
            };

            for item in items {
                let decayed = self.decay.decayed_mastery(&item, now);
                if decayed >= item.mastery {
                    report.unchanged += 1;
                    continue;
                }
                let update = ConceptItem {
                    mastery: decayed,
                    ..item.clone()
                };
                if self.store.apply_decayed_concept(&update)? {
                    let lost = item.mastery - decayed;
                    report.decayed += 1;
                    report.total_decay += lost;
                    report.max_decay = report.max_decay.max(lost);
                } else {
                    tracing::debug!(
                        user_id = %user_id,
                        concept = %item.concept_id,
                        "Concept touched since snapshot, skipping"
                    );
                    report.skipped += 1;
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            scanned = report.scanned,
            users = report.users,
            decayed = report.decayed,
            skipped = report.skipped,
            duration_ms = report.duration_ms,
            "Decay sweep complete"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Summaries
    // ------------------------------------------------------------------------

    /// Profile-wide view of one learner
    pub fn user_summary(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserSummary> {
        let records = self.store.list_mastery_records(user_id)?;

        let mut topics = Vec::with_capacity(records.len());
        for record in &records {
            let retrievability = self
                .store
                .load_card(user_id, &record.topic_id)?
                .filter(|c| !c.is_new())
                .map(|c| c.retrievability_at(now));
            topics.push(TopicSummary {
                topic_id: record.topic_id.clone(),
                mastery: record.mastery,
                success_rate: record.success_rate(),
                total_attempts: record.total_attempts,
                next_review: record.next_review,
                due: record.next_review.is_some_and(|due| due <= now),
                retrievability,
            });
        }

        let total_attempts: u32 = records.iter().map(|r| r.total_attempts).sum();
        let correct: u32 = records.iter().map(|r| r.correct_attempts).sum();
        let overall_success_rate = if total_attempts == 0 {
            0.0
        } else {
            correct as f64 / total_attempts as f64
        };
        let average_mastery = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.mastery).sum::<f64>() / records.len() as f64
        };

        let concepts: Vec<ConceptItem> = records.iter().map(MasteryRecord::to_concept).collect();
        let review_candidates =
            self.decay
                .concepts_needing_review(&concepts, now, self.config.decay.review_limit);

        let skills = self.planner.summary(&self.skill_states(user_id)?, now);

        let session = match self.existing_slot(user_id)? {
            Some(slot) => slot
                .lock()
                .map_err(|_| EngineError::LockPoisoned("session"))?
                .session
                .as_ref()
                .map(|s| s.summary(now)),
            None => None,
        };

        Ok(UserSummary {
            user_id: user_id.to_string(),
            due_topics: topics.iter().filter(|t| t.due).count(),
            topics,
            total_attempts,
            overall_success_rate,
            average_mastery,
            review_candidates,
            skills,
            session,
        })
    }
}

fn feedback(should_pause: bool, is_correct: bool, streak: i32) -> &'static str {
    if should_pause {
        "Take a break: cognitive load is high"
    } else if !is_correct && streak <= -3 {
        "Try an easier level"
    } else if is_correct && streak >= 5 {
        "Excellent! Ready for more of a challenge?"
    } else if is_correct {
        "Well done!"
    } else {
        "No worries, the next one will go better"
    }
}

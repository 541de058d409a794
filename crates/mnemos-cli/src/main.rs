//! Mnemos CLI
//!
//! Command-line front end for the adaptive memory engine: record answers,
//! plan questions, run decay sweeps and inspect learners.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use directories::ProjectDirs;
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use mnemos_core::decay::ConceptItem;
use mnemos_core::{
    AdaptiveEngine, AnswerInput, EngineConfig, LearnerStore, MemoryStore, Rating, ReviewItem,
    ReviewOutcome, SchedulerStrategy, SqliteStore,
};

/// Mnemos - adaptive memory and scheduling engine
#[derive(Parser)]
#[command(name = "mnemos")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Mnemos adaptive memory engine")]
#[command(long_about = "Mnemos schedules reviews with an FSRS-style memory model, \
adapts question difficulty to the learner and decays stale mastery.")]
struct Cli {
    /// Data directory holding mnemos.db
    #[arg(long, global = true, env = "MNEMOS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON engine config, defaulting to config.json in the platform config
    /// directory; MNEMOS_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate at this RFC 3339 instant instead of the current time
    #[arg(long, global = true)]
    now: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one answer and reschedule the topic
    Answer {
        user: String,
        topic: String,
        /// The answer was wrong
        #[arg(long)]
        wrong: bool,
        /// Response time in seconds
        #[arg(long, default_value = "30")]
        time: f64,
        /// Difficulty level 1-5
        #[arg(long, default_value = "3")]
        level: i64,
        /// Self-reported confidence 0-1
        #[arg(long)]
        confidence: Option<f64>,
    },

    /// Difficulty and pacing for the next question
    Next {
        user: String,
        topic: String,
        /// Mastery to plan from instead of the stored value
        #[arg(long)]
        mastery: Option<f64>,
    },

    /// Compute the next review for a card
    Review {
        /// JSON file holding a review item; a fresh card when omitted
        #[arg(long)]
        card: Option<PathBuf>,
        /// Rating: again, hard, good or easy
        #[arg(long, conflicts_with = "wrong")]
        rating: Option<String>,
        /// Grade as a wrong answer
        #[arg(long)]
        wrong: bool,
        /// Response time in seconds, when grading an answer
        #[arg(long, default_value = "30")]
        time: f64,
        /// Start a fresh card on the legacy model
        #[arg(long)]
        legacy: bool,
    },

    /// Apply decay to a JSON file of concepts
    Decay {
        /// JSON array of concept items
        file: PathBuf,
        /// Write the decayed items back to the file
        #[arg(long)]
        write: bool,
    },

    /// Decay stale mastery across the store
    Sweep {
        /// Keep running, sweeping every sweepIntervalHours
        #[arg(long)]
        watch: bool,
    },

    /// Transfer bonus for a target topic
    Transfer {
        target: String,
        /// Known masteries as topic=mastery
        #[arg(required = true)]
        masteries: Vec<String>,
    },

    /// Skill gaps and learning path for a target skill
    Gaps { user: String, skill: String },

    /// Per-user summary
    Stats { user: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = load_config(cli.config.as_deref())?;
    let now = resolve_now(cli.now.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Answer {
            user,
            topic,
            wrong,
            time,
            level,
            confidence,
        } => {
            let engine = open_engine(config, cli.data_dir)?;
            let mut answer = AnswerInput::new(topic, !wrong, time, level);
            if let Some(confidence) = confidence {
                answer = answer.with_confidence(confidence);
            }
            run_answer(&engine, &user, &answer, now, json)
        }
        Commands::Next {
            user,
            topic,
            mastery,
        } => {
            let engine = open_engine(config, cli.data_dir)?;
            run_next(&engine, &user, &topic, mastery, now, json)
        }
        Commands::Review {
            card,
            rating,
            wrong,
            time,
            legacy,
        } => run_review(config, card, rating, wrong, time, legacy, now, json),
        Commands::Decay { file, write } => run_decay(config, &file, write, now, json),
        Commands::Sweep { watch } => {
            let interval_hours = config.sweep_interval_hours;
            let engine = Arc::new(open_engine(config, cli.data_dir)?);
            if watch {
                run_sweep_loop(engine, interval_hours).await
            } else {
                run_sweep(&engine, now, json)
            }
        }
        Commands::Transfer { target, masteries } => {
            run_transfer(config, &target, &masteries, json)
        }
        Commands::Gaps { user, skill } => {
            let engine = open_engine(config, cli.data_dir)?;
            run_gaps(&engine, &user, &skill, now, json)
        }
        Commands::Stats { user } => {
            let engine = open_engine(config, cli.data_dir)?;
            run_stats(&engine, &user, now, json)
        }
    }
}

// ============================================================================
// SETUP
// ============================================================================

/// Logs go to stderr so `--json` output stays clean
fn init_logging() {
    let filter = EnvFilter::from_default_env().add_directive(Level::WARN.into());
    let json = std::env::var("MNEMOS_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .with_ansi(false)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let path = path.map(Path::to_path_buf).or_else(default_config_path);
    let config = match &path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(config.apply_env_overrides()?)
}

/// `config.json` under the platform config directory, when present
fn default_config_path() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "mnemos", "core")?;
    config_file_in(proj_dirs.config_dir())
}

fn config_file_in(dir: &Path) -> Option<PathBuf> {
    let path = dir.join("config.json");
    path.is_file().then_some(path)
}

fn resolve_now(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match raw {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --now timestamp: {raw}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

fn open_engine(config: EngineConfig, data_dir: Option<PathBuf>) -> anyhow::Result<AdaptiveEngine> {
    let store = SqliteStore::new(data_dir.map(|dir| dir.join("mnemos.db")))
        .context("failed to open the learner store")?;
    info!(path = %store.path().display(), "Store opened");
    let store: Arc<dyn LearnerStore> = Arc::new(store);
    Ok(AdaptiveEngine::new(config, store))
}

/// Engine for commands that never touch persisted learners
fn scratch_engine(config: EngineConfig) -> AdaptiveEngine {
    AdaptiveEngine::new(config, Arc::new(MemoryStore::new()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn label(name: &str) -> colored::ColoredString {
    name.white().bold()
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_answer(
    engine: &AdaptiveEngine,
    user: &str,
    answer: &AnswerInput,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let result = engine.process_answer(user, answer, now)?;
    if json {
        return print_json(&result);
    }

    let verdict = if answer.is_correct {
        "Correct".green().bold()
    } else {
        "Incorrect".red().bold()
    };
    println!("{} {}", verdict, result.feedback.dimmed());
    println!(
        "{}: {:.0} -> {:.0} ({:+})",
        label("Mastery"),
        result.mastery_before,
        result.mastery_after,
        result.mastery_change
    );
    if let Some(bonus) = &result.transfer_bonus {
        println!(
            "{}: +{} from {}",
            label("Transfer"),
            bonus.bonus_mastery,
            bonus.source_topics.join(", ")
        );
    }
    println!("{}: {}", label("XP"), result.xp_earned);
    println!("{}: {}", label("Streak"), result.streak);
    println!(
        "{}: {} ({} days, {})",
        label("Next Review"),
        result.next_review.format("%Y-%m-%d %H:%M"),
        result.next_review_days,
        result.scheduler
    );
    println!("{}: {}", label("Cognitive Load"), result.cognitive_load);
    if result.should_pause {
        println!("{}", "Take a break before continuing.".yellow());
    }
    if let Some(suggestion) = &result.break_suggestion {
        println!("{}: {}", label("Break"), suggestion.message);
    }
    Ok(())
}

fn run_next(
    engine: &AdaptiveEngine,
    user: &str,
    topic: &str,
    mastery: Option<f64>,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let params = engine.get_next_question_params(user, topic, mastery, now)?;
    if json {
        return print_json(&params);
    }

    println!("{}", format!("=== Next question: {topic} ===").cyan().bold());
    println!(
        "{}: {} ({})",
        label("Difficulty"),
        params.level,
        params.difficulty
    );
    println!("{}: {}", label("Band"), params.band);
    println!("{}: {:.0}", label("Mastery"), params.mastery);
    if let Some(r) = params.retrievability {
        println!("{}: {:.1}%", label("Retrievability"), r * 100.0);
    }
    println!("{}: {}", label("Cognitive Load"), params.cognitive_load);
    if params.consolidation {
        println!("{}", "Consolidation question".dimmed());
    }
    if params.interleave_suggested {
        match &params.suggested_topic {
            Some(next) => println!("{}: switch to {}", label("Interleave"), next.yellow()),
            None => println!("{}: switch topics", label("Interleave")),
        }
    }
    if params.should_take_break {
        println!("{}", "A break is recommended.".yellow());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_review(
    config: EngineConfig,
    card: Option<PathBuf>,
    rating: Option<String>,
    wrong: bool,
    time: f64,
    legacy: bool,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let item: ReviewItem = match &card {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw).context("card file is not a review item")?
        }
        None if legacy => SchedulerStrategy::Legacy.fresh_item(),
        None => config.scheduler.fresh_item(),
    };
    let outcome = match rating {
        Some(name) => match Rating::parse_name(&name) {
            Some(rating) => ReviewOutcome::Rated { rating },
            None => bail!("unknown rating '{name}', expected again, hard, good or easy"),
        },
        None => ReviewOutcome::answer(!wrong, time),
    };

    let engine = scratch_engine(config);
    let scheduled = engine.compute_next_review(&item, &outcome, now)?;
    if json {
        return print_json(&scheduled);
    }

    println!("{}", "=== Review Scheduled ===".cyan().bold());
    println!("{}: {}", label("Model"), scheduled.item.strategy());
    if let Some(rating) = scheduled.rating {
        println!("{}: {}", label("Rating"), rating);
    }
    if let Some(q) = scheduled.effective_quality {
        println!("{}: {:.1}", label("Effective Quality"), q);
    }
    println!("{}: {} days", label("Interval"), scheduled.interval_days);
    println!(
        "{}: {}",
        label("Next Review"),
        scheduled.next_review.format("%Y-%m-%d %H:%M")
    );
    match &scheduled.item {
        ReviewItem::Fsrs(card) => {
            println!("{}: {:.2}", label("Stability"), card.stability);
            println!("{}: {:.2}", label("Difficulty"), card.difficulty);
        }
        ReviewItem::Legacy(card) => {
            println!("{}: {:.2}", label("Ease"), card.ease_factor);
            println!("{}: {}", label("Repetitions"), card.repetitions);
        }
    }
    Ok(())
}

fn run_decay(
    config: EngineConfig,
    file: &Path,
    write: bool,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let items: Vec<ConceptItem> =
        serde_json::from_str(&raw).context("expected a JSON array of concept items")?;

    let engine = scratch_engine(config);
    let batch = engine.apply_decay_batch(&items, now);

    if write {
        std::fs::write(file, serde_json::to_string_pretty(&batch.items)?)
            .with_context(|| format!("failed to write {}", file.display()))?;
        info!(path = %file.display(), "Decayed concepts written");
    }
    if json {
        return print_json(&batch);
    }

    println!("{}", "=== Decay Batch ===".cyan().bold());
    println!("{}: {}", label("Concepts"), batch.stats.total);
    println!("{}: {}", label("Decayed"), batch.stats.decayed);
    println!("{}: {:.1}", label("Average Decay"), batch.stats.average_decay);
    println!("{}: {:.1}", label("Max Decay"), batch.stats.max_decay);
    for (before, after) in items.iter().zip(&batch.items) {
        if after.mastery < before.mastery {
            println!(
                "  {} {:.0} -> {}",
                before.concept_id,
                before.mastery,
                format!("{:.0}", after.mastery).yellow()
            );
        }
    }
    Ok(())
}

fn run_sweep(engine: &AdaptiveEngine, now: DateTime<Utc>, json: bool) -> anyhow::Result<()> {
    let report = engine.run_decay_sweep(now)?;
    if json {
        return print_json(&report);
    }

    println!("{}", "=== Decay Sweep ===".cyan().bold());
    println!("{}: {}", label("Scanned"), report.scanned);
    println!("{}: {}", label("Users"), report.users);
    println!("{}: {}", label("Decayed"), report.decayed);
    println!("{}: {}", label("Unchanged"), report.unchanged);
    println!("{}: {}", label("Skipped"), report.skipped);
    println!("{}: {:.1}", label("Total Decay"), report.total_decay);
    println!("{}: {}ms", label("Duration"), report.duration_ms);
    Ok(())
}

async fn run_sweep_loop(engine: Arc<AdaptiveEngine>, interval_hours: u64) -> anyhow::Result<()> {
    info!(interval_hours, "Starting periodic decay sweeps");
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_hours * 3600));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let engine = Arc::clone(&engine);
                let outcome = tokio::task::spawn_blocking(move || engine.run_decay_sweep(Utc::now())).await;
                match outcome {
                    Ok(Ok(report)) => info!(
                        scanned = report.scanned,
                        decayed = report.decayed,
                        skipped = report.skipped,
                        duration_ms = report.duration_ms,
                        "Periodic decay sweep complete"
                    ),
                    Ok(Err(e)) => warn!("Periodic decay sweep failed: {}", e),
                    Err(e) => warn!("Decay sweep task panicked: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping periodic decay sweeps");
                return Ok(());
            }
        }
    }
}

fn parse_masteries(pairs: &[String]) -> anyhow::Result<BTreeMap<String, f64>> {
    pairs
        .iter()
        .map(|pair| {
            let Some((topic, value)) = pair.split_once('=') else {
                bail!("expected topic=mastery, got '{pair}'");
            };
            let mastery: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("invalid mastery in '{pair}'"))?;
            Ok((topic.trim().to_string(), mastery))
        })
        .collect()
}

fn run_transfer(
    config: EngineConfig,
    target: &str,
    pairs: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let masteries = parse_masteries(pairs)?;
    let engine = scratch_engine(config);
    let bonus = engine.calculate_transfer_bonus(&masteries, target);
    if json {
        return print_json(&bonus);
    }

    match bonus {
        Some(bonus) => {
            println!(
                "{}: +{} mastery",
                label("Transfer Bonus"),
                bonus.bonus_mastery.to_string().green().bold()
            );
            println!("{}: {}", label("Sources"), bonus.source_topics.join(", "));
            println!("{}", bonus.explanation.dimmed());
        }
        None => println!("{}", format!("No transfer credit for {target}.").dimmed()),
    }
    Ok(())
}

fn run_gaps(
    engine: &AdaptiveEngine,
    user: &str,
    skill: &str,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let Some(analysis) = engine.analyze_skill_gaps(user, skill, now)? else {
        bail!("unknown skill '{skill}'");
    };
    let path = engine.skill_learning_path(user, skill, now)?;

    if json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GapsOutput<'a> {
            analysis: &'a mnemos_core::GapAnalysis,
            learning_path: Vec<&'a str>,
        }
        return print_json(&GapsOutput {
            analysis: &analysis,
            learning_path: path.iter().map(|n| n.id.as_str()).collect(),
        });
    }

    println!("{}", format!("=== Skill gaps: {} ===", analysis.target).cyan().bold());
    println!("{}: {:.0}", label("Target Mastery"), analysis.target_mastery);
    let ready = if analysis.ready {
        "yes".green()
    } else {
        "no".red()
    };
    println!("{}: {}", label("Ready"), ready);
    for gap in &analysis.gaps {
        let name = if gap.blocking {
            gap.name.red().bold()
        } else {
            gap.name.normal()
        };
        println!(
            "  {} {:.0}/{:.0}",
            name, gap.current_mastery, gap.required_mastery
        );
    }
    if !path.is_empty() {
        println!();
        println!("{}", "=== Learning Path ===".yellow().bold());
        for (i, node) in path.iter().enumerate() {
            println!("  {}. {}", i + 1, node.name);
        }
    }
    Ok(())
}

fn run_stats(
    engine: &AdaptiveEngine,
    user: &str,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let summary = engine.user_summary(user, now)?;
    if json {
        return print_json(&summary);
    }

    println!("{}", format!("=== Mnemos: {user} ===").cyan().bold());
    println!("{}: {}", label("Topics"), summary.topics.len());
    println!("{}: {}", label("Attempts"), summary.total_attempts);
    println!(
        "{}: {:.1}%",
        label("Success Rate"),
        summary.overall_success_rate * 100.0
    );
    println!("{}: {:.1}", label("Average Mastery"), summary.average_mastery);
    println!("{}: {}", label("Due for Review"), summary.due_topics);

    if !summary.topics.is_empty() {
        println!();
        println!("{}", "=== Topics ===".yellow().bold());
        for topic in &summary.topics {
            let due = if topic.due { " due".red().to_string() } else { String::new() };
            println!(
                "  {:<20} {:>5.1}  {:>3} attempts{}",
                topic.topic_id, topic.mastery, topic.total_attempts, due
            );
        }
    }
    if !summary.review_candidates.is_empty() {
        println!();
        println!("{}", "=== Needs Review ===".yellow().bold());
        for candidate in &summary.review_candidates {
            println!(
                "  {} ({} days, priority {:.1})",
                candidate.item.concept_id, candidate.days_since, candidate.priority
            );
        }
    }
    if summary.skills.total > 0 {
        println!();
        println!("{}", "=== Skills ===".yellow().bold());
        println!(
            "  {} mastered, {} learning, {} rusty",
            summary.skills.mastered, summary.skills.learning, summary.skills.rusty
        );
    }
    Ok(())
}

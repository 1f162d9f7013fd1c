//! goalpost CLI
//!
//! Command-line interface for goal backups:
//! - Chart a question's answers at any granularity
//! - Compute completion streaks
//! - Validate, compare and merge backup snapshots

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

use goalpost::backup::{
    detect_conflicts, merge, read_snapshot, validate_snapshot, write_snapshot, BackupSnapshot,
    ConflictReport, GoalSnapshot, MergeOutcome, MergeStrategy, QuestionSnapshot, SnapshotSide,
};
use goalpost::config::{generate_default_config, Config, LoggingConfig};
use goalpost::series::{ChartRefresher, ChartSnapshot, Granularity, Streak};

#[derive(Parser)]
#[command(name = "goalpost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Charts, streaks and merges for goal-tracking backups")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chart one question's numeric answers
    Chart {
        /// Backup snapshot (JSON)
        snapshot: PathBuf,
        /// Goal id or title
        #[arg(short, long)]
        goal: String,
        /// Question id or text
        #[arg(short, long)]
        question: String,
        /// Bucket size (day, week, month, quarter, half, year). Default: auto
        #[arg(short = 'G', long)]
        granularity: Option<Granularity>,
    },

    /// Show current and best streak for a question
    Streak {
        /// Backup snapshot (JSON)
        snapshot: PathBuf,
        /// Goal id or title
        #[arg(short, long)]
        goal: String,
        /// Question id or text
        #[arg(short, long)]
        question: String,
        /// Day to count back from (default: today)
        #[arg(short, long)]
        today: Option<NaiveDate>,
    },

    /// Check a snapshot for duplicate ids and dangling references
    Validate {
        /// Backup snapshot (JSON)
        snapshot: PathBuf,
    },

    /// List conflicts between two snapshots
    Conflicts {
        primary: PathBuf,
        secondary: PathBuf,
    },

    /// Merge two snapshots
    Merge {
        primary: PathBuf,
        secondary: PathBuf,
        /// stop_on_conflict or skip_conflicting (default: from config)
        #[arg(short, long)]
        strategy: Option<MergeStrategy>,
        /// Where to write the merged snapshot (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Where to write the conflict report, if any
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Env override warnings fire before the configured subscriber exists
    let early = fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let (config, skipped) = tracing::subscriber::with_default(early, || match &cli.config {
        Some(path) => Config::load_with_env(path).map(|config| (config, Vec::new())),
        None => Ok(Config::load_default()),
    })?;
    init_logging(&config.logging)?;
    for err in &skipped {
        tracing::warn!("Skipped config file: {}", err);
    }

    match cli.command {
        Commands::Chart {
            snapshot,
            goal,
            question,
            granularity,
        } => {
            let snapshot = load(&snapshot)?;
            let goal = find_goal(&snapshot, &goal)?;
            let question = find_question(goal, &question)?;

            if !question.response_type.is_numeric_family() {
                bail!(
                    "Question \"{}\" is {}; only numeric, scale and slider answers can be charted",
                    question.text,
                    question.response_type
                );
            }

            let responses = goal.numeric_responses(question.id);
            let mut refresher = ChartRefresher::new(config.calendar_rules()?, config.cache.ttl());
            refresher.refresh(&responses);
            if let Some(granularity) = granularity {
                refresher.select(granularity)?;
            }
            let chart = refresher.refresh(&responses);

            print_chart(&chart, &question.text, cli.format)?;
        }

        Commands::Streak {
            snapshot,
            goal,
            question,
            today,
        } => {
            let snapshot = load(&snapshot)?;
            let goal = find_goal(&snapshot, &goal)?;
            let question = find_question(goal, &question)?;
            let rules = config.calendar_rules()?;

            let Some(days) = goal.answered_days(question, &rules) else {
                bail!(
                    "Question \"{}\" is {}; streaks need yes/no or numeric answers",
                    question.text,
                    question.response_type
                );
            };
            let today = today.unwrap_or_else(|| rules.today());
            let streak = Streak::compute(&days, today);

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&streak)?),
                OutputFormat::Csv => {
                    let mut writer = csv::Writer::from_writer(std::io::stdout());
                    writer.write_record(["question", "current", "best"])?;
                    writer.write_record([
                        question.text.clone(),
                        streak.current_length.to_string(),
                        streak.best_length.to_string(),
                    ])?;
                    writer.flush()?;
                }
                OutputFormat::Table => {
                    println!("{}", question.text);
                    println!("  Current streak: {} day(s)", streak.current_length);
                    println!("  Best streak:    {} day(s)", streak.best_length);
                }
            }
        }

        Commands::Validate { snapshot: path } => {
            let snapshot = load(&path)?;
            validate_snapshot(&snapshot, SnapshotSide::Standalone)?;
            println!(
                "{:?}: OK ({} goals, {} questions, {} data points)",
                path,
                snapshot.goals.len(),
                snapshot.question_count(),
                snapshot.data_point_count()
            );
        }

        Commands::Conflicts { primary, secondary } => {
            let primary = load(&primary)?;
            let secondary = load(&secondary)?;
            validate_snapshot(&primary, SnapshotSide::Primary)?;
            validate_snapshot(&secondary, SnapshotSide::Secondary)?;

            let report = ConflictReport::new(detect_conflicts(&primary, &secondary));
            print_report(&report, cli.format)?;
        }

        Commands::Merge {
            primary,
            secondary,
            strategy,
            output,
            report,
        } => {
            let strategy = strategy.unwrap_or_else(|| config.merge_strategy());
            let primary = load(&primary)?;
            let secondary = load(&secondary)?;

            match merge(&primary, &secondary, strategy)? {
                MergeOutcome::Merged(merged) => {
                    if let Some(path) = &report {
                        if !merged.skipped.is_empty() {
                            ConflictReport::new(merged.skipped.clone()).write_to(path)?;
                            eprintln!("Skipped conflicts written to {:?}", path);
                        }
                    }

                    match &output {
                        Some(path) => {
                            write_snapshot(path, &merged.snapshot)?;
                            println!("Merged snapshot written to {:?}", path);
                            println!("  {}", merged.stats);
                        }
                        None => {
                            println!("{}", merged.snapshot.to_json_pretty()?);
                            eprintln!("{}", merged.stats);
                        }
                    }
                }
                MergeOutcome::Conflicted(conflicts) => {
                    match &report {
                        Some(path) => {
                            conflicts.write_to(path)?;
                            eprintln!("Conflict report written to {:?}", path);
                        }
                        None => print_report(&conflicts, cli.format)?,
                    }
                    eprintln!("Merge stopped: {}", conflicts);
                    eprintln!("Re-run with --strategy skip_conflicting to merge the rest.");
                    std::process::exit(2);
                }
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Initialize tracing from the `[logging]` section; `RUST_LOG` wins over the
/// configured level
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("goalpost={}", config.level)));

    // stdout is reserved for command output
    let writer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path))?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format.as_str() {
        "json" => registry.with(fmt::layer().json().with_writer(writer)).init(),
        _ => registry.with(fmt::layer().with_writer(writer)).init(),
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<BackupSnapshot> {
    read_snapshot(path).with_context(|| format!("Cannot read snapshot {:?}", path))
}

/// Look a goal up by id, then by case-insensitive title
fn find_goal<'a>(snapshot: &'a BackupSnapshot, needle: &str) -> anyhow::Result<&'a GoalSnapshot> {
    if let Ok(id) = needle.parse::<Uuid>() {
        if let Some(goal) = snapshot.goal(id) {
            return Ok(goal);
        }
    }

    snapshot
        .goals
        .iter()
        .find(|g| g.title.eq_ignore_ascii_case(needle))
        .ok_or_else(|| anyhow!("No goal matching \"{}\"", needle))
}

/// Look a question up by id, then by case-insensitive text
fn find_question<'a>(goal: &'a GoalSnapshot, needle: &str) -> anyhow::Result<&'a QuestionSnapshot> {
    if let Ok(id) = needle.parse::<Uuid>() {
        if let Some(question) = goal.find_question(id) {
            return Ok(question);
        }
    }

    goal.questions
        .iter()
        .find(|q| q.text.eq_ignore_ascii_case(needle))
        .ok_or_else(|| anyhow!("No question matching \"{}\" in goal \"{}\"", needle, goal.title))
}

fn print_chart(chart: &ChartSnapshot, title: &str, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(chart)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["start", "end", "average", "min", "max", "samples"])?;
            for bucket in &chart.buckets {
                writer.write_record([
                    bucket.start_date.to_string(),
                    bucket.end_date.to_string(),
                    format!("{:.2}", bucket.average_value),
                    format!("{:.2}", bucket.min_value),
                    format!("{:.2}", bucket.max_value),
                    bucket.sample_count.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            let selection = &chart.selection;
            let available: Vec<String> =
                selection.available().iter().map(|g| g.to_string()).collect();

            println!("{}", title);
            println!(
                "Span: {} day(s), granularity: {}{} (available: {})",
                selection.span_days(),
                selection.current(),
                if selection.is_manual() { "" } else { " (auto)" },
                available.join(", ")
            );
            println!();

            if chart.buckets.is_empty() {
                println!("No data");
                return Ok(());
            }

            println!(
                "{:<16} | {:>8} | {:>8} | {:>8} | {:>7}",
                "Period", "Avg", "Min", "Max", "Samples"
            );
            println!("{}", "-".repeat(60));
            for bucket in &chart.buckets {
                println!(
                    "{:<16} | {:>8.1} | {:>8.1} | {:>8.1} | {:>7}",
                    bucket.label(),
                    bucket.average_value,
                    bucket.min_value,
                    bucket.max_value,
                    bucket.sample_count
                );
            }

            let summary = &chart.summary;
            if let (Some(mean), Some(latest)) = (summary.mean_value, summary.latest_value) {
                println!();
                println!(
                    "{} day(s) logged, mean {:.1}, latest {:.1}",
                    summary.days_logged, mean, latest
                );
            }
        }
    }

    Ok(())
}

fn print_report(report: &ConflictReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["kind", "goal_id", "entity_id", "recommendation"])?;
            for entry in &report.conflicts {
                writer.write_record([
                    entry.conflict.entity_kind().to_string(),
                    entry.conflict.goal_id().to_string(),
                    entry.conflict.entity_id().to_string(),
                    entry.recommendation.clone(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if report.is_empty() {
                println!("No conflicts");
                return Ok(());
            }

            println!("{}", report);
            println!();
            for (i, entry) in report.conflicts.iter().enumerate() {
                println!("{:>3}. {}", i + 1, entry.conflict);
                println!("     → {}", entry.recommendation);
            }
        }
    }

    std::io::stdout().flush()?;
    Ok(())
}

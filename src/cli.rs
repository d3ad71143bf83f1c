//! Command-line interface: argument definitions, dispatch and plain-text output.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::db::Database;
use crate::forms::*;
use crate::models::*;
use crate::progress::{self, HistoryEntry, ResolveStats};
use crate::views::{DailySeries, Dashboard, TopicRow};
use crate::{api, export, import, today, views};

#[derive(Parser)]
#[command(name = "dsa")]
#[command(about = "Track practice problems, study sessions and spaced re-solves")]
pub struct Cli {
    /// Database file (overrides DSA_TRACKER_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API (overrides DSA_TRACKER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage topics
    #[command(subcommand)]
    Topic(TopicCommand),
    /// Manage problems
    #[command(subcommand)]
    Problem(ProblemCommand),
    /// Log and list study sessions
    #[command(subcommand)]
    Session(SessionCommand),
    /// Track re-solve attempts
    #[command(subcommand)]
    Resolve(ResolveCommand),
    /// Show resolve history of every solved problem
    History,
    /// Import pipe-delimited session lines from a file or stdin
    Bulk {
        /// Defaults to stdin
        file: Option<PathBuf>,
    },
    /// Import a spreadsheet workbook
    Import { path: PathBuf },
    /// Export session history as CSV
    Export {
        /// Defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show totals and recent activity
    Stats,
}

#[derive(Subcommand)]
pub enum TopicCommand {
    Add {
        name: String,
        #[arg(long)]
        goal_questions: Option<String>,
        #[arg(long)]
        goal_minutes: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    List,
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ProblemCommand {
    Add(ProblemArgs),
    List {
        #[arg(long)]
        topic_id: Option<i64>,
        /// Only problems flagged for review
        #[arg(long)]
        review: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Update the review flag, priority, notes or next review date
    Review {
        id: i64,
        /// "on" or "off"
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// YYYY-MM-DD, or empty to clear
        #[arg(long)]
        next: Option<String>,
    },
}

#[derive(Args)]
pub struct ProblemArgs {
    pub title: String,
    #[arg(long)]
    pub link: Option<String>,
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub difficulty: Option<String>,
    #[arg(long)]
    pub tags: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub topic_id: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub minutes: Option<String>,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    Log {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        minutes: Option<String>,
        #[arg(long)]
        attempts: Option<String>,
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        topic_id: Option<String>,
        #[arg(long)]
        problem_id: Option<String>,
    },
    List {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum ResolveCommand {
    Log {
        problem_id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        minutes: Option<String>,
        /// Planned, Solved or "Not Solved"
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change the outcome of an existing attempt
    Outcome {
        id: i64,
        outcome: String,
        #[arg(long)]
        minutes: Option<String>,
    },
}

/// Run a parsed command against the configured database.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Serve { port: None });
    let config = match &command {
        Commands::Serve { port } => config.with_overrides(cli.db, *port),
        _ => config.with_overrides(cli.db, None),
    };
    let db = config.open_database()?;

    match command {
        Commands::Serve { .. } => serve(db, config.port).await?,
        Commands::Topic(cmd) => topic(&db, cmd)?,
        Commands::Problem(cmd) => problem(&db, cmd)?,
        Commands::Session(cmd) => session(&db, cmd)?,
        Commands::Resolve(cmd) => resolve(&db, cmd)?,
        Commands::History => {
            let problems = db.list_problems(&ProblemFilter::default())?;
            let attempts = progress::group_by_problem(db.list_all_attempts()?);
            print!("{}", render_history(&progress::resolve_history(&problems, &attempts)));
        }
        Commands::Bulk { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            let imported = db.import_session_lines(&text, today())?;
            println!("Imported {} sessions", imported);
        }
        Commands::Import { path } => {
            let sheets = import::read_workbook(&path)?;
            let imported = db.import_sheets(&sheets)?;
            println!("Imported {} rows from {}", imported, path.display());
        }
        Commands::Export { output } => {
            let sessions = db.get_session_details(None)?;
            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let rows = export::write_sessions_csv(&sessions, file)?;
                    println!("Exported {} sessions to {}", rows, path.display());
                }
                None => {
                    export::write_sessions_csv(&sessions, std::io::stdout().lock())?;
                }
            }
        }
        Commands::Stats => {
            let dashboard = Dashboard::load(&db, today())?;
            let series = DailySeries::load(&db, today())?;
            print!("{}", render_stats(&dashboard, &series));
        }
    }

    Ok(())
}

async fn serve(db: Database, port: u16) -> Result<()> {
    tracing::info!("Starting dsa-tracker server on port {}", port);
    let app = api::create_router(db);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("dsa-tracker listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn topic(db: &Database, cmd: TopicCommand) -> Result<()> {
    match cmd {
        TopicCommand::Add {
            name,
            goal_questions,
            goal_minutes,
            description,
        } => {
            let input = TopicForm {
                name: Some(name),
                goal_questions,
                goal_minutes,
                description,
            }
            .into_new()?;
            let topic = db.create_topic(input)?;
            println!("Added topic #{} {}", topic.id, topic.name);
        }
        TopicCommand::List => print!("{}", render_topics(&views::topic_table(db)?)),
        TopicCommand::Delete { id } => {
            if !db.delete_topic(id)? {
                return Err(crate::error::TrackerError::NotFound("Topic").into());
            }
            println!("Deleted topic #{}", id);
        }
    }
    Ok(())
}

fn problem(db: &Database, cmd: ProblemCommand) -> Result<()> {
    match cmd {
        ProblemCommand::Add(args) => {
            let input = ProblemForm {
                title: Some(args.title),
                link: args.link,
                source: args.source,
                difficulty: args.difficulty,
                tags: args.tags,
                notes: args.notes,
                topic_id: args.topic_id,
                first_logged_date: args.date,
                first_logged_minutes: args.minutes,
            }
            .into_new(today())?;
            let problem = db.create_problem(input)?;
            println!("Added problem #{} {}", problem.id, problem.title);
        }
        ProblemCommand::List {
            topic_id,
            review,
            limit,
        } => {
            let problems = db.list_problems(&ProblemFilter {
                topic_id,
                needs_review: review.then_some(true),
                limit,
            })?;
            for p in &problems {
                let flag = if p.needs_review { "*" } else { " " };
                println!(
                    "{} #{:<5} {:<40} {:<8} {}",
                    flag,
                    p.id,
                    p.title,
                    p.review_priority.as_str(),
                    p.difficulty
                );
            }
        }
        ProblemCommand::Review {
            id,
            state,
            priority,
            notes,
            next,
        } => {
            let update = ReviewForm {
                review_state: state,
                review_priority: priority,
                review_notes: notes,
                next_review_date: next,
                ..ReviewForm::default()
            }
            .into_update()?;
            let problem = db
                .update_review(id, update)?
                .ok_or(crate::error::TrackerError::NotFound("Problem"))?;
            println!(
                "#{} {}: review {} ({})",
                problem.id,
                problem.title,
                if problem.needs_review { "on" } else { "off" },
                problem.review_priority.as_str()
            );
        }
    }
    Ok(())
}

fn session(db: &Database, cmd: SessionCommand) -> Result<()> {
    match cmd {
        SessionCommand::Log {
            date,
            minutes,
            attempts,
            outcome,
            notes,
            topic_id,
            problem_id,
        } => {
            let input = SessionForm {
                date,
                duration_minutes: minutes,
                attempts,
                outcome,
                notes,
                topic_id,
                problem_id,
            }
            .into_new(today());
            let session = db.create_session(input)?;
            println!(
                "Logged session #{} ({} min)",
                session.id, session.duration_minutes
            );
        }
        SessionCommand::List { limit } => {
            for detail in db.get_session_details(Some(limit))? {
                let s = &detail.session;
                println!(
                    "{:<10} {:>4} min  {:<20} {:<30} {}",
                    s.date.map(|d| d.to_string()).unwrap_or_default(),
                    s.duration_minutes,
                    detail.topic_name.as_deref().unwrap_or("-"),
                    detail.problem_title.as_deref().unwrap_or("-"),
                    s.outcome
                );
            }
        }
    }
    Ok(())
}

fn resolve(db: &Database, cmd: ResolveCommand) -> Result<()> {
    match cmd {
        ResolveCommand::Log {
            problem_id,
            date,
            minutes,
            outcome,
            notes,
        } => {
            let input = ResolveForm {
                problem_id: Some(problem_id),
                planned_date: date,
                minutes_spent: minutes,
                outcome,
                notes,
            }
            .into_new(today())?;
            let attempt = db.create_attempt(input)?;
            let stats = ResolveStats::from_attempts(&db.list_attempts(attempt.problem_id)?);
            println!(
                "Logged attempt #{} ({}); {}",
                attempt.id,
                attempt.outcome.as_str(),
                render_progress(&stats)
            );
        }
        ResolveCommand::Outcome { id, outcome, minutes } => {
            let update = OutcomeForm {
                outcome: Some(outcome),
                minutes_spent: minutes,
            }
            .into_update()?;
            let attempt = db
                .update_attempt_outcome(id, update)?
                .ok_or(crate::error::TrackerError::NotFound("Resolve attempt"))?;
            println!("Attempt #{} is now {}", attempt.id, attempt.outcome.as_str());
        }
    }
    Ok(())
}

// ============================================================
// Text rendering
// ============================================================

fn minutes(value: Option<i64>) -> String {
    value.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string())
}

fn render_progress(stats: &ResolveStats) -> String {
    match &stats.progress {
        Some(p) => match &p.minutes_path {
            Some(path) => format!("{} ({})", p.label, path),
            None => p.label.clone(),
        },
        None => "not solved yet".to_string(),
    }
}

/// One line per solved problem, latest solve first.
///
/// ```text
/// Two Sum                          2/3  best 9  avg 14.5  ↓ 11 min (20 → 9)
/// ```
pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No solved re-attempts yet\n".to_string();
    }
    let mut output = String::new();
    for entry in entries {
        let path = entry
            .minutes_path
            .as_deref()
            .map(|p| format!(" ({})", p))
            .unwrap_or_default();
        output.push_str(&format!(
            "{:<32} {}/{}  best {}  avg {}  {}{}\n",
            entry.problem.title,
            entry.solved_count,
            entry.attempts,
            minutes(entry.best_minutes),
            entry
                .avg_minutes
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.progress_label,
            path
        ));
    }
    output
}

pub fn render_topics(rows: &[TopicRow]) -> String {
    let mut output = String::new();
    for row in rows {
        output.push_str(&format!(
            "#{:<4} {:<28} {:>4} sessions {:>6} min\n",
            row.topic.id, row.topic.name, row.sessions, row.minutes
        ));
    }
    output
}

pub fn render_stats(dashboard: &Dashboard, series: &DailySeries) -> String {
    let totals = &dashboard.totals;
    let mut output = format!(
        "{} sessions, {} min total, last on {}\n",
        totals.total_sessions,
        totals.total_minutes,
        totals
            .latest_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    output.push_str("\nLast 7 days\n");
    for day in &dashboard.last_week {
        output.push_str(&format!("  {}  {:>4} min\n", day.label, day.minutes));
    }

    output.push_str("\nTop topics\n");
    for topic in dashboard.top_topics.iter().filter(|t| t.minutes > 0) {
        output.push_str(&format!("  {:<28} {:>6} min\n", topic.name, topic.minutes));
    }

    let month: i64 = series.series.iter().map(|d| d.minutes).sum();
    output.push_str(&format!("\nLast 30 days: {} min\n", month));
    output
}

mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "eng-tutor", about = "State and error notebook for the daily English tutor", version)]
struct Cli {
    /// State directory (default: $ENG_TUTOR_STATE_DIR or the local data dir)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the full state document
    Show,

    /// Write a timestamped backup of the state
    Backup {
        /// Backup directory (default: <state-dir>/backups)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Replace the state with a backup file
    Restore {
        file: PathBuf,
    },

    /// Save generated content for a day
    #[command(name = "save_daily")]
    SaveDaily {
        /// keypoint, quiz or user_answers
        #[arg(long)]
        content_type: String,
        /// JSON content (use "-" to read from stdin)
        #[arg(long)]
        content: String,
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record that a day's keypoint was viewed
    #[command(name = "record_view")]
    RecordView {
        #[arg(long)]
        date: Option<String>,
    },

    /// Show or update learning preferences
    Config {
        /// CEFR level (A1-C2)
        #[arg(long)]
        cefr: Option<String>,
        /// humorous, rigorous, casual or professional
        #[arg(long)]
        style: Option<String>,
        /// Oral share of content, 0-100
        #[arg(long, allow_negative_numbers = true)]
        oral_ratio: Option<i64>,
    },

    /// Show or update push times
    Schedule {
        /// HH:MM
        #[arg(long)]
        keypoint_time: Option<String>,
        /// HH:MM, later than the keypoint time
        #[arg(long)]
        quiz_time: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Browse and maintain the error notebook
    Errors {
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "5")]
        per_page: usize,
        /// Only errors from this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        /// Draw N random errors instead of paginating
        #[arg(long)]
        random: Option<usize>,
        /// Print notebook statistics
        #[arg(long)]
        stats: bool,
        /// Print up to N unreviewed errors for a review session
        #[arg(long)]
        review: Option<usize>,
        /// Mark an error (id or list index) as reviewed
        #[arg(long)]
        mark: Option<String>,
        /// With --mark: record another miss instead
        #[arg(long, requires = "mark")]
        wrong: bool,
        /// Archive errors missed 3+ times and 30+ days old
        #[arg(long)]
        archive_stale: bool,
        /// Remove reviewed errors
        #[arg(long)]
        clear_reviewed: bool,
    },

    /// Grade a day's quiz against the saved answers
    Grade {
        #[arg(long)]
        date: Option<String>,
    },

    /// Print a progress summary
    Stats,
}

/// Resolve "-" as stdin
fn resolve_content(content: String) -> std::io::Result<String> {
    if content == "-" {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
        Ok(buf)
    } else {
        Ok(content)
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let app = app::App::new(cli.state_dir)?;

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => commands::show::run(&app)?,
        Command::Backup { dir } => commands::backup::run(&app, dir.as_deref())?,
        Command::Restore { file } => commands::backup::run_restore(&app, &file)?,
        Command::SaveDaily { content_type, content, date } => {
            let content = resolve_content(content)?;
            commands::save_daily::run(&app, &content_type, &content, date.as_deref())?;
        }
        Command::RecordView { date } => commands::record_view::run(&app, date.as_deref())?,
        Command::Config { cefr, style, oral_ratio } => {
            commands::config::run(&app, cefr.as_deref(), style.as_deref(), oral_ratio)?;
        }
        Command::Schedule { keypoint_time, quiz_time, timezone } => {
            commands::schedule::run(&app, keypoint_time.as_deref(), quiz_time.as_deref(), timezone.as_deref())?;
        }
        Command::Errors {
            page,
            per_page,
            month,
            random,
            stats,
            review,
            mark,
            wrong,
            archive_stale,
            clear_reviewed,
        } => {
            if let Some(target) = mark {
                commands::errors::run_mark(&app, &target, !wrong)?;
            } else if archive_stale {
                commands::errors::run_archive_stale(&app)?;
            } else if clear_reviewed {
                commands::errors::run_clear_reviewed(&app)?;
            } else if stats {
                commands::errors::run_stats(&app)?;
            } else if let Some(count) = review {
                commands::errors::run_review(&app, count)?;
            } else {
                commands::errors::run_list(&app, page, per_page, month, random)?;
            }
        }
        Command::Grade { date } => commands::grade::run(&app, date.as_deref())?,
        Command::Stats => commands::stats::run(&app)?,
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        println!("Error: {:#}", e);
        std::process::exit(1);
    }
}

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use cohort_scoreboard::attendance::{
    self, AttendanceFlow, FlowState, OpenSessionParams, SessionLookup, SubmitOutcome,
};
use cohort_scoreboard::auth::AuthContext;
use cohort_scoreboard::board::{self, BoardPoller, BoardSnapshot, BoardState};
use cohort_scoreboard::config::Settings;
use cohort_scoreboard::db::{self, PgStore};
use cohort_scoreboard::models::{NewActivenessRecord, NewInterviewRound};
use cohort_scoreboard::store::RecordStore;
use cohort_scoreboard::{metrics, report, validate};

#[derive(Parser)]
#[command(name = "cohort-scoreboard")]
#[command(about = "Interview scores, Zoom activeness and attendance for student batches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Create an admin profile
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },
    /// Register a student batch
    AddBatch {
        #[arg(long)]
        name: String,
    },
    /// List batches, newest first
    Batches,
    /// Import interview rounds from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record one interview round
    AddRound {
        #[arg(long)]
        student: String,
        #[arg(long)]
        score: String,
        #[arg(long, default_value_t = 1)]
        round: i32,
        #[arg(long)]
        feedback: Option<String>,
    },
    DeleteRound {
        id: Uuid,
    },
    /// Record a Zoom activeness score
    AddActiveness {
        #[arg(long)]
        student: String,
        #[arg(long)]
        score: String,
        #[arg(long)]
        minutes: Option<i32>,
        #[arg(long)]
        zoom_session: Option<String>,
    },
    DeleteActiveness {
        id: Uuid,
    },
    /// Rank students by their best interview score
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Batch-wide interview statistics
    Summary,
    /// Zoom activeness board
    Activeness {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Open an attendance session and print its code and public link id
    OpenSession {
        #[arg(long)]
        name: String,
        #[arg(long)]
        batch: Option<String>,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        ttl_minutes: Option<i64>,
    },
    CloseSession {
        id: Uuid,
    },
    /// Mark a student present in an open session
    #[command(group(
        ArgGroup::new("session")
            .args(["code", "public_id"])
            .required(true)
            .multiple(false)
    ))]
    Mark {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        public_id: Option<String>,
        #[arg(long)]
        student: String,
    },
    /// Show who has marked attendance for a session
    Board {
        public_id: String,
        /// Keep polling; press Enter to refresh now, `q` to quit
        #[arg(long)]
        watch: bool,
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Present counts per session for a month
    Calendar {
        /// Month as YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let pool = db::connect(&settings.database_url, settings.max_connections).await?;
    let store = PgStore::new(pool.clone());
    let auth = AuthContext::init(&store, settings.admin_id).await;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&store, auth.admin_id()).await?;
            println!("Seed data inserted.");
        }
        Commands::SignUp { email, name } => {
            let context = AuthContext::sign_up(&store, &email, &name).await?;
            if let Some(admin) = context.admin() {
                println!("Admin {} created with id {}.", admin.email, admin.id);
                println!("Set ADMIN_ID={} to stamp rows with this profile.", admin.id);
            }
        }
        Commands::AddBatch { name } => {
            let batch = store.insert_batch(name.trim()).await?;
            println!("Batch {} created.", batch.name);
        }
        Commands::Batches => {
            let batches = store.list_batches().await?;
            if batches.is_empty() {
                println!("No batches found.");
            }
            for batch in batches {
                println!("- {} (created {})", batch.name, batch.created_at.date_naive());
            }
        }
        Commands::Import { csv } => {
            let inserted = db::import_rounds_csv(&store, auth.admin_id(), &csv).await?;
            println!("Inserted {inserted} interview rounds from {}.", csv.display());
        }
        Commands::AddRound {
            student,
            score,
            round,
            feedback,
        } => {
            let new_round = validate::interview_round(NewInterviewRound {
                student_name: student,
                round_number: round,
                score: validate::parse_score("interview score", &score)?,
                feedback,
            })?;
            let saved = store
                .insert_interview_round(auth.admin_id(), &new_round)
                .await?;
            println!(
                "Score added for {} (round {}, {:.1}/10), id {}.",
                saved.student_name, saved.round_number, saved.score, saved.id
            );
        }
        Commands::DeleteRound { id } => {
            store.delete_interview_round(id).await?;
            println!("Interview round {id} deleted.");
        }
        Commands::AddActiveness {
            student,
            score,
            minutes,
            zoom_session,
        } => {
            let record = validate::activeness_record(NewActivenessRecord {
                student_name: student,
                activeness_score: validate::parse_score("activeness score", &score)?,
                duration_minutes: minutes,
                zoom_session_id: zoom_session,
            })?;
            let saved = store.insert_activeness(auth.admin_id(), &record).await?;
            println!(
                "Activeness score added for {} ({:.0}%), id {}.",
                saved.student_name, saved.activeness_score, saved.id
            );
        }
        Commands::DeleteActiveness { id } => {
            store.delete_activeness(id).await?;
            println!("Activeness record {id} deleted.");
        }
        Commands::Leaderboard { limit } => {
            let rounds = store.list_interview_rounds().await?;
            let leaderboard = metrics::rank_leaderboard(metrics::aggregate_students(&rounds));

            if leaderboard.is_empty() {
                println!("No interview scores yet.");
                return Ok(());
            }

            println!("Top students by best interview score:");
            for (rank, student) in leaderboard.iter().take(limit).enumerate() {
                println!(
                    "{}. {} best {:.1}, average {:.2}, total {:.1} across {} rounds (last {})",
                    rank + 1,
                    student.name,
                    student.highest_score,
                    student.average_score,
                    student.total_score,
                    student.interviews_given,
                    student.last_interview_date.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::Summary => {
            let rounds = store.list_interview_rounds().await?;
            let summary = metrics::summarize_batch(&rounds);
            println!("Students: {}", summary.total_students);
            println!("Interviews: {}", summary.total_interviews);
            println!("Average score: {:.2}", summary.average_score);
            println!("Highest score: {:.1}", summary.highest_individual_score);
        }
        Commands::Activeness { limit } => {
            let records = metrics::rank_activeness(store.list_activeness().await?);
            if records.is_empty() {
                println!("No activeness scores yet.");
                return Ok(());
            }

            let summary = metrics::summarize_activeness(&records);
            println!(
                "{} records, average {:.1}%, {} minutes logged",
                summary.record_count, summary.average_score, summary.total_minutes
            );
            for (rank, record) in records.iter().take(limit).enumerate() {
                let minutes = record
                    .duration_minutes
                    .map(|m| format!(" over {m} min"))
                    .unwrap_or_default();
                println!(
                    "{}. {} {:.0}%{} ({})",
                    rank + 1,
                    record.student_name,
                    record.activeness_score,
                    minutes,
                    record.id
                );
            }
        }
        Commands::Report { out, limit } => {
            let rounds = store.list_interview_rounds().await?;
            let activeness = store.list_activeness().await?;
            let report = report::build_report(Utc::now(), &rounds, &activeness, limit);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::OpenSession {
            name,
            batch,
            date,
            ttl_minutes,
        } => {
            let now = Utc::now();
            let ttl = validate::session_ttl(ttl_minutes.unwrap_or(settings.session_ttl_minutes))?;
            let session = attendance::open_session(
                &store,
                auth.admin_id(),
                OpenSessionParams {
                    session_name: name,
                    batch_name: batch,
                    session_date: date.unwrap_or_else(|| now.date_naive()),
                    ttl,
                },
                now,
            )
            .await?;
            println!("Session {} opened.", session.session_name);
            println!("Code: {}", session.session_code);
            println!("Public id: {}", session.public_id);
            println!("Expires at {}", session.expires_at.format("%Y-%m-%d %H:%M UTC"));
        }
        Commands::CloseSession { id } => {
            attendance::close_session(&store, id).await?;
            println!("Session {id} closed.");
        }
        Commands::Mark {
            code,
            public_id,
            student,
        } => {
            let lookup = match (code, public_id) {
                (Some(code), _) => SessionLookup::Code(code),
                (None, Some(public_id)) => SessionLookup::PublicId(public_id),
                (None, None) => anyhow::bail!("either --code or --public-id is required"),
            };

            let mut flow = AttendanceFlow::new(&store);
            if let FlowState::Unavailable(reason) = flow.resolve(&lookup, Utc::now()).await? {
                println!("Session unavailable: {reason}.");
                return Ok(());
            }

            match flow.submit(&student, Utc::now()).await? {
                SubmitOutcome::Recorded(record) => println!(
                    "Attendance marked for {} at {}.",
                    record.student_name,
                    record.marked_at.format("%H:%M:%S UTC")
                ),
                SubmitOutcome::AlreadyMarked => {
                    println!("You have already marked your attendance for this session.")
                }
            }
        }
        Commands::Board {
            public_id,
            watch,
            interval_secs,
        } => {
            if !watch {
                let snapshot = board::load_board(&store, &public_id).await?;
                print_board(&snapshot);
                return Ok(());
            }

            let every =
                StdDuration::from_secs(interval_secs.unwrap_or(settings.poll_interval_secs).max(1));
            watch_board(store, public_id, every).await?;
        }
        Commands::Calendar { month } => {
            let month_start = match month {
                Some(month) => NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
                    .with_context(|| format!("invalid month {month}, expected YYYY-MM"))?,
                None => Utc::now()
                    .date_naive()
                    .with_day(1)
                    .context("failed to compute start of month")?,
            };

            let days = board::month_attendance(&store, month_start).await?;
            if days.is_empty() {
                println!("No sessions in {}.", month_start.format("%B %Y"));
            }
            for day in days {
                println!(
                    "- {} {}: {} present",
                    day.date, day.session_name, day.present_count
                );
            }
        }
    }

    Ok(())
}

fn print_board(snapshot: &BoardSnapshot) {
    let session = &snapshot.session;
    println!(
        "{} on {} ({} present)",
        session.session_name,
        session.session_date.format("%A, %B %-d, %Y"),
        snapshot.total_present
    );
    if snapshot.inactive {
        println!("This attendance session is no longer active.");
    }
    if let Some(last) = snapshot.last_marked_at {
        println!("Last marked at {}", last.format("%H:%M UTC"));
    }
    for (index, record) in snapshot.records.iter().enumerate() {
        println!(
            "{:>3}. {} ({}, {})",
            index + 1,
            record.student_name,
            record.status,
            record.marked_at.format("%H:%M")
        );
    }
}

async fn watch_board(store: PgStore, public_id: String, every: StdDuration) -> anyhow::Result<()> {
    let poller = BoardPoller::spawn(store, public_id, every);
    let mut updates = poller.subscribe();

    let (input_tx, mut input) = mpsc::unbounded_channel::<String>();
    tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let command = line.trim().to_string();
                    let quit = command == "q";
                    if input_tx.send(command).is_err() || quit {
                        break;
                    }
                }
            }
        }
    });

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                match &*updates.borrow_and_update() {
                    BoardState::Loading => println!("Loading attendance data..."),
                    BoardState::Loaded(snapshot) => print_board(snapshot),
                    BoardState::Error(message) => println!("Failed to load attendance data: {message}"),
                }
            }
            command = input.recv() => match command.as_deref() {
                Some("q") | None => break,
                Some(_) => poller.refresh(),
            },
        }
    }

    poller.stop();
    Ok(())
}

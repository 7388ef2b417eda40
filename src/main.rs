use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use sige_grades::alerts::{self, AlertInbox};
use sige_grades::db::{self, PgRepository};
use sige_grades::error::AggregateError;
use sige_grades::grades;
use sige_grades::logging;
use sige_grades::models::{GradeEntry, OverallAverage, PerformanceTier, Student, SubjectAverage};
use sige_grades::report;
use sige_grades::repository::{CsvRepository, FixtureRepository, GradeRepository};

const CURRENT_PERIOD: i32 = 4;

#[derive(Parser)]
#[command(name = "sige-grades")]
#[command(about = "Weighted grade averages and reports for SIGE-Móvil", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    /// Log debug events from this crate
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Read the built-in demo student instead of Postgres
    #[arg(long, global = true, conflicts_with = "from_csv")]
    demo: bool,
    /// Read grades from a CSV export instead of Postgres
    #[arg(long, global = true, value_name = "PATH")]
    from_csv: Option<PathBuf>,
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the demo student and grades
    Seed,
    /// Import grade entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print weighted averages per subject and overall
    Averages {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = CURRENT_PERIOD)]
        period: i32,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown grade report
    Report {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = CURRENT_PERIOD)]
        period: i32,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// List academic alerts raised by low averages
    Alerts {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = CURRENT_PERIOD)]
        period: i32,
    },
}

enum Source {
    Fixture(FixtureRepository),
    Csv(CsvRepository),
    Postgres(PgRepository),
}

impl GradeRepository for Source {
    async fn student(&self, email: &str) -> anyhow::Result<Option<Student>> {
        match self {
            Source::Fixture(repo) => repo.student(email).await,
            Source::Csv(repo) => repo.student(email).await,
            Source::Postgres(repo) => repo.student(email).await,
        }
    }

    async fn grade_entries(&self, email: &str) -> anyhow::Result<Vec<GradeEntry>> {
        match self {
            Source::Fixture(repo) => repo.grade_entries(email).await,
            Source::Csv(repo) => repo.grade_entries(email).await,
            Source::Postgres(repo) => repo.grade_entries(email).await,
        }
    }
}

#[derive(Serialize)]
struct AveragesOutput<'a> {
    student: &'a Student,
    period: i32,
    subjects: Vec<SubjectAverage>,
    overall: Option<OverallAverage>,
    tier: Option<PerformanceTier>,
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<PgPool> {
    let database_url =
        database_url.context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn open_source(args: &SourceArgs) -> anyhow::Result<Source> {
    if args.demo {
        tracing::debug!("using demo grades");
        return Ok(Source::Fixture(FixtureRepository::demo()?));
    }
    if let Some(path) = &args.from_csv {
        tracing::debug!(path = %path.display(), "using csv grades");
        return Ok(Source::Csv(CsvRepository::new(path)));
    }
    let pool = connect(args.database_url.as_deref()).await?;
    Ok(Source::Postgres(PgRepository::new(pool)))
}

async fn load_student<R: GradeRepository>(
    repo: &R,
    email: &str,
) -> anyhow::Result<(Student, Vec<GradeEntry>)> {
    let student = repo
        .student(email)
        .await?
        .with_context(|| format!("no student registered with email {email}"))?;
    let entries = repo.grade_entries(email).await?;
    tracing::info!(student = %student.email, entries = entries.len(), "loaded grades");
    Ok((student, entries))
}

fn print_averages(
    student: &Student,
    period: i32,
    entries: &[GradeEntry],
    json: bool,
) -> anyhow::Result<()> {
    let subjects = grades::subject_summaries(entries, period);
    let overall = match grades::overall_summary(entries, period) {
        Ok(overall) => Some(overall),
        Err(AggregateError::InvalidInput { .. }) => None,
    };

    if json {
        let output = AveragesOutput {
            student,
            period,
            tier: overall.as_ref().map(|overall| grades::classify(overall.average)),
            subjects,
            overall,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} ({}), period {}", student.full_name, student.grade_level, period);
    for summary in subjects.iter() {
        println!(
            "- {}: {:.2} ({} assessments, {})",
            summary.subject,
            summary.average,
            summary.entry_count,
            grades::classify(summary.average)
        );
    }

    match overall {
        Some(overall) => println!(
            "Overall: {:.2} ({})",
            overall.average,
            grades::classify(overall.average)
        ),
        None => println!("No grades recorded for period {period}."),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let Cli { source, command, .. } = cli;

    match command {
        Commands::InitDb => {
            let pool = connect(source.database_url.as_deref()).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(source.database_url.as_deref()).await?;
            let inserted = db::seed(&pool).await?;
            println!("Seed data inserted ({inserted} new grade entries).");
        }
        Commands::Import { csv } => {
            let pool = connect(source.database_url.as_deref()).await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} grade entries from {}.", csv.display());
        }
        Commands::Averages {
            email,
            period,
            json,
        } => {
            let repo = open_source(&source).await?;
            let (student, entries) = load_student(&repo, &email).await?;
            print_averages(&student, period, &entries, json)?;
        }
        Commands::Report { email, period, out } => {
            let repo = open_source(&source).await?;
            let (student, entries) = load_student(&repo, &email).await?;
            let report = report::build_report(&student, period, &entries);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Alerts { email, period } => {
            let repo = open_source(&source).await?;
            let (_, entries) = load_student(&repo, &email).await?;
            let inbox = AlertInbox::new(alerts::performance_alerts(&entries, period));

            if inbox.unread_count() == 0 {
                println!("No academic alerts for period {period}.");
                return Ok(());
            }

            println!("{} unread of {} alerts:", inbox.unread_count(), inbox.alerts().len());
            for alert in inbox.unread() {
                println!(
                    "- [{}] {} ({}): {}",
                    alert.priority.label(),
                    alert.title,
                    alert.raised_on,
                    alert.description
                );
            }
        }
    }

    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use academic_progression::borderline::FinalMark;
use academic_progression::config::AppConfig;
use academic_progression::models::{ModuleSelection, ProgramRecord};
use academic_progression::summary::round2;
use academic_progression::{
    db, determine_semester_status_with, get_academic_remarks_with, grade_options, report,
    telemetry,
};

#[derive(Parser)]
#[command(name = "academic-progression")]
#[command(about = "Academic standing and progression checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where a student's records come from.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// Student number to load from Postgres
    #[arg(long)]
    student: Option<i64>,
    /// JSON snapshot of the student's programs
    #[arg(long)]
    records: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo student
    Seed,
    /// Import module results from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List the grades offered for selection
    Grades,
    /// Compute academic remarks for a student
    Remarks {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        json: bool,
    },
    /// Work out the semester and status of the next registration
    NextSemester {
        #[command(flatten)]
        source: Source,
        /// CSV of selected modules (module_code, semester_number, status)
        #[arg(long)]
        modules: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Grade a weighted total, optionally applying a borderline adjustment
    Mark {
        #[arg(long)]
        total: f64,
        #[arg(long, requires = "by")]
        adjust: Option<f64>,
        /// Staff member making the adjustment
        #[arg(long)]
        by: Option<String>,
    },
    /// Write a markdown progress report
    Report {
        #[command(flatten)]
        source: Source,
        #[arg(long, default_value = "progress.md")]
        out: PathBuf,
    },
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_programs(
    config: &AppConfig,
    source: &Source,
) -> anyhow::Result<(String, Vec<ProgramRecord>)> {
    if let Some(path) = &source.records {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let programs: Vec<ProgramRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a valid records snapshot", path.display()))?;
        return Ok((path.display().to_string(), programs));
    }

    let std_no = source
        .student
        .context("either --student or --records is required")?;
    let pool = connect(config).await?;
    let programs = db::fetch_programs(&pool, std_no).await?;
    Ok((std_no.to_string(), programs))
}

fn read_selection(path: &Path) -> anyhow::Result<Vec<ModuleSelection>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut modules = Vec::new();
    for result in reader.deserialize::<ModuleSelection>() {
        modules.push(result?);
    }
    Ok(modules)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect(&config).await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} module results from {}.", csv.display());
        }
        Commands::Grades => {
            for grade in grade_options() {
                let marks = grade
                    .marks
                    .map(|range| format!("{}-{}", range.min, range.max))
                    .unwrap_or_else(|| "-".to_string());
                let points = grade
                    .points
                    .map(|points| format!("{points:.2}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<4} {:>7} {:>5}  {}",
                    grade.symbol.as_str(), marks, points, grade.description
                );
            }
        }
        Commands::Remarks { source, json } => {
            let (student, programs) = load_programs(&config, &source).await?;
            let remarks = get_academic_remarks_with(&programs, &config.policy);

            if json {
                println!("{}", serde_json::to_string_pretty(&remarks)?);
                return Ok(());
            }

            println!("{student}: {}", remarks.remark());
            println!(
                "CGPA {:.2}, {} of {} credits completed",
                round2(remarks.cgpa),
                round2(remarks.total_credits_completed),
                round2(remarks.total_credits_attempted)
            );
            for module in &remarks.failed_modules {
                println!("- failed {} ({})", module.module_code, module.grade);
            }
            for module in &remarks.supplementary_modules {
                println!("- supplementary {} ({})", module.module_code, module.grade);
            }
        }
        Commands::NextSemester {
            source,
            modules,
            json,
        } => {
            let (student, programs) = load_programs(&config, &source).await?;
            let selection = match modules {
                Some(path) => read_selection(&path)?,
                None => Vec::new(),
            };
            let next = determine_semester_status_with(&selection, &programs, &config.policy);

            if json {
                println!("{}", serde_json::to_string_pretty(&next)?);
            } else {
                println!(
                    "{student}: semester {} ({:?})",
                    next.semester_no, next.status
                );
            }
        }
        Commands::Mark { total, adjust, by } => {
            let mut mark = FinalMark::computed(total);
            if let Some(adjusted) = adjust {
                mark = mark.adjust(adjusted, by.as_deref().unwrap_or_default())?;
            }
            let grade = mark
                .grade()
                .map(|grade| grade.symbol.as_str())
                .unwrap_or("Not set");
            let flag = if mark.is_adjustable() { ", borderline" } else { "" };
            println!(
                "{:.2} -> {grade} ({:?}{flag})",
                mark.effective_total(),
                mark.source()
            );
        }
        Commands::Report { source, out } => {
            let (student, programs) = load_programs(&config, &source).await?;
            let remarks = get_academic_remarks_with(&programs, &config.policy);
            let next = determine_semester_status_with(&[], &programs, &config.policy);
            let report =
                report::build_report(&student, Utc::now().date_naive(), &remarks, &next);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

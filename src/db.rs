use std::str::FromStr;

use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    GradeSymbol, ModuleRecord, ModuleStatus, ProgramRecord, ProgramStatus, SemesterRecord,
    SemesterStatus,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_student(pool: &PgPool, std_no: i64, full_name: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO academic_progression.students (id, std_no, full_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (std_no) DO UPDATE SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(std_no)
    .bind(full_name)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

async fn upsert_program(
    pool: &PgPool,
    student_id: Uuid,
    program_name: &str,
    structure_id: i64,
    status: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO academic_progression.programs
        (id, student_id, program_name, structure_id, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_id, structure_id) DO UPDATE
        SET program_name = EXCLUDED.program_name, status = EXCLUDED.status
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(program_name)
    .bind(structure_id)
    .bind(status)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

async fn upsert_semester(
    pool: &PgPool,
    program_id: Uuid,
    semester_number: i32,
    term_code: &str,
    status: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO academic_progression.semesters
        (id, program_id, semester_number, term_code, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (program_id, term_code, semester_number) DO UPDATE
        SET status = EXCLUDED.status
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(program_id)
    .bind(semester_number)
    .bind(term_code)
    .bind(status)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
async fn insert_module(
    pool: &PgPool,
    semester_id: Uuid,
    module_code: &str,
    module_name: &str,
    credits: f64,
    grade: Option<&str>,
    status: &str,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO academic_progression.modules
        (id, semester_id, module_code, module_name, credits, grade, status, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(semester_id)
    .bind(module_code)
    .bind(module_name)
    .bind(credits)
    .bind(grade)
    .bind(status)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Demo student whose first attempt at CS102 failed and whose repeat passed.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let student_id = upsert_student(pool, 901_000_001, "Lerato Molapo").await?;
    let program_id = upsert_program(
        pool,
        student_id,
        "BSc in Software Engineering with Multimedia",
        1001,
        "Active",
    )
    .await?;

    let semesters = vec![
        (
            1,
            "2024-08",
            "Active",
            vec![
                ("seed-cs101", "CS101", "Introduction to Programming", Some("A"), "Compulsory"),
                ("seed-cs102", "CS102", "Discrete Mathematics", Some("F"), "Compulsory"),
            ],
        ),
        (
            1,
            "2025-02",
            "Repeat",
            vec![("seed-cs102-r1", "CS102", "Discrete Mathematics", Some("C"), "Repeat1")],
        ),
    ];

    for (number, term, status, modules) in semesters {
        let semester_id = upsert_semester(pool, program_id, number, term, status).await?;
        for (source_key, code, name, grade, module_status) in modules {
            insert_module(pool, semester_id, code, name, 10.0, grade, module_status, source_key)
                .await?;
        }
    }

    Ok(())
}

#[derive(Debug, Clone, serde::Deserialize)]
struct CsvRow {
    std_no: i64,
    full_name: String,
    program_name: String,
    structure_id: i64,
    program_status: String,
    semester_number: i32,
    term_code: String,
    semester_status: String,
    module_code: String,
    module_name: String,
    credits: f64,
    grade: Option<String>,
    module_status: String,
    source_key: Option<String>,
}

/// Typed values of an import row, checked before anything is written.
#[derive(Debug, Clone, PartialEq)]
struct CheckedRow {
    program_status: ProgramStatus,
    semester_status: SemesterStatus,
    grade: Option<GradeSymbol>,
    module_status: ModuleStatus,
}

fn check_row(row: &CsvRow, source_key: &str) -> anyhow::Result<CheckedRow> {
    if row.semester_number < 1 {
        anyhow::bail!(
            "row {source_key}: semester number {} must be at least 1",
            row.semester_number
        );
    }
    if !row.credits.is_finite() || row.credits < 0.0 {
        anyhow::bail!("row {source_key}: credits {} must be zero or more", row.credits);
    }

    let program_status = row
        .program_status
        .trim()
        .parse::<ProgramStatus>()
        .with_context(|| format!("row {source_key}: bad program status"))?;
    let semester_status = row
        .semester_status
        .trim()
        .parse::<SemesterStatus>()
        .with_context(|| format!("row {source_key}: bad semester status"))?;
    let module_status = row
        .module_status
        .trim()
        .parse::<ModuleStatus>()
        .with_context(|| format!("row {source_key}: bad module status"))?;
    let grade = row
        .grade
        .as_deref()
        .map(str::trim)
        .filter(|grade| !grade.is_empty())
        .map(GradeSymbol::from_str)
        .transpose()
        .with_context(|| format!("row {source_key}: bad grade for {}", row.module_code))?;

    Ok(CheckedRow {
        program_status,
        semester_status,
        grade,
        module_status,
    })
}

/// Imports module results row by row. A row with an unknown grade or status
/// stops the import before it is written.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .clone()
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        let checked = check_row(&row, &source_key)?;

        let student_id = upsert_student(pool, row.std_no, &row.full_name).await?;
        let program_id = upsert_program(
            pool,
            student_id,
            &row.program_name,
            row.structure_id,
            checked.program_status.as_str(),
        )
        .await?;
        let semester_id = upsert_semester(
            pool,
            program_id,
            row.semester_number,
            &row.term_code,
            checked.semester_status.as_str(),
        )
        .await?;

        let module_status = checked.module_status.to_string();
        if insert_module(
            pool,
            semester_id,
            &row.module_code,
            &row.module_name,
            row.credits,
            checked.grade.map(GradeSymbol::as_str),
            &module_status,
            &source_key,
        )
        .await?
        {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "module results imported");
    Ok(inserted)
}

/// One joined row of a student's history. Semester and module columns are
/// empty for programs or semesters without children.
#[derive(Debug, Clone)]
pub struct RecordRow {
    pub program_id: Uuid,
    pub program_name: String,
    pub structure_id: i64,
    pub program_status: String,
    pub semester_id: Option<Uuid>,
    pub semester_number: Option<i32>,
    pub term_code: Option<String>,
    pub semester_status: Option<String>,
    pub module_code: Option<String>,
    pub module_name: Option<String>,
    pub credits: Option<f64>,
    pub grade: Option<String>,
    pub module_status: Option<String>,
}

pub async fn fetch_programs(pool: &PgPool, std_no: i64) -> anyhow::Result<Vec<ProgramRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT p.id AS program_id, p.program_name, p.structure_id, p.status AS program_status,
               s.id AS semester_id, s.semester_number, s.term_code, s.status AS semester_status,
               m.module_code, m.module_name, m.credits, m.grade, m.status AS module_status
        FROM academic_progression.programs p
        JOIN academic_progression.students st ON st.id = p.student_id
        LEFT JOIN academic_progression.semesters s ON s.program_id = p.id
        LEFT JOIN academic_progression.modules m ON m.semester_id = s.id
        WHERE st.std_no = $1
        ORDER BY p.created_at, p.id, s.term_code, s.semester_number, s.id, m.module_code
        "#,
    )
    .bind(std_no)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to load records for student {std_no}"))?;

    let records = rows
        .into_iter()
        .map(|row| RecordRow {
            program_id: row.get("program_id"),
            program_name: row.get("program_name"),
            structure_id: row.get("structure_id"),
            program_status: row.get("program_status"),
            semester_id: row.get("semester_id"),
            semester_number: row.get("semester_number"),
            term_code: row.get("term_code"),
            semester_status: row.get("semester_status"),
            module_code: row.get("module_code"),
            module_name: row.get("module_name"),
            credits: row.get("credits"),
            grade: row.get("grade"),
            module_status: row.get("module_status"),
        })
        .collect();

    Ok(group_rows(records))
}

/// Folds ordered join rows back into programs, semesters and modules.
/// Unknown statuses and grades are logged and degraded, never fatal: a
/// program drops to `Inactive` and is left out of evaluation, a semester
/// reads as `Active`, a module as `Compulsory` and a grade as missing.
pub fn group_rows(rows: Vec<RecordRow>) -> Vec<ProgramRecord> {
    let mut programs: Vec<ProgramRecord> = Vec::new();
    let mut current_program: Option<Uuid> = None;
    let mut current_semester: Option<Uuid> = None;

    for row in rows {
        if current_program != Some(row.program_id) {
            programs.push(ProgramRecord {
                program_name: row.program_name.clone(),
                structure_id: row.structure_id,
                status: parse_or(&row.program_status, ProgramStatus::Inactive),
                semesters: Vec::new(),
            });
            current_program = Some(row.program_id);
            current_semester = None;
        }
        let Some(program) = programs.last_mut() else {
            continue;
        };

        let Some(semester_id) = row.semester_id else {
            continue;
        };
        if current_semester != Some(semester_id) {
            let semester_number = row.semester_number.unwrap_or_default();
            program.semesters.push(SemesterRecord {
                semester_number: u32::try_from(semester_number).unwrap_or_default(),
                term_code: row.term_code.clone().unwrap_or_default(),
                status: parse_or(
                    row.semester_status.as_deref().unwrap_or_default(),
                    SemesterStatus::Active,
                ),
                modules: Vec::new(),
            });
            current_semester = Some(semester_id);
        }
        let Some(semester) = program.semesters.last_mut() else {
            continue;
        };

        let Some(module_code) = row.module_code else {
            continue;
        };
        let grade = row
            .grade
            .as_deref()
            .map(str::trim)
            .filter(|grade| !grade.is_empty())
            .and_then(|grade| match GradeSymbol::from_str(grade) {
                Ok(symbol) => Some(symbol),
                Err(err) => {
                    warn!(module = %module_code, %err, "treating module as ungraded");
                    None
                }
            });
        semester.modules.push(ModuleRecord {
            module_name: row.module_name.unwrap_or_else(|| module_code.clone()),
            module_code,
            credits: row.credits.unwrap_or_default(),
            grade,
            status: parse_or(
                row.module_status.as_deref().unwrap_or_default(),
                ModuleStatus::Compulsory,
            ),
        });
    }

    programs
}

fn parse_or<T>(value: &str, fallback: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match value.trim().parse::<T>() {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(%err, ?fallback, "unrecognised status, using fallback");
            fallback
        }
    }
}

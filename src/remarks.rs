use std::collections::HashMap;

use tracing::debug;

use crate::grades;
use crate::models::{
    AcademicRemarks, GradeCategory, GradeSymbol, ModuleRecord, ModuleRef, ModuleSummary,
    ProgramRecord, ProgramStatus, RemarksStatus, SemesterPoints, SemesterRecord,
};
use crate::summary::summarize_modules;

/// Which attempts of a repeated module feed the cumulative GPA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttemptPolicy {
    /// Every graded attempt counts, so a failed and a passed attempt both
    /// stay in the credits attempted.
    #[default]
    AllAttempts,
    /// Only the latest graded attempt per module code counts.
    LatestAttempt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressionPolicy {
    pub attempts: AttemptPolicy,
    /// Unresolved fails in the latest semester a student may carry forward
    /// and still proceed.
    pub max_carried_failures: usize,
}

/// A semester that survived status filtering, with its counted modules.
#[derive(Debug, Clone)]
pub struct CountedSemester<'a> {
    pub record: &'a SemesterRecord,
    pub modules: Vec<&'a ModuleRecord>,
}

impl CountedSemester<'_> {
    pub fn has_marks(&self) -> bool {
        self.modules.iter().any(|module| captured_category(module).is_some())
    }
}

/// One graded sitting of a module.
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    pub semester: &'a SemesterRecord,
    pub module: &'a ModuleRecord,
    pub category: GradeCategory,
}

impl Attempt<'_> {
    fn sort_key(&self) -> (u32, &str, u8) {
        (
            self.semester.semester_number,
            self.semester.term_code.as_str(),
            self.module.status.attempt_rank(),
        )
    }

    fn to_ref(self, grade: GradeSymbol) -> ModuleRef {
        ModuleRef {
            module_code: self.module.module_code.clone(),
            module_name: self.module.module_name.clone(),
            semester_number: self.semester.semester_number,
            term_code: self.semester.term_code.clone(),
            grade,
        }
    }
}

pub fn active_program(programs: &[ProgramRecord]) -> Option<&ProgramRecord> {
    programs
        .iter()
        .find(|program| program.status == ProgramStatus::Active)
}

/// Drops deferred/deleted/dropped-out/withdrawn semesters and deleted or
/// dropped modules, ordered by `(term_code, semester_number)`.
pub fn counted_semesters(program: &ProgramRecord) -> Vec<CountedSemester<'_>> {
    let mut semesters: Vec<CountedSemester<'_>> = program
        .semesters
        .iter()
        .filter(|semester| !semester.status.is_excluded())
        .map(|semester| CountedSemester {
            record: semester,
            modules: semester
                .modules
                .iter()
                .filter(|module| !module.status.is_excluded())
                .collect(),
        })
        .collect();

    semesters.sort_by(|a, b| {
        (a.record.term_code.as_str(), a.record.semester_number)
            .cmp(&(b.record.term_code.as_str(), b.record.semester_number))
    });
    semesters
}

fn captured_category(module: &ModuleRecord) -> Option<GradeCategory> {
    module
        .grade
        .and_then(grades::descriptor)
        .map(|grade| grade.category)
        .filter(|category| category.is_captured())
}

/// Latest graded attempt per module code.
///
/// Attempts are ordered by `(semester_number, term_code, repeat number)`
/// and folded by module code, so the last attempt decides the outcome no
/// matter how earlier attempts went. The result keeps that order.
pub fn latest_attempts<'a>(semesters: &[CountedSemester<'a>]) -> Vec<Attempt<'a>> {
    let mut attempts: Vec<Attempt<'a>> = semesters
        .iter()
        .flat_map(|semester| {
            let record = semester.record;
            semester.modules.iter().copied().filter_map(move |module| {
                captured_category(module).map(|category| Attempt {
                    semester: record,
                    module,
                    category,
                })
            })
        })
        .collect();
    attempts.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut latest: HashMap<&'a str, usize> = HashMap::new();
    for (index, attempt) in attempts.iter().enumerate() {
        latest.insert(attempt.module.module_code.as_str(), index);
    }

    attempts
        .into_iter()
        .enumerate()
        .filter(|(index, attempt)| latest.get(attempt.module.module_code.as_str()) == Some(index))
        .map(|(_, attempt)| attempt)
        .collect()
}

fn cumulative_summary(
    semesters: &[CountedSemester<'_>],
    policy: &ProgressionPolicy,
) -> ModuleSummary {
    match policy.attempts {
        AttemptPolicy::AllAttempts => summarize_modules(
            semesters
                .iter()
                .flat_map(|semester| semester.modules.iter().copied()),
        ),
        AttemptPolicy::LatestAttempt => summarize_modules(
            latest_attempts(semesters)
                .into_iter()
                .map(|attempt| attempt.module),
        ),
    }
}

fn semester_points(
    semesters: &[CountedSemester<'_>],
    policy: &ProgressionPolicy,
) -> Vec<SemesterPoints> {
    semesters
        .iter()
        .enumerate()
        .filter(|(_, semester)| semester.has_marks())
        .map(|(index, semester)| {
            let own = summarize_modules(semester.modules.iter().copied());
            let cumulative = cumulative_summary(&semesters[..=index], policy);
            SemesterPoints {
                semester_number: semester.record.semester_number,
                term_code: semester.record.term_code.clone(),
                gpa: own.gpa,
                cgpa: cumulative.gpa,
                credits_attempted: own.credits_attempted,
                credits_completed: own.credits_completed,
                cumulative_credits_attempted: cumulative.credits_attempted,
                cumulative_credits_completed: cumulative.credits_completed,
            }
        })
        .collect()
}

pub fn get_academic_remarks(programs: &[ProgramRecord]) -> AcademicRemarks {
    get_academic_remarks_with(programs, &ProgressionPolicy::default())
}

/// Works out where a student stands in their active program.
///
/// Never fails: a student without an active program or without counted
/// semesters gets the zeroed `NoMarks` result.
pub fn get_academic_remarks_with(
    programs: &[ProgramRecord],
    policy: &ProgressionPolicy,
) -> AcademicRemarks {
    let Some(program) = active_program(programs) else {
        debug!("no active program, returning empty remarks");
        return AcademicRemarks::empty();
    };

    let semesters = counted_semesters(program);
    let Some(latest) = semesters.last() else {
        debug!(program = %program.program_name, "no counted semesters");
        return AcademicRemarks::empty();
    };

    let cumulative = cumulative_summary(&semesters, policy);
    let points = semester_points(&semesters, policy);

    let mut failed_modules = Vec::new();
    let mut supplementary_modules = Vec::new();
    for attempt in latest_attempts(&semesters) {
        let Some(grade) = attempt.module.grade else {
            continue;
        };
        match attempt.category {
            GradeCategory::Fail => failed_modules.push(attempt.to_ref(grade)),
            GradeCategory::Supplementary => supplementary_modules.push(attempt.to_ref(grade)),
            GradeCategory::Pass | GradeCategory::Deferred | GradeCategory::NotSubmitted => {}
        }
    }

    let status = if !latest.has_marks() {
        RemarksStatus::NoMarks
    } else {
        // Only fails graded in the latest semester hold the student back. An
        // older fail with an ungraded retake is still outstanding, not new.
        let unresolved = failed_modules
            .iter()
            .filter(|failed| {
                failed.semester_number == latest.record.semester_number
                    && failed.term_code == latest.record.term_code
            })
            .count();
        if unresolved > policy.max_carried_failures {
            RemarksStatus::RemainInSemester
        } else {
            RemarksStatus::Proceed
        }
    };

    debug!(
        program = %program.program_name,
        semester = latest.record.semester_number,
        status = status.label(),
        failed = failed_modules.len(),
        supplementary = supplementary_modules.len(),
        "academic remarks computed"
    );

    AcademicRemarks {
        status,
        cgpa: cumulative.gpa,
        latest_points: points.last().cloned().unwrap_or_default(),
        points,
        total_credits_attempted: cumulative.credits_attempted,
        total_credits_completed: cumulative.credits_completed,
        failed_modules,
        supplementary_modules,
    }
}

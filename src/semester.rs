use tracing::debug;

use crate::models::{
    AcademicRemarks, ModuleSelection, ProgramRecord, RegistrationStatus, RemarksStatus,
    SemesterDetermination,
};
use crate::remarks::{
    active_program, counted_semesters, get_academic_remarks_with, ProgressionPolicy,
};

pub fn determine_semester_status(
    modules: &[ModuleSelection],
    programs: &[ProgramRecord],
) -> SemesterDetermination {
    determine_semester_status_with(modules, programs, &ProgressionPolicy::default())
}

/// Whether a selected module re-takes earlier work: it carries a Repeat
/// status, or it names an outstanding failed or supplementary module from
/// the same structure semester.
fn retakes_outstanding(module: &ModuleSelection, remarks: &AcademicRemarks) -> bool {
    module.status.is_repeat()
        || remarks
            .failed_modules
            .iter()
            .chain(&remarks.supplementary_modules)
            .any(|outstanding| {
                outstanding.module_code == module.module_code
                    && outstanding.semester_number == module.semester_number
            })
}

/// Semester number and registration status for a new registration request.
///
/// A student held back stays on the semester they failed; everyone else
/// moves to the semester after their highest completed one. Re-entering a
/// semester number that already has graded results, or registering only
/// for modules that re-take outstanding work, makes the registration a
/// `Repeat`.
pub fn determine_semester_status_with(
    modules: &[ModuleSelection],
    programs: &[ProgramRecord],
    policy: &ProgressionPolicy,
) -> SemesterDetermination {
    let remarks = get_academic_remarks_with(programs, policy);
    let semesters = active_program(programs)
        .map(counted_semesters)
        .unwrap_or_default();

    let highest_completed = semesters
        .iter()
        .filter(|semester| semester.has_marks())
        .map(|semester| semester.record.semester_number)
        .max()
        .unwrap_or(0);

    let semester_no = match (remarks.status, semesters.last()) {
        (RemarksStatus::RemainInSemester, Some(latest)) => latest.record.semester_number,
        _ => highest_completed + 1,
    };

    let attempted_before = semesters
        .iter()
        .any(|semester| semester.record.semester_number == semester_no && semester.has_marks());
    let repeats_only = !modules.is_empty()
        && modules
            .iter()
            .all(|module| retakes_outstanding(module, &remarks));

    let status = if attempted_before || repeats_only {
        RegistrationStatus::Repeat
    } else {
        RegistrationStatus::Active
    };

    debug!(
        semester_no,
        ?status,
        remarks = remarks.status.label(),
        selected = modules.len(),
        "semester determined"
    );

    SemesterDetermination {
        semester_no,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        GradeSymbol, ModuleRecord, ModuleStatus, ProgramStatus, SemesterRecord, SemesterStatus,
    };

    type SemesterRow<'a> = (u32, &'a str, SemesterStatus, Vec<(&'a str, Option<GradeSymbol>)>);

    fn history(semesters: Vec<SemesterRow<'_>>) -> Vec<ProgramRecord> {
        vec![ProgramRecord {
            program_name: "Diploma in Business IT".to_string(),
            structure_id: 3,
            status: ProgramStatus::Active,
            semesters: semesters
                .into_iter()
                .map(|(number, term, status, modules)| SemesterRecord {
                    semester_number: number,
                    term_code: term.to_string(),
                    status,
                    modules: modules
                        .into_iter()
                        .map(|(code, grade)| {
                            ModuleRecord::new(code, code, 10.0, grade, ModuleStatus::Active)
                        })
                        .collect(),
                })
                .collect(),
        }]
    }

    fn selection(code: &str, semester_number: u32, status: ModuleStatus) -> ModuleSelection {
        ModuleSelection {
            module_code: code.to_string(),
            semester_number,
            status,
        }
    }

    #[test]
    fn new_student_starts_at_semester_one() {
        let result =
            determine_semester_status(&[selection("BIT101", 1, ModuleStatus::Compulsory)], &[]);
        assert_eq!(result.semester_no, 1);
        assert_eq!(result.status, RegistrationStatus::Active);
    }

    #[test]
    fn passing_student_advances() {
        let programs = history(vec![(
            1,
            "2024-08",
            SemesterStatus::Active,
            vec![("BIT101", Some(GradeSymbol::B)), ("BIT102", Some(GradeSymbol::A))],
        )]);
        let result = determine_semester_status(
            &[selection("BIT201", 2, ModuleStatus::Compulsory)],
            &programs,
        );
        assert_eq!(result.semester_no, 2);
        assert_eq!(result.status, RegistrationStatus::Active);
    }

    #[test]
    fn failing_student_remains_and_repeats() {
        let programs = history(vec![
            (
                1,
                "2024-02",
                SemesterStatus::Active,
                vec![("BIT101", Some(GradeSymbol::B))],
            ),
            (
                2,
                "2024-08",
                SemesterStatus::Active,
                vec![("BIT201", Some(GradeSymbol::F))],
            ),
        ]);
        let result = determine_semester_status(
            &[selection("BIT201", 2, ModuleStatus::Repeat(1))],
            &programs,
        );
        assert_eq!(result.semester_no, 2);
        assert_eq!(result.status, RegistrationStatus::Repeat);
    }

    #[test]
    fn repeat_only_selection_is_a_repeat_registration() {
        let programs = history(vec![(
            1,
            "2024-08",
            SemesterStatus::Active,
            vec![("BIT101", Some(GradeSymbol::Pp)), ("BIT102", Some(GradeSymbol::B))],
        )]);
        let result = determine_semester_status(
            &[selection("BIT101", 1, ModuleStatus::Repeat(1))],
            &programs,
        );
        assert_eq!(result.semester_no, 2);
        assert_eq!(result.status, RegistrationStatus::Repeat);
    }

    #[test]
    fn selecting_outstanding_modules_is_a_repeat_registration() {
        let programs = history(vec![(
            1,
            "2024-08",
            SemesterStatus::Active,
            vec![("BIT101", Some(GradeSymbol::Pp)), ("BIT102", Some(GradeSymbol::B))],
        )]);

        let outstanding = determine_semester_status(
            &[selection("BIT101", 1, ModuleStatus::Compulsory)],
            &programs,
        );
        assert_eq!(outstanding.status, RegistrationStatus::Repeat);

        let other_semester = determine_semester_status(
            &[selection("BIT101", 2, ModuleStatus::Compulsory)],
            &programs,
        );
        assert_eq!(other_semester.status, RegistrationStatus::Active);

        let mixed = determine_semester_status(
            &[
                selection("BIT101", 1, ModuleStatus::Compulsory),
                selection("BIT201", 2, ModuleStatus::Compulsory),
            ],
            &programs,
        );
        assert_eq!(mixed.semester_no, 2);
        assert_eq!(mixed.status, RegistrationStatus::Active);
    }

    #[test]
    fn pending_retake_of_older_fail_still_advances() {
        let programs = history(vec![
            (
                1,
                "2024-02",
                SemesterStatus::Active,
                vec![("BIT100", Some(GradeSymbol::B)), ("BIT101", Some(GradeSymbol::F))],
            ),
            (
                2,
                "2024-08",
                SemesterStatus::Active,
                vec![
                    ("BIT101", None),
                    ("BIT201", Some(GradeSymbol::B)),
                    ("BIT202", Some(GradeSymbol::A)),
                ],
            ),
        ]);
        let result = determine_semester_status(&[], &programs);
        assert_eq!(result.semester_no, 3);
        assert_eq!(result.status, RegistrationStatus::Active);
    }

    #[test]
    fn ungraded_current_semester_is_not_completed() {
        let programs = history(vec![
            (
                1,
                "2024-02",
                SemesterStatus::Active,
                vec![("BIT101", Some(GradeSymbol::C))],
            ),
            (2, "2024-08", SemesterStatus::Active, vec![("BIT201", None)]),
        ]);
        let result = determine_semester_status(&[], &programs);
        assert_eq!(result.semester_no, 2);
        assert_eq!(result.status, RegistrationStatus::Active);
    }
}

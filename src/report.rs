use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AcademicRemarks, ModuleRef, RegistrationStatus, SemesterDetermination};
use crate::summary::round2;

fn write_modules(output: &mut String, modules: &[ModuleRef], empty: &str) {
    if modules.is_empty() {
        let _ = writeln!(output, "{empty}");
        return;
    }
    for module in modules {
        let _ = writeln!(
            output,
            "- {} {} ({}) in semester {} ({})",
            module.module_code,
            module.module_name,
            module.grade,
            module.semester_number,
            module.term_code
        );
    }
}

pub fn build_report(
    student: &str,
    generated_on: NaiveDate,
    remarks: &AcademicRemarks,
    next: &SemesterDetermination,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Academic Progress Report");
    let _ = writeln!(output, "Generated for {} on {}", student, generated_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Standing");
    let _ = writeln!(output, "- Remarks: {}", remarks.remark());
    let _ = writeln!(output, "- CGPA: {:.2}", round2(remarks.cgpa));
    let _ = writeln!(
        output,
        "- Credits: {} completed of {} attempted",
        round2(remarks.total_credits_completed),
        round2(remarks.total_credits_attempted)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Semester Points");

    if remarks.points.is_empty() {
        let _ = writeln!(output, "No graded semesters yet.");
    } else {
        let _ = writeln!(output, "| Semester | Term | GPA | CGPA | Credits |");
        let _ = writeln!(output, "| --- | --- | --- | --- | --- |");
        for points in &remarks.points {
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} | {:.2} | {}/{} |",
                points.semester_number,
                points.term_code,
                round2(points.gpa),
                round2(points.cgpa),
                round2(points.credits_completed),
                round2(points.credits_attempted)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Failed Modules");
    write_modules(&mut output, &remarks.failed_modules, "No outstanding failures.");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Supplementary Modules");
    write_modules(
        &mut output,
        &remarks.supplementary_modules,
        "No supplementary assessments pending.",
    );

    let status = match next.status {
        RegistrationStatus::Active => "Active",
        RegistrationStatus::Repeat => "Repeat",
    };
    let _ = writeln!(output);
    let _ = writeln!(output, "## Next Registration");
    let _ = writeln!(output, "Semester {} ({})", next.semester_no, status);

    output
}

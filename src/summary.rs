use tracing::warn;

use crate::grades;
use crate::models::{GradeSymbol, ModuleRecord, ModuleStatus, ModuleSummary};

/// Aggregates GPA and credit totals over graded modules.
///
/// Deleted and dropped modules are skipped, as are modules without a
/// captured outcome (`Def`, `GNS`, no grade). Exemptions count towards
/// completed credits only. Grades without points (`PP`, `X`, `AP`, `ANN`)
/// stay out of the GPA but still count as attempted.
pub fn summarize_modules<'a, I>(modules: I) -> ModuleSummary
where
    I: IntoIterator<Item = &'a ModuleRecord>,
{
    let mut summary = ModuleSummary::default();
    let mut weighted_points = 0.0;
    let mut point_credits = 0.0;

    for module in modules {
        if module.status.is_excluded() {
            continue;
        }
        let Some(grade) = module.grade.and_then(grades::descriptor) else {
            continue;
        };
        if !grade.category.is_captured() {
            continue;
        }

        let credits = clamped_credits(module);
        if grade.is_pass() {
            summary.credits_completed += credits;
        }
        if is_exemption(module) {
            continue;
        }

        summary.credits_attempted += credits;
        if let Some(points) = grade.points {
            weighted_points += points * credits;
            point_credits += credits;
        }
    }

    if point_credits > 0.0 {
        summary.gpa = weighted_points / point_credits;
    }
    summary
}

fn is_exemption(module: &ModuleRecord) -> bool {
    module.status == ModuleStatus::Exempted || module.grade == Some(GradeSymbol::Exp)
}

fn clamped_credits(module: &ModuleRecord) -> f64 {
    if module.credits.is_finite() && module.credits >= 0.0 {
        return module.credits;
    }
    warn!(
        module = %module.module_code,
        credits = module.credits,
        "module credits out of range, counting as 0"
    );
    0.0
}

/// Two-decimal presentation rounding. Never feed the result back into a sum.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(
        code: &str,
        credits: f64,
        grade: Option<GradeSymbol>,
        status: ModuleStatus,
    ) -> ModuleRecord {
        ModuleRecord::new(code, format!("{code} module"), credits, grade, status)
    }

    #[test]
    fn empty_input_is_zeroed() {
        let summary = summarize_modules(std::iter::empty());
        assert_eq!(summary, ModuleSummary::default());
    }

    #[test]
    fn weights_points_by_credits() {
        let modules = vec![
            module("CS101", 10.0, Some(GradeSymbol::A), ModuleStatus::Active),
            module("CS102", 10.0, Some(GradeSymbol::F), ModuleStatus::Active),
        ];
        let summary = summarize_modules(&modules);
        assert!((summary.gpa - 2.0).abs() < 1e-9);
        assert_eq!(summary.credits_attempted, 20.0);
        assert_eq!(summary.credits_completed, 10.0);
    }

    #[test]
    fn deleted_and_dropped_modules_never_count() {
        let modules = vec![
            module("CS101", 10.0, Some(GradeSymbol::F), ModuleStatus::Delete),
            module("CS102", 10.0, Some(GradeSymbol::A), ModuleStatus::Drop),
        ];
        let summary = summarize_modules(&modules);
        assert_eq!(summary.credits_attempted, 0.0);
        assert_eq!(summary.credits_completed, 0.0);
        assert_eq!(summary.gpa, 0.0);
    }

    #[test]
    fn pointless_grades_stay_out_of_gpa() {
        let modules = vec![
            module("CS101", 12.0, Some(GradeSymbol::B), ModuleStatus::Active),
            module("CS102", 8.0, Some(GradeSymbol::Pp), ModuleStatus::Active),
            module("CS103", 6.0, Some(GradeSymbol::Ap), ModuleStatus::Active),
        ];
        let summary = summarize_modules(&modules);
        assert!((summary.gpa - 3.0).abs() < 1e-9);
        assert_eq!(summary.credits_attempted, 26.0);
        assert_eq!(summary.credits_completed, 18.0);
    }

    #[test]
    fn ungraded_and_pending_modules_are_ignored() {
        let modules = vec![
            module("CS101", 10.0, None, ModuleStatus::Active),
            module("CS102", 10.0, Some(GradeSymbol::Gns), ModuleStatus::Active),
            module("CS103", 10.0, Some(GradeSymbol::Def), ModuleStatus::Active),
        ];
        assert_eq!(summarize_modules(&modules), ModuleSummary::default());
    }

    #[test]
    fn exemptions_complete_without_attempting() {
        let modules = vec![
            module("CS101", 10.0, Some(GradeSymbol::Exp), ModuleStatus::Exempted),
            module("CS102", 10.0, Some(GradeSymbol::C), ModuleStatus::Active),
        ];
        let summary = summarize_modules(&modules);
        assert_eq!(summary.credits_attempted, 10.0);
        assert_eq!(summary.credits_completed, 20.0);
        assert!((summary.gpa - 2.0).abs() < 1e-9);
    }

    #[test]
    fn negative_credits_are_clamped() {
        let modules = vec![
            module("CS101", -5.0, Some(GradeSymbol::A), ModuleStatus::Active),
            module("CS102", 10.0, Some(GradeSymbol::C), ModuleStatus::Active),
        ];
        let summary = summarize_modules(&modules);
        assert_eq!(summary.credits_attempted, 10.0);
        assert!((summary.gpa - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_credit_modules_affect_nothing_but_are_counted() {
        let modules = vec![module("CS100", 0.0, Some(GradeSymbol::A), ModuleStatus::Active)];
        let summary = summarize_modules(&modules);
        assert_eq!(summary.gpa, 0.0);
        assert_eq!(summary.credits_attempted, 0.0);
    }

    #[test]
    fn round2_is_presentation_only() {
        assert_eq!(round2(2.666_666), 2.67);
        assert_eq!(round2(3.0), 3.0);
    }
}

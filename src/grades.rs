use crate::models::GradeCategory::{Deferred, Fail, NotSubmitted, Pass, Supplementary};
use crate::models::GradingScale::{Degree, Diploma};
use crate::models::GradeSymbol as G;
use crate::models::{GradeCategory, GradeDescriptor, GradeSymbol, GradingScale, MarkRange};

const fn banded(
    symbol: G,
    scale: GradingScale,
    min: u8,
    max: u8,
    points: Option<f64>,
    category: GradeCategory,
    description: &'static str,
) -> GradeDescriptor {
    GradeDescriptor {
        symbol,
        scale,
        marks: Some(MarkRange { min, max }),
        points,
        category,
        description,
    }
}

const fn administrative(
    symbol: G,
    points: Option<f64>,
    category: GradeCategory,
    description: &'static str,
) -> GradeDescriptor {
    GradeDescriptor {
        symbol,
        scale: GradingScale::Degree,
        marks: None,
        points,
        category,
        description,
    }
}

/// Every grade the institution issues, in declaration order. Lookups that
/// can match several rows return the first one.
pub static GRADES: &[GradeDescriptor] = &[
    banded(G::APlus, Degree, 90, 100, Some(4.0), Pass, "Distinction"),
    banded(G::A, Degree, 85, 89, Some(4.0), Pass, "Distinction"),
    banded(G::AMinus, Degree, 80, 84, Some(3.67), Pass, "Merit"),
    banded(G::BPlus, Degree, 75, 79, Some(3.33), Pass, "Merit"),
    banded(G::B, Degree, 70, 74, Some(3.0), Pass, "Credit"),
    banded(G::BMinus, Degree, 65, 69, Some(2.67), Pass, "Credit"),
    banded(G::CPlus, Degree, 60, 64, Some(2.33), Pass, "Pass"),
    banded(G::C, Degree, 55, 59, Some(2.0), Pass, "Pass"),
    banded(G::CMinus, Degree, 50, 54, Some(1.67), Pass, "Pass"),
    banded(G::Pp, Degree, 45, 49, None, Supplementary, "Pass Provisional"),
    banded(G::F, Degree, 0, 44, Some(0.0), Fail, "Fail"),
    banded(G::APlus, Diploma, 90, 100, Some(4.0), Pass, "Distinction"),
    banded(G::A, Diploma, 85, 89, Some(4.0), Pass, "Distinction"),
    banded(G::AMinus, Diploma, 80, 84, Some(3.7), Pass, "Merit"),
    banded(G::BPlus, Diploma, 75, 79, Some(3.3), Pass, "Merit"),
    banded(G::B, Diploma, 70, 74, Some(3.0), Pass, "Credit"),
    banded(G::BMinus, Diploma, 65, 69, Some(2.7), Pass, "Credit"),
    banded(G::CPlus, Diploma, 60, 64, Some(2.3), Pass, "Pass"),
    banded(G::C, Diploma, 55, 59, Some(2.0), Pass, "Pass"),
    banded(G::CMinus, Diploma, 50, 54, Some(1.7), Pass, "Pass"),
    banded(G::Pp, Diploma, 45, 49, None, Supplementary, "Pass Provisional"),
    banded(G::F, Diploma, 0, 44, Some(0.0), Fail, "Fail"),
    administrative(G::Exp, None, Pass, "Exempted"),
    administrative(G::Ap, None, Pass, "Aegrotat Pass"),
    administrative(G::X, None, Supplementary, "Outstanding Supplementary Assessment"),
    administrative(G::Def, None, Deferred, "Deferred"),
    administrative(G::Gns, None, NotSubmitted, "Grade Not Submitted"),
    administrative(G::Ann, None, Fail, "Annulled"),
    administrative(G::Dnc, Some(0.0), Fail, "Did Not Complete"),
    administrative(G::Dns, Some(0.0), Fail, "Did Not Submit"),
];

const POINTS_TOLERANCE: f64 = 1e-9;

/// What to look a grade up by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradeQuery<'a> {
    Marks(i32),
    Points(f64),
    Symbol(&'a str),
}

pub fn grade_for(query: GradeQuery<'_>) -> Option<&'static GradeDescriptor> {
    match query {
        GradeQuery::Marks(marks) => grade_for_marks(marks),
        GradeQuery::Points(points) => grade_for_points(points),
        GradeQuery::Symbol(symbol) => symbol.parse().ok().and_then(descriptor),
    }
}

/// Degree-scale grade for a whole mark in `[0, 100]`.
pub fn grade_for_marks(marks: i32) -> Option<&'static GradeDescriptor> {
    grade_for_marks_on(GradingScale::Degree, marks)
}

pub fn grade_for_marks_on(scale: GradingScale, marks: i32) -> Option<&'static GradeDescriptor> {
    GRADES.iter().find(|grade| {
        grade.scale == scale && grade.marks.is_some_and(|range| range.contains(marks))
    })
}

/// Rounds a weighted total half away from zero before the marks lookup.
pub fn grade_for_score(score: f64) -> Option<&'static GradeDescriptor> {
    if !score.is_finite() {
        return None;
    }
    grade_for_marks(score.round() as i32)
}

/// First point-bearing grade whose points equal `points`. Symbols without
/// points (`PP`, `Def`, `ANN`, ...) never match.
pub fn grade_for_points(points: f64) -> Option<&'static GradeDescriptor> {
    GRADES.iter().find(|grade| {
        grade
            .points
            .is_some_and(|value| (value - points).abs() < POINTS_TOLERANCE)
    })
}

/// First declared descriptor for a symbol.
pub fn descriptor(symbol: GradeSymbol) -> Option<&'static GradeDescriptor> {
    GRADES.iter().find(|grade| grade.symbol == symbol)
}

/// Grades offered for selection: one entry per distinct symbol, first
/// occurrence wins.
pub fn grade_options() -> Vec<&'static GradeDescriptor> {
    let mut options: Vec<&'static GradeDescriptor> = Vec::new();
    for grade in GRADES {
        if !options.iter().any(|seen| seen.symbol == grade.symbol) {
            options.push(grade);
        }
    }
    options
}

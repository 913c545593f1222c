//! Weighted assessment totals and the staff override for borderline marks.
//!
//! A total one mark below a grade cutoff (44, 49, ... 89) may be moved by one
//! mark before the grade is finalised. The override is recorded so that the
//! final grade can always be traced back to either the computed total or a
//! named adjustment.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::grades;
use crate::models::GradeDescriptor;

const BORDERLINE_MIN: i32 = 44;
const BORDERLINE_MAX: i32 = 89;
const MAX_ADJUSTMENT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssessmentScore {
    pub marks: f64,
    pub total_marks: f64,
    /// Percentage of the module total this assessment carries.
    pub weight: f64,
}

/// Sum of each assessment's share of its weight. Assessments without a
/// positive `total_marks` are skipped.
pub fn weighted_total(assessments: &[AssessmentScore]) -> f64 {
    assessments
        .iter()
        .filter(|assessment| assessment.total_marks > 0.0)
        .map(|assessment| assessment.marks / assessment.total_marks * assessment.weight)
        .sum()
}

pub fn is_borderline(score: f64) -> bool {
    if !score.is_finite() {
        return false;
    }
    let rounded = score.round() as i32;
    (BORDERLINE_MIN..=BORDERLINE_MAX).contains(&rounded) && rounded % 5 == 4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkSource {
    Computed,
    ManuallyAdjusted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FinalMark {
    Computed {
        total: f64,
    },
    ManuallyAdjusted {
        computed: f64,
        adjusted: f64,
        adjusted_by: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum AdjustmentError {
    #[error("total {0:.2} is not a borderline mark")]
    NotBorderline(f64),
    #[error("adjusted total {adjusted:.2} is more than one mark from {computed:.2}")]
    OutOfRange { computed: f64, adjusted: f64 },
    #[error("an adjustment must name the staff member making it")]
    MissingAuthor,
}

impl FinalMark {
    pub fn computed(total: f64) -> Self {
        Self::Computed { total }
    }

    pub fn from_assessments(assessments: &[AssessmentScore]) -> Self {
        Self::computed(weighted_total(assessments))
    }

    /// The total the grade is derived from.
    pub fn effective_total(&self) -> f64 {
        match self {
            Self::Computed { total } => *total,
            Self::ManuallyAdjusted { adjusted, .. } => *adjusted,
        }
    }

    pub fn computed_total(&self) -> f64 {
        match self {
            Self::Computed { total } => *total,
            Self::ManuallyAdjusted { computed, .. } => *computed,
        }
    }

    pub fn source(&self) -> MarkSource {
        match self {
            Self::Computed { .. } => MarkSource::Computed,
            Self::ManuallyAdjusted { .. } => MarkSource::ManuallyAdjusted,
        }
    }

    pub fn is_adjustable(&self) -> bool {
        is_borderline(self.computed_total())
    }

    /// Replaces the effective total with a staff-chosen one. Only borderline
    /// computed totals can be moved, and by at most one mark. Adjusting an
    /// already adjusted mark starts again from the computed total.
    pub fn adjust(self, adjusted: f64, adjusted_by: &str) -> Result<Self, AdjustmentError> {
        let computed = self.computed_total();
        if !is_borderline(computed) {
            return Err(AdjustmentError::NotBorderline(computed));
        }
        if !adjusted.is_finite() || (adjusted - computed).abs() > MAX_ADJUSTMENT {
            return Err(AdjustmentError::OutOfRange { computed, adjusted });
        }
        let adjusted_by = adjusted_by.trim();
        if adjusted_by.is_empty() {
            return Err(AdjustmentError::MissingAuthor);
        }

        info!(computed, adjusted, adjusted_by, "borderline mark adjusted");
        Ok(Self::ManuallyAdjusted {
            computed,
            adjusted,
            adjusted_by: adjusted_by.to_string(),
        })
    }

    pub fn revert(self) -> Self {
        Self::computed(self.computed_total())
    }

    pub fn grade(&self) -> Option<&'static GradeDescriptor> {
        grades::grade_for_score(self.effective_total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GradeSymbol;

    #[test]
    fn borderline_marks_sit_one_below_each_cutoff() {
        let flagged: Vec<i32> = (0..=100).filter(|m| is_borderline(f64::from(*m))).collect();
        assert_eq!(flagged, vec![44, 49, 54, 59, 64, 69, 74, 79, 84, 89]);
        assert!(is_borderline(48.6));
        assert!(!is_borderline(94.0));
        assert!(!is_borderline(f64::NAN));
    }

    #[test]
    fn weighted_total_scales_each_assessment() {
        let assessments = [
            AssessmentScore {
                marks: 30.0,
                total_marks: 40.0,
                weight: 40.0,
            },
            AssessmentScore {
                marks: 45.0,
                total_marks: 100.0,
                weight: 60.0,
            },
            AssessmentScore {
                marks: 10.0,
                total_marks: 0.0,
                weight: 10.0,
            },
        ];
        let total = weighted_total(&assessments);
        assert!((total - 57.0).abs() < 1e-9);
    }

    #[test]
    fn adjustment_moves_borderline_mark_into_next_band() {
        let mark = FinalMark::computed(49.0);
        assert_eq!(mark.grade().map(|g| g.symbol), Some(GradeSymbol::Pp));

        let adjusted = mark.adjust(50.0, "registry.officer").expect("borderline");
        assert_eq!(adjusted.source(), MarkSource::ManuallyAdjusted);
        assert_eq!(adjusted.grade().map(|g| g.symbol), Some(GradeSymbol::CMinus));
        assert_eq!(adjusted.computed_total(), 49.0);

        let reverted = adjusted.revert();
        assert_eq!(reverted, FinalMark::computed(49.0));
        assert_eq!(reverted.source(), MarkSource::Computed);
    }

    #[test]
    fn non_borderline_marks_cannot_be_adjusted() {
        let mark = FinalMark::computed(62.0);
        assert!(!mark.is_adjustable());
        assert_eq!(
            mark.adjust(63.0, "registry.officer"),
            Err(AdjustmentError::NotBorderline(62.0))
        );
    }

    #[test]
    fn adjustments_are_limited_to_one_mark() {
        let mark = FinalMark::computed(44.0);
        assert!(matches!(
            mark.clone().adjust(46.0, "registry.officer"),
            Err(AdjustmentError::OutOfRange { .. })
        ));
        assert_eq!(
            mark.clone().adjust(43.0, " "),
            Err(AdjustmentError::MissingAuthor)
        );
        let lowered = mark.adjust(43.0, "registry.officer").expect("within one mark");
        assert_eq!(lowered.effective_total(), 43.0);
        assert_eq!(lowered.grade().map(|g| g.symbol), Some(GradeSymbol::F));
    }
}

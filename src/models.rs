use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Printed grade symbols. Case-sensitive: `Def` and `DEF` are not the same symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeSymbol {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "PP")]
    Pp,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "EXP")]
    Exp,
    #[serde(rename = "AP")]
    Ap,
    #[serde(rename = "X")]
    X,
    #[serde(rename = "Def")]
    Def,
    #[serde(rename = "GNS")]
    Gns,
    #[serde(rename = "ANN")]
    Ann,
    #[serde(rename = "DNC")]
    Dnc,
    #[serde(rename = "DNS")]
    Dns,
}

impl GradeSymbol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::Pp => "PP",
            Self::F => "F",
            Self::Exp => "EXP",
            Self::Ap => "AP",
            Self::X => "X",
            Self::Def => "Def",
            Self::Gns => "GNS",
            Self::Ann => "ANN",
            Self::Dnc => "DNC",
            Self::Dns => "DNS",
        }
    }
}

impl fmt::Display for GradeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeSymbol {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let symbol = match value {
            "A+" => Self::APlus,
            "A" => Self::A,
            "A-" => Self::AMinus,
            "B+" => Self::BPlus,
            "B" => Self::B,
            "B-" => Self::BMinus,
            "C+" => Self::CPlus,
            "C" => Self::C,
            "C-" => Self::CMinus,
            "PP" => Self::Pp,
            "F" => Self::F,
            "EXP" => Self::Exp,
            "AP" => Self::Ap,
            "X" => Self::X,
            "Def" => Self::Def,
            "GNS" => Self::Gns,
            "ANN" => Self::Ann,
            "DNC" => Self::Dnc,
            "DNS" => Self::Dns,
            other => return Err(UnknownValue::new("grade symbol", other)),
        };
        Ok(symbol)
    }
}

/// How a grade counts towards progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeCategory {
    Pass,
    Fail,
    /// Conditional outcome settled by a supplementary assessment, not a repeat.
    Supplementary,
    Deferred,
    NotSubmitted,
}

impl GradeCategory {
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Whether an assessment outcome exists at all.
    pub fn is_captured(self) -> bool {
        match self {
            Self::Pass | Self::Fail | Self::Supplementary => true,
            Self::Deferred | Self::NotSubmitted => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradingScale {
    Degree,
    Diploma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkRange {
    pub min: u8,
    pub max: u8,
}

impl MarkRange {
    pub fn contains(&self, marks: i32) -> bool {
        (i32::from(self.min)..=i32::from(self.max)).contains(&marks)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeDescriptor {
    pub symbol: GradeSymbol,
    pub scale: GradingScale,
    /// `None` for administrative symbols that are never derived from marks.
    pub marks: Option<MarkRange>,
    pub points: Option<f64>,
    pub category: GradeCategory,
    pub description: &'static str,
}

impl GradeDescriptor {
    pub fn is_pass(&self) -> bool {
        self.category.is_pass()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModuleStatus {
    Compulsory,
    Elective,
    Active,
    Repeat(u8),
    Resit(u8),
    Exempted,
    Ineligible,
    Delete,
    Drop,
}

impl ModuleStatus {
    /// Deleted and dropped modules never count towards anything.
    pub fn is_excluded(self) -> bool {
        matches!(self, Self::Delete | Self::Drop)
    }

    pub fn is_repeat(self) -> bool {
        matches!(self, Self::Repeat(_))
    }

    /// Orders attempts that share a semester number and term.
    pub fn attempt_rank(self) -> u8 {
        match self {
            Self::Repeat(n) | Self::Resit(n) => n,
            _ => 0,
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compulsory => f.write_str("Compulsory"),
            Self::Elective => f.write_str("Elective"),
            Self::Active => f.write_str("Active"),
            Self::Repeat(n) => write!(f, "Repeat{n}"),
            Self::Resit(n) => write!(f, "Resit{n}"),
            Self::Exempted => f.write_str("Exempted"),
            Self::Ineligible => f.write_str("Ineligible"),
            Self::Delete => f.write_str("Delete"),
            Self::Drop => f.write_str("Drop"),
        }
    }
}

impl FromStr for ModuleStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let numbered = |prefix: &str| {
            value
                .strip_prefix(prefix)
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| *n > 0)
        };

        match value {
            "Compulsory" => Ok(Self::Compulsory),
            "Elective" => Ok(Self::Elective),
            "Active" => Ok(Self::Active),
            "Exempted" => Ok(Self::Exempted),
            "Ineligible" => Ok(Self::Ineligible),
            "Delete" => Ok(Self::Delete),
            "Drop" => Ok(Self::Drop),
            _ => {
                if let Some(n) = numbered("Repeat") {
                    Ok(Self::Repeat(n))
                } else if let Some(n) = numbered("Resit") {
                    Ok(Self::Resit(n))
                } else {
                    Err(UnknownValue::new("module status", value))
                }
            }
        }
    }
}

impl TryFrom<String> for ModuleStatus {
    type Error = UnknownValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleStatus> for String {
    fn from(status: ModuleStatus) -> Self {
        status.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemesterStatus {
    Active,
    Enrolled,
    Outstanding,
    Repeat,
    Deferred,
    Deleted,
    DroppedOut,
    Withdrawn,
}

impl SemesterStatus {
    pub fn is_excluded(self) -> bool {
        match self {
            Self::Deferred | Self::Deleted | Self::DroppedOut | Self::Withdrawn => true,
            Self::Active | Self::Enrolled | Self::Outstanding | Self::Repeat => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Enrolled => "Enrolled",
            Self::Outstanding => "Outstanding",
            Self::Repeat => "Repeat",
            Self::Deferred => "Deferred",
            Self::Deleted => "Deleted",
            Self::DroppedOut => "DroppedOut",
            Self::Withdrawn => "Withdrawn",
        }
    }
}

impl FromStr for SemesterStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Active" => Ok(Self::Active),
            "Enrolled" => Ok(Self::Enrolled),
            "Outstanding" => Ok(Self::Outstanding),
            "Repeat" => Ok(Self::Repeat),
            "Deferred" => Ok(Self::Deferred),
            "Deleted" => Ok(Self::Deleted),
            "DroppedOut" => Ok(Self::DroppedOut),
            "Withdrawn" => Ok(Self::Withdrawn),
            other => Err(UnknownValue::new("semester status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramStatus {
    Active,
    Completed,
    Changed,
    Inactive,
    Deleted,
}

impl ProgramStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Changed => "Changed",
            Self::Inactive => "Inactive",
            Self::Deleted => "Deleted",
        }
    }
}

impl FromStr for ProgramStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Active" => Ok(Self::Active),
            "Completed" => Ok(Self::Completed),
            "Changed" => Ok(Self::Changed),
            "Inactive" => Ok(Self::Inactive),
            "Deleted" => Ok(Self::Deleted),
            other => Err(UnknownValue::new("program status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub module_code: String,
    pub module_name: String,
    pub credits: f64,
    /// `None` until marks are captured.
    pub grade: Option<GradeSymbol>,
    pub status: ModuleStatus,
}

impl ModuleRecord {
    pub fn new(
        module_code: impl Into<String>,
        module_name: impl Into<String>,
        credits: f64,
        grade: Option<GradeSymbol>,
        status: ModuleStatus,
    ) -> Self {
        Self {
            module_code: module_code.into(),
            module_name: module_name.into(),
            credits,
            grade,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterRecord {
    pub semester_number: u32,
    /// Sortable term code such as `2024-08`.
    pub term_code: String,
    pub status: SemesterStatus,
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    pub program_name: String,
    pub structure_id: i64,
    pub status: ProgramStatus,
    #[serde(default)]
    pub semesters: Vec<SemesterRecord>,
}

/// A module attempt as surfaced in failed/supplementary lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRef {
    pub module_code: String,
    pub module_name: String,
    pub semester_number: u32,
    pub term_code: String,
    pub grade: GradeSymbol,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModuleSummary {
    pub gpa: f64,
    pub credits_attempted: f64,
    pub credits_completed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemarksStatus {
    Proceed,
    RemainInSemester,
    NoMarks,
}

impl RemarksStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Proceed => "Proceed",
            Self::RemainInSemester => "Remain in Semester",
            Self::NoMarks => "No Marks",
        }
    }
}

/// Semester and cumulative figures for one counted semester.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SemesterPoints {
    pub semester_number: u32,
    pub term_code: String,
    pub gpa: f64,
    pub cgpa: f64,
    pub credits_attempted: f64,
    pub credits_completed: f64,
    pub cumulative_credits_attempted: f64,
    pub cumulative_credits_completed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcademicRemarks {
    pub status: RemarksStatus,
    pub cgpa: f64,
    pub latest_points: SemesterPoints,
    pub points: Vec<SemesterPoints>,
    pub total_credits_attempted: f64,
    pub total_credits_completed: f64,
    pub failed_modules: Vec<ModuleRef>,
    pub supplementary_modules: Vec<ModuleRef>,
}

impl AcademicRemarks {
    /// Zeroed result for students with nothing to evaluate.
    pub fn empty() -> Self {
        Self {
            status: RemarksStatus::NoMarks,
            cgpa: 0.0,
            latest_points: SemesterPoints::default(),
            points: Vec::new(),
            total_credits_attempted: 0.0,
            total_credits_completed: 0.0,
            failed_modules: Vec::new(),
            supplementary_modules: Vec::new(),
        }
    }

    /// One-line remark as printed on statements, e.g. `Proceed, Repeat CS102`.
    pub fn remark(&self) -> String {
        match self.status {
            RemarksStatus::NoMarks => self.status.label().to_string(),
            RemarksStatus::RemainInSemester => {
                let count = self.failed_modules.len();
                let noun = if count == 1 { "module" } else { "modules" };
                format!("{}, {count} {noun} failed", self.status.label())
            }
            RemarksStatus::Proceed => {
                let mut parts = vec![self.status.label().to_string()];
                if !self.failed_modules.is_empty() {
                    parts.push(format!("Repeat {}", join_codes(&self.failed_modules)));
                }
                if !self.supplementary_modules.is_empty() {
                    parts.push(format!(
                        "Supplementary {}",
                        join_codes(&self.supplementary_modules)
                    ));
                }
                parts.join(", ")
            }
        }
    }
}

fn join_codes(modules: &[ModuleRef]) -> String {
    modules
        .iter()
        .map(|module| module.module_code.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistrationStatus {
    Active,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SemesterDetermination {
    pub semester_no: u32,
    pub status: RegistrationStatus,
}

/// A module picked for a prospective registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSelection {
    pub module_code: String,
    pub semester_number: u32,
    pub status: ModuleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValue {
    kind: &'static str,
    value: String,
}

impl UnknownValue {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

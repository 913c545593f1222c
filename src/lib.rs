//! Academic progression rules: grade lookups, GPA aggregation, academic
//! remarks and next-semester determination over a student's records.

pub mod borderline;
pub mod config;
pub mod db;
pub mod grades;
pub mod models;
pub mod remarks;
pub mod report;
pub mod semester;
pub mod summary;
pub mod telemetry;

pub use grades::{grade_for, grade_options, GradeQuery};
pub use remarks::{
    get_academic_remarks, get_academic_remarks_with, AttemptPolicy, ProgressionPolicy,
};
pub use semester::{determine_semester_status, determine_semester_status_with};
pub use summary::summarize_modules;

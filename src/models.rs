use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EntryError;

pub const MAX_SCORE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    Exam,
    Workshop,
    Homework,
    Project,
}

impl AssessmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Exam => "exam",
            AssessmentType::Workshop => "workshop",
            AssessmentType::Homework => "homework",
            AssessmentType::Project => "project",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exam" => Ok(AssessmentType::Exam),
            "workshop" => Ok(AssessmentType::Workshop),
            "homework" => Ok(AssessmentType::Homework),
            "project" => Ok(AssessmentType::Project),
            other => Err(EntryError::UnknownAssessmentType(other.to_string())),
        }
    }
}

/// One recorded assessment result on the 0.0 to 5.0 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeEntry {
    pub id: String,
    pub subject: String,
    pub assessment_type: AssessmentType,
    pub title: String,
    pub score: f64,
    pub date: NaiveDate,
    pub period: i32,
    pub weight: f64,
}

impl GradeEntry {
    /// Checks the entry invariants. Ingestion calls this before handing
    /// entries to the aggregator, which assumes they hold.
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.subject.trim().is_empty() {
            return Err(EntryError::EmptySubject {
                id: self.id.clone(),
            });
        }
        if !(0.0..=MAX_SCORE).contains(&self.score) {
            return Err(EntryError::ScoreOutOfRange {
                id: self.id.clone(),
                score: self.score,
            });
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(EntryError::NonPositiveWeight {
                id: self.id.clone(),
                weight: self.weight,
            });
        }
        if self.period < 1 {
            return Err(EntryError::InvalidPeriod {
                id: self.id.clone(),
                period: self.period,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject: String,
    pub period: i32,
    pub average: f64,
    pub entry_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallAverage {
    pub period: i32,
    pub average: f64,
    pub subject_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PerformanceTier {
    Excellent,
    Acceptable,
    NeedsImprovement,
}

impl PerformanceTier {
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "Excellent",
            PerformanceTier::Acceptable => "Acceptable",
            PerformanceTier::NeedsImprovement => "Needs improvement",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub grade_level: String,
}

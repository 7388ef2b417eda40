use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{AssessmentType, GradeEntry, Student};

/// Data-access collaborator that hands grade entries to the aggregator.
#[allow(async_fn_in_trait)]
pub trait GradeRepository {
    async fn student(&self, email: &str) -> anyhow::Result<Option<Student>>;

    async fn grade_entries(&self, email: &str) -> anyhow::Result<Vec<GradeEntry>>;
}

pub const DEMO_EMAIL: &str = "ana.gonzalez@sige.edu";

pub fn demo_student() -> Student {
    Student {
        id: Uuid::from_u128(0x5b0e_8f3a_2c4d_4e6f_9a1b_3c5d_7e9f_1a2b),
        full_name: "Ana González".to_string(),
        email: DEMO_EMAIL.to_string(),
        grade_level: "5th Grade A".to_string(),
    }
}

pub fn demo_entries() -> anyhow::Result<Vec<GradeEntry>> {
    use AssessmentType::{Exam, Homework, Project, Workshop};

    let rows = [
        ("1", "Mathematics", Exam, "Chapter 5 exam", 4.5, (2024, 11, 10), 4, 30.0),
        ("2", "Mathematics", Workshop, "Algebra workshop", 4.2, (2024, 11, 5), 4, 20.0),
        ("3", "Mathematics", Homework, "Chapter 4 exercises", 4.8, (2024, 11, 1), 4, 10.0),
        ("4", "Mathematics", Exam, "Term exam", 3.9, (2024, 10, 15), 3, 40.0),
        ("5", "Spanish", Project, "Literary essay", 4.0, (2024, 11, 8), 4, 35.0),
        ("6", "Spanish", Exam, "Grammar exam", 3.7, (2024, 11, 2), 4, 30.0),
        ("7", "Spanish", Homework, "Text analysis", 4.3, (2024, 10, 28), 4, 15.0),
        ("8", "Science", Exam, "Solar system exam", 3.8, (2024, 11, 5), 4, 30.0),
        ("9", "Science", Project, "Solar system model", 4.6, (2024, 10, 30), 4, 25.0),
        ("10", "Science", Workshop, "Physics lab", 4.1, (2024, 10, 25), 4, 20.0),
        ("11", "Social Studies", Exam, "Geography exam", 4.4, (2024, 11, 7), 4, 30.0),
        ("12", "Social Studies", Project, "Political map", 4.7, (2024, 11, 1), 4, 25.0),
        ("13", "English", Exam, "Unit 5 test", 4.3, (2024, 11, 9), 4, 30.0),
        ("14", "English", Workshop, "Speaking practice", 4.5, (2024, 11, 3), 4, 20.0),
    ];

    rows.into_iter()
        .map(|(id, subject, assessment_type, title, score, (y, m, d), period, weight)| {
            Ok(GradeEntry {
                id: id.to_string(),
                subject: subject.to_string(),
                assessment_type,
                title: title.to_string(),
                score,
                date: NaiveDate::from_ymd_opt(y, m, d).context("invalid date")?,
                period,
                weight,
            })
        })
        .collect()
}

/// Built-in demo data for a single student.
#[derive(Debug, Clone)]
pub struct FixtureRepository {
    student: Student,
    entries: Vec<GradeEntry>,
}

impl FixtureRepository {
    pub fn demo() -> anyhow::Result<Self> {
        Ok(Self {
            student: demo_student(),
            entries: demo_entries()?,
        })
    }
}

impl GradeRepository for FixtureRepository {
    async fn student(&self, email: &str) -> anyhow::Result<Option<Student>> {
        Ok((self.student.email == email).then(|| self.student.clone()))
    }

    async fn grade_entries(&self, email: &str) -> anyhow::Result<Vec<GradeEntry>> {
        if self.student.email != email {
            return Ok(Vec::new());
        }
        Ok(self.entries.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct CsvRow {
    pub student_email: String,
    pub student_name: String,
    pub grade_level: String,
    pub id: String,
    pub subject: String,
    pub assessment_type: String,
    pub title: String,
    pub score: f64,
    pub date: NaiveDate,
    pub period: i32,
    pub weight: f64,
}

impl CsvRow {
    pub fn to_entry(&self) -> anyhow::Result<GradeEntry> {
        let entry = GradeEntry {
            id: self.id.clone(),
            subject: self.subject.trim().to_string(),
            assessment_type: self.assessment_type.parse()?,
            title: self.title.clone(),
            score: self.score,
            date: self.date,
            period: self.period,
            weight: self.weight,
        };
        entry.validate()?;
        Ok(entry)
    }
}

pub fn read_csv_rows(path: &Path) -> anyhow::Result<Vec<CsvRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("{}: bad row {}", path.display(), index + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

/// Grade entries read from a CSV export. The file is re-read on every call.
#[derive(Debug, Clone)]
pub struct CsvRepository {
    path: PathBuf,
}

impl CsvRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn rows(&self) -> anyhow::Result<Vec<CsvRow>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_csv_rows(&path))
            .await
            .context("csv reader task failed")?
    }
}

impl GradeRepository for CsvRepository {
    async fn student(&self, email: &str) -> anyhow::Result<Option<Student>> {
        let rows = self.rows().await?;
        Ok(rows
            .into_iter()
            .find(|row| row.student_email == email)
            .map(|row| Student {
                id: Uuid::new_v5(&Uuid::NAMESPACE_OID, row.student_email.as_bytes()),
                full_name: row.student_name,
                email: row.student_email,
                grade_level: row.grade_level,
            }))
    }

    async fn grade_entries(&self, email: &str) -> anyhow::Result<Vec<GradeEntry>> {
        let rows = self.rows().await?;
        let entries = rows
            .iter()
            .filter(|row| row.student_email == email)
            .map(CsvRow::to_entry)
            .collect::<anyhow::Result<Vec<_>>>()?;

        tracing::debug!(email, count = entries.len(), path = %self.path.display(), "loaded csv grades");
        Ok(entries)
    }
}

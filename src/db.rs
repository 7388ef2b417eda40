use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{GradeEntry, Student};
use crate::repository::{self, GradeRepository};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_student(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    email: &str,
    grade_level: &str,
) -> anyhow::Result<Uuid> {
    let student_id: Uuid = sqlx::query(
        r#"
        INSERT INTO sige_movil.students (id, full_name, email, grade_level)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name, grade_level = EXCLUDED.grade_level
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(email)
    .bind(grade_level)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert student {email}"))?
    .get("id");

    Ok(student_id)
}

/// Inserts an entry unless its source key is already known. Returns whether
/// a row was written.
async fn insert_entry(
    pool: &PgPool,
    student_id: Uuid,
    source_key: &str,
    entry: &GradeEntry,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO sige_movil.grade_entries
        (id, student_id, source_key, subject, assessment_type, title, score, recorded_on, period, weight)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(source_key)
    .bind(&entry.subject)
    .bind(entry.assessment_type.as_str())
    .bind(&entry.title)
    .bind(entry.score)
    .bind(entry.date)
    .bind(entry.period)
    .bind(entry.weight)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let student = repository::demo_student();
    let student_id = upsert_student(
        pool,
        student.id,
        &student.full_name,
        &student.email,
        &student.grade_level,
    )
    .await?;

    let mut inserted = 0usize;
    for entry in repository::demo_entries()? {
        let source_key = format!("seed-{}", entry.id);
        if insert_entry(pool, student_id, &source_key, &entry).await? {
            inserted += 1;
        }
    }

    tracing::info!(student = %student.email, inserted, "seeded demo grades");
    Ok(inserted)
}

/// Storage key for an imported entry. Export ids are only unique per
/// student, so the key carries the student's email.
pub fn import_source_key(student_email: &str, entry_id: &str) -> String {
    let entry_id = entry_id.trim();
    if entry_id.is_empty() {
        format!("import:{}:{}", student_email, Uuid::new_v4())
    } else {
        format!("import:{}:{}", student_email, entry_id)
    }
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let rows = repository::read_csv_rows(csv_path)?;
    let mut inserted = 0usize;

    for (index, row) in rows.iter().enumerate() {
        let entry = row
            .to_entry()
            .with_context(|| format!("{}: invalid row {}", csv_path.display(), index + 1))?;
        let student_id = upsert_student(
            pool,
            Uuid::new_v4(),
            &row.student_name,
            &row.student_email,
            &row.grade_level,
        )
        .await?;

        let source_key = import_source_key(&row.student_email, &entry.id);

        if insert_entry(pool, student_id, &source_key, &entry).await? {
            inserted += 1;
        } else {
            tracing::debug!(source_key = %source_key, "skipping known grade entry");
        }
    }

    tracing::info!(path = %csv_path.display(), rows = rows.len(), inserted, "imported grades");
    Ok(inserted)
}

/// Postgres-backed grade storage.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl GradeRepository for PgRepository {
    async fn student(&self, email: &str) -> anyhow::Result<Option<Student>> {
        let row = sqlx::query(
            "SELECT id, full_name, email, grade_level FROM sige_movil.students WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Student {
            id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            grade_level: row.get("grade_level"),
        }))
    }

    async fn grade_entries(&self, email: &str) -> anyhow::Result<Vec<GradeEntry>> {
        let records = sqlx::query(
            "SELECT g.source_key, g.subject, g.assessment_type, g.title, g.score, \
             g.recorded_on, g.period, g.weight \
             FROM sige_movil.grade_entries g \
             JOIN sige_movil.students s ON s.id = g.student_id \
             WHERE s.email = $1 \
             ORDER BY g.seq",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(records.len());
        for row in records {
            let assessment_type: String = row.get("assessment_type");
            entries.push(GradeEntry {
                id: row.get("source_key"),
                subject: row.get("subject"),
                assessment_type: assessment_type.parse()?,
                title: row.get("title"),
                score: row.get("score"),
                date: row.get("recorded_on"),
                period: row.get("period"),
                weight: row.get("weight"),
            });
        }

        tracing::debug!(email, count = entries.len(), "loaded grades from postgres");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_keys_are_scoped_per_student() {
        let first = import_source_key("ana@sige.edu", "1");
        let second = import_source_key("carlos@sige.edu", "1");

        assert_eq!(first, "import:ana@sige.edu:1");
        assert_ne!(first, second);
        assert_eq!(import_source_key("ana@sige.edu", " 1 "), first);
    }

    #[test]
    fn import_keys_never_match_seed_keys() {
        let key = import_source_key(repository::DEMO_EMAIL, "seed-3");
        assert!(key.starts_with("import:"));
        assert_ne!(key, "seed-3");
    }

    #[test]
    fn blank_ids_get_fresh_keys() {
        let first = import_source_key("ana@sige.edu", "");
        let second = import_source_key("ana@sige.edu", "  ");
        assert!(first.starts_with("import:ana@sige.edu:"));
        assert_ne!(first, second);
    }
}

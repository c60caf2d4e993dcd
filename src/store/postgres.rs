use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ListQuery, MoodStore};
use crate::error::{AppError, AppResult};
use crate::models::mood::{MoodEntry, NewMoodEntry, UpsertOutcome};

// `xmax = 0` only holds for a freshly inserted row version, which is how the
// conflict path is told apart from the insert path in a single round trip.
// GREATEST keeps updated_at >= created_at when a racing insert committed
// with a later transaction timestamp than ours.
const UPSERT_SQL: &str = r#"
    INSERT INTO mood_entries (id, entry_date, mood, note)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (entry_date) DO UPDATE SET
        mood = EXCLUDED.mood,
        note = EXCLUDED.note,
        updated_at = GREATEST(NOW(), mood_entries.created_at)
    RETURNING id, entry_date, mood, note, created_at, updated_at, (xmax = 0) AS inserted
"#;

const LIST_SQL: &str = r#"
    SELECT id, entry_date, mood, note, created_at, updated_at
    FROM mood_entries
    WHERE ($1::date IS NULL OR entry_date >= $1)
      AND ($2::date IS NULL OR entry_date <= $2)
    ORDER BY entry_date ASC
    LIMIT $3
"#;

const PAGE_SQL: &str = r#"
    SELECT id, entry_date, mood, note, created_at, updated_at
    FROM mood_entries
    WHERE ($1::date IS NULL OR entry_date > $1)
    ORDER BY entry_date ASC
    LIMIT $2
"#;

#[derive(Debug, FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    entry: MoodEntry,
    inserted: bool,
}

#[derive(Clone)]
pub struct PgMoodStore {
    pool: PgPool,
}

impl PgMoodStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MoodStore for PgMoodStore {
    async fn upsert(&self, entry: &NewMoodEntry) -> AppResult<UpsertOutcome> {
        let row = sqlx::query_as::<_, UpsertRow>(UPSERT_SQL)
            .bind(Uuid::new_v4())
            .bind(entry.date)
            .bind(entry.mood)
            .bind(&entry.note)
            .fetch_one(&self.pool)
            .await?;

        Ok(UpsertOutcome {
            entry: row.entry,
            created: row.inserted,
        })
    }

    async fn list(&self, query: &ListQuery) -> AppResult<Vec<MoodEntry>> {
        let entries = sqlx::query_as::<_, MoodEntry>(LIST_SQL)
            .bind(query.start)
            .bind(query.end)
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn page_after(&self, after: Option<NaiveDate>, size: i64) -> AppResult<Vec<MoodEntry>> {
        let entries = sqlx::query_as::<_, MoodEntry>(PAGE_SQL)
            .bind(after)
            .bind(size)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let id = Uuid::parse_str(id).map_err(|_| AppError::InvalidId("Invalid id".into()))?;

        let result = sqlx::query("DELETE FROM mood_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

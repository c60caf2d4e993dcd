use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ListQuery, MoodStore};
use crate::error::{AppError, AppResult};
use crate::models::mood::{MoodEntry, NewMoodEntry, UpsertOutcome};

/// In-process store for single-instance runs without Postgres.
/// Keyed by date, so the map itself enforces one entry per day.
#[derive(Default)]
pub struct MemoryMoodStore {
    entries: Mutex<BTreeMap<NaiveDate, MoodEntry>>,
}

impl MemoryMoodStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MoodStore for MemoryMoodStore {
    async fn upsert(&self, entry: &NewMoodEntry) -> AppResult<UpsertOutcome> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();

        let outcome = match entries.get_mut(&entry.date) {
            Some(existing) => {
                existing.mood = entry.mood;
                existing.note = entry.note.clone();
                existing.updated_at = now.max(existing.created_at);
                UpsertOutcome {
                    entry: existing.clone(),
                    created: false,
                }
            }
            None => {
                let created = MoodEntry {
                    id: Uuid::new_v4(),
                    date: entry.date,
                    mood: entry.mood,
                    note: entry.note.clone(),
                    created_at: now,
                    updated_at: now,
                };
                entries.insert(entry.date, created.clone());
                UpsertOutcome {
                    entry: created,
                    created: true,
                }
            }
        };

        Ok(outcome)
    }

    async fn list(&self, query: &ListQuery) -> AppResult<Vec<MoodEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .values()
            .filter(|e| query.contains(e.date))
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn page_after(&self, after: Option<NaiveDate>, size: i64) -> AppResult<Vec<MoodEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .values()
            .filter(|e| after.map_or(true, |a| e.date > a))
            .take(size.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let id = Uuid::parse_str(id).map_err(|_| AppError::InvalidId("Invalid id".into()))?;

        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| e.id != id);
        Ok(entries.len() < before)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

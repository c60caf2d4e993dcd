//! Mood entry persistence.
//!
//! `MoodStore` is the capability set the API depends on: a conditional
//! upsert keyed by date, a sorted range query, keyset paging for export,
//! and delete by id. `PgMoodStore` is the production engine;
//! `MemoryMoodStore` backs local runs without a database and the tests.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::config::DEFAULT_LIST_LIMIT;
use crate::error::{AppError, AppResult};
use crate::models::mood::{MoodEntry, NewMoodEntry, UpsertOutcome};

pub use memory::MemoryMoodStore;
pub use postgres::PgMoodStore;

const EXPORT_PAGE_SIZE: i64 = 500;

#[async_trait]
pub trait MoodStore: Send + Sync {
    /// Inserts or replaces the entry for `entry.date` as one atomic step.
    async fn upsert(&self, entry: &NewMoodEntry) -> AppResult<UpsertOutcome>;

    /// Entries within the inclusive range, ascending by date, at most `query.limit`.
    async fn list(&self, query: &ListQuery) -> AppResult<Vec<MoodEntry>>;

    /// Up to `size` entries with a date strictly after `after`, ascending.
    async fn page_after(&self, after: Option<NaiveDate>, size: i64) -> AppResult<Vec<MoodEntry>>;

    /// Fails with `InvalidId` for malformed ids. `Ok(false)` when nothing matched.
    async fn delete(&self, id: &str) -> AppResult<bool>;

    async fn ping(&self) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub limit: i64,
}

impl ListQuery {
    pub fn new(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        requested_limit: Option<i64>,
        max_limit: i64,
    ) -> Self {
        Self {
            start,
            end,
            limit: clamp_limit(requested_limit, max_limit),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Out-of-range limits are clamped, never rejected.
pub fn clamp_limit(requested: Option<i64>, max_limit: i64) -> i64 {
    requested
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, max_limit.max(1))
}

/// Every entry, ascending by date. The first page is read before this
/// returns, so an unreachable store fails here instead of mid-stream; later
/// pages are fetched lazily as the stream is polled. Each call starts over
/// from the earliest date.
pub async fn export_all(
    store: Arc<dyn MoodStore>,
) -> AppResult<BoxStream<'static, AppResult<MoodEntry>>> {
    export_paged(store, EXPORT_PAGE_SIZE).await
}

type Cursor = Option<(Arc<dyn MoodStore>, Option<NaiveDate>, i64)>;

async fn export_paged(
    store: Arc<dyn MoodStore>,
    page_size: i64,
) -> AppResult<BoxStream<'static, AppResult<MoodEntry>>> {
    let first = store.page_after(None, page_size).await?;
    let cursor = cursor_after(store, &first, page_size);

    let rest = stream::try_unfold(cursor, next_page)
        .map_ok(|page| stream::iter(page.into_iter().map(Ok::<_, AppError>)))
        .try_flatten();

    Ok(stream::iter(first.into_iter().map(Ok::<_, AppError>))
        .chain(rest)
        .boxed())
}

/// Only a full page can have a successor.
fn cursor_after(store: Arc<dyn MoodStore>, page: &[MoodEntry], page_size: i64) -> Cursor {
    match page.last() {
        Some(last) if page.len() as i64 >= page_size => Some((store, Some(last.date), page_size)),
        _ => None,
    }
}

async fn next_page(cursor: Cursor) -> AppResult<Option<(Vec<MoodEntry>, Cursor)>> {
    let Some((store, after, page_size)) = cursor else {
        return Ok(None);
    };

    let page = store.page_after(after, page_size).await?;
    if page.is_empty() {
        return Ok(None);
    }

    let next = cursor_after(store, &page, page_size);
    Ok(Some((page, next)))
}

//! CSV rendering for `GET /api/moods/export`.
//!
//! Fields that contain a delimiter, a quote or a line break are quoted and
//! inner quotes doubled (RFC 4180), so notes survive a parse round trip.

use axum::body::Bytes;
use futures_util::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

use crate::error::{AppError, AppResult};
use crate::models::mood::MoodEntry;

pub const CSV_HEADER: [&str; 3] = ["date", "mood", "note"];
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CSV_DISPOSITION: &str = "attachment; filename=moods.csv";

fn encode_record(fields: &[&str]) -> AppResult<Bytes> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(64));
    writer
        .write_record(fields)
        .map_err(|e| AppError::Internal(e.into()))?;
    let buf = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.into_error().into()))?;
    Ok(Bytes::from(buf))
}

pub fn encode_entry(entry: &MoodEntry) -> AppResult<Bytes> {
    let date = entry.date.format("%Y-%m-%d").to_string();
    encode_record(&[
        date.as_str(),
        entry.mood.as_str(),
        entry.note.as_deref().unwrap_or(""),
    ])
}

/// Header line followed by one line per entry, in stream order.
pub fn csv_stream(
    entries: BoxStream<'static, AppResult<MoodEntry>>,
) -> impl Stream<Item = AppResult<Bytes>> + Send + 'static {
    let header = stream::once(async { encode_record(&CSV_HEADER) });
    let rows = entries.and_then(|entry| async move { encode_entry(&entry) });

    header
        .chain(rows)
        .inspect_err(|e| tracing::error!(error = %e, "CSV export aborted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mood::Mood;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn entry(date: (i32, u32, u32), mood: Mood, note: Option<&str>) -> MoodEntry {
        let now = Utc::now();
        MoodEntry {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            mood,
            note: note.map(String::from),
            created_at: now,
            updated_at: now,
        }
    }

    async fn render(entries: Vec<MoodEntry>) -> String {
        let source = stream::iter(entries.into_iter().map(Ok::<_, AppError>)).boxed();
        let chunks: Vec<Bytes> = csv_stream(source)
            .try_collect()
            .await
            .unwrap();
        chunks
            .iter()
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_plain_rows_are_unquoted() {
        let out = render(vec![
            entry((2024, 1, 1), Mood::Happy, Some("gym")),
            entry((2024, 1, 2), Mood::Sad, None),
        ])
        .await;
        assert_eq!(out, "date,mood,note\n2024-01-01,happy,gym\n2024-01-02,sad,\n");
    }

    #[tokio::test]
    async fn test_empty_export_is_header_only() {
        assert_eq!(render(vec![]).await, "date,mood,note\n");
    }

    #[tokio::test]
    async fn test_note_round_trips_through_csv_parser() {
        let tricky = [
            "hello, world\nbye",
            "she said \"hi\"",
            "line one\r\nline two",
            "",
            ",,,",
        ];
        let entries: Vec<MoodEntry> = tricky
            .iter()
            .enumerate()
            .map(|(i, note)| entry((2024, 5, i as u32 + 1), Mood::Ecstatic, Some(*note)))
            .collect();

        let out = render(entries).await;
        let mut reader = csv::Reader::from_reader(out.as_bytes());
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["date", "mood", "note"])
        );

        let notes: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[2].to_string())
            .collect();
        assert_eq!(notes, tricky);
    }

    #[test]
    fn test_quoted_field_shape() {
        let bytes = encode_entry(&entry((2024, 1, 1), Mood::Down, Some("a,\"b\""))).unwrap();
        assert_eq!(&bytes[..], b"2024-01-01,down,\"a,\"\"b\"\"\"\n");
    }
}

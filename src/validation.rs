//! Entry validation: turns a raw `UpsertMoodRequest` into a `NewMoodEntry`.
//!
//! Field rules are declared on the request with `validator` derives; the
//! custom checks live here so the write path and tests share them.

use std::borrow::Cow;

use chrono::NaiveDate;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult};
use crate::models::mood::{Mood, NewMoodEntry, UpsertMoodRequest};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Strict `YYYY-MM-DD`. chrono alone would accept unpadded months and days.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn validate_date(value: &str) -> Result<(), ValidationError> {
    match parse_date(value) {
        Some(_) => Ok(()),
        None => {
            let mut err = ValidationError::new("date");
            err.message = Some(Cow::from("date must be YYYY-MM-DD"));
            Err(err)
        }
    }
}

pub fn validate_mood(value: &str) -> Result<(), ValidationError> {
    match value.parse::<Mood>() {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = ValidationError::new("mood");
            err.message = Some(Cow::from(format!("mood must be one of [{}]", Mood::allowed())));
            Err(err)
        }
    }
}

/// Validates the request and normalizes it. Pure; nothing is persisted here.
pub fn normalize(request: UpsertMoodRequest) -> AppResult<NewMoodEntry> {
    request
        .validate()
        .map_err(|errors| AppError::Validation(describe(&errors)))?;

    let date = parse_date(&request.date)
        .ok_or_else(|| AppError::Validation("date must be YYYY-MM-DD".into()))?;
    let mood = request
        .mood
        .parse::<Mood>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(NewMoodEntry {
        date,
        mood,
        note: request.note,
    })
}

/// Flattens field errors into one message, ordered by field name.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(date: &str, mood: &str, note: Option<&str>) -> UpsertMoodRequest {
        UpsertMoodRequest {
            date: date.into(),
            mood: mood.into(),
            note: note.map(String::from),
        }
    }

    #[test]
    fn test_normalize_valid_payload() {
        let entry = normalize(request("2024-01-01", "happy", Some("gym"))).unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(entry.mood, Mood::Happy);
        assert_eq!(entry.note.as_deref(), Some("gym"));
    }

    #[test]
    fn test_note_passes_through_unmodified() {
        let note = "  hello, world\nbye \"quoted\"  ";
        let entry = normalize(request("2024-02-29", "neutral", Some(note))).unwrap();
        assert_eq!(entry.note.as_deref(), Some(note));

        let entry = normalize(request("2024-02-29", "neutral", Some(""))).unwrap();
        assert_eq!(entry.note.as_deref(), Some(""));
    }

    #[test]
    fn test_malformed_dates_rejected() {
        for bad in [
            "2024-13-40",
            "not-a-date",
            "2023-02-29",
            "2024-1-01",
            "2024/01/01",
            "20240101",
            "",
            "2024-01-01T00:00:00",
            "+202-01-01",
        ] {
            let err = normalize(request(bad, "happy", None)).unwrap_err();
            match err {
                AppError::Validation(msg) => {
                    assert!(msg.starts_with("date:"), "{bad:?} gave {msg}")
                }
                other => panic!("{bad:?} gave unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_mood_lists_allowed_values() {
        let err = normalize(request("2024-01-01", "Happy", None)).unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.starts_with("mood:"));
                for mood in Mood::ALL {
                    assert!(msg.contains(mood.as_str()), "missing {mood} in {msg}");
                }
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_both_fields_reported_in_field_order() {
        let err = normalize(request("nope", "meh", None)).unwrap_err();
        match err {
            AppError::Validation(msg) => {
                let date_at = msg.find("date:").unwrap();
                let mood_at = msg.find("mood:").unwrap();
                assert!(date_at < mood_at);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_date_accepts_leap_day() {
        assert_eq!(
            parse_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }
}

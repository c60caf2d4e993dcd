use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "mood_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Ecstatic,
    Happy,
    Neutral,
    Sad,
    Down,
    Angry,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Ecstatic,
        Mood::Happy,
        Mood::Neutral,
        Mood::Sad,
        Mood::Down,
        Mood::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Ecstatic => "ecstatic",
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Down => "down",
            Mood::Angry => "angry",
        }
    }

    /// Comma-separated list of accepted keywords, in declaration order.
    pub fn allowed() -> String {
        Self::ALL
            .iter()
            .map(Mood::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMood(pub String);

impl fmt::Display for UnknownMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mood {:?}, expected one of {}", self.0, Mood::allowed())
    }
}

impl std::error::Error for UnknownMood {}

impl FromStr for Mood {
    type Err = UnknownMood;

    /// Case-exact: `"Happy"` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MoodEntry {
    pub id: Uuid,
    #[sqlx(rename = "entry_date")]
    pub date: NaiveDate,
    pub mood: Mood,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// POST /api/moods
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertMoodRequest {
    #[validate(custom = "crate::validation::validate_date")]
    pub date: String,

    #[validate(custom = "crate::validation::validate_mood")]
    pub mood: String,

    #[serde(default)]
    pub note: Option<String>,
}

/// Validated write payload. Only the validator builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMoodEntry {
    pub date: NaiveDate,
    pub mood: Mood,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub entry: MoodEntry,
    pub created: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpsertStatus {
    Created,
    Updated,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertMoodResponse {
    pub status: UpsertStatus,
    pub id: Uuid,
}

impl From<&UpsertOutcome> for UpsertMoodResponse {
    fn from(outcome: &UpsertOutcome) -> Self {
        Self {
            status: if outcome.created {
                UpsertStatus::Created
            } else {
                UpsertStatus::Updated
            },
            id: outcome.entry.id,
        }
    }
}

/// GET /api/moods
#[derive(Debug, Default, Deserialize)]
pub struct ListMoodsQuery {
    #[serde(default, deserialize_with = "blank_as_none_date")]
    pub start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none_date")]
    pub end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "saturating_limit")]
    pub limit: Option<i64>,
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// `?start=` means no bound.
fn blank_as_none_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| {
            s.parse::<NaiveDate>()
                .map_err(|_| de::Error::custom(format!("invalid date {s:?}, expected YYYY-MM-DD")))
        })
        .transpose()
}

/// Integers beyond `i64` saturate so the limit clamp still applies.
fn saturating_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| match s.parse::<i64>() {
            Ok(n) => Ok(n),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Ok(i64::MAX),
                IntErrorKind::NegOverflow => Ok(i64::MIN),
                _ => Err(de::Error::custom(format!("invalid limit {s:?}, expected an integer"))),
            },
        })
        .transpose()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoodListResponse {
    pub items: Vec<MoodEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_from_str_is_case_exact() {
        assert_eq!("happy".parse::<Mood>(), Ok(Mood::Happy));
        assert_eq!("angry".parse::<Mood>(), Ok(Mood::Angry));
        assert!("Happy".parse::<Mood>().is_err());
        assert!(" sad".parse::<Mood>().is_err());
        assert!("elated".parse::<Mood>().is_err());
    }

    #[test]
    fn test_unknown_mood_lists_allowed_set() {
        let err = "meh".parse::<Mood>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown mood \"meh\", expected one of ecstatic, happy, neutral, sad, down, angry"
        );
    }

    #[test]
    fn test_entry_serializes_date_as_iso() {
        let now = Utc::now();
        let entry = MoodEntry {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mood: Mood::Sad,
            note: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2024-01-01");
        assert_eq!(json["mood"], "sad");
        assert!(json["note"].is_null());
        assert!(json.get("created_at").is_some());
        assert!(json.get("updated_at").is_some());
    }

    #[test]
    fn test_upsert_response_status_strings() {
        let now = Utc::now();
        let outcome = UpsertOutcome {
            entry: MoodEntry {
                id: Uuid::new_v4(),
                date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
                mood: Mood::Happy,
                note: Some("gym".into()),
                created_at: now,
                updated_at: now,
            },
            created: false,
        };
        let json = serde_json::to_value(UpsertMoodResponse::from(&outcome)).unwrap();
        assert_eq!(json["status"], "updated");
        assert_eq!(json["id"], outcome.entry.id.to_string());
    }

    #[test]
    fn test_list_query_blank_bounds_are_absent() {
        let q: ListMoodsQuery =
            serde_json::from_str(r#"{"start":"","end":" ","limit":""}"#).unwrap();
        assert_eq!(q.start, None);
        assert_eq!(q.end, None);
        assert_eq!(q.limit, None);

        let q: ListMoodsQuery = serde_json::from_str(r#"{"start":"2024-01-05"}"#).unwrap();
        assert_eq!(q.start, NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn test_list_query_limit_saturates() {
        let q: ListMoodsQuery =
            serde_json::from_str(r#"{"limit":"99999999999999999999"}"#).unwrap();
        assert_eq!(q.limit, Some(i64::MAX));

        let q: ListMoodsQuery =
            serde_json::from_str(r#"{"limit":"-99999999999999999999"}"#).unwrap();
        assert_eq!(q.limit, Some(i64::MIN));

        assert!(serde_json::from_str::<ListMoodsQuery>(r#"{"limit":"lots"}"#).is_err());
        assert!(serde_json::from_str::<ListMoodsQuery>(r#"{"start":"soon"}"#).is_err());
    }

    #[test]
    fn test_upsert_request_note_is_optional() {
        let req: UpsertMoodRequest =
            serde_json::from_str(r#"{"date":"2024-01-01","mood":"happy"}"#).unwrap();
        assert!(req.note.is_none());
    }
}

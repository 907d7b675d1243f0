//! Session DTOs - Data Transfer Objects per sessioni di studio

use crate::entities::Session;
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// Formati naive accettati per `start_at`, interpretati come UTC
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Body della richiesta POST /groups/{group_id}/sessions
///
/// `start_at` resta un valore json grezzo: la validazione distingue campo mancante,
/// valore non interpretabile e istante nel passato.
#[derive(Deserialize, Debug, Validate)]
pub struct CreateSessionRequestDTO {
    #[serde(default)]
    pub start_at: Option<Value>,

    #[validate(length(max = 200, message = "Venue must be at most 200 characters"))]
    pub venue: Option<String>,

    #[validate(length(max = 200, message = "Topic must be at most 200 characters"))]
    pub topic: Option<String>,

    #[validate(range(min = 1, max = 1440, message = "Time goal must be between 1 and 1440 minutes"))]
    pub time_goal_minutes: Option<i32>,

    #[validate(length(max = 2000, message = "Content goal must be at most 2000 characters"))]
    pub content_goal: Option<String>,
}

/// DTO per creare una nuova sessione nello store (senza id e created_at)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateSessionDTO {
    pub group_id: i64,
    pub creator_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub topic: Option<String>,
    pub time_goal_minutes: Option<i32>,
    pub content_goal: Option<String>,
}

/// Le tre cause di rifiuto di `start_at`, ognuna con il proprio messaggio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAtError {
    Missing,
    Invalid,
    NotInFuture,
}

impl StartAtError {
    pub fn message(&self) -> &'static str {
        match self {
            StartAtError::Missing => "start_at is required",
            StartAtError::Invalid => "start_at is not a valid timestamp",
            StartAtError::NotInFuture => "start_at must be in the future",
        }
    }
}

/// Interpreta `start_at` e verifica che sia strettamente successivo a `now`.
///
/// L'istante viene troncato al millisecondo, la stessa precisione usata dal confronto dei conflitti.
pub fn parse_start_at(raw: Option<&Value>, now: DateTime<Utc>) -> Result<DateTime<Utc>, StartAtError> {
    let text = match raw {
        None | Some(Value::Null) => return Err(StartAtError::Missing),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(StartAtError::Missing),
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(StartAtError::Invalid),
    };

    let parsed = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|naive| naive.and_utc())
        })
        .ok_or(StartAtError::Invalid)?
        .trunc_subsecs(3);

    if parsed <= now {
        return Err(StartAtError::NotInFuture);
    }

    Ok(parsed)
}

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionDTO {
    pub id: i64,
    pub group_id: i64,
    pub creator_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub topic: Option<String>,
    pub time_goal_minutes: Option<i32>,
    pub content_goal: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionDTO {
    fn from(value: Session) -> Self {
        Self {
            id: value.id,
            group_id: value.group_id,
            creator_id: value.creator_id,
            start_at: value.start_at,
            venue: value.venue,
            topic: value.topic,
            time_goal_minutes: value.time_goal_minutes,
            content_goal: value.content_goal,
            created_at: value.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub session: SessionDTO,
}

impl SessionResponse {
    pub fn new(session: SessionDTO) -> Self {
        Self { session }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionDTO>,
}

/// Risposta generica di conferma
#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_start_at() {
        assert_eq!(parse_start_at(None, now()), Err(StartAtError::Missing));
        assert_eq!(parse_start_at(Some(&Value::Null), now()), Err(StartAtError::Missing));
        assert_eq!(parse_start_at(Some(&json!("  ")), now()), Err(StartAtError::Missing));
    }

    #[test]
    fn test_unparseable_start_at() {
        assert_eq!(parse_start_at(Some(&json!("tomorrow")), now()), Err(StartAtError::Invalid));
        assert_eq!(parse_start_at(Some(&json!(1234)), now()), Err(StartAtError::Invalid));
        assert_eq!(parse_start_at(Some(&json!("2030-13-40T10:00:00Z")), now()), Err(StartAtError::Invalid));
    }

    #[test]
    fn test_past_and_present_start_at() {
        assert_eq!(
            parse_start_at(Some(&json!("2029-12-31T10:00:00Z")), now()),
            Err(StartAtError::NotInFuture)
        );
        // l'istante corrente non è "strettamente futuro"
        assert_eq!(
            parse_start_at(Some(&json!("2030-01-01T12:00:00Z")), now()),
            Err(StartAtError::NotInFuture)
        );
    }

    #[test]
    fn test_accepted_formats() {
        let expected = Utc.with_ymd_and_hms(2099, 12, 25, 10, 0, 0).unwrap();
        for raw in [
            "2099-12-25T10:00:00Z",
            "2099-12-25T11:00:00+01:00",
            "2099-12-25T10:00:00",
            "2099-12-25 10:00",
            "2099-12-25T10:00",
        ] {
            assert_eq!(parse_start_at(Some(&json!(raw)), now()), Ok(expected), "format {raw}");
        }
    }

    #[test]
    fn test_truncated_to_milliseconds() {
        let parsed = parse_start_at(Some(&json!("2099-12-25T10:00:00.123456Z")), now()).unwrap();
        assert_eq!(parsed.timestamp_subsec_micros(), 123_000);
    }

    #[test]
    fn test_validation_of_optional_fields() {
        let body: CreateSessionRequestDTO = serde_json::from_value(json!({
            "start_at": "2099-12-25T10:00:00Z",
            "time_goal_minutes": 0
        }))
        .unwrap();
        assert!(body.validate().is_err());

        let body: CreateSessionRequestDTO = serde_json::from_value(json!({
            "start_at": "2099-12-25T10:00:00Z",
            "venue": "Library, room 2",
            "time_goal_minutes": 90
        }))
        .unwrap();
        assert!(body.validate().is_ok());
    }
}

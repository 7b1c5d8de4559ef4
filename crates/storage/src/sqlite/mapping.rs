use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::repository::{AttemptRecord, QuestionRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn uuid_from_text(field: &'static str, raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i64_from_u64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_question_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuestionRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;

    Ok(QuestionRecord {
        id: uuid_from_text("question id", &id)?,
        course_code: row.try_get("course_code").map_err(ser)?,
        question_text: row.try_get("question_text").map_err(ser)?,
        option_a: row.try_get("option_a").map_err(ser)?,
        option_b: row.try_get("option_b").map_err(ser)?,
        option_c: row.try_get("option_c").map_err(ser)?,
        option_d: row.try_get("option_d").map_err(ser)?,
        correct_answer: row.try_get("correct_answer").map_err(ser)?,
        topic: row.try_get("topic").map_err(ser)?,
        difficulty_level: row.try_get("difficulty_level").map_err(ser)?,
        created_at: Some(created_at),
    })
}

pub(crate) fn map_attempt_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<AttemptRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let user_id: Option<String> = row.try_get("user_id").map_err(ser)?;
    let time_taken: Option<i64> = row.try_get("time_taken").map_err(ser)?;
    let questions_data: String = row.try_get("questions_data").map_err(ser)?;

    Ok(AttemptRecord {
        id: uuid_from_text("attempt id", &id)?,
        user_id: user_id
            .as_deref()
            .map(|raw| uuid_from_text("user id", raw))
            .transpose()?,
        course_code: row.try_get("course_code").map_err(ser)?,
        started_at: row.try_get("started_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        score: u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        time_taken: time_taken
            .map(|v| u64_from_i64("time_taken", v))
            .transpose()?,
        status: row.try_get("status").map_err(ser)?,
        questions_data: serde_json::from_str(&questions_data).map_err(ser)?,
    })
}

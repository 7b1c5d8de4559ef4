use chrono::Utc;
use quiz_core::model::{CourseCode, Question};

use super::SqliteRepository;
use super::mapping::map_question_row;
use crate::repository::{QuestionRecord, QuestionRepository, StorageError, valid_questions};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn questions_for_course(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<Question>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r"
            SELECT
                id, course_code, question_text, option_a, option_b, option_c, option_d,
                correct_answer, topic, difficulty_level, created_at
            FROM questions
            WHERE course_code = ?1
            ORDER BY created_at, id
            LIMIT ?2
            ",
        )
        .bind(course.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(valid_questions(course, rows.iter().map(map_question_row)))
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let record = QuestionRecord::from_question(question);
        sqlx::query(
            r"
            INSERT INTO questions (
                id, course_code, question_text, option_a, option_b, option_c, option_d,
                correct_answer, topic, difficulty_level, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                -- created_at keeps the original insert time
                course_code = excluded.course_code,
                question_text = excluded.question_text,
                option_a = excluded.option_a,
                option_b = excluded.option_b,
                option_c = excluded.option_c,
                option_d = excluded.option_d,
                correct_answer = excluded.correct_answer,
                topic = excluded.topic,
                difficulty_level = excluded.difficulty_level
            ",
        )
        .bind(record.id.to_string())
        .bind(record.course_code)
        .bind(record.question_text)
        .bind(record.option_a)
        .bind(record.option_b)
        .bind(record.option_c)
        .bind(record.option_d)
        .bind(record.correct_answer)
        .bind(record.topic)
        .bind(record.difficulty_level)
        .bind(record.created_at.unwrap_or_else(Utc::now))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{OptionLabel, QuestionId};

    #[tokio::test]
    async fn malformed_rows_do_not_hide_valid_ones() {
        let repo = SqliteRepository::in_memory("memdb_malformed_questions")
            .await
            .unwrap();
        let course = CourseCode::new("IFT212.2").unwrap();
        let valid = Question::new(
            QuestionId::generate(),
            course.clone(),
            "Which gate outputs 1 only when all inputs are 1?",
            ["AND".into(), "OR".into(), "XOR".into(), "NOT".into()],
            OptionLabel::A,
            Some("Logic Gates".into()),
            None,
        )
        .unwrap();
        repo.upsert_question(&valid).await.unwrap();

        let malformed = [
            ("not-a-uuid", "Readable text"),
            ("0b6f4a50-64a6-4d37-9f40-2f7f3c5e1a21", "   "),
        ];
        for (id, text) in malformed {
            sqlx::query(
                r"
                INSERT INTO questions (
                    id, course_code, question_text, option_a, option_b, option_c, option_d,
                    correct_answer, topic, difficulty_level, created_at
                )
                VALUES (?1, 'IFT212.2', ?2, 'a', 'b', 'c', 'd', 'B', NULL, NULL, ?3)
                ",
            )
            .bind(id)
            .bind(text)
            .bind(Utc::now())
            .execute(&repo.pool)
            .await
            .unwrap();
        }

        let fetched = repo.questions_for_course(&course, 50).await.unwrap();

        assert_eq!(fetched, vec![valid]);
    }
}

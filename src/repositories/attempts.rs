use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{ExamQuestion, QuizAttempt, SavedAnswer};

pub(crate) const COLUMNS: &str = "\
    id, quiz_id, user_id, started_at, submitted_at, score, exam_data, \
    answers, last_auto_save, created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_active(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
    user_id: &str,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts \
         WHERE quiz_id = $1 AND user_id = $2 AND submitted_at IS NULL"
    ))
    .bind(quiz_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateAttempt<'a> {
    pub id: &'a str,
    pub quiz_id: &'a str,
    pub user_id: &'a str,
    pub started_at: time::PrimitiveDateTime,
    pub exam_data: Json<Vec<ExamQuestion>>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

/// Insert a fresh attempt. The partial unique index on unsubmitted attempts
/// turns concurrent starts into a no-op for the loser, which then re-reads
/// the winner's row.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAttempt<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO quiz_attempts (
            id, quiz_id, user_id, started_at, exam_data, answers, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,'[]'::jsonb,$6,$7)
        ON CONFLICT DO NOTHING",
    )
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.user_id)
    .bind(params.started_at)
    .bind(params.exam_data)
    .bind(params.created_at)
    .bind(params.updated_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Overwrite the saved answers if the attempt is still open. Returns false
/// when a concurrent submit already closed it.
pub(crate) async fn save_answers(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    answers: Json<Vec<SavedAnswer>>,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_attempts SET answers = $1, last_auto_save = $2, updated_at = $2
         WHERE id = $3 AND submitted_at IS NULL",
    )
    .bind(answers)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Close the attempt and record the score. The `submitted_at IS NULL` guard
/// makes a second submit lose the race instead of overwriting the first.
pub(crate) async fn submit(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    answers: Json<Vec<SavedAnswer>>,
    score: i32,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_attempts SET answers = $1, score = $2, submitted_at = $3, updated_at = $3
         WHERE id = $4 AND submitted_at IS NULL",
    )
    .bind(answers)
    .bind(score)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list(
    pool: &PgPool,
    quiz_id: Option<&str>,
    user_id: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE TRUE"
    ));

    if let Some(quiz_id) = quiz_id {
        builder.push(" AND quiz_id = ");
        builder.push_bind(quiz_id);
    }
    if let Some(user_id) = user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);
    }

    builder.push(" ORDER BY started_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<QuizAttempt>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    quiz_id: Option<&str>,
    user_id: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM quiz_attempts WHERE TRUE");

    if let Some(quiz_id) = quiz_id {
        builder.push(" AND quiz_id = ");
        builder.push_bind(quiz_id);
    }
    if let Some(user_id) = user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

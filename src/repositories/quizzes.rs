use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{Choice, Question, Quiz};

pub(crate) const COLUMNS: &str = "\
    id, title, description, exam_question_count, randomize_questions, \
    randomize_choices, questions_per_page, created_by, created_at, updated_at";

const QUESTION_COLUMNS: &str = "id, quiz_id, text, order_index, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<Quiz>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM quizzes ORDER BY created_at DESC OFFSET "
    ));
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Quiz>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
        .fetch_one(pool)
        .await
}

pub(crate) async fn count_questions(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn list_questions(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE quiz_id = $1 ORDER BY order_index"
    ))
    .bind(quiz_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_choices_for_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
) -> Result<Vec<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>(
        "SELECT c.id, c.question_id, c.text, c.is_correct, c.order_index \
         FROM choices c \
         JOIN questions q ON q.id = c.question_id \
         WHERE q.quiz_id = $1 \
         ORDER BY q.order_index, c.order_index",
    )
    .bind(quiz_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct CreateQuiz<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub exam_question_count: i32,
    pub randomize_questions: bool,
    pub randomize_choices: bool,
    pub questions_per_page: i32,
    pub created_by: &'a str,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuiz<'_>,
) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            id, title, description, exam_question_count, randomize_questions,
            randomize_choices, questions_per_page, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.exam_question_count)
    .bind(params.randomize_questions)
    .bind(params.randomize_choices)
    .bind(params.questions_per_page)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateQuiz {
    pub title: Option<String>,
    pub description: Option<String>,
    pub exam_question_count: Option<i32>,
    pub randomize_questions: Option<bool>,
    pub randomize_choices: Option<bool>,
    pub questions_per_page: Option<i32>,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateQuiz,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            exam_question_count = COALESCE($3, exam_question_count),
            randomize_questions = COALESCE($4, randomize_questions),
            randomize_choices = COALESCE($5, randomize_choices),
            questions_per_page = COALESCE($6, questions_per_page),
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.exam_question_count)
    .bind(params.randomize_questions)
    .bind(params.randomize_choices)
    .bind(params.questions_per_page)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct InsertQuestion<'a> {
    pub id: &'a str,
    pub quiz_id: &'a str,
    pub text: &'a str,
    pub order_index: i32,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn insert_question(
    executor: impl sqlx::PgExecutor<'_>,
    params: InsertQuestion<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO questions (id, quiz_id, text, order_index, created_at)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.text)
    .bind(params.order_index)
    .bind(params.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) struct InsertChoice<'a> {
    pub id: &'a str,
    pub question_id: &'a str,
    pub text: &'a str,
    pub is_correct: bool,
    pub order_index: i32,
}

pub(crate) async fn insert_choice(
    executor: impl sqlx::PgExecutor<'_>,
    params: InsertChoice<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO choices (id, question_id, text, is_correct, order_index)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(params.id)
    .bind(params.question_id)
    .bind(params.text)
    .bind(params.is_correct)
    .bind(params.order_index)
    .execute(executor)
    .await?;
    Ok(())
}

/// Questions cascade to choices, so a single delete clears both levels.
pub(crate) async fn delete_questions(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

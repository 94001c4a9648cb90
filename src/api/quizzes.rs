use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{default_limit, PaginatedResponse, QuestionPage};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Choice, Quiz};
use crate::repositories;
use crate::schemas::quiz::{
    QuestionCreate, QuestionResponse, QuizCreate, QuizDetailResponse, QuizResponse, QuizUpdate,
    REQUIRED_NUM_CHOICES,
};

#[derive(Debug, Deserialize)]
pub(crate) struct QuizListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionPageQuery {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    #[serde(alias = "pageSize")]
    page_size: Option<usize>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quizzes).post(create_quiz))
        .route("/:quiz_id", get(get_quiz).put(update_quiz).delete(delete_quiz))
}

async fn list_quizzes(
    Query(params): Query<QuizListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<QuizResponse>>, ApiError> {
    let quizzes = repositories::quizzes::list(state.db(), params.skip, params.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;
    let total_count = repositories::quizzes::count(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count quizzes"))?;

    let mut items = Vec::with_capacity(quizzes.len());
    for quiz in quizzes {
        let question_count = repositories::quizzes::count_questions(state.db(), &quiz.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
        items.push(QuizResponse::from_db(quiz, question_count));
    }

    Ok(Json(PaginatedResponse { items, total_count, skip: params.skip, limit: params.limit }))
}

async fn get_quiz(
    Path(quiz_id): Path<String>,
    Query(params): Query<QuestionPageQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizDetailResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;

    let questions = repositories::quizzes::list_questions(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let choices = repositories::quizzes::list_choices_for_quiz(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch choices"))?;

    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(quiz.questions_per_page.max(1) as usize);
    let view = QuestionPage::build(questions.len(), page, page_size)
        .map_err(ApiError::BadRequest)?;

    let mut by_question: HashMap<String, Vec<Choice>> = HashMap::new();
    for choice in choices {
        by_question.entry(choice.question_id.clone()).or_default().push(choice);
    }

    let question_count = questions.len() as i64;
    let page_questions = questions[view.start..view.end]
        .iter()
        .map(|question| {
            QuestionResponse::from_db(
                question.clone(),
                by_question.remove(&question.id).unwrap_or_default(),
                user.is_admin,
            )
        })
        .collect();

    Ok(Json(QuizDetailResponse {
        quiz: QuizResponse::from_db(quiz, question_count),
        questions: page_questions,
    }))
}

async fn create_quiz(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_questions(&payload.questions)?;

    let now = primitive_now_utc();
    let quiz_id = Uuid::new_v4().to_string();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let quiz = repositories::quizzes::create(
        &mut *tx,
        repositories::quizzes::CreateQuiz {
            id: &quiz_id,
            title: &payload.title,
            description: payload.description.as_deref(),
            exam_question_count: payload.exam_question_count,
            randomize_questions: payload.randomize_questions,
            randomize_choices: payload.randomize_choices,
            questions_per_page: payload.questions_per_page,
            created_by: &admin.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    let question_count = payload.questions.len() as i64;
    insert_questions(&mut tx, &quiz_id, &payload.questions, now).await?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit quiz"))?;

    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz, question_count))))
}

async fn update_quiz(
    Path(quiz_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuizUpdate>,
) -> Result<Json<QuizResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if let Some(questions) = payload.questions.as_deref() {
        validate_questions(questions)?;
    }

    fetch_quiz(&state, &quiz_id).await?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let quiz = repositories::quizzes::update(
        &mut *tx,
        &quiz_id,
        repositories::quizzes::UpdateQuiz {
            title: payload.title,
            description: payload.description,
            exam_question_count: payload.exam_question_count,
            randomize_questions: payload.randomize_questions,
            randomize_choices: payload.randomize_choices,
            questions_per_page: payload.questions_per_page,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?
    .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    if let Some(questions) = payload.questions.as_ref() {
        repositories::quizzes::delete_questions(&mut *tx, &quiz_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to replace questions"))?;
        insert_questions(&mut tx, &quiz_id, questions, now).await?;
    }

    let question_count = repositories::quizzes::count_questions(&mut *tx, &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit quiz update"))?;

    Ok(Json(QuizResponse::from_db(quiz, question_count)))
}

async fn delete_quiz(
    Path(quiz_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::quizzes::delete_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;

    if !deleted {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_quiz(state: &AppState, quiz_id: &str) -> Result<Quiz, ApiError> {
    repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
}

fn validate_questions(questions: &[QuestionCreate]) -> Result<(), ApiError> {
    if questions.is_empty() {
        return Err(ApiError::BadRequest("a quiz requires at least one question".to_string()));
    }
    for (index, question) in questions.iter().enumerate() {
        if question.choices.len() != REQUIRED_NUM_CHOICES {
            return Err(ApiError::BadRequest(format!(
                "question {} must have exactly {} choices",
                index + 1,
                REQUIRED_NUM_CHOICES
            )));
        }
        if question.correct_count() != 1 {
            return Err(ApiError::BadRequest(format!(
                "question {} must have exactly one correct choice",
                index + 1
            )));
        }
    }
    Ok(())
}

async fn insert_questions(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    quiz_id: &str,
    questions: &[QuestionCreate],
    now: time::PrimitiveDateTime,
) -> Result<(), ApiError> {
    for (question_index, question) in questions.iter().enumerate() {
        let question_id = Uuid::new_v4().to_string();
        repositories::quizzes::insert_question(
            &mut **tx,
            repositories::quizzes::InsertQuestion {
                id: &question_id,
                quiz_id,
                text: &question.text,
                order_index: question_index as i32,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to insert question"))?;

        for (choice_index, choice) in question.choices.iter().enumerate() {
            repositories::quizzes::insert_choice(
                &mut **tx,
                repositories::quizzes::InsertChoice {
                    id: &Uuid::new_v4().to_string(),
                    question_id: &question_id,
                    text: &choice.text,
                    is_correct: choice.is_correct,
                    order_index: choice_index as i32,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to insert choice"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;

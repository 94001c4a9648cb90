use std::collections::HashMap;

use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::thread_rng;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{default_limit, PaginatedResponse, QuestionPage};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Quiz, QuizAttempt, SavedAnswer, User};
use crate::repositories;
use crate::schemas::attempt::{
    AttemptPageResponse, AttemptQuestionView, AttemptReviewResponse, AttemptSummaryResponse,
    AutosavePayload, AutosaveResponse, StartAttemptResponse, SubmitResponse,
};
use crate::services::{exam_snapshot, grading};

/// Form keys on final submit look like `answer_<question_id>`.
const ANSWER_FIELD_PREFIX: &str = "answer_";

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptPageQuery {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    #[serde(alias = "pageSize")]
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    #[serde(alias = "quizId")]
    quiz_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "userId")]
    user_id: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/quizzes/:quiz_id/attempt", get(attempt_page).post(start_attempt))
        .route("/quizzes/:quiz_id/autosave", post(autosave))
        .route("/quizzes/:quiz_id/submit", post(submit))
        .route("/attempts", get(list_attempts))
        .route("/attempts/:attempt_id", get(review_attempt))
}

async fn start_attempt(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StartAttemptResponse>), ApiError> {
    if user.is_admin {
        return Err(ApiError::Forbidden("Administrators cannot take quizzes"));
    }

    let quiz = fetch_quiz(&state, &quiz_id).await?;

    if let Some(existing) = find_active(&state, &quiz.id, &user.id).await? {
        return Ok((StatusCode::OK, Json(start_response(existing, true))));
    }

    let questions = repositories::quizzes::list_questions(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    if questions.is_empty() {
        return Err(ApiError::BadRequest("Quiz has no questions".to_string()));
    }

    let choices = repositories::quizzes::list_choices_for_quiz(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch choices"))?;

    let exam_data = exam_snapshot::build_exam_data(&quiz, &questions, &choices, &mut thread_rng());
    if exam_data.is_empty() {
        return Err(ApiError::BadRequest("Quiz has no gradable questions".to_string()));
    }

    let now = primitive_now_utc();
    let attempt_id = Uuid::new_v4().to_string();
    let created = repositories::attempts::create(
        state.db(),
        repositories::attempts::CreateAttempt {
            id: &attempt_id,
            quiz_id: &quiz.id,
            user_id: &user.id,
            started_at: now,
            exam_data: SqlJson(exam_data),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

    if !created {
        // Lost a concurrent start; the winner's attempt is the active one.
        let existing = find_active(&state, &quiz.id, &user.id)
            .await?
            .ok_or_else(|| ApiError::Conflict("Attempt already submitted".to_string()))?;
        return Ok((StatusCode::OK, Json(start_response(existing, true))));
    }

    let attempt = repositories::attempts::find_by_id(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::Internal("Attempt vanished after insert".to_string()))?;

    metrics::counter!("quiz_attempts_started_total").increment(1);

    Ok((StatusCode::CREATED, Json(start_response(attempt, false))))
}

async fn attempt_page(
    Path(quiz_id): Path<String>,
    Query(params): Query<AttemptPageQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptPageResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;

    let attempt = find_active(&state, &quiz.id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No active attempt for this quiz".to_string()))?;

    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(quiz.questions_per_page.max(1) as usize);
    let view = QuestionPage::build(attempt.exam_data.0.len(), page, page_size)
        .map_err(ApiError::BadRequest)?;

    let questions = attempt.exam_data.0[view.start..view.end]
        .iter()
        .enumerate()
        .map(|(local, question)| AttemptQuestionView::from_snapshot(question, view.ordinal(local)))
        .collect();

    Ok(Json(AttemptPageResponse {
        attempt_id: attempt.id,
        quiz_id: attempt.quiz_id,
        started_at: format_primitive(attempt.started_at),
        questions,
        answers: attempt.answers.0,
        pagination: view.meta(),
    }))
}

async fn autosave(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AutosavePayload>,
) -> Result<Json<AutosaveResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    let attempt = require_open_attempt(&state, &quiz, &user).await?;

    let incoming: Vec<SavedAnswer> =
        payload.answers.into_iter().map(|answer| answer.into_db()).collect();
    let merged = grading::retain_known_questions(
        &attempt.exam_data.0,
        grading::merge_answers(&attempt.answers.0, &incoming),
    );

    let now = primitive_now_utc();
    let saved = repositories::attempts::save_answers(state.db(), &attempt.id, SqlJson(merged), now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to save answers"))?;

    if !saved {
        return Err(ApiError::Conflict("Attempt already submitted".to_string()));
    }

    Ok(Json(AutosaveResponse { status: "saved".to_string(), saved_at: format_primitive(now) }))
}

async fn submit(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    let attempt = require_open_attempt(&state, &quiz, &user).await?;

    let incoming = parse_answer_form(&form);
    let merged = grading::retain_known_questions(
        &attempt.exam_data.0,
        grading::merge_answers(&attempt.answers.0, &incoming),
    );
    let score = grading::score(&attempt.exam_data.0, &merged);
    let total_questions = attempt.exam_data.0.len();

    let now = primitive_now_utc();
    let submitted = repositories::attempts::submit(
        state.db(),
        &attempt.id,
        SqlJson(merged),
        score,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to submit attempt"))?;

    if !submitted {
        return Err(ApiError::Conflict("Attempt already submitted".to_string()));
    }

    metrics::counter!("quiz_attempts_submitted_total").increment(1);

    Ok(Json(SubmitResponse {
        attempt_id: attempt.id,
        score,
        total_questions,
        submitted_at: format_primitive(now),
    }))
}

async fn list_attempts(
    Query(params): Query<AttemptListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<AttemptSummaryResponse>>, ApiError> {
    let attempts = repositories::attempts::list(
        state.db(),
        params.quiz_id.as_deref(),
        params.user_id.as_deref(),
        params.skip,
        params.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;

    let total_count = repositories::attempts::count(
        state.db(),
        params.quiz_id.as_deref(),
        params.user_id.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;

    Ok(Json(PaginatedResponse {
        items: attempts.iter().map(AttemptSummaryResponse::from_db).collect(),
        total_count,
        skip: params.skip,
        limit: params.limit,
    }))
}

async fn review_attempt(
    Path(attempt_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<AttemptReviewResponse>, ApiError> {
    let attempt = repositories::attempts::find_by_id(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    Ok(Json(AttemptReviewResponse::from_db(attempt)))
}

async fn fetch_quiz(state: &AppState, quiz_id: &str) -> Result<Quiz, ApiError> {
    repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
}

async fn find_active(
    state: &AppState,
    quiz_id: &str,
    user_id: &str,
) -> Result<Option<QuizAttempt>, ApiError> {
    repositories::attempts::find_active(state.db(), quiz_id, user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))
}

/// Resolve the caller's open attempt on a quiz, distinguishing "already
/// submitted" from "never started" for the error body.
async fn require_open_attempt(
    state: &AppState,
    quiz: &Quiz,
    user: &User,
) -> Result<QuizAttempt, ApiError> {
    if let Some(attempt) = find_active(state, &quiz.id, &user.id).await? {
        return Ok(attempt);
    }

    let latest =
        repositories::attempts::list(state.db(), Some(&quiz.id), Some(&user.id), 0, 1)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?;

    match latest.first() {
        Some(attempt) if attempt.is_submitted() => {
            Err(ApiError::Conflict("Attempt already submitted".to_string()))
        }
        _ => Err(ApiError::NotFound("No active attempt for this quiz".to_string())),
    }
}

fn start_response(attempt: QuizAttempt, resumed: bool) -> StartAttemptResponse {
    StartAttemptResponse {
        attempt_id: attempt.id,
        quiz_id: attempt.quiz_id,
        started_at: format_primitive(attempt.started_at),
        total_questions: attempt.exam_data.0.len(),
        resumed,
    }
}

fn parse_answer_form(form: &HashMap<String, String>) -> Vec<SavedAnswer> {
    let mut answers: Vec<SavedAnswer> = form
        .iter()
        .filter_map(|(key, value)| {
            let question_id = key.strip_prefix(ANSWER_FIELD_PREFIX)?;
            if question_id.is_empty() || value.is_empty() {
                return None;
            }
            Some(SavedAnswer {
                question_id: question_id.to_string(),
                choice_id: value.clone(),
            })
        })
        .collect();
    // HashMap iteration order is arbitrary; keep the stored list stable.
    answers.sort_by(|a, b| a.question_id.cmp(&b.question_id));
    answers
}

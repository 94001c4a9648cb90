use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{ExamQuestion, QuizAttempt, SavedAnswer};

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerPayload {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(alias = "choiceId")]
    pub(crate) choice_id: String,
}

impl AnswerPayload {
    pub(crate) fn into_db(self) -> SavedAnswer {
        SavedAnswer { question_id: self.question_id, choice_id: self.choice_id }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AutosavePayload {
    pub(crate) answers: Vec<AnswerPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartAttemptResponse {
    pub(crate) attempt_id: String,
    pub(crate) quiz_id: String,
    pub(crate) started_at: String,
    pub(crate) total_questions: usize,
    /// True when an existing unsubmitted attempt was returned instead of a
    /// fresh one.
    pub(crate) resumed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AutosaveResponse {
    pub(crate) status: String,
    pub(crate) saved_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) attempt_id: String,
    pub(crate) score: i32,
    pub(crate) total_questions: usize,
    pub(crate) submitted_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptChoiceView {
    pub(crate) choice_id: String,
    pub(crate) text: String,
}

/// One snapshot question as shown to the taker. Carries the continuous
/// ordinal so numbering does not restart on every page. No grading key.
#[derive(Debug, Serialize)]
pub(crate) struct AttemptQuestionView {
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) ordinal: usize,
    pub(crate) choices: Vec<AttemptChoiceView>,
}

impl AttemptQuestionView {
    pub(crate) fn from_snapshot(question: &ExamQuestion, ordinal: usize) -> Self {
        Self {
            question_id: question.question_id.clone(),
            text: question.text.clone(),
            ordinal,
            choices: question
                .choices
                .iter()
                .map(|c| AttemptChoiceView { choice_id: c.choice_id.clone(), text: c.text.clone() })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PageLink {
    pub(crate) number: usize,
    pub(crate) current: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PageMeta {
    pub(crate) page: usize,
    pub(crate) page_size: usize,
    pub(crate) total_questions: usize,
    pub(crate) total_pages: usize,
    pub(crate) has_previous: bool,
    pub(crate) has_next: bool,
    pub(crate) pages: Vec<PageLink>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptPageResponse {
    pub(crate) attempt_id: String,
    pub(crate) quiz_id: String,
    pub(crate) started_at: String,
    pub(crate) questions: Vec<AttemptQuestionView>,
    pub(crate) answers: Vec<SavedAnswer>,
    pub(crate) pagination: PageMeta,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptSummaryResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) user_id: String,
    pub(crate) started_at: String,
    pub(crate) submitted_at: Option<String>,
    pub(crate) score: Option<i32>,
    pub(crate) last_auto_save: Option<String>,
    pub(crate) total_questions: usize,
    pub(crate) answered_questions: usize,
}

impl AttemptSummaryResponse {
    pub(crate) fn from_db(attempt: &QuizAttempt) -> Self {
        Self {
            id: attempt.id.clone(),
            quiz_id: attempt.quiz_id.clone(),
            user_id: attempt.user_id.clone(),
            started_at: format_primitive(attempt.started_at),
            submitted_at: attempt.submitted_at.map(format_primitive),
            score: attempt.score,
            last_auto_save: attempt.last_auto_save.map(format_primitive),
            total_questions: attempt.exam_data.0.len(),
            answered_questions: attempt.answers.0.len(),
        }
    }
}

/// Full review view for administrators: the frozen snapshot including the
/// grading key, next to everything the taker submitted.
#[derive(Debug, Serialize)]
pub(crate) struct AttemptReviewResponse {
    #[serde(flatten)]
    pub(crate) summary: AttemptSummaryResponse,
    pub(crate) exam_data: Vec<ExamQuestion>,
    pub(crate) answers: Vec<SavedAnswer>,
}

impl AttemptReviewResponse {
    pub(crate) fn from_db(attempt: QuizAttempt) -> Self {
        Self {
            summary: AttemptSummaryResponse::from_db(&attempt),
            exam_data: attempt.exam_data.0,
            answers: attempt.answers.0,
        }
    }
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Choice, Question, Quiz};

/// Every question carries exactly this many choices.
pub(crate) const REQUIRED_NUM_CHOICES: usize = 4;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChoiceCreate {
    #[validate(length(min = 1, message = "choice text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub(crate) text: String,
    #[validate(nested)]
    pub(crate) choices: Vec<ChoiceCreate>,
}

impl QuestionCreate {
    pub(crate) fn correct_count(&self) -> usize {
        self.choices.iter().filter(|c| c.is_correct).count()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default = "default_question_count")]
    #[serde(alias = "examQuestionCount")]
    #[validate(range(min = 1, message = "exam_question_count must be positive"))]
    pub(crate) exam_question_count: i32,
    #[serde(default)]
    #[serde(alias = "randomizeQuestions")]
    pub(crate) randomize_questions: bool,
    #[serde(default)]
    #[serde(alias = "randomizeChoices")]
    pub(crate) randomize_choices: bool,
    #[serde(default = "default_questions_per_page")]
    #[serde(alias = "questionsPerPage")]
    #[validate(range(min = 1, message = "questions_per_page must be positive"))]
    pub(crate) questions_per_page: i32,
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "examQuestionCount")]
    #[validate(range(min = 1, message = "exam_question_count must be positive"))]
    pub(crate) exam_question_count: Option<i32>,
    #[serde(default)]
    #[serde(alias = "randomizeQuestions")]
    pub(crate) randomize_questions: Option<bool>,
    #[serde(default)]
    #[serde(alias = "randomizeChoices")]
    pub(crate) randomize_choices: Option<bool>,
    #[serde(default)]
    #[serde(alias = "questionsPerPage")]
    #[validate(range(min = 1, message = "questions_per_page must be positive"))]
    pub(crate) questions_per_page: Option<i32>,
    /// Replaces the whole question set when present.
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Option<Vec<QuestionCreate>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) exam_question_count: i32,
    pub(crate) randomize_questions: bool,
    pub(crate) randomize_choices: bool,
    pub(crate) questions_per_page: i32,
    pub(crate) question_count: i64,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz, question_count: i64) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            exam_question_count: quiz.exam_question_count,
            randomize_questions: quiz.randomize_questions,
            randomize_choices: quiz.randomize_choices,
            questions_per_page: quiz.questions_per_page,
            question_count,
            created_by: quiz.created_by,
            created_at: format_primitive(quiz.created_at),
            updated_at: format_primitive(quiz.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChoiceResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) order_index: i32,
    /// Only present for admin callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) order_index: i32,
    pub(crate) choices: Vec<ChoiceResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_db(
        question: Question,
        choices: Vec<Choice>,
        include_answers: bool,
    ) -> Self {
        Self {
            id: question.id,
            text: question.text,
            order_index: question.order_index,
            choices: choices
                .into_iter()
                .map(|c| ChoiceResponse {
                    id: c.id,
                    text: c.text,
                    order_index: c.order_index,
                    is_correct: include_answers.then_some(c.is_correct),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizDetailResponse {
    #[serde(flatten)]
    pub(crate) quiz: QuizResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}

fn default_question_count() -> i32 {
    10
}

fn default_questions_per_page() -> i32 {
    10
}

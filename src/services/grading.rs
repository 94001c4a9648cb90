use std::collections::HashSet;

use crate::db::models::{ExamQuestion, SavedAnswer};

/// Merge an incoming answer list over previously saved ones. The last write
/// per question wins; first-seen question order is kept stable so the stored
/// list stays readable in review.
pub(crate) fn merge_answers(existing: &[SavedAnswer], incoming: &[SavedAnswer]) -> Vec<SavedAnswer> {
    let mut merged: Vec<SavedAnswer> = existing.to_vec();
    for answer in incoming {
        match merged.iter_mut().find(|a| a.question_id == answer.question_id) {
            Some(slot) => slot.choice_id = answer.choice_id.clone(),
            None => merged.push(answer.clone()),
        }
    }
    merged
}

/// Drop answers that do not refer to a question in the attempt's snapshot.
pub(crate) fn retain_known_questions(
    exam_data: &[ExamQuestion],
    answers: Vec<SavedAnswer>,
) -> Vec<SavedAnswer> {
    let known: HashSet<&str> = exam_data.iter().map(|q| q.question_id.as_str()).collect();
    answers
        .into_iter()
        .filter(|a| known.contains(a.question_id.as_str()))
        .collect()
}

/// Score an attempt against its own frozen grading key. One point per
/// question whose recorded answer matches the snapshot's correct choice.
pub(crate) fn score(exam_data: &[ExamQuestion], answers: &[SavedAnswer]) -> i32 {
    exam_data
        .iter()
        .filter(|question| {
            answers
                .iter()
                .rfind(|a| a.question_id == question.question_id)
                .is_some_and(|a| a.choice_id == question.correct_choice_id)
        })
        .count() as i32
}

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::models::{Choice, ExamChoice, ExamQuestion, Question, Quiz};

/// Freeze a quiz into the question set served for one attempt.
///
/// Samples up to `exam_question_count` questions, keeps authored order unless
/// `randomize_questions` is set, and shuffles choices per question when
/// `randomize_choices` is set. The returned snapshot carries each question's
/// correct choice id so grading stays stable even if the quiz is edited later.
pub(crate) fn build_exam_data(
    quiz: &Quiz,
    questions: &[Question],
    choices: &[Choice],
    rng: &mut impl Rng,
) -> Vec<ExamQuestion> {
    let mut by_question: HashMap<&str, Vec<&Choice>> = HashMap::new();
    for choice in choices {
        by_question.entry(choice.question_id.as_str()).or_default().push(choice);
    }

    let count = (quiz.exam_question_count.max(1) as usize).min(questions.len());
    let mut selected: Vec<&Question> = questions.iter().collect();
    if selected.len() > count {
        selected.shuffle(rng);
        selected.truncate(count);
    }

    if quiz.randomize_questions {
        selected.shuffle(rng);
    } else {
        selected.sort_by_key(|q| q.order_index);
    }

    selected
        .into_iter()
        .filter_map(|question| {
            let mut question_choices =
                by_question.get(question.id.as_str()).cloned().unwrap_or_default();
            if quiz.randomize_choices {
                question_choices.shuffle(rng);
            } else {
                question_choices.sort_by_key(|c| c.order_index);
            }

            // A question without a correct choice cannot be graded; skip it
            // rather than freeze an unanswerable snapshot entry.
            let correct = question_choices.iter().find(|c| c.is_correct)?;

            Some(ExamQuestion {
                question_id: question.id.clone(),
                text: question.text.clone(),
                choices: question_choices
                    .iter()
                    .map(|c| ExamChoice { choice_id: c.id.clone(), text: c.text.clone() })
                    .collect(),
                correct_choice_id: correct.id.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;

    use super::*;

    fn quiz(count: i32, randomize_questions: bool, randomize_choices: bool) -> Quiz {
        let ts = datetime!(2025-01-01 00:00:00);
        Quiz {
            id: "quiz-1".to_string(),
            title: "Sample".to_string(),
            description: None,
            exam_question_count: count,
            randomize_questions,
            randomize_choices,
            questions_per_page: 10,
            created_by: "admin-1".to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn question(id: &str, order_index: i32) -> Question {
        Question {
            id: id.to_string(),
            quiz_id: "quiz-1".to_string(),
            text: format!("Question {id}"),
            order_index,
            created_at: datetime!(2025-01-01 00:00:00),
        }
    }

    fn choice(id: &str, question_id: &str, is_correct: bool, order_index: i32) -> Choice {
        Choice {
            id: id.to_string(),
            question_id: question_id.to_string(),
            text: format!("Choice {id}"),
            is_correct,
            order_index,
        }
    }

    fn fixture(question_count: usize) -> (Vec<Question>, Vec<Choice>) {
        let mut questions = Vec::new();
        let mut choices = Vec::new();
        for qi in 0..question_count {
            let qid = format!("q{qi}");
            questions.push(question(&qid, qi as i32));
            for ci in 0..4 {
                choices.push(choice(&format!("{qid}-c{ci}"), &qid, ci == 0, ci as i32));
            }
        }
        (questions, choices)
    }

    #[test]
    fn keeps_authored_order_without_randomization() {
        let (questions, choices) = fixture(3);
        let mut rng = StdRng::seed_from_u64(7);

        let snapshot = build_exam_data(&quiz(10, false, false), &questions, &choices, &mut rng);

        let ids: Vec<&str> = snapshot.iter().map(|q| q.question_id.as_str()).collect();
        assert_eq!(ids, ["q0", "q1", "q2"]);
        for entry in &snapshot {
            let choice_ids: Vec<&str> =
                entry.choices.iter().map(|c| c.choice_id.as_str()).collect();
            assert_eq!(choice_ids[0], format!("{}-c0", entry.question_id));
            assert_eq!(entry.correct_choice_id, format!("{}-c0", entry.question_id));
        }
    }

    #[test]
    fn samples_down_to_exam_question_count() {
        let (questions, choices) = fixture(8);
        let mut rng = StdRng::seed_from_u64(42);

        let snapshot = build_exam_data(&quiz(5, false, false), &questions, &choices, &mut rng);

        assert_eq!(snapshot.len(), 5);
        // Sampling without question shuffling keeps ascending authored order.
        let orders: Vec<&str> = snapshot.iter().map(|q| q.question_id.as_str()).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
    }

    #[test]
    fn choice_shuffle_preserves_grading_key() {
        let (questions, choices) = fixture(4);
        let mut rng = StdRng::seed_from_u64(3);

        let snapshot = build_exam_data(&quiz(10, true, true), &questions, &choices, &mut rng);

        assert_eq!(snapshot.len(), 4);
        for entry in &snapshot {
            assert_eq!(entry.choices.len(), 4);
            assert!(entry
                .choices
                .iter()
                .any(|c| c.choice_id == entry.correct_choice_id));
            assert_eq!(entry.correct_choice_id, format!("{}-c0", entry.question_id));
        }
    }

    #[test]
    fn skips_questions_without_a_correct_choice() {
        let (questions, mut choices) = fixture(2);
        for choice in choices.iter_mut().filter(|c| c.question_id == "q1") {
            choice.is_correct = false;
        }
        let mut rng = StdRng::seed_from_u64(1);

        let snapshot = build_exam_data(&quiz(10, false, false), &questions, &choices, &mut rng);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].question_id, "q0");
    }
}

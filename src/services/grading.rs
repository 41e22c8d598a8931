// src/services/grading.rs

use chrono::{DateTime, Utc};

use crate::{
    models::{
        course::QuizDefinition,
        quiz_attempt::{GradedAnswer, NewQuizAttempt, SubmittedAnswer},
    },
    services::rounded_percentage,
};

/// Outcome of grading one submission against a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedResult {
    pub answers: Vec<GradedAnswer>,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub passed: bool,
}

/// Grades each submitted answer independently.
///
/// * Unknown question ids score zero and do not count towards `max_score`.
/// * A repeated question id is graded (and counted) each time it appears.
/// * Unanswered questions are not counted towards `max_score`.
pub fn grade_submission(quiz: &QuizDefinition, submitted: &[SubmittedAnswer]) -> GradedResult {
    let mut score: i32 = 0;
    let mut max_score: i32 = 0;
    let mut answers = Vec::with_capacity(submitted.len());

    for answer in submitted {
        let graded = match quiz.question(answer.question_id) {
            Some(question) => {
                max_score = max_score.saturating_add(question.points);
                let is_correct = answer.selected_option == question.correct_option;
                let points_awarded = if is_correct { question.points } else { 0 };
                score = score.saturating_add(points_awarded);

                GradedAnswer {
                    question_id: answer.question_id,
                    selected_option: answer.selected_option,
                    is_correct,
                    points_awarded,
                }
            }
            None => GradedAnswer {
                question_id: answer.question_id,
                selected_option: answer.selected_option,
                is_correct: false,
                points_awarded: 0,
            },
        };
        answers.push(graded);
    }

    let percentage = rounded_percentage(score as i64, max_score as i64);

    GradedResult {
        answers,
        score,
        max_score,
        percentage,
        passed: percentage >= quiz.quiz.passing_score,
    }
}

/// Whole seconds between start and completion, rounded half-up.
/// A start time in the future is clamped to zero.
pub fn elapsed_seconds(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> i64 {
    let millis = (completed_at - started_at).num_milliseconds();
    if millis < 0 {
        tracing::warn!(
            %started_at,
            %completed_at,
            "Quiz start time is after completion time, clamping time spent to 0"
        );
        return 0;
    }
    (millis + 500).div_euclid(1000)
}

/// Grades a submission and packages it as a new, not yet persisted attempt.
pub fn build_attempt(
    student_id: i64,
    quiz: &QuizDefinition,
    submitted: &[SubmittedAnswer],
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> NewQuizAttempt {
    let result = grade_submission(quiz, submitted);

    NewQuizAttempt {
        student_id,
        course_id: quiz.course_id,
        module_id: quiz.quiz.module_id,
        quiz_id: quiz.quiz.id,
        answers: result.answers,
        score: result.score,
        max_score: result.max_score,
        percentage: result.percentage,
        passed: result.passed,
        started_at,
        completed_at,
        time_spent_seconds: elapsed_seconds(started_at, completed_at),
    }
}

// src/models/quiz_attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// One answer as submitted by the student.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    /// Zero-based option index.
    #[validate(range(min = 0, message = "Selected option must not be negative"))]
    pub selected_option: i32,
}

/// DTO for submitting a quiz.
///
/// Answers may be incomplete, repeat a question, or reference questions that
/// are not part of the quiz. None of these are rejected; only a negative
/// option index is.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(nested)]
    pub answers: Vec<SubmittedAnswer>,

    /// When the student opened the quiz, as reported by the client.
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// A graded answer, stored inside the attempt as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub selected_option: i32,
    pub is_correct: bool,
    pub points_awarded: i32,
}

/// Represents the 'quiz_attempts' table. Rows are never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub module_id: i64,
    pub quiz_id: i64,
    pub answers: Json<Vec<GradedAnswer>>,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub passed: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub time_spent_seconds: i64,
}

/// An attempt that has been graded but not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuizAttempt {
    pub student_id: i64,
    pub course_id: i64,
    pub module_id: i64,
    pub quiz_id: i64,
    pub answers: Vec<GradedAnswer>,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub passed: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub time_spent_seconds: i64,
}

/// Result summary returned to the student after a submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizResultResponse {
    pub attempt_id: i64,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub passed: bool,
    pub passing_score: i32,
    pub time_spent: i64,
    pub answers: Vec<GradedAnswer>,
}

impl QuizResultResponse {
    pub fn new(attempt_id: i64, passing_score: i32, attempt: NewQuizAttempt) -> Self {
        Self {
            attempt_id,
            score: attempt.score,
            max_score: attempt.max_score,
            percentage: attempt.percentage,
            passed: attempt.passed,
            passing_score,
            time_spent: attempt.time_spent_seconds,
            answers: attempt.answers,
        }
    }
}

/// Query parameters for the caller's attempt history.
#[derive(Debug, Deserialize)]
pub struct AttemptListParams {
    pub course_id: Option<i64>,
    pub quiz_id: Option<i64>,
}

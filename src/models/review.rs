// src/models/review.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'course_reviews' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseReview {
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    /// 1 to 5 stars.
    pub rating: i32,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for reviewing a course. Only enrolled students may review.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Comment is too long"))]
    pub comment: String,
}

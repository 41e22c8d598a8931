// src/models/enrollment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'enrollments' table: one progress ledger per (student, course).
///
/// `completed_lessons`, `total_lessons`, `overall_progress` and `is_completed`
/// are derived from `completed_lesson_ids` and the course outline. They are only
/// ever recomputed together by `services::progress`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,

    /// Lesson ids without duplicates, in completion order.
    pub completed_lesson_ids: Vec<i64>,

    pub completed_lessons: i32,
    pub total_lessons: i32,

    /// Integer percentage, 0-100.
    pub overall_progress: i32,

    pub is_completed: bool,

    /// Set once, the first time progress reaches 100.
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Course price at the moment of enrollment.
    pub amount_paid_cents: i64,

    pub last_accessed_at: chrono::DateTime<chrono::Utc>,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}

/// Summary returned after recording a lesson completion.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressResponse {
    pub enrollment_id: i64,
    pub completed_lessons: i32,
    pub total_lessons: i32,
    pub overall_progress: i32,
    pub is_completed: bool,
    /// True when the lesson had been completed before; nothing was written.
    pub already_completed: bool,
}

impl ProgressResponse {
    pub fn from_enrollment(enrollment: &Enrollment, already_completed: bool) -> Self {
        Self {
            enrollment_id: enrollment.id,
            completed_lessons: enrollment.completed_lessons,
            total_lessons: enrollment.total_lessons,
            overall_progress: enrollment.overall_progress,
            is_completed: enrollment.is_completed,
            already_completed,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    All,
}

impl EnrollmentStatus {
    /// The `is_completed` value to filter on, if any.
    pub fn completed_filter(self) -> Option<bool> {
        match self {
            EnrollmentStatus::Active => Some(false),
            EnrollmentStatus::Completed => Some(true),
            EnrollmentStatus::All => None,
        }
    }
}

/// Query parameters for the admin enrollment listing.
#[derive(Debug, Default, Deserialize)]
pub struct EnrollmentListParams {
    pub course_id: Option<i64>,
    pub status: Option<EnrollmentStatus>,
    /// Matches course titles (case-insensitive substring) or an exact student id.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl EnrollmentListParams {
    /// 1-based page, never below 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to 1..=MAX_PAGE_SIZE.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Trimmed search text, `None` when blank.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { page, limit, total, pages }
    }
}

/// Platform-wide enrollment counts, independent of any filter.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollmentCounts {
    pub total: i64,
    pub active: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollmentPage {
    pub enrollments: Vec<Enrollment>,
    pub pagination: Pagination,
    pub stats: EnrollmentCounts,
}

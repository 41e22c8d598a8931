// src/services/progress.rs

use chrono::{DateTime, Utc};

use crate::{
    models::{course::CourseOutline, enrollment::Enrollment},
    services::rounded_percentage,
};

/// What `record_lesson_completion` did to the enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonCompletion {
    /// The lesson was already in the completed set. Nothing changed.
    AlreadyCompleted,
    /// The lesson was added and the derived fields recomputed.
    Recorded {
        /// This call moved the enrollment to completed.
        course_completed: bool,
    },
}

impl LessonCompletion {
    pub fn is_noop(&self) -> bool {
        matches!(self, LessonCompletion::AlreadyCompleted)
    }
}

/// Adds `lesson_id` to the enrollment's completed set and recomputes the
/// cached counters from `course`.
///
/// Completing an already completed lesson leaves the enrollment untouched,
/// including `last_accessed_at`. Completion is monotonic: once `is_completed`
/// is set it stays set and `completed_at` is never overwritten.
pub fn record_lesson_completion(
    enrollment: &mut Enrollment,
    course: &CourseOutline,
    lesson_id: i64,
    now: DateTime<Utc>,
) -> LessonCompletion {
    if enrollment.completed_lesson_ids.contains(&lesson_id) {
        return LessonCompletion::AlreadyCompleted;
    }

    enrollment.completed_lesson_ids.push(lesson_id);
    enrollment.completed_lessons = enrollment.completed_lesson_ids.len() as i32;
    enrollment.total_lessons = course.total_lessons() as i32;

    // A course that lost lessons after they were completed would otherwise exceed 100.
    enrollment.overall_progress = rounded_percentage(
        enrollment.completed_lessons as i64,
        enrollment.total_lessons as i64,
    )
    .min(100);

    let mut course_completed = false;
    if enrollment.overall_progress >= 100 && !enrollment.is_completed {
        enrollment.is_completed = true;
        enrollment.completed_at = Some(now);
        course_completed = true;
    }

    enrollment.last_accessed_at = now;

    LessonCompletion::Recorded { course_completed }
}

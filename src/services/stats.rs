// src/services/stats.rs

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::FromRow;

use crate::services::rounded_percentage;

/// The course columns the dashboard needs.
#[derive(Debug, Clone, FromRow)]
pub struct CourseFigures {
    pub id: i64,
    pub is_published: bool,
}

/// The enrollment columns the dashboard needs.
#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentFigures {
    pub student_id: i64,
    pub course_id: i64,
    pub overall_progress: i32,
    pub is_completed: bool,
    pub amount_paid_cents: i64,
}

/// The review columns the dashboard needs.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewFigures {
    pub course_id: i64,
    pub rating: i32,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CourseEnrollmentCount {
    pub course_id: i64,
    pub enrollments: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_courses: usize,
    pub published_courses: usize,
    pub total_enrollments: usize,
    pub completed_enrollments: usize,
    /// Distinct students across the enrollments.
    pub total_students: usize,
    /// Sum of what students paid at enrollment time.
    pub revenue_cents: i64,
    pub average_progress: i32,
    /// Mean review rating to one decimal place, 0 with no reviews.
    pub average_rating: f64,
    pub enrollments_per_course: Vec<CourseEnrollmentCount>,
}

/// Aggregates course, enrollment and review rows into dashboard figures.
///
/// Enrollments and reviews whose course is not among `courses` are ignored, so
/// passing an instructor's own courses yields that instructor's dashboard.
pub fn compute_dashboard_stats(
    courses: &[CourseFigures],
    enrollments: &[EnrollmentFigures],
    reviews: &[ReviewFigures],
) -> DashboardStats {
    let course_ids: HashSet<i64> = courses.iter().map(|c| c.id).collect();

    let relevant: Vec<&EnrollmentFigures> = enrollments
        .iter()
        .filter(|e| course_ids.contains(&e.course_id))
        .collect();

    let revenue_cents: i64 = relevant.iter().map(|e| e.amount_paid_cents).sum();

    let total_students = relevant
        .iter()
        .map(|e| e.student_id)
        .collect::<HashSet<_>>()
        .len();

    let ratings: Vec<i64> = reviews
        .iter()
        .filter(|r| course_ids.contains(&r.course_id))
        .map(|r| r.rating as i64)
        .collect();
    let average_rating = average_to_tenth(ratings.iter().sum(), ratings.len() as i64);

    let progress_sum: i64 = relevant.iter().map(|e| e.overall_progress as i64).sum();
    let average_progress = rounded_percentage(progress_sum, relevant.len() as i64 * 100);

    let mut counts: HashMap<i64, usize> = courses.iter().map(|c| (c.id, 0)).collect();
    for e in &relevant {
        *counts.entry(e.course_id).or_default() += 1;
    }
    let mut enrollments_per_course: Vec<CourseEnrollmentCount> = counts
        .into_iter()
        .map(|(course_id, enrollments)| CourseEnrollmentCount { course_id, enrollments })
        .collect();
    enrollments_per_course.sort_by(|a, b| {
        b.enrollments
            .cmp(&a.enrollments)
            .then(a.course_id.cmp(&b.course_id))
    });

    DashboardStats {
        total_courses: courses.len(),
        published_courses: courses.iter().filter(|c| c.is_published).count(),
        total_enrollments: relevant.len(),
        completed_enrollments: relevant.iter().filter(|e| e.is_completed).count(),
        total_students,
        revenue_cents,
        average_progress,
        average_rating,
        enrollments_per_course,
    }
}

/// `sum / count` rounded half-up to one decimal place; 0 when `count` is 0.
fn average_to_tenth(sum: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    let tenths = (sum * 20 + count) / (count * 2);
    tenths as f64 / 10.0
}

// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    db::ENROLLMENT_COLUMNS,
    error::AppError,
    models::enrollment::{
        Enrollment, EnrollmentCounts, EnrollmentListParams, EnrollmentPage, EnrollmentStatus,
        Pagination,
    },
    services::stats::{CourseFigures, EnrollmentFigures, ReviewFigures, compute_dashboard_stats},
};

/// Filter shared by the page query and its count. `$1` course, `$2` completion
/// state, `$3` title pattern, `$4` raw search text (matched against student ids).
const ENROLLMENT_FILTER: &str = r#"
    ($1::BIGINT IS NULL OR course_id = $1)
    AND ($2::BOOLEAN IS NULL OR is_completed = $2)
    AND ($3::TEXT IS NULL
         OR student_id::TEXT = $4
         OR course_id IN (SELECT id FROM courses WHERE title ILIKE $3))
"#;

/// Lists enrollments across all students, newest first, one page at a time.
/// Admin only.
///
/// * `course_id` narrows to one course; `status` to `active` or `completed`.
/// * `search` matches course titles or an exact student id.
/// * The response carries the filtered total and unfiltered platform counts.
pub async fn list_enrollments(
    State(pool): State<PgPool>,
    Query(params): Query<EnrollmentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let completed = params.status.and_then(EnrollmentStatus::completed_filter);
    let search = params.search_text();
    let pattern = search.map(|s| format!("%{}%", s));

    let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
        r#"
        SELECT {ENROLLMENT_COLUMNS}
        FROM enrollments
        WHERE {ENROLLMENT_FILTER}
        ORDER BY enrolled_at DESC, id DESC
        LIMIT $5 OFFSET $6
        "#
    ))
    .bind(params.course_id)
    .bind(completed)
    .bind(&pattern)
    .bind(search)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list enrollments: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM enrollments WHERE {ENROLLMENT_FILTER}"
    ))
    .bind(params.course_id)
    .bind(completed)
    .bind(&pattern)
    .bind(search)
    .fetch_one(&pool)
    .await?;

    let (all, done): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_completed) FROM enrollments",
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(EnrollmentPage {
        enrollments,
        pagination: Pagination::new(params.page(), params.limit(), total),
        stats: EnrollmentCounts {
            total: all,
            active: all - done,
            completed: done,
        },
    }))
}

/// Removes an enrollment.
/// Admin only. Quiz attempts are kept as history.
pub async fn delete_enrollment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete enrollment: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Enrollment not found".to_string()));
    }

    tracing::info!(enrollment_id = id, "Enrollment deleted by admin");

    Ok(StatusCode::NO_CONTENT)
}

/// Platform-wide dashboard figures.
/// Admin only.
pub async fn dashboard_stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let courses =
        sqlx::query_as::<_, CourseFigures>("SELECT id, is_published FROM courses")
            .fetch_all(&pool)
            .await?;

    let enrollments = sqlx::query_as::<_, EnrollmentFigures>(
        "SELECT student_id, course_id, overall_progress, is_completed, amount_paid_cents FROM enrollments",
    )
    .fetch_all(&pool)
    .await?;

    let reviews =
        sqlx::query_as::<_, ReviewFigures>("SELECT course_id, rating FROM course_reviews")
            .fetch_all(&pool)
            .await?;

    Ok(Json(compute_dashboard_stats(&courses, &enrollments, &reviews)))
}

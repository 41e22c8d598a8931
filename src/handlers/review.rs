// src/handlers/review.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    db,
    error::AppError,
    models::review::{CourseReview, CreateReviewRequest},
    utils::{html::clean_html, jwt::Claims},
};

const REVIEW_COLUMNS: &str = "id, course_id, student_id, rating, comment, created_at";

/// Reviews a course the caller is enrolled in.
/// A second review from the same student replaces the first.
pub async fn submit_review(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let student_id = claims.user_id()?;
    let mut conn = pool.acquire().await?;

    db::find_course(&mut conn, course_id).await?;
    if db::find_enrollment_for(&mut conn, student_id, course_id)
        .await?
        .is_none()
    {
        return Err(AppError::Forbidden(
            "Only enrolled students can review this course".to_string(),
        ));
    }

    let review = sqlx::query_as::<_, CourseReview>(&format!(
        r#"
        INSERT INTO course_reviews (course_id, student_id, rating, comment)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (course_id, student_id)
        DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment, created_at = NOW()
        RETURNING {REVIEW_COLUMNS}
        "#
    ))
    .bind(course_id)
    .bind(student_id)
    .bind(payload.rating)
    .bind(clean_html(&payload.comment))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store review: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(course_id, student_id, rating = review.rating, "Course reviewed");

    Ok((StatusCode::CREATED, Json(review)))
}

/// Reviews of a published course, newest first.
pub async fn list_reviews(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;

    let course = db::find_course(&mut conn, course_id).await?;
    if !course.is_published {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    let reviews = sqlx::query_as::<_, CourseReview>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM course_reviews WHERE course_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Json(reviews))
}

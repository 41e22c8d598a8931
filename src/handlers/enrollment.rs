// src/handlers/enrollment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    db::{self, ENROLLMENT_COLUMNS},
    error::{AppError, is_unique_violation},
    models::enrollment::{Enrollment, ProgressResponse},
    services::progress::{LessonCompletion, record_lesson_completion},
    utils::jwt::Claims,
};

/// Enrolls the caller in a published course.
///
/// `total_lessons` starts from the course's current lesson count; it is
/// resynchronized on every completion afterwards. The current price is
/// recorded as the amount paid.
pub async fn enroll(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let mut conn = pool.acquire().await?;

    let course = db::find_course(&mut conn, course_id).await?;
    if !course.is_published {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    let outline = db::load_course_outline(&mut conn, course_id).await?;

    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        r#"
        INSERT INTO enrollments (student_id, course_id, total_lessons, amount_paid_cents)
        VALUES ($1, $2, $3, $4)
        RETURNING {ENROLLMENT_COLUMNS}
        "#
    ))
    .bind(student_id)
    .bind(course_id)
    .bind(outline.total_lessons() as i32)
    .bind(course.price_cents)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Already enrolled in this course".to_string())
        } else {
            tracing::error!("Failed to enroll: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(student_id, course_id, enrollment_id = enrollment.id, "Student enrolled");

    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Lists the caller's enrollments, most recently accessed first.
pub async fn list_my_enrollments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = $1 ORDER BY last_accessed_at DESC"
    ))
    .bind(student_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list enrollments: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(enrollments))
}

/// Retrieves one enrollment. Only its student or an admin may read it.
pub async fn get_enrollment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Enrollment not found".to_string()))?;

    ensure_owner(&claims, &enrollment)?;

    Ok(Json(enrollment))
}

/// Records that the caller finished a lesson.
///
/// The enrollment row is locked for the duration of the read-modify-write so
/// concurrent completions on the same enrollment apply one after the other.
/// Completing a lesson twice is not an error and performs no write.
pub async fn complete_lesson(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((enrollment_id, lesson_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let mut enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = $1 FOR UPDATE"
    ))
    .bind(enrollment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Enrollment not found".to_string()))?;

    ensure_owner(&claims, &enrollment)?;

    let outline = db::load_course_outline(&mut tx, enrollment.course_id).await?;
    if !outline.contains_lesson(lesson_id) {
        return Err(AppError::NotFound(
            "Lesson not found in this course".to_string(),
        ));
    }

    let outcome = record_lesson_completion(&mut enrollment, &outline, lesson_id, chrono::Utc::now());

    match outcome {
        LessonCompletion::AlreadyCompleted => {
            tracing::debug!(enrollment_id, lesson_id, "Lesson already completed");
            // Dropping the transaction releases the row lock without writing.
            return Ok(Json(ProgressResponse::from_enrollment(&enrollment, true)));
        }
        LessonCompletion::Recorded { course_completed } => {
            sqlx::query(
                r#"
                UPDATE enrollments SET
                    completed_lesson_ids = $2,
                    completed_lessons = $3,
                    total_lessons = $4,
                    overall_progress = $5,
                    is_completed = $6,
                    completed_at = $7,
                    last_accessed_at = $8
                WHERE id = $1
                "#,
            )
            .bind(enrollment.id)
            .bind(&enrollment.completed_lesson_ids)
            .bind(enrollment.completed_lessons)
            .bind(enrollment.total_lessons)
            .bind(enrollment.overall_progress)
            .bind(enrollment.is_completed)
            .bind(enrollment.completed_at)
            .bind(enrollment.last_accessed_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update enrollment progress: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

            tx.commit().await?;

            tracing::info!(
                enrollment_id,
                lesson_id,
                progress = enrollment.overall_progress,
                course_completed,
                "Lesson completion recorded"
            );
        }
    }

    Ok(Json(ProgressResponse::from_enrollment(&enrollment, false)))
}

fn ensure_owner(claims: &Claims, enrollment: &Enrollment) -> Result<(), AppError> {
    if claims.is_admin() || claims.user_id()? == enrollment.student_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "This enrollment belongs to another student".to_string(),
        ))
    }
}

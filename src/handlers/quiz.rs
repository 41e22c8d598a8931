// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::MAX_ANSWERS_PER_SUBMISSION,
    db,
    error::AppError,
    models::quiz_attempt::{AttemptListParams, QuizAttempt, QuizResultResponse, SubmitQuizRequest},
    services::grading::build_attempt,
    utils::jwt::Claims,
};

/// Submits answers for a quiz and stores the graded attempt.
///
/// * The caller must be enrolled in the quiz's course.
/// * Every submission creates a new attempt; earlier attempts are never changed.
/// * Unknown or repeated question ids are graded, not rejected.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.answers.len() > MAX_ANSWERS_PER_SUBMISSION {
        return Err(AppError::BadRequest(format!(
            "At most {} answers may be submitted",
            MAX_ANSWERS_PER_SUBMISSION
        )));
    }
    req.validate()?;

    let student_id = claims.user_id()?;
    let mut conn = pool.acquire().await?;

    let quiz = db::load_quiz_definition(&mut conn, quiz_id).await?;
    db::find_course(&mut conn, quiz.course_id).await?;

    if db::find_enrollment_for(&mut conn, student_id, quiz.course_id)
        .await?
        .is_none()
    {
        return Err(AppError::Forbidden(
            "You are not enrolled in this course".to_string(),
        ));
    }

    let attempt = build_attempt(
        student_id,
        &quiz,
        &req.answers,
        req.started_at,
        chrono::Utc::now(),
    );

    let (attempt_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO quiz_attempts
        (student_id, course_id, module_id, quiz_id, answers, score, max_score,
         percentage, passed, started_at, completed_at, time_spent_seconds)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(attempt.student_id)
    .bind(attempt.course_id)
    .bind(attempt.module_id)
    .bind(attempt.quiz_id)
    .bind(SqlJson(&attempt.answers))
    .bind(attempt.score)
    .bind(attempt.max_score)
    .bind(attempt.percentage)
    .bind(attempt.passed)
    .bind(attempt.started_at)
    .bind(attempt.completed_at)
    .bind(attempt.time_spent_seconds)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store quiz attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(
        attempt_id,
        student_id,
        quiz_id,
        score = attempt.score,
        max_score = attempt.max_score,
        passed = attempt.passed,
        "Quiz graded"
    );

    Ok((
        StatusCode::CREATED,
        Json(QuizResultResponse::new(
            attempt_id,
            quiz.quiz.passing_score,
            attempt,
        )),
    ))
}

/// Lists the caller's attempts at a quiz, newest first.
pub async fn list_my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let params = AttemptListParams {
        course_id: None,
        quiz_id: Some(quiz_id),
    };
    let attempts = fetch_attempts(&pool, claims.user_id()?, &params).await?;

    Ok(Json(attempts))
}

/// Lists the caller's attempts, optionally narrowed to a course and/or quiz.
pub async fn list_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<AttemptListParams>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = fetch_attempts(&pool, claims.user_id()?, &params).await?;

    Ok(Json(attempts))
}

async fn fetch_attempts(
    pool: &PgPool,
    student_id: i64,
    params: &AttemptListParams,
) -> Result<Vec<QuizAttempt>, AppError> {
    sqlx::query_as::<_, QuizAttempt>(
        r#"
        SELECT id, student_id, course_id, module_id, quiz_id, answers, score, max_score,
               percentage, passed, started_at, completed_at, time_spent_seconds
        FROM quiz_attempts
        WHERE student_id = $1
          AND ($2::BIGINT IS NULL OR course_id = $2)
          AND ($3::BIGINT IS NULL OR quiz_id = $3)
        ORDER BY completed_at DESC, id DESC
        "#,
    )
    .bind(student_id)
    .bind(params.course_id)
    .bind(params.quiz_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz attempts: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })
}

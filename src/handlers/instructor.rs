// src/handlers/instructor.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgConnection, PgPool};
use validator::Validate;

use crate::{
    config::DEFAULT_PASSING_SCORE,
    db::{self, COURSE_COLUMNS},
    error::AppError,
    models::course::{
        Course, CreateCourseRequest, CreateLessonRequest, CreateModuleRequest, CreateQuizRequest,
        UpdateCourseRequest,
    },
    services::stats::{CourseFigures, EnrollmentFigures, ReviewFigures, compute_dashboard_stats},
    utils::{html::clean_html, jwt::Claims},
};

/// Loads the course and checks the caller may edit it.
/// Admins may edit any course; instructors only their own.
async fn authorize_course(
    conn: &mut PgConnection,
    claims: &Claims,
    course_id: i64,
) -> Result<Course, AppError> {
    let course = db::find_course(conn, course_id).await?;
    if !claims.is_admin() && course.instructor_id != claims.user_id()? {
        return Err(AppError::Forbidden("You do not own this course".to_string()));
    }
    Ok(course)
}

/// Resolves the course owning a module and checks the caller may edit it.
async fn authorize_module(
    conn: &mut PgConnection,
    claims: &Claims,
    module_id: i64,
) -> Result<Course, AppError> {
    let (course_id,): (i64,) =
        sqlx::query_as("SELECT course_id FROM course_modules WHERE id = $1")
            .bind(module_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(AppError::NotFound("Module not found".to_string()))?;

    authorize_course(conn, claims, course_id).await
}

/// Creates a new course owned by the caller.
pub async fn create_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let instructor_id = claims.user_id()?;

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"
        INSERT INTO courses (instructor_id, title, description, category, price_cents, is_published)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {COURSE_COLUMNS}
        "#
    ))
    .bind(instructor_id)
    .bind(&payload.title)
    .bind(clean_html(&payload.description))
    .bind(&payload.category)
    .bind(payload.price_cents)
    .bind(payload.is_published)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(course_id = course.id, instructor_id, "Course created");

    Ok((StatusCode::CREATED, Json(course)))
}

/// Updates course fields that are present in the payload.
pub async fn update_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = pool.begin().await?;
    authorize_course(&mut *tx, &claims, id).await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"
        UPDATE courses SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            category = COALESCE($4, category),
            price_cents = COALESCE($5, price_cents),
            is_published = COALESCE($6, is_published)
        WHERE id = $1
        RETURNING {COURSE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(payload.title)
    .bind(payload.description.as_deref().map(clean_html))
    .bind(payload.category)
    .bind(payload.price_cents)
    .bind(payload.is_published)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(course))
}

/// Appends a module to the end of a course.
pub async fn create_module(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = pool.begin().await?;
    authorize_course(&mut *tx, &claims, course_id).await?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO course_modules (course_id, title, position)
        VALUES ($1, $2, (SELECT COALESCE(MAX(position) + 1, 0) FROM course_modules WHERE course_id = $1))
        RETURNING id
        "#,
    )
    .bind(course_id)
    .bind(&payload.title)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Appends a lesson to the end of a module.
pub async fn create_lesson(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(module_id): Path<i64>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = pool.begin().await?;
    authorize_module(&mut *tx, &claims, module_id).await?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO lessons (module_id, title, content, video_url, duration_minutes, position)
        VALUES ($1, $2, $3, $4, $5, (SELECT COALESCE(MAX(position) + 1, 0) FROM lessons WHERE module_id = $1))
        RETURNING id
        "#,
    )
    .bind(module_id)
    .bind(&payload.title)
    .bind(clean_html(&payload.content))
    .bind(&payload.video_url)
    .bind(payload.duration_minutes)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Creates a quiz and its questions in one transaction.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(module_id): Path<i64>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(pos) = payload
        .questions
        .iter()
        .position(|q| !q.has_valid_correct_option())
    {
        return Err(AppError::BadRequest(format!(
            "Question {} has a correct option outside its options",
            pos + 1
        )));
    }

    let mut tx = pool.begin().await?;
    authorize_module(&mut *tx, &claims, module_id).await?;

    let (quiz_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO quizzes (module_id, title, passing_score, time_limit_minutes)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(module_id)
    .bind(&payload.title)
    .bind(payload.passing_score.unwrap_or(DEFAULT_PASSING_SCORE))
    .bind(payload.time_limit_minutes)
    .fetch_one(&mut *tx)
    .await?;

    for (position, question) in payload.questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO quiz_questions (quiz_id, position, prompt, options, correct_option, points)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(quiz_id)
        .bind(position as i32)
        .bind(&question.prompt)
        .bind(sqlx::types::Json(&question.options))
        .bind(question.correct_option)
        .bind(question.points)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(quiz_id, module_id, questions = payload.questions.len(), "Quiz created");

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": quiz_id}))))
}

/// Dashboard figures restricted to the caller's own courses.
pub async fn my_stats(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let instructor_id = claims.user_id()?;

    let courses = sqlx::query_as::<_, CourseFigures>(
        "SELECT id, is_published FROM courses WHERE instructor_id = $1",
    )
    .bind(instructor_id)
    .fetch_all(&pool)
    .await?;

    let enrollments = sqlx::query_as::<_, EnrollmentFigures>(
        r#"
        SELECT e.student_id, e.course_id, e.overall_progress, e.is_completed, e.amount_paid_cents
        FROM enrollments e
        JOIN courses c ON c.id = e.course_id
        WHERE c.instructor_id = $1
        "#,
    )
    .bind(instructor_id)
    .fetch_all(&pool)
    .await?;

    let reviews = sqlx::query_as::<_, ReviewFigures>(
        r#"
        SELECT r.course_id, r.rating
        FROM course_reviews r
        JOIN courses c ON c.id = r.course_id
        WHERE c.instructor_id = $1
        "#,
    )
    .bind(instructor_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(compute_dashboard_stats(&courses, &enrollments, &reviews)))
}

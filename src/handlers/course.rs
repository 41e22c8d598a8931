// src/handlers/course.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    db::{COURSE_COLUMNS, QUESTION_COLUMNS},
    error::AppError,
    models::course::{
        Course, CourseDetail, CourseModule, Lesson, ModuleDetail, PublicQuestion, PublicQuiz,
        Quiz, QuizQuestion,
    },
};

/// Query parameters for the catalog.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub q: Option<String>,
}

/// Lists published courses, optionally filtered by category and title keyword.
pub async fn list_courses(
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let search_pattern = params.q.map(|k| format!("%{}%", k));

    let courses = sqlx::query_as::<_, Course>(&format!(
        r#"
        SELECT {COURSE_COLUMNS}
        FROM courses
        WHERE is_published = TRUE
          AND ($1::TEXT IS NULL OR category = $1)
          AND ($2::TEXT IS NULL OR title ILIKE $2)
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(params.category)
    .bind(search_pattern)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list courses: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(courses))
}

/// Retrieves a published course with its modules, lessons, and quizzes.
/// Quiz questions are returned without their correct option.
pub async fn get_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 AND is_published = TRUE"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let modules = sqlx::query_as::<_, CourseModule>(
        "SELECT id, course_id, title, position FROM course_modules WHERE course_id = $1 ORDER BY position, id",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let lessons = sqlx::query_as::<_, Lesson>(
        r#"
        SELECT l.id, l.module_id, l.title, l.content, l.video_url, l.duration_minutes, l.position
        FROM lessons l
        JOIN course_modules m ON m.id = l.module_id
        WHERE m.course_id = $1
        ORDER BY l.position, l.id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT q.id, q.module_id, q.title, q.passing_score, q.time_limit_minutes
        FROM quizzes q
        JOIN course_modules m ON m.id = q.module_id
        WHERE m.course_id = $1
        ORDER BY q.id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let quiz_ids: Vec<i64> = quizzes.iter().map(|q| q.id).collect();
    let questions = sqlx::query_as::<_, QuizQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE quiz_id = ANY($1) ORDER BY position, id"
    ))
    .bind(&quiz_ids)
    .fetch_all(&pool)
    .await?;

    Ok(Json(assemble_course_detail(course, modules, lessons, quizzes, questions)))
}

/// Groups flat rows into the nested course view.
fn assemble_course_detail(
    course: Course,
    modules: Vec<CourseModule>,
    lessons: Vec<Lesson>,
    quizzes: Vec<Quiz>,
    questions: Vec<QuizQuestion>,
) -> CourseDetail {
    let total_lessons = lessons.len();

    let mut lessons_by_module: HashMap<i64, Vec<Lesson>> = HashMap::new();
    for lesson in lessons {
        lessons_by_module.entry(lesson.module_id).or_default().push(lesson);
    }

    let mut questions_by_quiz: HashMap<i64, Vec<PublicQuestion>> = HashMap::new();
    for question in questions {
        questions_by_quiz
            .entry(question.quiz_id)
            .or_default()
            .push(PublicQuestion::from(question));
    }

    let mut quizzes_by_module: HashMap<i64, Vec<PublicQuiz>> = HashMap::new();
    for quiz in quizzes {
        let questions = questions_by_quiz.remove(&quiz.id).unwrap_or_default();
        quizzes_by_module
            .entry(quiz.module_id)
            .or_default()
            .push(PublicQuiz { quiz, questions });
    }

    let modules = modules
        .into_iter()
        .map(|module| ModuleDetail {
            lessons: lessons_by_module.remove(&module.id).unwrap_or_default(),
            quizzes: quizzes_by_module.remove(&module.id).unwrap_or_default(),
            module,
        })
        .collect();

    CourseDetail {
        course,
        total_lessons,
        modules,
    }
}

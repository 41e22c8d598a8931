// src/db.rs
//
// Queries shared by several handlers.

use sqlx::PgConnection;

use crate::{
    error::AppError,
    models::{
        course::{Course, CourseOutline, ModuleOutline, Quiz, QuizDefinition, QuizQuestion},
        enrollment::Enrollment,
    },
};

pub const COURSE_COLUMNS: &str =
    "id, instructor_id, title, description, category, price_cents, is_published, created_at";

pub const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, completed_lesson_ids, \
     completed_lessons, total_lessons, overall_progress, is_completed, completed_at, \
     amount_paid_cents, last_accessed_at, enrolled_at";

pub const QUESTION_COLUMNS: &str =
    "id, quiz_id, position, prompt, options, correct_option, points";

pub async fn find_course(conn: &mut PgConnection, course_id: i64) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))
}

/// Loads the lesson ids of a course grouped by module, in display order.
pub async fn load_course_outline(
    conn: &mut PgConnection,
    course_id: i64,
) -> Result<CourseOutline, AppError> {
    let rows: Vec<(i64, Option<i64>)> = sqlx::query_as(
        r#"
        SELECT m.id, l.id
        FROM course_modules m
        LEFT JOIN lessons l ON l.module_id = m.id
        WHERE m.course_id = $1
        ORDER BY m.position, m.id, l.position, l.id
        "#,
    )
    .bind(course_id)
    .fetch_all(conn)
    .await?;

    let mut outline = CourseOutline {
        course_id,
        modules: Vec::new(),
    };

    for (module_id, lesson_id) in rows {
        if outline.modules.last().map(|m| m.module_id) != Some(module_id) {
            outline.modules.push(ModuleOutline {
                module_id,
                lesson_ids: Vec::new(),
            });
        }
        if let (Some(lesson_id), Some(module)) = (lesson_id, outline.modules.last_mut()) {
            module.lesson_ids.push(lesson_id);
        }
    }

    Ok(outline)
}

/// Loads a quiz, its questions, and the course it belongs to.
pub async fn load_quiz_definition(
    conn: &mut PgConnection,
    quiz_id: i64,
) -> Result<QuizDefinition, AppError> {
    let (quiz, course_id) = sqlx::query_as::<_, (i64, i64, String, i32, Option<i32>, i64)>(
        r#"
        SELECT q.id, q.module_id, q.title, q.passing_score, q.time_limit_minutes, m.course_id
        FROM quizzes q
        JOIN course_modules m ON m.id = q.module_id
        WHERE q.id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(|(id, module_id, title, passing_score, time_limit_minutes, course_id)| {
        (
            Quiz {
                id,
                module_id,
                title,
                passing_score,
                time_limit_minutes,
            },
            course_id,
        )
    })
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let questions = sqlx::query_as::<_, QuizQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE quiz_id = $1 ORDER BY position, id"
    ))
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(QuizDefinition {
        quiz,
        course_id,
        questions,
    })
}

pub async fn find_enrollment_for(
    conn: &mut PgConnection,
    student_id: i64,
    course_id: i64,
) -> Result<Option<Enrollment>, AppError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = $1 AND course_id = $2"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(conn)
    .await?;

    Ok(enrollment)
}

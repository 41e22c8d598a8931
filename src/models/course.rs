// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::Validate;

use crate::config::{MAX_OPTIONS_PER_QUESTION, MIN_OPTIONS_PER_QUESTION};

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,

    /// Owner of the course content.
    pub instructor_id: i64,

    pub title: String,

    /// Sanitized HTML.
    pub description: String,

    pub category: String,

    /// Price in the smallest currency unit.
    pub price_cents: i64,

    /// Unpublished courses are hidden from the catalog and cannot be enrolled in.
    pub is_published: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'course_modules' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub position: i32,
}

/// Represents the 'lessons' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub duration_minutes: i32,
    pub position: i32,
}

/// Represents the 'quizzes' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    /// Percentage (0-100) required to pass.
    pub passing_score: i32,
    pub time_limit_minutes: Option<i32>,
}

/// Represents the 'quiz_questions' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub quiz_id: i64,
    pub position: i32,
    pub prompt: String,

    /// Ordered option strings, stored as a JSON array.
    pub options: Json<Vec<String>>,

    /// Zero-based index into `options`.
    pub correct_option: i32,

    pub points: i32,
}

/// A quiz together with everything grading needs: its questions and the
/// course/module it belongs to.
#[derive(Debug, Clone)]
pub struct QuizDefinition {
    pub quiz: Quiz,
    pub course_id: i64,
    pub questions: Vec<QuizQuestion>,
}

impl QuizDefinition {
    pub fn question(&self, question_id: i64) -> Option<&QuizQuestion> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Lesson identifiers of a course grouped by module.
/// The authoritative source for a course's current lesson count.
#[derive(Debug, Clone, Default)]
pub struct CourseOutline {
    pub course_id: i64,
    pub modules: Vec<ModuleOutline>,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleOutline {
    pub module_id: i64,
    pub lesson_ids: Vec<i64>,
}

impl CourseOutline {
    /// Sum of lesson counts across all modules.
    pub fn total_lessons(&self) -> usize {
        self.modules.iter().map(|m| m.lesson_ids.len()).sum()
    }

    pub fn contains_lesson(&self, lesson_id: i64) -> bool {
        self.modules
            .iter()
            .any(|m| m.lesson_ids.contains(&lesson_id))
    }
}

/// DTO for sending a question to students (excludes the correct option).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub prompt: String,
    pub options: Json<Vec<String>>,
    pub points: i32,
}

impl From<QuizQuestion> for PublicQuestion {
    fn from(q: QuizQuestion) -> Self {
        Self {
            id: q.id,
            prompt: q.prompt,
            options: q.options,
            points: q.points,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
pub struct ModuleDetail {
    #[serde(flatten)]
    pub module: CourseModule,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<PublicQuiz>,
}

/// Full course view returned by the catalog.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub total_lessons: usize,
    pub modules: Vec<ModuleDetail>,
}

/// DTO for creating a new course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 20000))]
    pub description: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[serde(default)]
    pub is_published: bool,
}

/// DTO for updating a course. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateModuleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 100000))]
    pub content: String,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub duration_minutes: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    #[validate(range(min = 1))]
    pub time_limit_minutes: Option<i32>,
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(range(min = 0))]
    pub correct_option: i32,
    #[validate(range(min = 0))]
    pub points: i32,
}

impl CreateQuestionRequest {
    /// The correct option must index into `options`.
    pub fn has_valid_correct_option(&self) -> bool {
        usize::try_from(self.correct_option)
            .map(|idx| idx < self.options.len())
            .unwrap_or(false)
    }
}

fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < MIN_OPTIONS_PER_QUESTION {
        return Err(validator::ValidationError::new("too_few_options"));
    }
    if options.len() > MAX_OPTIONS_PER_QUESTION {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("invalid_option_length"));
        }
    }
    Ok(())
}

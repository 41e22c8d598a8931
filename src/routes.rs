// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, course, enrollment, instructor, quiz, review},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, instructor_middleware},
};

/// Assembles the main application router.
///
/// * Catalog routes are public.
/// * Student routes require a valid bearer token.
/// * Authoring routes additionally require the instructor (or admin) role.
/// * Admin routes require the admin role.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let catalog_routes = Router::new()
        .route("/", get(course::list_courses))
        .route("/{id}", get(course::get_course))
        .route("/{id}/reviews", get(review::list_reviews));

    let student_routes = Router::new()
        .route("/courses/{id}/enroll", post(enrollment::enroll))
        .route("/courses/{id}/review", post(review::submit_review))
        .route("/enrollments", get(enrollment::list_my_enrollments))
        .route("/enrollments/{id}", get(enrollment::get_enrollment))
        .route(
            "/enrollments/{id}/lessons/{lesson_id}/complete",
            post(enrollment::complete_lesson),
        )
        .route("/quizzes/{id}/submit", post(quiz::submit_quiz))
        .route("/quizzes/{id}/attempts", get(quiz::list_my_attempts))
        .route("/attempts", get(quiz::list_attempts))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let instructor_routes = Router::new()
        .route("/courses", post(instructor::create_course))
        .route("/courses/{id}", put(instructor::update_course))
        .route("/courses/{id}/modules", post(instructor::create_module))
        .route("/modules/{id}/lessons", post(instructor::create_lesson))
        .route("/modules/{id}/quizzes", post(instructor::create_quiz))
        .route("/stats", get(instructor::my_stats))
        // Auth first, then role check
        .layer(middleware::from_fn(instructor_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/enrollments", get(admin::list_enrollments))
        .route("/enrollments/{id}", delete(admin::delete_enrollment))
        .route("/stats", get(admin::dashboard_stats))
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/courses", catalog_routes)
        .nest("/api", student_routes)
        .nest("/api/instructor", instructor_routes)
        .nest("/api/admin", admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

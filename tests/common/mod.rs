// tests/common/mod.rs

use coursemarket::{config::Config, routes, state::AppState, utils::jwt::sign_jwt};
use sqlx::postgres::PgPoolOptions;

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port.
/// Returns `None` when no database is configured so the caller can skip.
pub async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
    };

    let app = routes::create_router(AppState::new(pool, config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    })
}

/// A user id unlikely to collide with rows left by earlier runs.
pub fn unique_user_id() -> i64 {
    (uuid::Uuid::new_v4().as_u128() & 0x0000_7fff_ffff_ffff) as i64
}

pub fn token(user_id: i64, role: &str) -> String {
    sign_jwt(user_id, role, JWT_SECRET, 600).unwrap()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(
        &self,
        path: &str,
        token: &str,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a published course with `lessons_per_module` lessons in each module
    /// and one three-question quiz (10 points each, passing score 70) in the first module.
    /// Returns (course_id, lesson_ids, quiz_id).
    pub async fn seed_course(
        &self,
        instructor_token: &str,
        lessons_per_module: &[usize],
    ) -> (i64, Vec<i64>, i64) {
        let course: serde_json::Value = self
            .post_json(
                "/api/instructor/courses",
                instructor_token,
                serde_json::json!({
                    "title": format!("Rust {}", &uuid::Uuid::new_v4().to_string()[..8]),
                    "description": "<p>Systems programming</p>",
                    "category": "programming",
                    "price_cents": 4900,
                    "is_published": true
                }),
            )
            .await
            .json()
            .await
            .unwrap();
        let course_id = course["id"].as_i64().unwrap();

        let mut lesson_ids = Vec::new();
        let mut first_module = None;
        for (m, count) in lessons_per_module.iter().enumerate() {
            let module: serde_json::Value = self
                .post_json(
                    &format!("/api/instructor/courses/{}/modules", course_id),
                    instructor_token,
                    serde_json::json!({ "title": format!("Module {}", m + 1) }),
                )
                .await
                .json()
                .await
                .unwrap();
            let module_id = module["id"].as_i64().unwrap();
            first_module.get_or_insert(module_id);

            for l in 0..*count {
                let lesson: serde_json::Value = self
                    .post_json(
                        &format!("/api/instructor/modules/{}/lessons", module_id),
                        instructor_token,
                        serde_json::json!({
                            "title": format!("Lesson {}.{}", m + 1, l + 1),
                            "content": "Read the chapter.",
                            "duration_minutes": 10
                        }),
                    )
                    .await
                    .json()
                    .await
                    .unwrap();
                lesson_ids.push(lesson["id"].as_i64().unwrap());
            }
        }

        let quiz_resp = self
            .post_json(
                &format!("/api/instructor/modules/{}/quizzes", first_module.unwrap()),
                instructor_token,
                serde_json::json!({
                    "title": "Checkpoint",
                    "passing_score": 70,
                    "questions": [
                        { "prompt": "Q1", "options": ["a", "b", "c"], "correct_option": 0, "points": 10 },
                        { "prompt": "Q2", "options": ["a", "b", "c"], "correct_option": 1, "points": 10 },
                        { "prompt": "Q3", "options": ["a", "b", "c"], "correct_option": 2, "points": 10 }
                    ]
                }),
            )
            .await;
        assert_eq!(quiz_resp.status().as_u16(), 201);
        let quiz: serde_json::Value = quiz_resp.json().await.unwrap();

        (course_id, lesson_ids, quiz["id"].as_i64().unwrap())
    }
}

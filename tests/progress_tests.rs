// tests/progress_tests.rs

mod common;

use common::{TestApp, spawn_app, token, unique_user_id};

async fn question_ids(app: &TestApp, course_id: i64) -> Vec<i64> {
    let detail: serde_json::Value = app
        .client
        .get(app.url(&format!("/api/courses/{}", course_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    detail["modules"][0]["quizzes"][0]["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect()
}

async fn enroll(app: &TestApp, student: &str, course_id: i64) -> serde_json::Value {
    let response = app
        .post_json(
            &format!("/api/courses/{}/enroll", course_id),
            student,
            serde_json::json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn complete(
    app: &TestApp,
    student: &str,
    enrollment_id: i64,
    lesson_id: i64,
) -> reqwest::Response {
    app.post_json(
        &format!("/api/enrollments/{}/lessons/{}/complete", enrollment_id, lesson_id),
        student,
        serde_json::json!({}),
    )
    .await
}

async fn admin_list(app: &TestApp, admin: &str, course_id: i64, query: &str) -> serde_json::Value {
    let response = app
        .get_auth(
            &format!("/api/admin/enrollments?course_id={}{}", course_id, query),
            admin,
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn lesson_completion_flow() {
    let Some(app) = spawn_app().await else { return };
    let instructor = token(unique_user_id(), "instructor");
    let student = token(unique_user_id(), "student");

    let (course_id, lessons, _) = app.seed_course(&instructor, &[3, 3, 3]).await;

    let enrollment = enroll(&app, &student, course_id).await;
    let enrollment_id = enrollment["id"].as_i64().unwrap();
    assert_eq!(enrollment["total_lessons"], 9);
    assert_eq!(enrollment["overall_progress"], 0);

    // Enrolling twice conflicts.
    let response = app
        .post_json(
            &format!("/api/courses/{}/enroll", course_id),
            &student,
            serde_json::json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    complete(&app, &student, enrollment_id, lessons[0]).await;
    let response = complete(&app, &student, enrollment_id, lessons[1]).await;
    assert_eq!(response.status().as_u16(), 200);
    let progress: serde_json::Value = response.json().await.unwrap();
    assert_eq!(progress["completed_lessons"], 2);
    assert_eq!(progress["total_lessons"], 9);
    assert_eq!(progress["overall_progress"], 22);
    assert_eq!(progress["is_completed"], false);
    assert_eq!(progress["already_completed"], false);

    let before: serde_json::Value = app
        .get_auth(&format!("/api/enrollments/{}", enrollment_id), &student)
        .await
        .json()
        .await
        .unwrap();

    // Repeating a completion changes nothing, not even the last access time.
    let repeat: serde_json::Value = complete(&app, &student, enrollment_id, lessons[1])
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(repeat["already_completed"], true);
    assert_eq!(repeat["completed_lessons"], 2);
    assert_eq!(repeat["overall_progress"], 22);

    let after: serde_json::Value = app
        .get_auth(&format!("/api/enrollments/{}", enrollment_id), &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(before["last_accessed_at"], after["last_accessed_at"]);
    assert_eq!(after["completed_lesson_ids"].as_array().unwrap().len(), 2);

    // A lesson from another course is rejected.
    let response = complete(&app, &student, enrollment_id, i64::MAX).await;
    assert_eq!(response.status().as_u16(), 404);

    // Another student may not touch this enrollment.
    let intruder = token(unique_user_id(), "student");
    let response = complete(&app, &intruder, enrollment_id, lessons[2]).await;
    assert_eq!(response.status().as_u16(), 403);

    for lesson_id in &lessons[2..] {
        let response = complete(&app, &student, enrollment_id, *lesson_id).await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let done: serde_json::Value = app
        .get_auth(&format!("/api/enrollments/{}", enrollment_id), &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(done["completed_lessons"], 9);
    assert_eq!(done["overall_progress"], 100);
    assert_eq!(done["is_completed"], true);
    let completed_at = done["completed_at"].clone();
    assert!(!completed_at.is_null());

    // Repeating the final lesson keeps the first completion time.
    complete(&app, &student, enrollment_id, lessons[8]).await;
    let again: serde_json::Value = app
        .get_auth(&format!("/api/enrollments/{}", enrollment_id), &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(again["completed_at"], completed_at);
}

#[tokio::test]
async fn new_lessons_resync_total() {
    let Some(app) = spawn_app().await else { return };
    let instructor = token(unique_user_id(), "instructor");
    let student = token(unique_user_id(), "student");

    let (course_id, lessons, _) = app.seed_course(&instructor, &[2]).await;
    let enrollment = enroll(&app, &student, course_id).await;
    let enrollment_id = enrollment["id"].as_i64().unwrap();

    complete(&app, &student, enrollment_id, lessons[0]).await;

    // Instructor adds two more lessons to a new module.
    let module: serde_json::Value = app
        .post_json(
            &format!("/api/instructor/courses/{}/modules", course_id),
            &instructor,
            serde_json::json!({ "title": "Bonus" }),
        )
        .await
        .json()
        .await
        .unwrap();
    for title in ["Bonus 1", "Bonus 2"] {
        app.post_json(
            &format!("/api/instructor/modules/{}/lessons", module["id"]),
            &instructor,
            serde_json::json!({ "title": title, "content": "" }),
        )
        .await;
    }

    let progress: serde_json::Value = complete(&app, &student, enrollment_id, lessons[1])
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(progress["total_lessons"], 4);
    assert_eq!(progress["overall_progress"], 50);
    assert_eq!(progress["is_completed"], false);
}

#[tokio::test]
async fn quiz_submission_flow() {
    let Some(app) = spawn_app().await else { return };
    let instructor = token(unique_user_id(), "instructor");
    let student = token(unique_user_id(), "student");

    let (course_id, _, quiz_id) = app.seed_course(&instructor, &[1]).await;
    let questions = question_ids(&app, course_id).await;
    assert_eq!(questions.len(), 3);

    let started_at = (chrono::Utc::now() - chrono::Duration::seconds(120)).to_rfc3339();
    let submit_path = format!("/api/quizzes/{}/submit", quiz_id);

    // Not enrolled yet.
    let response = app
        .post_json(
            &submit_path,
            &student,
            serde_json::json!({ "answers": [], "started_at": started_at }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);

    enroll(&app, &student, course_id).await;

    // Q1 and Q3 right, Q2 wrong.
    let response = app
        .post_json(
            &submit_path,
            &student,
            serde_json::json!({
                "answers": [
                    { "question_id": questions[0], "selected_option": 0 },
                    { "question_id": questions[1], "selected_option": 0 },
                    { "question_id": questions[2], "selected_option": 2 }
                ],
                "started_at": started_at
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 20);
    assert_eq!(result["max_score"], 30);
    assert_eq!(result["percentage"], 67);
    assert_eq!(result["passed"], false);
    assert_eq!(result["passing_score"], 70);
    assert!(result["time_spent"].as_i64().unwrap() >= 120);
    assert_eq!(result["answers"][1]["is_correct"], false);
    let first_attempt = result["attempt_id"].as_i64().unwrap();

    // Resubmitting creates a new attempt; unknown questions are inert.
    let response = app
        .post_json(
            &submit_path,
            &student,
            serde_json::json!({
                "answers": [
                    { "question_id": questions[0], "selected_option": 0 },
                    { "question_id": questions[1], "selected_option": 1 },
                    { "question_id": questions[2], "selected_option": 2 },
                    { "question_id": i64::MAX, "selected_option": 0 }
                ],
                "started_at": "2999-01-01T00:00:00Z"
            }),
        )
        .await;
    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 30);
    assert_eq!(result["max_score"], 30);
    assert_eq!(result["percentage"], 100);
    assert_eq!(result["passed"], true);
    // A start time in the future is clamped.
    assert_eq!(result["time_spent"], 0);
    assert_ne!(result["attempt_id"].as_i64().unwrap(), first_attempt);

    let attempts: Vec<serde_json::Value> = app
        .get_auth(&format!("/api/quizzes/{}/attempts", quiz_id), &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1]["id"].as_i64().unwrap(), first_attempt);
    assert_eq!(attempts[1]["percentage"], 67);

    // The same history, listed by course.
    let by_course: Vec<serde_json::Value> = app
        .get_auth(&format!("/api/attempts?course_id={}", course_id), &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_course.len(), 2);
    assert_eq!(by_course[1]["id"].as_i64().unwrap(), first_attempt);

    // A negative option index is rejected and nothing is stored.
    let response = app
        .post_json(
            &submit_path,
            &student,
            serde_json::json!({
                "answers": [{ "question_id": questions[0], "selected_option": -1 }],
                "started_at": started_at
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let attempts: Vec<serde_json::Value> = app
        .get_auth(&format!("/api/quizzes/{}/attempts", quiz_id), &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(attempts.len(), 2);

    // Missing quiz.
    let response = app
        .post_json(
            "/api/quizzes/9223372036854775807/submit",
            &student,
            serde_json::json!({ "answers": [], "started_at": started_at }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_manages_enrollments_and_sees_stats() {
    let Some(app) = spawn_app().await else { return };
    let instructor = token(unique_user_id(), "instructor");
    let admin = token(unique_user_id(), "admin");

    let (course_id, lessons, _) = app.seed_course(&instructor, &[2]).await;

    // First student finishes the course, second is halfway, third has not started.
    let mut students = Vec::new();
    for done in [2, 1, 0] {
        let student_id = unique_user_id();
        let student = token(student_id, "student");
        let enrollment = enroll(&app, &student, course_id).await;
        let id = enrollment["id"].as_i64().unwrap();
        assert_eq!(enrollment["amount_paid_cents"], 4900);
        for lesson_id in &lessons[..done] {
            complete(&app, &student, id, *lesson_id).await;
        }
        students.push((student_id, student, id));
    }

    let page = admin_list(&app, &admin, course_id, "").await;
    assert_eq!(page["enrollments"].as_array().unwrap().len(), 3);
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["pagination"]["page"], 1);
    let total = page["stats"]["total"].as_i64().unwrap();
    assert!(total >= 3);
    assert_eq!(
        page["stats"]["active"].as_i64().unwrap() + page["stats"]["completed"].as_i64().unwrap(),
        total
    );

    let completed = admin_list(&app, &admin, course_id, "&status=completed").await;
    assert_eq!(completed["pagination"]["total"], 1);
    assert_eq!(completed["enrollments"][0]["id"].as_i64().unwrap(), students[0].2);

    let active = admin_list(&app, &admin, course_id, "&status=active").await;
    assert_eq!(active["pagination"]["total"], 2);

    let second_page = admin_list(&app, &admin, course_id, "&limit=2&page=2").await;
    assert_eq!(second_page["enrollments"].as_array().unwrap().len(), 1);
    assert_eq!(second_page["pagination"]["pages"], 2);
    assert_eq!(second_page["pagination"]["total"], 3);

    let searched = admin_list(&app, &admin, course_id, &format!("&search={}", students[1].0)).await;
    assert_eq!(searched["pagination"]["total"], 1);
    assert_eq!(searched["enrollments"][0]["id"].as_i64().unwrap(), students[1].2);

    let response = app
        .get_auth("/api/admin/enrollments?status=paused", &admin)
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // Reviews from enrolled students only.
    for ((_, student, _), rating) in students.iter().zip([5, 4]) {
        let response = app
            .post_json(
                &format!("/api/courses/{}/review", course_id),
                student,
                serde_json::json!({ "rating": rating, "comment": "Solid" }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
    }
    let outsider = token(unique_user_id(), "student");
    let response = app
        .post_json(
            &format!("/api/courses/{}/review", course_id),
            &outsider,
            serde_json::json!({ "rating": 1 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);

    let reviews: Vec<serde_json::Value> = app
        .client
        .get(app.url(&format!("/api/courses/{}/reviews", course_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reviews.len(), 2);

    // A later price change does not rewrite past revenue.
    let response = app
        .client
        .put(app.url(&format!("/api/instructor/courses/{}", course_id)))
        .bearer_auth(&instructor)
        .json(&serde_json::json!({ "price_cents": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let stats: serde_json::Value = app
        .get_auth("/api/instructor/stats", &instructor)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_courses"], 1);
    assert_eq!(stats["total_enrollments"], 3);
    assert_eq!(stats["completed_enrollments"], 1);
    assert_eq!(stats["total_students"], 3);
    assert_eq!(stats["revenue_cents"], 14700);
    assert_eq!(stats["average_progress"], 50);
    assert_eq!(stats["average_rating"], 4.5);

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/enrollments/{}", students[0].2)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/enrollments/{}", students[0].2)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    assert_eq!(admin_list(&app, &admin, course_id, "").await["pagination"]["total"], 2);

    let response = app.get_auth("/api/admin/stats", &admin).await;
    assert_eq!(response.status().as_u16(), 200);
}

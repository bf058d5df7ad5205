//! Contract tests for the demo lesson-data endpoint.
//!
//! Drives the axum router directly with tower's `oneshot`, no sockets.

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use lessonq::lessons::LessonData;
use lessonq::server::app;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
  let bytes = response.into_body().collect().await.unwrap().to_bytes();
  serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
  Request::builder()
    .method(method)
    .uri(uri)
    .header(http::header::CONTENT_TYPE, "application/json")
    .body(body.to_string())
    .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
  Request::builder().uri(uri).body(String::new()).unwrap()
}

#[tokio::test]
async fn get_seeds_deterministic_lesson() {
  let app = app();
  let resp = app
    .oneshot(get_request("/api/lesson-data?lessonId=intro"))
    .await
    .unwrap();

  assert_eq!(resp.status(), StatusCode::OK);
  let lesson: LessonData = body_json(resp).await;
  assert_eq!(lesson.id, "intro");
  assert_eq!(lesson.progress, 60);
  assert_eq!(lesson.user_stats.completed_exercises, 2);
  assert_eq!(lesson.user_stats.total_exercises, 5);
  assert_eq!(lesson.recommendations.len(), 3);
}

#[tokio::test]
async fn get_without_lesson_id_uses_default() {
  let app = app();
  let resp = app.oneshot(get_request("/api/lesson-data")).await.unwrap();

  assert_eq!(resp.status(), StatusCode::OK);
  let lesson: LessonData = body_json(resp).await;
  assert_eq!(lesson.id, "language-models-intro");
}

#[tokio::test]
async fn get_is_stable_across_requests() {
  let app = app();
  let first: LessonData = body_json(
    app
      .clone()
      .oneshot(get_request("/api/lesson-data?lessonId=intro"))
      .await
      .unwrap(),
  )
  .await;
  let second: LessonData = body_json(
    app
      .oneshot(get_request("/api/lesson-data?lessonId=intro"))
      .await
      .unwrap(),
  )
  .await;
  assert_eq!(first, second);
}

#[tokio::test]
async fn complete_exercise_advances_progress() {
  let app = app();

  // Seed via GET: progress 60, 2/5 exercises.
  let seeded: LessonData = body_json(
    app
      .clone()
      .oneshot(get_request("/api/lesson-data?lessonId=intro"))
      .await
      .unwrap(),
  )
  .await;
  assert_eq!(seeded.progress, 60);

  let resp = app
    .oneshot(json_request(
      "POST",
      "/api/lesson-data",
      r#"{"lessonId":"intro","action":"complete_exercise"}"#,
    ))
    .await
    .unwrap();

  assert_eq!(resp.status(), StatusCode::OK);
  let lesson: LessonData = body_json(resp).await;
  assert_eq!(lesson.user_stats.completed_exercises, 3);
  assert_eq!(lesson.progress, 70);
}

#[tokio::test]
async fn complete_exercise_caps_at_totals() {
  let app = app();

  // 2/5 seeded; completing five more times can only reach 5/5 and 100.
  let mut lesson: LessonData = body_json(
    app
      .clone()
      .oneshot(get_request("/api/lesson-data?lessonId=intro"))
      .await
      .unwrap(),
  )
  .await;
  for _ in 0..5 {
    lesson = body_json(
      app
        .clone()
        .oneshot(json_request(
          "POST",
          "/api/lesson-data",
          r#"{"lessonId":"intro","action":"complete_exercise"}"#,
        ))
        .await
        .unwrap(),
    )
    .await;
  }

  assert_eq!(lesson.user_stats.completed_exercises, 5);
  assert_eq!(lesson.progress, 100);
}

#[tokio::test]
async fn update_progress_leaves_lesson_unchanged() {
  let app = app();
  let seeded: LessonData = body_json(
    app
      .clone()
      .oneshot(get_request("/api/lesson-data?lessonId=intro"))
      .await
      .unwrap(),
  )
  .await;

  let resp = app
    .oneshot(json_request(
      "POST",
      "/api/lesson-data",
      r#"{"lessonId":"intro","action":"update_progress"}"#,
    ))
    .await
    .unwrap();

  assert_eq!(resp.status(), StatusCode::OK);
  let lesson: LessonData = body_json(resp).await;
  assert_eq!(lesson.progress, seeded.progress);
  assert_eq!(
    lesson.user_stats.completed_exercises,
    seeded.user_stats.completed_exercises
  );
}

#[tokio::test]
async fn post_without_lesson_id_is_400() {
  let app = app();
  let resp = app
    .oneshot(json_request(
      "POST",
      "/api/lesson-data",
      r#"{"action":"complete_exercise"}"#,
    ))
    .await
    .unwrap();

  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: serde_json::Value = body_json(resp).await;
  assert_eq!(body["error"], "lessonId is required");
}

#[tokio::test]
async fn unsupported_method_is_405_with_allow_header() {
  let app = app();
  let resp = app
    .oneshot(json_request("DELETE", "/api/lesson-data", ""))
    .await
    .unwrap();

  assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
  assert_eq!(resp.headers()[http::header::ALLOW], "GET, POST");
  let body: serde_json::Value = body_json(resp).await;
  assert_eq!(body["error"], "Method DELETE Not Allowed");
}

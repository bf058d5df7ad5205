//! Demo lesson-data endpoint backed by in-process memory.
//!
//! This is the external collaborator the client talks to; its only
//! contract is the request/response shape of `/api/lesson-data`. The
//! store does not persist across restarts.

use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use crate::config::DEFAULT_LESSON_ID;
use crate::lessons::{LessonData, ProgressAction, UserStats};

pub type LessonStore = Arc<RwLock<HashMap<String, LessonData>>>;

/// Build the demo router with a fresh in-memory store.
pub fn app() -> Router {
  let store: LessonStore = Arc::new(RwLock::new(HashMap::new()));
  Router::new().route(
    "/api/lesson-data",
    get(get_lesson_data)
      .post(update_lesson_data)
      .fallback(method_not_allowed),
  )
  .with_state(store)
}

/// Serve the demo endpoint on the given listener.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
  axum::serve(listener, app()).await
}

/// Deterministic starting state for a lesson seen for the first time.
fn seed_lesson(lesson_id: &str) -> LessonData {
  LessonData {
    id: lesson_id.to_string(),
    title: "Introduction to Language Models".to_string(),
    progress: 60,
    user_stats: UserStats {
      completed_exercises: 2,
      total_exercises: 5,
      time_spent: 900,
    },
    recommendations: vec![
      "Try the advanced tokenization exercise".to_string(),
      "Review transformer architecture concepts".to_string(),
      "Practice with the interactive code examples".to_string(),
    ],
    last_accessed: Utc::now(),
  }
}

#[derive(Deserialize)]
struct LessonQuery {
  #[serde(rename = "lessonId")]
  lesson_id: Option<String>,
}

async fn get_lesson_data(
  State(store): State<LessonStore>,
  Query(query): Query<LessonQuery>,
) -> Json<LessonData> {
  let lesson_id = query.lesson_id.as_deref().unwrap_or(DEFAULT_LESSON_ID);

  let mut store = store.write().await;
  let lesson = store
    .entry(lesson_id.to_string())
    .or_insert_with(|| seed_lesson(lesson_id));
  Json(lesson.clone())
}

async fn update_lesson_data(State(store): State<LessonStore>, Json(body): Json<Value>) -> Response {
  // Extracted by hand: a missing lessonId must be a 400, not a decode
  // rejection from the extractor.
  let Some(lesson_id) = body.get("lessonId").and_then(Value::as_str) else {
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({"error": "lessonId is required"})),
    )
      .into_response();
  };

  let action = body
    .get("action")
    .and_then(|v| serde_json::from_value::<ProgressAction>(v.clone()).ok());

  let mut store = store.write().await;
  let lesson = store
    .entry(lesson_id.to_string())
    .or_insert_with(|| seed_lesson(lesson_id));

  match action {
    Some(ProgressAction::CompleteExercise) => lesson.complete_exercise(),
    // update_progress and unknown actions store the lesson unchanged
    Some(ProgressAction::UpdateProgress) | None => {}
  }

  Json(lesson.clone()).into_response()
}

async fn method_not_allowed(method: Method) -> Response {
  (
    StatusCode::METHOD_NOT_ALLOWED,
    [(header::ALLOW, "GET, POST")],
    Json(json!({"error": format!("Method {} Not Allowed", method)})),
  )
    .into_response()
}

//! Lesson data types matching the `/lesson-data` wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonData {
  pub id: String,
  pub title: String,
  /// Completion percentage, 0-100
  pub progress: u32,
  pub user_stats: UserStats,
  pub recommendations: Vec<String>,
  /// ISO-8601 timestamp of the last access
  pub last_accessed: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
  pub completed_exercises: u32,
  pub total_exercises: u32,
  /// Seconds spent in the lesson
  pub time_spent: u64,
}

impl LessonData {
  /// Record a completed exercise: one more exercise (capped at the total)
  /// and ten points of progress (capped at 100).
  pub fn complete_exercise(&mut self) {
    self.user_stats.completed_exercises = self
      .user_stats
      .completed_exercises
      .saturating_add(1)
      .min(self.user_stats.total_exercises);
    self.progress = self.progress.saturating_add(10).min(100);
    self.last_accessed = Utc::now();
  }
}

/// The closed set of write operations on a lesson, carried on the wire as
/// the `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressAction {
  CompleteExercise,
  UpdateProgress,
}

/// POST `/lesson-data` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
  pub lesson_id: String,
  pub action: ProgressAction,
}

/// Arguments for [`LessonsApi::update_lesson_progress`](super::LessonsApi).
#[derive(Debug, Clone)]
pub struct UpdateLessonProgressArgs {
  pub lesson_id: String,
  /// true maps to `complete_exercise`, false to `update_progress`
  pub exercise_completed: bool,
}

impl UpdateLessonProgressArgs {
  pub fn completed(lesson_id: impl Into<String>) -> Self {
    Self {
      lesson_id: lesson_id.into(),
      exercise_completed: true,
    }
  }

  pub fn action(&self) -> ProgressAction {
    if self.exercise_completed {
      ProgressAction::CompleteExercise
    } else {
      ProgressAction::UpdateProgress
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lesson(progress: u32, completed: u32, total: u32) -> LessonData {
    LessonData {
      id: "intro".to_string(),
      title: "Introduction to Language Models".to_string(),
      progress,
      user_stats: UserStats {
        completed_exercises: completed,
        total_exercises: total,
        time_spent: 900,
      },
      recommendations: vec![],
      last_accessed: Utc::now(),
    }
  }

  #[test]
  fn test_complete_exercise_increments_and_adds_progress() {
    let mut data = lesson(65, 3, 5);
    data.complete_exercise();
    assert_eq!(data.user_stats.completed_exercises, 4);
    assert_eq!(data.progress, 75);
  }

  #[test]
  fn test_complete_exercise_caps_at_totals() {
    let mut data = lesson(95, 5, 5);
    data.complete_exercise();
    assert_eq!(data.user_stats.completed_exercises, 5);
    assert_eq!(data.progress, 100);
  }

  #[test]
  fn test_wire_shape_is_camel_case() {
    let json = serde_json::to_value(lesson(60, 2, 5)).unwrap();
    assert!(json.get("userStats").is_some());
    assert!(json["userStats"].get("completedExercises").is_some());
    assert!(json.get("lastAccessed").is_some());
  }

  #[test]
  fn test_action_serializes_snake_case() {
    let req = UpdateLessonRequest {
      lesson_id: "intro".to_string(),
      action: ProgressAction::CompleteExercise,
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["lessonId"], "intro");
    assert_eq!(json["action"], "complete_exercise");
  }

  #[test]
  fn test_args_map_to_actions() {
    assert_eq!(
      UpdateLessonProgressArgs::completed("x").action(),
      ProgressAction::CompleteExercise
    );
    let args = UpdateLessonProgressArgs {
      lesson_id: "x".to_string(),
      exercise_completed: false,
    };
    assert_eq!(args.action(), ProgressAction::UpdateProgress);
  }
}

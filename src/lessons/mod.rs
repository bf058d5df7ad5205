//! Lessons endpoint: typed data shapes and the cached client façade.

mod api;
mod types;

pub use api::LessonsApi;
pub use types::{
  LessonData, ProgressAction, UpdateLessonProgressArgs, UpdateLessonRequest, UserStats,
};

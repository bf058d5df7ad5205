use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lessonq::{Config, LessonsApi, UpdateLessonProgressArgs};

#[derive(Parser, Debug)]
#[command(name = "lessonq")]
#[command(about = "Demo lesson-data endpoint plus a cached client walkthrough")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/lessonq/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Port for the demo endpoint (0 picks a free port)
  #[arg(short, long, default_value_t = 3000)]
  port: u16,

  /// Lesson to exercise in the walkthrough
  #[arg(short, long)]
  lesson: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;

  // Serve the demo endpoint locally and point the client at it.
  let listener = TcpListener::bind(("127.0.0.1", args.port)).await?;
  let addr = listener.local_addr()?;
  config.origin = format!("http://{}", addr);
  info!(%addr, "demo endpoint listening");

  tokio::spawn(async move {
    if let Err(error) = lessonq::server::run(listener).await {
      tracing::error!(%error, "demo endpoint stopped");
    }
  });

  let api = LessonsApi::new(&config)?;
  let lesson_id = args.lesson.as_deref();

  let lesson = api.get_lesson_data(lesson_id).await?;
  info!(
    lesson = %lesson.id,
    progress = lesson.progress,
    completed = lesson.user_stats.completed_exercises,
    "initial fetch"
  );

  // Served from cache; the endpoint sees no second request.
  let cached = api.get_lesson_data(lesson_id).await?;
  info!(progress = cached.progress, "second read (cache hit)");

  let updated = api
    .update_lesson_progress(UpdateLessonProgressArgs::completed(lesson.id.clone()))
    .await?;
  info!(
    progress = updated.progress,
    completed = updated.user_stats.completed_exercises,
    "exercise completed"
  );

  // The mutation invalidated the lesson tag, so this read refetches.
  let refreshed = api.get_lesson_data(lesson_id).await?;
  info!(progress = refreshed.progress, "read after invalidation (refetched)");

  info!("demo endpoint still serving; press Ctrl-C to exit");
  tokio::signal::ctrl_c().await?;

  Ok(())
}

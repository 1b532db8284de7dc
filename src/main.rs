use std::sync::Arc;
use std::time::Duration;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use ai_starter_quest::channels::cli;
use ai_starter_quest::config::QuestConfig;
use ai_starter_quest::llm::create_provider;
use ai_starter_quest::quest::{
    QuestEngine, QuestRouteState, SessionStore, TutorClient, quest_routes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = QuestConfig::from_env()?;

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(&config);

    let cli_mode = std::env::args().nth(1).as_deref() == Some("cli");

    let llm = create_provider(&config);
    let tutor = TutorClient::new(llm, &config);

    eprintln!("🎓 AI Starter Quest v{}", env!("CARGO_PKG_VERSION"));
    if tutor.is_ready() {
        eprintln!("   Tutor: Gemini ({})", config.model);
    } else if config.ai_configured() {
        eprintln!("   Tutor: disabled (Gemini client setup failed, see logs)");
    } else {
        eprintln!("   Tutor: disabled (set GEMINI_API_KEY to enable hints)");
    }
    eprintln!(
        "   Coaching asides: {}",
        if config.coaching_enabled { "on" } else { "off" }
    );

    let engine = Arc::new(QuestEngine::new(tutor, &config));
    let store = SessionStore::new();

    if cli_mode {
        eprintln!("   Commands: /hint, /email <address>, /status, /reset, /quit\n");
        cli::run(engine, store).await?;
        return Ok(());
    }

    eprintln!("   API: http://0.0.0.0:{}/api/sessions\n", config.port);

    spawn_session_pruning(Arc::clone(&store), config.session_idle_timeout);

    let app = quest_routes(QuestRouteState { engine, store });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Quest server started");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop sessions that have gone idle.
fn spawn_session_pruning(store: Arc<SessionStore>, idle_timeout: Duration) {
    if idle_timeout.is_zero() {
        tracing::info!("Session pruning disabled");
        return;
    }
    let period = idle_timeout.min(Duration::from_secs(600));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            store.prune_idle(idle_timeout).await;
        }
    });
}

/// Console logging plus an optional daily-rolling log file.
fn init_tracing(config: &QuestConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ai-starter-quest.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

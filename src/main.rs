//! Standalone trivia host wiring the session engine to a terminal transport.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_host::{
    bank::QuestionBank,
    config::AppConfig,
    dao::session_store::{SessionStore, memory::MemorySessionStore},
    services::{commands, session_service, storage_supervisor},
    state::{AppState, SharedState},
    transport::console::ConsoleTransport,
};

/// Guild every console message is attributed to.
const LOCAL_GUILD_ID: &str = "local";
/// Channel every console message is posted in.
const LOCAL_CHANNEL_ID: &str = "general";
/// Author every console message is attributed to.
const LOCAL_USER_ID: &str = "player";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let bank = QuestionBank::load();
    let session_ttl = config.session_ttl;

    let state = AppState::new(config, bank, Arc::new(ConsoleTransport::new()));

    tokio::spawn(storage_supervisor::run(state.clone(), move || async move {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(session_ttl));
        Ok(store)
    }));

    wait_for_store(&state).await?;
    match session_service::resume_unfinished(&state).await {
        Ok(count) if count > 0 => info!(count, "resumed sessions from the store"),
        Ok(_) => {}
        Err(err) => warn!(error = %err, "failed to resume unfinished sessions"),
    }

    info!(
        "trivia host ready; talk in #{LOCAL_CHANNEL_ID} below (commands start with {})",
        commands::COMMAND_WORD
    );
    run_console_loop(state).await
}

/// Block until the supervisor has installed a session store.
async fn wait_for_store(state: &SharedState) -> anyhow::Result<()> {
    let mut watcher = state.degraded_watcher();
    while *watcher.borrow_and_update() {
        watcher.changed().await?;
    }
    Ok(())
}

/// Feed stdin lines into the inbound dispatch until EOF or a shutdown signal.
async fn run_console_loop(state: SharedState) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = shutdown_signal() => {
                info!("shutting down");
                return Ok(());
            }
            line = lines.next_line() => {
                match line? {
                    Some(content) => {
                        let content = content.trim();
                        if content.is_empty() {
                            continue;
                        }
                        commands::handle_inbound(
                            &state,
                            LOCAL_GUILD_ID,
                            LOCAL_CHANNEL_ID,
                            LOCAL_USER_ID,
                            content,
                        )
                        .await;
                    }
                    None => {
                        info!("stdin closed; shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

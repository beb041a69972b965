//! Trivia Back binary entrypoint wiring REST, SSE, storage, and the question
//! provider together.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_back::{
    config::AppConfig,
    dao::{session_store::SessionStore, storage::StorageError},
    provider::{
        QuestionProvider,
        llm::{LlmConfig, LlmQuestionProvider},
    },
    routes,
    services::{reaper, sse_events, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let provider = build_provider();
    let app_state = AppState::new(config, provider);

    spawn_storage_supervisor(app_state.clone());
    tokio::spawn(reaper::run(app_state.clone()));
    tokio::spawn(watch_degraded(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the LLM question provider when credentials are configured; without
/// them questions come from the built-in bank.
fn build_provider() -> Option<Arc<dyn QuestionProvider>> {
    let config = LlmConfig::from_env()?;
    match LlmQuestionProvider::new(config) {
        Ok(provider) => {
            info!("LLM question provider configured");
            Some(Arc::new(provider))
        }
        Err(err) => {
            warn!(error = %err, "failed to build LLM provider; using the built-in bank only");
            None
        }
    }
}

/// Supervise the MongoDB session store connection in the background.
#[cfg(feature = "mongo-store")]
fn spawn_storage_supervisor(state: SharedState) {
    use trivia_back::dao::session_store::mongodb::{MongoSessionStore, config::MongoConfig};

    tokio::spawn(storage_supervisor::run(state, || async {
        let config = MongoConfig::from_env()
            .await
            .map_err(|err| StorageError::unavailable("invalid MongoDB configuration".into(), err))?;
        let store = MongoSessionStore::connect(config).await?;
        Ok(Arc::new(store) as Arc<dyn SessionStore>)
    }));
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_storage_supervisor(_state: SharedState) {
    warn!("no storage backend compiled in; running degraded");
}

/// Forward degraded mode flips to public SSE subscribers.
async fn watch_degraded(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        sse_events::broadcast_system_status(&state, degraded);
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
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

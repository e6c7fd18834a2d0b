pub mod handlers;

pub use handlers::{create_router, AppState};

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::classifier::Classifier;

/// Serve the ranking API on `bind` until Ctrl-C.
pub async fn start_server<C: Classifier + 'static>(bind: &str, state: AppState<C>) -> Result<()> {
    let entries = state.snapshot.len();
    let app = create_router(state);

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!(%bind, entries, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // If the handler cannot be installed, run until killed
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

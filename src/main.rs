use std::sync::Arc;
use tracing::{error, info, warn};

use chat_relay::{
    config::AppConfig,
    logger,
    persistence::{start_persistence_task, FileSnapshotStorage, SnapshotStorage},
    server::build_router,
    AppState, ChatStore, InMemoryChatStore, InMemoryConnectionRegistry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init_tracing();

    info!("Starting chat relay server");

    let config = AppConfig::from_env()?;

    // Seed the store from disk before accepting any client traffic
    let chat_store = Arc::new(InMemoryChatStore::new());
    let storage = Arc::new(FileSnapshotStorage::new(config.storage_dir.clone()));
    match storage.load().await {
        Ok(snapshot) => {
            chat_store.restore(snapshot).await;
        }
        Err(e) => {
            warn!(error = %e, "Failed to load stored chats, starting empty");
        }
    }

    let connection_registry = Arc::new(InMemoryConnectionRegistry::new());
    let app_state = AppState::new(
        chat_store.clone(),
        connection_registry,
        config.outbound_queue_capacity,
    );

    let persistence_task = start_persistence_task(
        chat_store.clone(),
        storage.clone(),
        config.persistence.clone(),
    );

    let app = build_router(app_state, &config.allowed_origin)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "WebSocket server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush one last snapshot so nothing since the last cycle is lost. The
    // background task must be fully stopped first so its writes cannot land
    // after the final one.
    persistence_task.abort();
    if let Err(e) = persistence_task.await {
        if !e.is_cancelled() {
            warn!(error = %e, "Persistence task ended abnormally");
        }
    }
    let snapshot = chat_store.snapshot().await;
    if let Err(e) = storage.write(&snapshot).await {
        error!(error = %e, "Final backup failed");
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

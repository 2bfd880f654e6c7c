use std::net::SocketAddr;
use tracing::info;
use zenti_agent::api::{create_router, AppState};
use zenti_agent::bootstrap;
use zenti_agent::infrastructure::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    bootstrap::init_tracing("api=debug,zenti_agent=debug,tower_http=debug");

    let config = AppConfig::load()?;
    let rag = bootstrap::build_rag(&config.config)?;
    let llm = bootstrap::build_llm(&config.config.llm)?;
    let query_handler = bootstrap::build_query_handler(&config, llm, rag.clone());
    info!(provider = %config.config.llm.provider, "services initialized");

    let addr = SocketAddr::new(config.config.server.host.parse()?, config.config.server.port);
    let state = AppState::new(query_handler, rag, config);
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemFileStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::integrations::build_http_client;
use server::integrations::generative::GeminiGenerator;
use server::integrations::identity::RemoteIdentityProvider;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if config.identity.accept_invalid_certs {
        warn!("TLS certificate verification is disabled for the identity service");
    }

    let db = server::database::init_db(&config.database.url).await?;
    server::seed::seed_role_permissions(&db).await?;
    server::seed::seed_organization_profiles(&db).await?;
    server::seed::ensure_indexes(&db).await?;

    let files = FilesystemFileStore::new(
        PathBuf::from(&config.storage.root),
        config.storage.max_upload_size,
    )
    .await
    .context("Failed to prepare the storage directory")?;

    let identity_client = build_http_client(
        config.identity.timeout_secs,
        config.identity.accept_invalid_certs,
    )?;
    let chatbot_client = build_http_client(config.chatbot.timeout_secs, false)?;

    let state = AppState {
        db,
        files: Arc::new(files),
        identity: Arc::new(RemoteIdentityProvider::new(
            identity_client,
            &config.identity,
        )),
        generator: Arc::new(GeminiGenerator::new(chatbot_client, &config.chatbot)),
        config: Arc::new(config),
    };

    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("Invalid server host/port")?;
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

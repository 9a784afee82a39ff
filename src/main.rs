use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use line_sketch::{
    api,
    config,
    history::{HistoryStore, JsonFileBackend},
    orchestrator::JobOrchestrator,
    prompt::PromptComposer,
    replicate::ReplicateClient,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    config::Config::dotenv_load();
    let config = config::Config::new().expect("Failed to load configuration");
    config::Config::print_env_vars();

    let client = ReplicateClient::new(config.replicate_api_url.clone());
    let orchestrator = JobOrchestrator::new(Arc::new(client), config.poll_policy(), config.default_credential());
    let history = HistoryStore::open(Box::new(JsonFileBackend::new(&config.history_path)))
        .expect("Failed to open history store");

    let shutdown = CancellationToken::new();
    let state = Arc::new(api::AppState {
        orchestrator: Arc::new(orchestrator),
        history: Arc::new(history),
        composer: PromptComposer::new(),
        shutdown: shutdown.clone(),
    });
    let app = api::router(state);

    // Run our application with safe parsing
    let host_str = config.api_host.clone();
    let port_str = config.api_port.clone();
    let ip: std::net::IpAddr = host_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", host_str);
        std::net::IpAddr::from([127, 0, 0, 1])
    });
    let port: u16 = port_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 8190", port_str);
        8190
    });
    let socket_address = SocketAddr::new(ip, port);
    tracing::info!("listening on {}", socket_address);

    let result = axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested, cancelling in-flight jobs");
            shutdown.cancel();
        })
        .await;
    if let Err(e) = result {
        tracing::error!(error = %e, "Server error");
    }
}

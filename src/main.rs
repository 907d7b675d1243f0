use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use studygroup_server::config::{AuthMode, EmailMode, StoreBackend};
use studygroup_server::core::{AppState, Config, IdentityVerifier, JwtVerifier, RemoteVerifier};
use studygroup_server::notifications::{EmailApiNotifier, LogNotifier, Notifier};
use studygroup_server::repositories::MemoryStore;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Inizializza il logging (RUST_LOG sovrascrive il default)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,studygroup_server=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Carica la configurazione
    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    config.print_info();

    // Verificatore dei token
    let verifier: Arc<dyn IdentityVerifier> = match &config.auth {
        AuthMode::Jwt { secret } => Arc::new(JwtVerifier::new(secret)),
        AuthMode::Remote { url, api_key } => Arc::new(RemoteVerifier::new(url, api_key.clone())?),
    };

    // Canale di consegna delle email
    let notifier: Arc<dyn Notifier> = match &config.email {
        EmailMode::Live(api) => Arc::new(EmailApiNotifier::new(api.clone())?),
        EmailMode::Log => Arc::new(LogNotifier),
    };

    // Store
    let state = match &config.store {
        StoreBackend::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .connect(database_url)
                .await?;
            info!("Connected to PostgreSQL");

            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Migrations applied");

            AppState::from_pool(
                pool,
                verifier,
                notifier,
                config.dispatch_interval,
                &config.public_base_url,
            )
        }
        StoreBackend::Memory => AppState::from_memory(
            Arc::new(MemoryStore::new()),
            verifier,
            notifier,
            config.dispatch_interval,
            &config.public_base_url,
        ),
    };

    let app = studygroup_server::create_router(Arc::new(state));

    // Avvia il server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

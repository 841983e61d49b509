use cellemu_site::{
    AppState,
    auth::ensure_bootstrap_admin,
    config::{AppConfig, Env},
    create_router,
    mail::{LogMailer, MailerState, SmtpMailer},
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
    storage::{LocalDiskStorage, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `DATABASE_URL` value that selects the in-memory repository (local demos only).
const MEMORY_DATABASE: &str = "memory";

/// main
///
/// The asynchronous entry point: configuration, logging, database, storage, mail,
/// then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (panics on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Log Filter
    // RUST_LOG wins; otherwise verbose for this crate, request summaries from tower_http.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cellemu_site=debug,tower_http=info,sqlx=warn".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: multi-line pretty output.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Repository Initialization
    let repo: RepositoryState = if config.db_url == MEMORY_DATABASE && config.env == Env::Local {
        tracing::warn!("DATABASE_URL=memory: content lives in process memory and is lost on exit");
        Arc::new(InMemoryRepository::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.db_url)
            .await
            .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("FATAL: Database migrations failed.");

        Arc::new(PostgresRepository::new(pool))
    };

    match repo.purge_expired_sessions().await {
        Ok(purged) if purged > 0 => tracing::info!(purged, "expired sessions removed"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "could not purge expired sessions"),
    }

    if let Err(e) = ensure_bootstrap_admin(&repo, &config).await {
        tracing::error!(error = %e, "bootstrap administrator could not be created");
    }

    // 5. Storage Initialization (local disk, served under the upload URL prefix)
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("FATAL: UPLOAD_DIR is not writable.");
    let storage: StorageState = Arc::new(LocalDiskStorage::new(&config.upload_dir, &config.upload_url_prefix));

    // 6. Mail Transport
    let mailer: MailerState = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "SMTP delivery enabled");
            Arc::new(SmtpMailer::new(smtp).expect("FATAL: Invalid SMTP configuration."))
        }
        None => {
            tracing::warn!("SMTP_HOST not set: notification e-mails are only logged");
            Arc::new(LogMailer)
        }
    };

    // 7. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState { repo, storage, mailer, config };

    // 8. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Could not bind BIND_ADDR.");

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    axum::serve(listener, app).await.expect("HTTP server terminated unexpectedly");
}

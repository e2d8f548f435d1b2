use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use crypto_core::jwt;
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use posting_service::config::StorageBackend;
use posting_service::jobs::TokenCleanupJob;
use posting_service::middleware::MetricsMiddleware;
use posting_service::{configure_routes, json_config, metrics, AppState, Config};
use std::io;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable ({}), waiting for Ctrl+C", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// PEM from `{name}_FILE` when set, else from `{name}` itself.
fn load_pem(name: &str) -> io::Result<String> {
    let file_var = format!("{}_FILE", name);
    if let Ok(path) = std::env::var(&file_var) {
        return std::fs::read_to_string(&path).map_err(|e| {
            io::Error::new(e.kind(), format!("Failed to read {} ({}): {}", file_var, path, e))
        });
    }

    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} or {} must be set", name, file_var),
        )
    })
}

async fn build_state(config: Config) -> io::Result<AppState> {
    match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(AppState::in_memory(config))
        }
        StorageBackend::Postgres => {
            let db_cfg = DbPoolConfig::from_env("posting-service")
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            db_cfg.log_config();

            let pool = create_pg_pool(db_cfg).await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("Failed to create database pool: {}", e),
                )
            })?;
            tracing::info!("Connected to database via db-pool crate");

            if config.database.run_migrations {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migration failed: {}", e)))?;
                tracing::info!("Database migrations completed");
            }

            Ok(AppState::postgres(pool, config))
        }
    }
}

/// Posting Service
///
/// # Routes
///
/// - `/api/users`, `/api/auth/token` - Registration, login and logout
/// - `/api/myprofile` - The caller's profile
/// - `/api/posts/*`, `/api/myposts` - Posts with images
/// - `/api/posts/{id}/comments`, `/api/comments/{id}` - Comments
/// - `/api/health/*` - Probes
/// - `/metrics` - Prometheus exposition
#[actix_web::main]
async fn main() -> io::Result<()> {
    // Container healthcheck: `posting-service healthcheck`
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" {
                let port = std::env::var("POSTING_SERVICE_PORT").unwrap_or_else(|_| "8080".into());
                let url = format!("http://127.0.0.1:{}/api/health/live", port);
                match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    dotenvy::dotenv().ok();

    let json_logs = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting posting-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let private_key_pem = load_pem("JWT_PRIVATE_KEY_PEM")?;
    let public_key_pem = load_pem("JWT_PUBLIC_KEY_PEM")?;
    jwt::initialize_jwt_keys(&private_key_pem, &public_key_pem).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Failed to initialize JWT keys: {}", e),
        )
    })?;
    tracing::info!("JWT keys initialized");

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let sweep_interval = Duration::from_secs(config.auth.token_sweep_interval_secs);
    let cors_config = config.cors.clone();
    let image_max_bytes = config.storage.image_max_bytes;

    let state = web::Data::new(build_state(config).await?);

    let (shutdown_tx, _) = broadcast::channel(1);
    let cleanup_handle =
        TokenCleanupJob::new(state.tokens.clone(), sweep_interval).spawn(shutdown_tx.subscribe());

    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_config.origins() {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(json_config(image_max_bytes))
            .wrap(MetricsMiddleware)
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    let result = tokio::select! {
        joined = &mut server_task => {
            tracing::error!("HTTP server exited unexpectedly");
            joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            server_task
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?
        }
    };

    let _ = shutdown_tx.send(());
    if let Err(e) = cleanup_handle.await {
        tracing::warn!("Token cleanup job ended abnormally: {}", e);
    }

    tracing::info!("Posting-service shutting down");
    result
}

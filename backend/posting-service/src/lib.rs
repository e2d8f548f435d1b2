/// Posting Service Library
///
/// A small social posting API: accounts with bearer tokens, posts carrying one
/// JPEG image, and comments on posts.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `services`: Business logic layer
/// - `db`: Repository traits with PostgreSQL and in-memory implementations
/// - `models`: Row types, request and response bodies
/// - `middleware`: Bearer authentication, ownership checks and request metrics
/// - `pagination`: Page requests and the paginated response envelope
/// - `storage`: Filesystem store for post images
/// - `jobs`: Background maintenance tasks
/// - `error`: Error types and their HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod security;
pub mod services;
pub mod storage;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest};
use db::{
    CommentRepository, MemoryStore, PgCommentRepository, PgPostRepository, PgTokenRepository,
    PgUserRepository, PostRepository, TokenRepository, UserRepository,
};
use sqlx::PgPool;
use std::sync::Arc;
use storage::ImageStore;

/// Shared handles every handler reaches through `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub images: ImageStore,
    pub config: Arc<Config>,
    /// Present for the PostgreSQL backend; used by the readiness probe.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool.clone())),
            images: image_store(&config),
            config: Arc::new(config),
            pool: Some(pool),
        }
    }

    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            tokens: store,
            images: image_store(&config),
            config: Arc::new(config),
            pool: None,
        }
    }
}

fn image_store(config: &Config) -> ImageStore {
    ImageStore::new(
        config.storage.image_base_path.clone(),
        config.storage.image_format.clone(),
    )
}

/// JSON extractor settings: malformed bodies and wrong content types are a
/// plain 400. The size limit leaves room for a base64 image of the maximum
/// decoded size.
pub fn json_config(image_max_bytes: usize) -> web::JsonConfig {
    let limit = image_max_bytes.saturating_mul(2).max(64 * 1024);

    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err: JsonPayloadError, req: &HttpRequest| {
            tracing::debug!(path = %req.path(), error = %err, "rejected request body");
            match err {
                JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                    err.into()
                }
                JsonPayloadError::ContentType => {
                    AppError::BadRequest("Content-Type must be application/json".into()).into()
                }
                other => AppError::BadRequest(format!("Malformed JSON body: {}", other)).into(),
            }
        })
}

/// Mount the `/api` routes. Everything under `/api` passes through
/// `BearerAuth`, which lets the public routes through untouched.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(middleware::BearerAuth)
            .route("/health/live", web::get().to(handlers::liveness))
            .route("/health/ready", web::get().to(handlers::readiness))
            .route("/users", web::post().to(handlers::register))
            .service(
                web::resource("/auth/token")
                    .route(web::post().to(handlers::login))
                    .route(web::delete().to(handlers::logout)),
            )
            .service(
                web::resource("/myprofile")
                    .route(web::get().to(handlers::get_profile))
                    .route(web::patch().to(handlers::update_profile)),
            )
            .route("/myposts", web::get().to(handlers::list_my_posts))
            .service(
                web::resource("/posts")
                    .route(web::post().to(handlers::create_post))
                    .route(web::get().to(handlers::list_posts)),
            )
            .service(
                web::resource("/posts/{post_id:\\d+}")
                    .route(web::get().to(handlers::get_post))
                    .route(web::delete().to(handlers::delete_post)),
            )
            .service(
                web::resource("/posts/{post_id:\\d+}/comments")
                    .route(web::post().to(handlers::create_comment))
                    .route(web::get().to(handlers::list_comments)),
            )
            .route(
                "/comments/{comment_id:\\d+}",
                web::delete().to(handlers::delete_comment),
            ),
    );
}

//! Ningrat Wedding backend - content API, storage proxy and invoices

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod invoice;
pub mod logging;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::{SiteConfig, StorageConfig};
use crate::models::{BlogPost, Story};
use crate::routes::{
    auth, blocks, blog, contact, dashboard, entries, files, health, invoices, pages, settings,
    sitemap, stories,
};
use crate::state::AppState;
use crate::storage::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};

/// Cap for every JSON endpoint.
const JSON_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub type StartupError = Box<dyn std::error::Error + Send + Sync>;

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN, falling back
/// to the local frontend dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect::<Vec<HeaderValue>>()
        })
        .filter(|origins| !origins.is_empty())
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", post(auth::verify_token))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/pages/home", get(pages::home))
        .route("/api/pages/about", get(pages::about))
        .route("/api/pages/portfolio", get(pages::portfolio))
        .route("/api/pages/services", get(pages::services))
        .route("/api/pages/contact", get(pages::contact))
        .route("/api/pages/checkout", get(pages::checkout))
        .route("/api/settings/{page}", get(settings::get_settings))
        .route("/api/stories/{slug}", get(stories::get_story))
        .route("/api/blog", get(blog::list_posts))
        .route("/api/blog/{slug}", get(blog::get_post))
        .route("/api/invoices/{id}", get(invoices::public_invoice))
        .route("/api/invoices/{id}/pdf", get(invoices::invoice_pdf))
        .route("/api/contact", post(contact::submit))
        .route("/sitemap.xml", get(sitemap::sitemap))
        .route("/robots.txt", get(sitemap::robots))
        .route("/health", get(health::health_ping))
        .route("/health/ready", get(health::health_ready))
        .route("/health/database", get(health::health_database))
        .route("/health/storage", get(health::health_storage))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/dashboard", get(dashboard::dashboard))
        .route(
            "/api/admin/stories",
            get(entries::list::<Story>).post(entries::create::<Story>),
        )
        .route(
            "/api/admin/stories/{id}",
            get(entries::get::<Story>)
                .put(entries::update::<Story>)
                .delete(entries::delete::<Story>),
        )
        .route(
            "/api/admin/blog",
            get(entries::list::<BlogPost>).post(entries::create::<BlogPost>),
        )
        .route(
            "/api/admin/blog/{id}",
            get(entries::get::<BlogPost>)
                .put(entries::update::<BlogPost>)
                .delete(entries::delete::<BlogPost>),
        )
        .route(
            "/api/admin/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/api/admin/invoices/new", get(invoices::new_invoice))
        .route(
            "/api/admin/invoices/{id}",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/api/admin/settings/{page}", put(settings::put_settings))
        .route("/api/admin/inbox", get(contact::inbox))
        .route("/api/admin/blocks/template/{kind}", get(blocks::template))
        .route("/api/admin/blocks/edit", post(blocks::edit))
        .route("/api/list-files", get(files::list_files))
        .route("/api/delete-file", delete(files::delete_file))
        .route("/api/rename-file", post(files::rename_file))
        .route("/api/storage-usage", get(files::storage_usage))
}

/// Uploads get their own body limit, sized from the storage settings.
fn upload_routes(max_upload_bytes: usize) -> Router<AppState> {
    let limit = max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/api/upload", post(files::upload))
        .layer(DefaultBodyLimit::max(limit))
        .layer(RequestBodyLimitLayer::new(limit))
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    public_routes()
        .merge(admin_routes())
        .layer(RequestBodyLimitLayer::new(JSON_BODY_LIMIT))
        .merge(upload_routes(state.files.max_upload_bytes()))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Refuse to start in production with the default JWT secret; warn about
/// default admin credentials.
fn check_production_secrets() -> Result<(), StartupError> {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_default();
    if environment != "production" {
        return Ok(());
    }

    let secret = std::env::var("JWT_SECRET").unwrap_or_default();
    if secret.is_empty() || secret == auth::DEFAULT_JWT_SECRET {
        return Err("JWT_SECRET must be set to a secure, unique value in production".into());
    }

    if std::env::var("ADMIN_EMAIL").unwrap_or_default().is_empty() {
        tracing::warn!("SECURITY: ADMIN_EMAIL is not set, using the built-in admin address");
    }
    if std::env::var("ADMIN_HASH_PASSWORD").is_err() && std::env::var("ADMIN_PASSWORD").is_err() {
        tracing::warn!(
            "SECURITY: Neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is set. \
             The fallback password is insecure; run hash-password and set ADMIN_HASH_PASSWORD."
        );
    }
    Ok(())
}

async fn document_store() -> Result<Arc<dyn DocumentStore>, StartupError> {
    if !db::DbConfig::is_configured() {
        tracing::warn!("DATABASE_URL not set. Content is kept in memory and lost on restart.");
        return Ok(Arc::new(MemoryDocumentStore::new()));
    }

    let pool = db::init_pool(None).await?;
    db::run_migrations(&pool).await?;
    Ok(Arc::new(PgDocumentStore::new(pool)))
}

async fn object_store(config: &StorageConfig) -> Arc<dyn ObjectStore> {
    if config.has_credentials() {
        tracing::info!(bucket = %config.bucket, endpoint = %config.endpoint, "Using S3 object storage");
        Arc::new(S3ObjectStore::from_config(config).await)
    } else {
        tracing::warn!("Storage credentials not set. Uploads are kept in memory.");
        Arc::new(MemoryObjectStore::new())
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Dropping the guards stops the background log writers.
    let _log_guards = logging::init();

    health::init_start_time();
    check_production_secrets()?;

    let storage = StorageConfig::default();
    let site = SiteConfig::default();
    let state = AppState::new(
        document_store().await?,
        object_store(&storage).await,
        &storage,
        site,
    );

    let app = create_app(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3001);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

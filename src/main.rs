//! TubeBrief
//!
//! YouTube transcript summarization and enrichment API using Rust + Actix-Web.
//! Retrieves caption transcripts, forwards text to Gemini for summaries or
//! enriched versions, and gates the AI endpoints behind a sliding-window
//! per-client quota with a pro-key bypass.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

mod ai;
mod api;
mod config;
mod db;
mod error;
mod payment;
mod quota;
mod transcript;

use crate::ai::{GeminiModel, ModelChain, TextModel};
use crate::config::Settings;
use crate::db::{DbPool, PgQuotaStore, VideoRepository};
use crate::payment::CheckoutClient;
use crate::quota::{MemoryQuotaStore, QuotaGuard, QuotaPolicy, QuotaStore};
use crate::transcript::{TimedTextSource, TranscriptFetcher};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub quota: QuotaGuard,
    pub models: ModelChain,
    pub transcripts: TranscriptFetcher,
    pub videos: Option<VideoRepository>,
    pub checkout: Option<CheckoutClient>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tubebrief=info".parse().unwrap())
                .add_directive("actix_web=info".parse().unwrap()),
        )
        .json()
        .init();

    // Load configuration
    let settings = Settings::load().expect("Failed to load configuration");
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting TubeBrief v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    // Initialize database connection if configured
    let db_pool = if !settings.database.url.is_empty() {
        match DbPool::new(&settings.database.url) {
            Ok(pool) => match pool.test_connection().await {
                Ok(()) => {
                    if let Err(e) = pool.ensure_schema().await {
                        warn!("Schema bootstrap failed: {}. Running without database.", e);
                        None
                    } else {
                        info!("Database pool initialized successfully");
                        Some(pool)
                    }
                }
                Err(e) => {
                    warn!(
                        "Database connection test failed: {}. Running without database.",
                        e
                    );
                    None
                }
            },
            Err(e) => {
                warn!(
                    "Failed to create database pool: {}. Running without database.",
                    e
                );
                None
            }
        }
    } else {
        info!("No database URL configured, running without database");
        None
    };

    let videos = db_pool.clone().map(VideoRepository::new);

    // Quota store: database-backed when available, otherwise in-memory so
    // the guard still enforces within this process.
    let quota_store: Arc<dyn QuotaStore> = match db_pool {
        Some(ref pool) => Arc::new(PgQuotaStore::new(pool.clone())),
        None => {
            warn!("Quota records are in-memory only and reset on restart");
            Arc::new(MemoryQuotaStore::new())
        }
    };
    let quota = QuotaGuard::new(
        quota_store,
        QuotaPolicy {
            max_requests: settings.quota.max_requests,
            window_secs: settings.quota.window_secs,
            bypass_key: settings.quota.pro_key.clone().filter(|k| !k.is_empty()),
        },
    );

    // AI model chain: primary model followed by configured fallbacks.
    if settings.gemini.api_key.is_empty() {
        warn!("Gemini API key not configured, AI endpoints will fail");
    }
    let mut models: Vec<Box<dyn TextModel>> = Vec::new();
    for name in std::iter::once(&settings.gemini.model).chain(&settings.gemini.fallback_models) {
        let model = GeminiModel::new(&settings.gemini.api_key, name)
            .expect("Failed to build Gemini client");
        models.push(Box::new(model));
    }
    let models = ModelChain::new(models);

    // Transcript fetcher with language fallback chain
    let caption_source = Arc::new(
        TimedTextSource::new(settings.transcript.proxy_url.as_deref())
            .expect("Failed to build caption client"),
    );
    let transcripts = TranscriptFetcher::new(
        caption_source,
        settings.transcript.languages.clone(),
        settings.transcript.default_language.clone(),
    );

    // Payment checkout client, if a gateway token is configured
    let checkout = match settings.payment.access_token.as_deref() {
        Some(token) if !token.is_empty() => Some(
            CheckoutClient::new(
                token,
                &settings.payment.product_title,
                settings.payment.product_price,
                &settings.payment.currency,
            )
            .expect("Failed to build checkout client"),
        ),
        _ => {
            info!("No payment token configured, checkout endpoint disabled");
            None
        }
    };

    let workers = settings.server.workers.unwrap_or(num_cpus::get() * 2);
    let cors_origins = settings.cors.allowed_origins.clone();

    // Create shared application state
    let app_state = web::Data::new(AppState {
        settings,
        quota,
        models,
        transcripts,
        videos,
        checkout,
    });

    // Configure and start HTTP server
    HttpServer::new(move || {
        let cors = build_cors(&cors_origins);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "tubebrief"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION"))),
            )
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Build the CORS layer from configured origins; "*" means any origin.
fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

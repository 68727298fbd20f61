//! CRM Entitlements server binary.
//!
//! Loads configuration from `CRM_ENTITLEMENTS__*` environment variables (and `.env`),
//! connects to PostgreSQL, and serves the webhook, entitlement and compose endpoints.

use std::sync::Arc;

use axum::http::HeaderValue;
use sqlx::PgPool;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crm_entitlements::adapters::ai::ProviderChain;
use crm_entitlements::adapters::http::{api_router, AppStateBuilder};
use crm_entitlements::adapters::postgres::{
    PostgresEntitlementRepository, PostgresWebhookEventRepository,
};
use crm_entitlements::adapters::stripe::{StripeApiConfig, StripeMetadataClient};
use crm_entitlements::config::{AppConfig, ServerConfig};
use crm_entitlements::domain::entitlement::{EntitlementLifecycle, RevocationPolicy};
use crm_entitlements::domain::foundation::Timestamp;
use crm_entitlements::ports::WebhookEventRepository;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);

    tracing::info!(
        environment = ?config.server.environment,
        "Starting crm-entitlements"
    );

    let pool: PgPool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let entitlements = Arc::new(PostgresEntitlementRepository::new(pool.clone()));
    let webhook_events = Arc::new(PostgresWebhookEventRepository::new(pool));

    let retention_days = i64::from(config.payment.webhook_retention_days);
    match webhook_events
        .delete_before(Timestamp::now().minus_days(retention_days))
        .await
    {
        Ok(deleted) => tracing::info!(deleted, retention_days, "Pruned processed webhook events"),
        Err(e) => tracing::warn!(error = %e, "Failed to prune processed webhook events"),
    }

    let chain = ProviderChain::from_config(&config.ai)?;
    tracing::info!(providers = ?chain.provider_names(), "Text generation chain ready");

    let lifecycle = EntitlementLifecycle::new(RevocationPolicy::new(config.billing.calendar()?));

    let mut builder = AppStateBuilder::new(entitlements, webhook_events)
        .stripe_webhook_secret(config.payment.stripe_webhook_secret.clone())
        .zaxaa_webhook_secret(config.payment.zaxaa_webhook_secret.clone())
        .lifecycle(lifecycle)
        .persistence_timeout(config.billing.persistence_timeout())
        .claim_lease(config.server.request_timeout())
        .provider_chain(Arc::new(chain));

    if let Some(api_key) = config.payment.stripe_api_key.clone() {
        let timeout = config.payment.metadata_fetch_timeout();
        let client = StripeMetadataClient::new(StripeApiConfig::new(api_key).with_timeout(timeout))?;
        builder = builder.metadata_source(Arc::new(client), timeout);
    } else {
        tracing::warn!("No Stripe API key configured; subscription metadata will not be fetched");
    }

    let state = builder.build();
    if state.stripe_verifier.is_none() {
        tracing::warn!("No Stripe webhook secret configured; Stripe webhooks will be rejected");
    }
    if state.zaxaa_verifier.is_none() {
        tracing::warn!("No Zaxaa webhook secret configured; Zaxaa webhooks will be rejected");
    }

    let app = api_router()
        .with_state(state)
        .layer(cors_layer(&config.server))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// JSON output in production, human-readable otherwise. `RUST_LOG` overrides the configured level.
fn init_tracing(server: &ServerConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
}

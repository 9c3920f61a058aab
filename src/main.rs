//! Storefront - cart, coupon and checkout service

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::api::{build_router, AppState};
use storefront::auth::PgAuthenticator;
use storefront::config::load_config;
use storefront::messaging::{EventPublisher, LogPublisher, NatsPublisher};
use storefront::payment::StripeGateway;
use storefront::repository::postgres::PgStore;
use storefront::services::{CartService, CheckoutService, PricingEngine};
use storefront::shipping::{ShippingQuoter, ViaCep};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = PgStore::connect(&config).await.context("connecting to database")?;
    store.migrate().await.context("running migrations")?;
    let store = Arc::new(store);

    let events: Arc<dyn EventPublisher> = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Arc::new(NatsPublisher::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable; domain events will only be logged");
                Arc::new(LogPublisher)
            }
        },
        None => Arc::new(LogPublisher),
    };
    if config.stripe_secret_key.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY not set; payment intents will be refused");
    }

    let http = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
    let payments = StripeGateway::new(http.clone(), &config.stripe_api_base, config.stripe_secret_key.clone(), &config.currency);
    let pricing = PricingEngine::new(store.clone());

    let state = AppState {
        carts: CartService::new(store.clone(), store.clone(), events.clone()),
        pricing: pricing.clone(),
        checkout: CheckoutService::new(pricing, store.clone(), Arc::new(payments), events),
        shipping: ShippingQuoter::new(Arc::new(ViaCep::new(http, &config.viacep_base_url))),
        auth: Arc::new(PgAuthenticator::new(store.pool().clone())),
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

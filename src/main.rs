//! OpenSASE Orders - order lifecycle and inventory reconciliation service

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_orders::api::{self, AppState};
use opensase_orders::config::{Config, StorageConfig};
use opensase_orders::services::{EventPublisher, NatsPublisher, NoopPublisher, OrderService};
use opensase_orders::store::{MemoryGuestStore, MemoryOrderStore, MemoryProductStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let service = match &config.storage {
        StorageConfig::Postgres { url, max_connections } => {
            let store = Arc::new(PgStore::connect(url, *max_connections).await?);
            store.migrate().await?;
            OrderService::new(store.clone(), store.clone(), store)
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; orders are lost on restart");
            OrderService::new(Arc::new(MemoryOrderStore::new()), Arc::new(MemoryProductStore::new()), Arc::new(MemoryGuestStore::new()))
        }
    };

    let events: Arc<dyn EventPublisher> = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Arc::new(NatsPublisher::new(client)),
            Err(error) => {
                tracing::warn!(%error, "NATS unavailable, order events disabled");
                Arc::new(NoopPublisher)
            }
        },
        None => Arc::new(NoopPublisher),
    };

    let orders = service.with_events(events).with_max_probes(config.max_probes);
    let app = api::router(AppState { orders });

    tracing::info!("🚀 OpenSASE Orders listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}

//! Bookstore catalog service
//!
//! Server-rendered views and a JSON API over a collection of book records.

pub mod modules;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use bookstore_http::views::Views;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Re-export commonly used types
pub use modules::*;

/// Run the service until a shutdown signal arrives.
///
/// Modules are stopped (and the storage connection released) on every path
/// after the store is opened, including failed seeding.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        database = %settings.database.name,
        collection = %settings.database.collection,
        "bookstore starting"
    );

    let views = Views::load(&settings.views.glob).context("failed to load views")?;
    let store = books::open_store(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, Arc::new(views));

    let served = serve(&registry, &settings).await;
    let stopped = registry.stop_all().await;

    served?;
    stopped?;
    tracing::info!("bookstore stopped");
    Ok(())
}

async fn serve(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let ctx = InitCtx { settings };
    registry.init_all(&ctx).await?;
    bookstore_http::start_server(registry, settings).await
}

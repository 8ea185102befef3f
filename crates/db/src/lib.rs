//! MongoDB client factory and collection bootstrap.

use std::future::Future;
use std::time::Duration;

use bookstore_kernel::settings::DatabaseSettings;
use mongodb::{bson::doc, options::ClientOptions, Client, Collection};
use thiserror::Error;

const APP_NAME: &str = "bookstore";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("mongodb: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Connect to the configured deployment and verify it answers a ping.
///
/// Both server selection and the ping are bounded by
/// `connect_timeout_ms`, so an unreachable database fails startup quickly.
pub async fn connect(settings: &DatabaseSettings) -> Result<Client, DbError> {
    let timeout = settings.connect_timeout();

    let mut options = with_timeout("parse connection string", timeout, async {
        Ok::<_, DbError>(ClientOptions::parse(&settings.uri).await?)
    })
    .await?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);

    let client = Client::with_options(options)?;

    with_timeout("ping", timeout, async {
        client.database("admin").run_command(doc! { "ping": 1 }).await?;
        Ok::<_, DbError>(())
    })
    .await?;

    tracing::info!(target: "bookstore-db", database = %settings.name, "connected to mongodb");
    Ok(client)
}

/// Return a handle to `collection` in `database`, creating the collection if
/// it is not yet listed.
pub async fn ensure_collection<T>(
    client: &Client,
    database: &str,
    collection: &str,
) -> Result<Collection<T>, DbError>
where
    T: Send + Sync,
{
    let db = client.database(database);

    let names = db.list_collection_names().await?;
    if names.iter().any(|name| name == collection) {
        tracing::debug!(target: "bookstore-db", collection, "collection already present");
    } else {
        tracing::info!(target: "bookstore-db", collection, "creating collection");
        db.create_collection(collection).await?;
    }

    Ok(db.collection::<T>(collection))
}

/// Run `fut`, failing with [`DbError::Timeout`] if it does not finish within `after`.
pub async fn with_timeout<T, F>(
    operation: &'static str,
    after: Duration,
    fut: F,
) -> Result<T, DbError>
where
    F: Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Timeout { operation, after }),
    }
}

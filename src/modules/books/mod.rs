pub mod models;
pub mod routes;
pub mod seed;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use bookstore_http::views::Views;
use bookstore_kernel::{
    settings::{DatabaseSettings, StorageBackend},
    InitCtx, Module,
};
use serde_json::json;

use routes::AppState;
use store::{BookStore, InMemoryBookStore, MongoBookStore};

/// Catalog module: seeds the example books and serves the HTML and JSON routes.
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>, views: Arc<Views>) -> Self {
        Self {
            state: AppState { store, views },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let inserted = seed::seed_examples(self.state.store.as_ref())
            .await
            .context("failed to seed example books")?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            inserted,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
            })
        };
        let status = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/StatusResponse" } } }
            })
        };

        Some(json!({
            "paths": {
                "/api/books": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Every book in the catalog",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                                    }
                                }
                            },
                            "500": error("Database error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Book" } },
                                "application/x-www-form-urlencoded": { "schema": { "$ref": "#/components/schemas/BookForm" } },
                                "multipart/form-data": { "schema": { "$ref": "#/components/schemas/BookForm" } }
                            }
                        },
                        "responses": {
                            "201": status("Book created"),
                            "400": error("Invalid request body"),
                            "409": error("Book already exists")
                        }
                    }
                },
                "/api/books/{id}": {
                    "put": {
                        "summary": "Update selected fields of a book",
                        "tags": ["Books"],
                        "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "requestBody": {
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookUpdate" } } }
                        },
                        "responses": {
                            "200": status("Book updated"),
                            "400": error("Invalid update data or no valid fields"),
                            "404": error("Book not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "responses": {
                            "200": status("Book deleted"),
                            "404": error("Book not found or already deleted")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "Caller-assigned identifier" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "edition": { "type": "string" },
                            "pages": { "type": "string" },
                            "year": { "type": "string" }
                        },
                        "required": ["id", "title", "author"]
                    },
                    "BookForm": {
                        "type": "object",
                        "properties": {
                            "ID": { "type": "string" },
                            "BookName": { "type": "string" },
                            "BookAuthor": { "type": "string" },
                            "BookEdition": { "type": "string" },
                            "BookPages": { "type": "string" },
                            "BookYear": { "type": "string" }
                        }
                    },
                    "BookUpdate": {
                        "type": "object",
                        "description": "Only string values for these keys are applied; other keys are ignored",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "edition": { "type": "string" },
                            "pages": { "type": "string" },
                            "year": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.state.store.shutdown().await;
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Open the configured backing store.
///
/// For MongoDB this connects, verifies the deployment, and makes sure the
/// collection exists; any failure is fatal to startup.
pub async fn open_store(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn BookStore>> {
    match settings.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory book store; data is lost on exit");
            Ok(Arc::new(InMemoryBookStore::new()))
        }
        StorageBackend::Mongodb => {
            let client = bookstore_db::connect(settings)
                .await
                .context("failed to connect to mongodb")?;

            let collection = match bookstore_db::ensure_collection(
                &client,
                &settings.name,
                &settings.collection,
            )
            .await
            {
                Ok(collection) => collection,
                Err(e) => {
                    client.shutdown().await;
                    return Err(e).with_context(|| {
                        format!("failed to prepare collection '{}'", settings.collection)
                    });
                }
            };

            Ok(Arc::new(MongoBookStore::new(
                client,
                collection,
                settings.operation_timeout(),
            )))
        }
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn BookStore>, views: Arc<Views>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, views))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_kernel::settings::Settings;

    fn module(store: Arc<InMemoryBookStore>) -> BooksModule {
        let views = Views::from_sources([("index.html", "index")]).unwrap();
        BooksModule::new(store, Arc::new(views))
    }

    #[tokio::test]
    async fn init_seeds_examples_once() {
        let store = Arc::new(InMemoryBookStore::new());
        let module = module(store.clone());
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        module.init(&ctx).await.unwrap();
        module.init(&ctx).await.unwrap();

        assert_eq!(store.find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn init_fails_on_duplicated_example() {
        let frankenstein = seed::example_books()[1].clone();
        let store = Arc::new(InMemoryBookStore::with_books([
            frankenstein.clone(),
            frankenstein,
        ]));
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        assert!(module(store).init(&ctx).await.is_err());
    }

    #[test]
    fn openapi_documents_book_routes() {
        let module = module(Arc::new(InMemoryBookStore::new()));
        let doc = module.openapi().unwrap();

        assert!(doc["paths"]["/api/books"]["post"].is_object());
        assert!(doc["paths"]["/api/books/{id}"]["delete"].is_object());
        assert!(doc["components"]["schemas"]["Book"].is_object());
    }

    #[tokio::test]
    async fn memory_backend_opens_without_a_database() {
        let settings = DatabaseSettings {
            backend: StorageBackend::Memory,
            ..DatabaseSettings::default()
        };
        let store = open_store(&settings).await.unwrap();
        assert!(store.find_all().await.unwrap().is_empty());
    }
}

//! HTTP routes for the books module: HTML pages and the JSON API.

pub mod api;
pub mod input;
pub mod pages;

use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use bookstore_http::{error::AppError, views::Views};

use super::models::Book;
use super::store::BookStore;

/// Handles shared by every handler, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookStore>,
    pub views: Arc<Views>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/books", get(pages::books))
        .route("/authors", get(pages::authors))
        .route("/years", get(pages::years))
        .route("/search", get(pages::search))
        .route("/create", get(pages::create))
        .route("/api/books", get(api::list_books).post(api::create_book))
        .route(
            "/api/books/{id}",
            put(api::update_book).delete(api::delete_book),
        )
        .with_state(state)
}

/// Read the whole collection, mapping failures to a 500.
async fn load_books(state: &AppState) -> Result<Vec<Book>, AppError> {
    state
        .store
        .find_all()
        .await
        .map_err(|e| AppError::internal("Database error", e))
}

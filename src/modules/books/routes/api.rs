use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use bookstore_http::{error::AppError, response::StatusMessage};
use serde_json::{Map, Value};

use super::input::NewBook;
use super::{load_books, AppState};
use crate::modules::books::models::{Book, BookPatch};

pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(load_books(&state).await?))
}

/// Insert a book unless an exact copy already exists.
///
/// Two concurrent creates of the same book can both pass the duplicate check.
pub async fn create_book(
    State(state): State<AppState>,
    NewBook(book): NewBook,
) -> Result<StatusMessage, AppError> {
    let existing = state
        .store
        .count_matching(&book)
        .await
        .map_err(|e| AppError::internal("Could not insert book", e))?;
    if existing > 0 {
        return Err(AppError::conflict("Book already exists"));
    }

    state
        .store
        .insert(&book)
        .await
        .map_err(|e| AppError::internal("Could not insert book", e))?;

    tracing::info!(id = %book.id, title = %book.title, "book created");
    Ok(StatusMessage::created("Book created"))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<StatusMessage, AppError> {
    let Json(fields) = body.map_err(|rejection| {
        tracing::debug!(%rejection, "rejected update body");
        AppError::bad_request("Invalid update data")
    })?;

    let patch = BookPatch::from_fields(&fields);
    if patch.is_empty() {
        return Err(AppError::bad_request("No valid fields to update"));
    }

    let matched = state
        .store
        .update(&id, &patch)
        .await
        .map_err(|e| AppError::internal("Could not update book", e))?;
    if matched == 0 {
        return Err(AppError::not_found("Book not found"));
    }

    tracing::info!(%id, "book updated");
    Ok(StatusMessage::ok("Book updated"))
}

/// Storage failures and missing ids both answer 404.
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusMessage, AppError> {
    match state.store.delete(&id).await {
        Ok(deleted) if deleted > 0 => {
            tracing::info!(%id, "book deleted");
            Ok(StatusMessage::ok("Book deleted"))
        }
        Ok(_) => Err(AppError::not_found("Book not found or already deleted")),
        Err(e) => {
            tracing::error!(%id, error = %e, "delete failed");
            Err(AppError::not_found("Book not found or already deleted"))
        }
    }
}

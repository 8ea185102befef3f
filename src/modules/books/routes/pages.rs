use axum::{extract::State, response::Html};
use bookstore_http::error::AppError;

use super::{load_books, AppState};
use crate::utils::unique_values;

type Page = Result<Html<String>, AppError>;

pub async fn index(State(state): State<AppState>) -> Page {
    state.views.render_empty("index.html")
}

pub async fn books(State(state): State<AppState>) -> Page {
    let books = load_books(&state).await?;
    state.views.render("book-table.html", "books", &books)
}

pub async fn authors(State(state): State<AppState>) -> Page {
    let books = load_books(&state).await?;
    let authors = unique_values(books.iter().map(|book| book.author.as_str()));
    state.views.render("authors.html", "authors", &authors)
}

pub async fn years(State(state): State<AppState>) -> Page {
    let books = load_books(&state).await?;
    let years = unique_values(books.iter().map(|book| book.year.as_str()));
    state.views.render("years.html", "years", &years)
}

pub async fn search(State(state): State<AppState>) -> Page {
    state.views.render_empty("search-bar.html")
}

pub async fn create(State(state): State<AppState>) -> Page {
    state.views.render_empty("create-form.html")
}

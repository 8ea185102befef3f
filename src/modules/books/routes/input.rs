use std::fmt::Display;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use bookstore_http::error::AppError;

use crate::modules::books::models::{Book, BookForm};

const INVALID_BODY: &str = "Invalid request body";

/// A book decoded from an HTML form (urlencoded or multipart) or a JSON body.
///
/// Form posts use the form field names (`ID`, `BookName`, ...); anything
/// else is decoded as JSON with the API field names.
#[derive(Debug)]
pub struct NewBook(pub Book);

enum BodyKind {
    UrlEncoded,
    Multipart,
    Json,
}

fn body_kind(req: &Request) -> BodyKind {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        BodyKind::UrlEncoded
    } else if content_type.starts_with("multipart/form-data") {
        BodyKind::Multipart
    } else {
        BodyKind::Json
    }
}

fn invalid_body(kind: &str, reason: impl Display) -> AppError {
    tracing::debug!(%reason, "rejected book {kind}");
    AppError::bad_request(INVALID_BODY)
}

async fn read_multipart(mut multipart: Multipart) -> Result<BookForm, AppError> {
    let mut form = BookForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid_body("multipart", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| invalid_body("multipart", e))?;

        // unknown fields are ignored, like the urlencoded form
        match name.as_str() {
            "ID" => form.id = value,
            "BookName" => form.title = value,
            "BookAuthor" => form.author = value,
            "BookEdition" => form.edition = value,
            "BookPages" => form.pages = value,
            "BookYear" => form.year = value,
            _ => {}
        }
    }

    Ok(form)
}

impl<S> FromRequest<S> for NewBook
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let book = match body_kind(&req) {
            BodyKind::UrlEncoded => {
                let Form(form) = Form::<BookForm>::from_request(req, state)
                    .await
                    .map_err(|e| invalid_body("form", e))?;
                Book::from(form)
            }
            BodyKind::Multipart => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| invalid_body("multipart", e))?;
                Book::from(read_multipart(multipart).await?)
            }
            BodyKind::Json => {
                let Json(book) = Json::<Book>::from_request(req, state)
                    .await
                    .map_err(|e| invalid_body("json", e))?;
                book
            }
        };

        Ok(Self(book))
    }
}

//! Storage for book records: the [`BookStore`] contract and its MongoDB and
//! in-memory implementations.

use std::time::Duration;

use async_trait::async_trait;
use bookstore_db::{with_timeout, DbError};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    Collection,
};
use thiserror::Error;
use tokio::sync::RwLock;

use super::models::{Book, BookDocument, BookPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the catalog needs from its backing collection.
///
/// "Exact match" compares all six fields; an empty optional field matches a
/// record where that field is empty or absent.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every record, in storage order.
    async fn find_all(&self) -> StoreResult<Vec<Book>>;

    /// Number of records that exactly match `book`.
    async fn count_matching(&self, book: &Book) -> StoreResult<u64>;

    async fn insert(&self, book: &Book) -> StoreResult<()>;

    /// Apply `patch` to the first record whose external id is `id`.
    /// Returns the number of records matched.
    async fn update(&self, id: &str, patch: &BookPatch) -> StoreResult<u64>;

    /// Delete the first record whose external id is `id`.
    /// Returns the number of records deleted.
    async fn delete(&self, id: &str) -> StoreResult<u64>;

    /// Release the underlying connection.
    async fn shutdown(&self) {}
}

/// MongoDB-backed store. Each call is bounded by `operation_timeout`.
pub struct MongoBookStore {
    client: mongodb::Client,
    collection: Collection<BookDocument>,
    operation_timeout: Duration,
}

impl MongoBookStore {
    pub fn new(
        client: mongodb::Client,
        collection: Collection<BookDocument>,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            client,
            collection,
            operation_timeout,
        }
    }
}

/// Filter matching `book` on all six stored fields.
pub(crate) fn exact_match_filter(book: &Book) -> Document {
    let mut filter = Document::new();
    filter.insert(BookDocument::ID, book.id.as_str());
    filter.insert(BookDocument::TITLE, book.title.as_str());
    filter.insert(BookDocument::AUTHOR, book.author.as_str());

    let optional = [
        (BookDocument::EDITION, &book.edition),
        (BookDocument::PAGES, &book.pages),
        (BookDocument::YEAR, &book.year),
    ];
    for (field, value) in optional {
        if value.is_empty() {
            // empty fields are not stored, so also match a missing field
            filter.insert(field, doc! { "$in": [Bson::Null, ""] });
        } else {
            filter.insert(field, value.as_str());
        }
    }

    filter
}

fn id_filter(id: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(BookDocument::ID, id);
    filter
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn find_all(&self) -> StoreResult<Vec<Book>> {
        let documents = with_timeout("find books", self.operation_timeout, async {
            let cursor = self.collection.find(doc! {}).await?;
            Ok::<_, DbError>(cursor.try_collect::<Vec<_>>().await?)
        })
        .await?;

        Ok(documents.into_iter().map(Book::from).collect())
    }

    async fn count_matching(&self, book: &Book) -> StoreResult<u64> {
        let filter = exact_match_filter(book);
        let count = with_timeout("count books", self.operation_timeout, async {
            Ok::<_, DbError>(self.collection.count_documents(filter).await?)
        })
        .await?;
        Ok(count)
    }

    async fn insert(&self, book: &Book) -> StoreResult<()> {
        let document = BookDocument::from(book);
        with_timeout("insert book", self.operation_timeout, async {
            self.collection.insert_one(document).await?;
            Ok::<_, DbError>(())
        })
        .await?;
        Ok(())
    }

    async fn update(&self, id: &str, patch: &BookPatch) -> StoreResult<u64> {
        let update = doc! { "$set": patch.to_set_document() };
        let result = with_timeout("update book", self.operation_timeout, async {
            let updated = self.collection.update_one(id_filter(id), update).await?;
            Ok::<_, DbError>(updated)
        })
        .await?;
        Ok(result.matched_count)
    }

    async fn delete(&self, id: &str) -> StoreResult<u64> {
        let result = with_timeout("delete book", self.operation_timeout, async {
            let deleted = self.collection.delete_one(id_filter(id)).await?;
            Ok::<_, DbError>(deleted)
        })
        .await?;
        Ok(result.deleted_count)
    }

    async fn shutdown(&self) {
        tracing::info!("closing mongodb client");
        self.client.clone().shutdown().await;
    }
}

/// Process-local store, used for demos and tests.
#[derive(Default)]
pub struct InMemoryBookStore {
    books: RwLock<Vec<Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        Self {
            books: RwLock::new(books.into_iter().collect()),
        }
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn find_all(&self) -> StoreResult<Vec<Book>> {
        Ok(self.books.read().await.clone())
    }

    async fn count_matching(&self, book: &Book) -> StoreResult<u64> {
        let books = self.books.read().await;
        Ok(books.iter().filter(|stored| *stored == book).count() as u64)
    }

    async fn insert(&self, book: &Book) -> StoreResult<()> {
        self.books.write().await.push(book.clone());
        Ok(())
    }

    async fn update(&self, id: &str, patch: &BookPatch) -> StoreResult<u64> {
        let mut books = self.books.write().await;
        match books.iter_mut().find(|book| book.id == id) {
            Some(book) => {
                patch.apply(book);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<u64> {
        let mut books = self.books.write().await;
        match books.iter().position(|book| book.id == id) {
            Some(index) => {
                books.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> Book {
        Book::new("b4", "Dune", "Frank Herbert")
    }

    #[test]
    fn exact_match_filter_covers_all_fields() {
        let book = dune().with_details("1st", "412", "1965");
        let filter = exact_match_filter(&book);

        assert_eq!(filter.len(), 6);
        assert_eq!(filter.get_str("ID").unwrap(), "b4");
        assert_eq!(filter.get_str("BookEdition").unwrap(), "1st");
        assert_eq!(filter.get_str("BookYear").unwrap(), "1965");
    }

    #[test]
    fn exact_match_filter_matches_missing_optional_fields() {
        let filter = exact_match_filter(&dune());

        assert_eq!(
            filter.get_document("BookPages").unwrap(),
            &doc! { "$in": [Bson::Null, ""] }
        );
        assert_eq!(filter.get_str("BookAuthor").unwrap(), "Frank Herbert");
    }

    #[tokio::test]
    async fn count_matching_requires_every_field_to_match() {
        let store = InMemoryBookStore::with_books([dune()]);

        assert_eq!(store.count_matching(&dune()).await.unwrap(), 1);
        let other_year = dune().with_details("", "", "1965");
        assert_eq!(store.count_matching(&other_year).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_and_delete_report_matches() {
        let store = InMemoryBookStore::with_books([dune()]);
        let patch = BookPatch {
            year: Some("1965".into()),
            ..BookPatch::default()
        };

        assert_eq!(store.update("b4", &patch).await.unwrap(), 1);
        assert_eq!(store.update("missing", &patch).await.unwrap(), 0);
        assert_eq!(store.find_all().await.unwrap()[0].year, "1965");

        assert_eq!(store.delete("missing").await.unwrap(), 0);
        assert_eq!(store.delete("b4").await.unwrap(), 1);
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_only_the_first_match() {
        let store = InMemoryBookStore::new();
        store.insert(&dune()).await.unwrap();
        store
            .insert(&dune().with_details("2nd", "", ""))
            .await
            .unwrap();

        assert_eq!(store.delete("b4").await.unwrap(), 1);
        let remaining = store.find_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].edition, "2nd");
    }
}

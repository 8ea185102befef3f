//! Startup seeding of the example catalog.

use thiserror::Error;

use super::models::Book;
use super::store::{BookStore, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("example book '{id}' is stored {count} times")]
    Duplicated { id: String, count: u64 },

    #[error("seeding example book '{id}' failed: {source}")]
    Store {
        id: String,
        #[source]
        source: StoreError,
    },
}

/// Records inserted on first start.
pub fn example_books() -> [Book; 3] {
    [
        Book::new("example1", "The Vortex", "José Eustasio Rivera").with_details(
            "958-30-0804-4",
            "292",
            "1924",
        ),
        Book::new("example2", "Frankenstein", "Mary Shelley").with_details(
            "978-3-649-64609-9",
            "280",
            "1818",
        ),
        Book::new("example3", "The Black Cat", "Edgar Allan Poe").with_details(
            "978-3-99168-238-7",
            "280",
            "1843",
        ),
    ]
}

/// Insert each example book that has no exact match yet.
///
/// More than one exact match means the collection is inconsistent and
/// startup must not continue. Returns the number of books inserted.
pub async fn seed_examples(store: &dyn BookStore) -> Result<usize, SeedError> {
    let mut inserted = 0;

    for book in example_books() {
        let store_error = |source| SeedError::Store {
            id: book.id.clone(),
            source,
        };

        let count = store.count_matching(&book).await.map_err(store_error)?;
        match count {
            0 => {
                store.insert(&book).await.map_err(store_error)?;
                inserted += 1;
                tracing::info!(id = %book.id, title = %book.title, "example book inserted");
            }
            1 => {
                tracing::info!(id = %book.id, title = %book.title, "example book already present");
            }
            count => {
                return Err(SeedError::Duplicated {
                    id: book.id.clone(),
                    count,
                });
            }
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::InMemoryBookStore;

    #[tokio::test]
    async fn seeding_fresh_store_inserts_all_examples() {
        let store = InMemoryBookStore::new();

        assert_eq!(seed_examples(&store).await.unwrap(), 3);
        assert_eq!(store.find_all().await.unwrap(), example_books().to_vec());
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = InMemoryBookStore::new();

        for _ in 0..3 {
            seed_examples(&store).await.unwrap();
        }

        assert_eq!(seed_examples(&store).await.unwrap(), 0);
        for book in example_books() {
            assert_eq!(store.count_matching(&book).await.unwrap(), 1);
        }
        assert_eq!(store.find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn modified_example_does_not_count_as_present() {
        let mut edited = example_books()[1].clone();
        edited.year = "1831".to_string();
        let store = InMemoryBookStore::with_books([edited]);

        assert_eq!(seed_examples(&store).await.unwrap(), 3);
        assert_eq!(store.find_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn duplicated_example_aborts_seeding() {
        let frankenstein = example_books()[1].clone();
        let store = InMemoryBookStore::with_books([frankenstein.clone(), frankenstein]);

        match seed_examples(&store).await {
            Err(SeedError::Duplicated { id, count }) => {
                assert_eq!(id, "example2");
                assert_eq!(count, 2);
            }
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }
}

use mongodb::bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalog entry as exposed by the JSON API.
///
/// Optional fields are empty strings when absent and are omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Caller-assigned identifier, used by update and delete
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub edition: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pages: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub year: String,
}

impl Book {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_details(
        mut self,
        edition: impl Into<String>,
        pages: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        self.edition = edition.into();
        self.pages = pages.into();
        self.year = year.into();
        self
    }
}

/// Fields posted by the HTML create form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "BookName", default)]
    pub title: String,
    #[serde(rename = "BookAuthor", default)]
    pub author: String,
    #[serde(rename = "BookEdition", default)]
    pub edition: String,
    #[serde(rename = "BookPages", default)]
    pub pages: String,
    #[serde(rename = "BookYear", default)]
    pub year: String,
}

impl From<BookForm> for Book {
    fn from(form: BookForm) -> Self {
        Self {
            id: form.id,
            title: form.title,
            author: form.author,
            edition: form.edition,
            pages: form.pages,
            year: form.year,
        }
    }
}

/// Stored document layout. Field names match the collection's existing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<ObjectId>,
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "BookName", default)]
    pub title: String,
    #[serde(rename = "BookAuthor", default)]
    pub author: String,
    #[serde(rename = "BookEdition", default, skip_serializing_if = "String::is_empty")]
    pub edition: String,
    #[serde(rename = "BookPages", default, skip_serializing_if = "String::is_empty")]
    pub pages: String,
    #[serde(rename = "BookYear", default, skip_serializing_if = "String::is_empty")]
    pub year: String,
}

impl BookDocument {
    pub const ID: &'static str = "ID";
    pub const TITLE: &'static str = "BookName";
    pub const AUTHOR: &'static str = "BookAuthor";
    pub const EDITION: &'static str = "BookEdition";
    pub const PAGES: &'static str = "BookPages";
    pub const YEAR: &'static str = "BookYear";
}

impl From<&Book> for BookDocument {
    fn from(book: &Book) -> Self {
        Self {
            mongo_id: None,
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            edition: book.edition.clone(),
            pages: book.pages.clone(),
            year: book.year.clone(),
        }
    }
}

impl From<BookDocument> for Book {
    fn from(document: BookDocument) -> Self {
        Self {
            id: document.id,
            title: document.title,
            author: document.author,
            edition: document.edition,
            pages: document.pages,
            year: document.year,
        }
    }
}

/// Partial update. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub edition: Option<String>,
    pub pages: Option<String>,
    pub year: Option<String>,
}

impl BookPatch {
    /// Pick the updatable keys out of a loosely-typed body.
    ///
    /// Unknown keys (including `id`) are ignored, as are recognised keys whose
    /// value is not a string.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_owned);

        Self {
            title: text("title"),
            author: text("author"),
            edition: text("edition"),
            pages: text("pages"),
            year: text("year"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.edition.is_none()
            && self.pages.is_none()
            && self.year.is_none()
    }

    pub fn apply(&self, book: &mut Book) {
        let fields = [
            (&self.title, &mut book.title),
            (&self.author, &mut book.author),
            (&self.edition, &mut book.edition),
            (&self.pages, &mut book.pages),
            (&self.year, &mut book.year),
        ];
        for (value, target) in fields {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }
    }

    /// `$set` body for the stored document.
    pub fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        let fields = [
            (BookDocument::TITLE, &self.title),
            (BookDocument::AUTHOR, &self.author),
            (BookDocument::EDITION, &self.edition),
            (BookDocument::PAGES, &self.pages),
            (BookDocument::YEAR, &self.year),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                set.insert(name, value.as_str());
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;
    use serde_json::json;

    #[test]
    fn json_omits_empty_optional_fields() {
        let book = Book::new("b4", "Dune", "Frank Herbert");
        assert_eq!(
            serde_json::to_value(&book).unwrap(),
            json!({ "id": "b4", "title": "Dune", "author": "Frank Herbert" })
        );
    }

    #[test]
    fn json_missing_fields_decode_as_empty() {
        let book: Book = serde_json::from_value(json!({ "id": "b4", "title": "Dune" })).unwrap();
        assert_eq!(book.author, "");
        assert_eq!(book.year, "");
    }

    #[test]
    fn form_fields_map_to_book() {
        let form = BookForm {
            id: "b5".into(),
            title: "Emma".into(),
            author: "Jane Austen".into(),
            year: "1815".into(),
            ..BookForm::default()
        };
        let book = Book::from(form);
        assert_eq!(book, Book::new("b5", "Emma", "Jane Austen").with_details("", "", "1815"));
    }

    #[test]
    fn document_uses_stored_field_names_and_hides_mongo_id() {
        let book = Book::new("b4", "Dune", "Frank Herbert").with_details("", "412", "");
        let document = bson::to_document(&BookDocument::from(&book)).unwrap();

        assert_eq!(document.get_str("ID").unwrap(), "b4");
        assert_eq!(document.get_str("BookName").unwrap(), "Dune");
        assert_eq!(document.get_str("BookPages").unwrap(), "412");
        assert!(!document.contains_key("BookEdition"));
        assert!(!document.contains_key("_id"));

        let mut stored = BookDocument::from(&book);
        stored.mongo_id = Some(ObjectId::new());
        let json = serde_json::to_value(Book::from(stored)).unwrap();
        assert!(json.get("_id").is_none());
        assert!(json.get("mongo_id").is_none());
    }

    #[test]
    fn patch_keeps_only_recognised_string_fields() {
        let body = json!({
            "title": "Dune Messiah",
            "year": 1969,
            "pages": "256",
            "id": "other",
            "publisher": "Putnam"
        });
        let patch = BookPatch::from_fields(body.as_object().unwrap());

        assert_eq!(
            patch,
            BookPatch {
                title: Some("Dune Messiah".into()),
                pages: Some("256".into()),
                ..BookPatch::default()
            }
        );
    }

    #[test]
    fn patch_without_recognised_fields_is_empty() {
        let body = json!({ "year": 1965, "isbn": "x" });
        assert!(BookPatch::from_fields(body.as_object().unwrap()).is_empty());
    }

    #[test]
    fn patch_apply_touches_only_supplied_fields() {
        let mut book = Book::new("b4", "Dune", "Frank Herbert").with_details("1st", "412", "");
        let patch = BookPatch {
            year: Some("1965".into()),
            ..BookPatch::default()
        };
        patch.apply(&mut book);

        assert_eq!(
            book,
            Book::new("b4", "Dune", "Frank Herbert").with_details("1st", "412", "1965")
        );
    }

    #[test]
    fn patch_set_document_uses_stored_names() {
        let patch = BookPatch {
            author: Some("F. Herbert".into()),
            year: Some("1965".into()),
            ..BookPatch::default()
        };
        let set = patch.to_set_document();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get_str("BookAuthor").unwrap(), "F. Herbert");
        assert_eq!(set.get_str("BookYear").unwrap(), "1965");
    }
}

//! Core traits for the values stored in and read from a record store.
//!
//! - [`Record`] is implemented by caller element types. Records travel to and from the store as
//!   BSON documents through serde; the stored field name is the serde name of a field, so
//!   `#[serde(rename = "...")]` decouples it from the Rust field name.
//! - [`Element`] describes how a record is held by a destination vector: by value (`Vec<R>`)
//!   or by owning pointer (`Vec<Box<R>>`).
//! - [`Identifiable`] exposes the id a record is stored under, used by batch saves.
//!
//! The `Record` derive from the facade crate implements `Record` and the by-value `Element`
//! in one go.

use bson::{
    Document,
    de::deserialize_from_document,
    error::Error as BsonError,
    ser::serialize_to_document,
};
use serde::{Serialize, de::DeserializeOwned};

/// A typed record that can be read from a store.
///
/// `Default` provides the zero value a record is decoded onto: fields absent from the
/// stored document keep their default.
///
/// # Example
///
/// ```ignore
/// use kiln::record::Record;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
/// pub struct Book {
///     #[record(id)]
///     pub book_id: String,
///     pub name: String,
///     pub pages: i64,
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

/// The storage convention of a destination vector's elements.
///
/// Implemented for every [`Record`] (by value, usually through the derive) and for
/// `Box<R>` (by owning pointer). Destinations whose element type implements neither, such as
/// `Vec<i64>` or `Vec<Box<Box<R>>>`, are rejected at compile time.
pub trait Element: Sized {
    /// The record type the element holds.
    type Record: Record;

    /// `true` when the element is an owning pointer to the record.
    const BY_REFERENCE: bool;

    /// Converts a decoded record into the element's storage convention.
    fn from_boxed(record: Box<Self::Record>) -> Self;
}

impl<R: Record> Element for Box<R> {
    type Record = R;

    const BY_REFERENCE: bool = true;

    fn from_boxed(record: Box<R>) -> Self {
        record
    }
}

/// Anything exposing the id it is stored under.
pub trait Identifiable {
    /// Returns the id of this item.
    fn id(&self) -> &str;
}

impl<T: Identifiable + ?Sized> Identifiable for &T {
    fn id(&self) -> &str {
        (**self).id()
    }
}

impl<T: Identifiable + ?Sized> Identifiable for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }
}

/// Serializes a value into the document stored for it.
///
/// # Errors
///
/// Returns an error if the value does not serialize into a document (scalars, sequences,
/// unit values).
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Document, BsonError> {
    serialize_to_document(value)
}

/// Decodes a raw stored document onto `target`.
///
/// Fields present in `raw` replace those of `target`; fields missing from `raw` keep the
/// value `target` already had.
///
/// # Errors
///
/// Returns an error if the merged document cannot be converted into `R`.
pub fn decode_into<R: Record>(raw: Document, target: &mut R) -> Result<(), BsonError> {
    let mut merged = serialize_to_document(&*target)?;
    for (field, value) in raw {
        merged.insert(field, value);
    }

    *target = deserialize_from_document(merged)?;

    Ok(())
}

/// Extension trait providing document conversions for records.
///
/// Automatically implemented for all [`Record`] types.
pub trait RecordExt: Record {
    /// Converts this record into its stored document.
    fn to_document(&self) -> Result<Document, BsonError>;

    /// Creates a record from a stored document, defaulting missing fields.
    fn from_document(raw: Document) -> Result<Self, BsonError>;
}

impl<R: Record> RecordExt for R {
    fn to_document(&self) -> Result<Document, BsonError> {
        encode(self)
    }

    fn from_document(raw: Document) -> Result<Self, BsonError> {
        let mut record = R::default();
        decode_into(raw, &mut record)?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Book {
        #[serde(rename = "book_id")]
        id: String,
        name: String,
        pages: i64,
        hardcover: bool,
    }

    impl Record for Book {}

    #[test]
    fn missing_fields_keep_zero_values() {
        let book = Book::from_document(doc! { "book_id": "id-1", "name": "Galaxy" }).unwrap();

        assert_eq!(
            book,
            Book { id: "id-1".into(), name: "Galaxy".into(), pages: 0, hardcover: false },
        );
    }

    #[test]
    fn decode_overwrites_present_fields_only() {
        let mut book = Book { id: "id-1".into(), name: "old".into(), pages: 10, hardcover: true };
        decode_into(doc! { "name": "new" }, &mut book).unwrap();

        assert_eq!(book.name, "new");
        assert_eq!(book.pages, 10);
        assert!(book.hardcover);
    }

    #[test]
    fn mistyped_field_fails_to_decode() {
        assert!(Book::from_document(doc! { "pages": "many" }).is_err());
    }

    #[test]
    fn external_names_are_used() {
        let stored = Book { id: "id-2".into(), ..Book::default() }.to_document().unwrap();

        assert_eq!(stored.get_str("book_id").unwrap(), "id-2");
        assert!(stored.get("id").is_none());
    }

    #[test]
    fn scalars_do_not_encode() {
        assert!(encode(&42_i64).is_err());
        assert!(encode(&vec![1, 2, 3]).is_err());
    }

    #[test]
    fn boxed_elements_are_by_reference() {
        assert!(<Box<Book> as Element>::BY_REFERENCE);

        let boxed = <Box<Book> as Element>::from_boxed(Box::new(Book::default()));
        assert_eq!(*boxed, Book::default());
    }
}

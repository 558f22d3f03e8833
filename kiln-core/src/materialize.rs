//! Binding query results into caller-owned vectors.
//!
//! A [`Materializer`] is bound to a destination `Vec<E>` where `E` is an [`Element`]: either a
//! record held by value or a `Box` of a record. It hands out fresh zero-valued records to
//! decode into and appends the decoded records back in the destination's storage convention.
//! The same query code therefore fills `Vec<Book>` and `Vec<Box<Book>>` alike.
//!
//! ```ignore
//! let mut books: Vec<Box<Book>> = Vec::new();
//! let mut sink = Materializer::bind(&mut books);
//!
//! let mut book = sink.new_element();
//! decode_into(raw, &mut *book)?;
//! sink.append(book);
//! ```

use crate::record::Element;

/// Appends decoded records into a bound destination vector.
#[derive(Debug)]
pub struct Materializer<'a, E: Element> {
    list: &'a mut Vec<E>,
}

impl<'a, E: Element> Materializer<'a, E> {
    /// Binds a destination, clearing any elements it already holds.
    pub fn bind(list: &'a mut Vec<E>) -> Self {
        list.clear();

        Self { list }
    }

    /// Returns `true` when the destination stores owning pointers to records.
    pub fn by_reference(&self) -> bool {
        E::BY_REFERENCE
    }

    /// Returns a fresh, zero-valued record to decode into.
    pub fn new_element(&self) -> Box<E::Record> {
        Box::default()
    }

    /// Appends a decoded record at the end of the destination.
    pub fn append(&mut self, element: Box<E::Record>) {
        self.list.push(E::from_boxed(element));
    }

    /// Drops everything appended so far.
    pub fn discard(&mut self) {
        self.list.clear();
    }

    /// Number of elements appended since binding.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if nothing has been appended since binding.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

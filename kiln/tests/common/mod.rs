#![allow(dead_code)]

use kiln::{memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};

pub const BOOKS: &str = "books";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
pub struct Book {
    #[record(id)]
    #[serde(rename = "book_id")]
    pub id: String,
    pub name: String,
    pub author: String,
    pub published: i64,
    pub pages: i64,
    pub hardcover: bool,
    pub tags: Vec<String>,
}

pub fn book(id: &str, name: &str, published: i64, pages: i64, tags: &[&str]) -> Book {
    Book {
        id: id.to_string(),
        name: name.to_string(),
        author: "Douglas Adams".to_string(),
        published,
        pages,
        hardcover: published < 1982,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn series() -> Vec<Book> {
    vec![
        book("id-1", "The Hitchhiker's Guide to the Galaxy", 1979, 180, &["sci-fi", "comedy"]),
        book("id-2", "The Restaurant at the End of the Universe", 1980, 200, &["sci-fi"]),
        book("id-3", "Life, the Universe and Everything", 1982, 224, &["sci-fi", "cricket"]),
        book("id-4", "So Long, and Thanks for All the Fish", 1984, 204, &["romance"]),
        book("id-5", "Mostly Harmless", 1992, 240, &["sci-fi", "comedy"]),
    ]
}

pub async fn empty_store() -> RecordStore<InMemoryStore> {
    RecordStore::new(InMemoryStore::builder().build().await.unwrap())
}

pub async fn seeded_store() -> RecordStore<InMemoryStore> {
    let store = empty_store().await;
    store
        .batch_save(&Context::background(), BOOKS, &series())
        .await
        .unwrap();

    store
}

pub fn names<'a>(books: impl IntoIterator<Item = &'a Book>) -> Vec<&'a str> {
    books.into_iter().map(|b| b.name.as_str()).collect()
}

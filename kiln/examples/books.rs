use std::time::Duration;

use kiln::{bson::doc, memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};

const BOOKS: &str = "books";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
pub struct Book {
    #[record(id)]
    #[serde(rename = "book_id")]
    pub id: String,
    pub name: String,
    pub author: String,
    pub published: i64,
    pub pages: i64,
    pub hardcover: bool,
}

impl Book {
    fn new(name: &str, published: i64, pages: i64, hardcover: bool) -> Self {
        Self {
            id: to_id(name),
            name: name.to_string(),
            author: "Douglas Adams".to_string(),
            published,
            pages,
            hardcover,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = RecordStore::new(InMemoryStore::builder().build().await?);
    let ctx = Context::with_timeout(Duration::from_secs(5));

    let books = vec![
        Book::new("The Hitchhiker's Guide to the Galaxy", 1979, 180, true),
        Book::new("The Restaurant at the End of the Universe", 1980, 200, true),
        Book::new("Life, the Universe and Everything", 1982, 224, false),
        Book::new("So Long, and Thanks for All the Fish", 1984, 204, false),
    ];
    store.batch_save(&ctx, BOOKS, &books).await?;

    let sequel = Book::new("Mostly Harmless", 1992, 240, false);
    store.save(&ctx, BOOKS, sequel.id(), &sequel).await?;
    store.update(&ctx, BOOKS, sequel.id(), doc! { "hardcover": true }).await?;

    let criteria = Criteria::builder(BOOKS)
        .filter(Filter::gte("pages", 200))
        .order_by("published")
        .descending()
        .build();

    let mut found: Vec<Box<Book>> = Vec::new();
    store.query(&ctx, &criteria, &mut found).await?;

    let names: Vec<&str> = found.iter().map(|b| b.name.as_str()).collect();
    for (page, chunk) in Pager::new(&names, 2)?.enumerate() {
        println!("page {page}: {chunk:?}");
    }

    store.delete(&ctx, BOOKS, sequel.id()).await?;
    match store.get::<Book>(&ctx, BOOKS, sequel.id()).await {
        Err(err) if err.is_not_found() => println!("{err}"),
        other => println!("unexpected: {other:?}"),
    }

    store.shutdown().await?;
    Ok(())
}

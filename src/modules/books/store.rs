use chrono::Utc;
use dashmap::DashMap;
use uuid::{Timestamp, Uuid};

use super::models::{Book, BookCreate, BookUpdate};

/// In-memory book store shared between the books and reviews modules.
pub struct BookStore {
    books: DashMap<Uuid, Book>,
}

impl BookStore {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }

    /// Assign a uid and timestamps and persist the book.
    pub fn insert(&self, payload: BookCreate) -> Book {
        let now = Utc::now();
        let book = Book {
            uid: Uuid::new_v7(Timestamp::now(uuid::NoContext)),
            title: payload.title,
            author: payload.author,
            publisher: payload.publisher,
            published_date: payload.published_date,
            page_count: payload.page_count,
            language: payload.language,
            created_at: now,
            updated_at: now,
        };
        self.books.insert(book.uid, book.clone());
        book
    }

    /// All books ordered by creation time.
    pub fn list(&self) -> Vec<Book> {
        let mut books: Vec<Book> = self.books.iter().map(|entry| entry.value().clone()).collect();
        books.sort_by_key(|book| book.created_at);
        books
    }

    pub fn get(&self, uid: Uuid) -> Option<Book> {
        self.books.get(&uid).map(|entry| entry.value().clone())
    }

    /// Apply the mutable fields and bump `updated_at`. The uid and
    /// published_date are never touched here.
    pub fn update(&self, uid: Uuid, payload: BookUpdate) -> Option<Book> {
        let mut entry = self.books.get_mut(&uid)?;
        let book = entry.value_mut();
        book.title = payload.title;
        book.author = payload.author;
        book.publisher = payload.publisher;
        book.page_count = payload.page_count;
        book.language = payload.language;
        book.updated_at = Utc::now();
        Some(book.clone())
    }

    pub fn remove(&self, uid: Uuid) -> bool {
        self.books.remove(&uid).is_some()
    }

    pub fn contains(&self, uid: Uuid) -> bool {
        self.books.contains_key(&uid)
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

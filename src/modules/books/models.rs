use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::reviews::models::Review;

/// A book as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier, immutable once assigned
    pub uid: Uuid,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub published_date: NaiveDate,
    pub page_count: i32,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Detail view: the book plus its reviews ordered by creation time.
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub reviews: Vec<Review>,
}

/// Creation payload; uid and timestamps are server-assigned.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookCreate {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 128))]
    pub author: String,
    #[validate(length(min = 1, max = 128))]
    pub publisher: String,
    pub published_date: NaiveDate,
    #[validate(range(min = 1))]
    pub page_count: i32,
    #[validate(length(min = 2, max = 32))]
    pub language: String,
}

/// Update payload; uid and published_date are immutable and therefore
/// absent from the update surface.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookUpdate {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 128))]
    pub author: String,
    #[validate(length(min = 1, max = 128))]
    pub publisher: String,
    #[validate(range(min = 1))]
    pub page_count: i32,
    #[validate(length(min = 2, max = 32))]
    pub language: String,
}

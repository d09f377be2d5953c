use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A review attached to a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub uid: Uuid,
    pub book_uid: Uuid,
    pub user_uid: Option<Uuid>,
    pub rating: i32,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload; uid, book_uid, and timestamps are server-assigned.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewCreate {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(min = 1, max = 2048))]
    pub review_text: String,
    pub user_uid: Option<Uuid>,
}

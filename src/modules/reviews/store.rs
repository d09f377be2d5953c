use chrono::Utc;
use dashmap::DashMap;
use uuid::{Timestamp, Uuid};

use super::models::{Review, ReviewCreate};

/// In-memory review store; reviews are looked up both by uid and by the
/// owning book.
pub struct ReviewStore {
    reviews: DashMap<Uuid, Review>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self {
            reviews: DashMap::new(),
        }
    }

    pub fn insert(&self, book_uid: Uuid, payload: ReviewCreate) -> Review {
        let now = Utc::now();
        let review = Review {
            uid: Uuid::new_v7(Timestamp::now(uuid::NoContext)),
            book_uid,
            user_uid: payload.user_uid,
            rating: payload.rating,
            review_text: payload.review_text,
            created_at: now,
            updated_at: now,
        };
        self.reviews.insert(review.uid, review.clone());
        review
    }

    /// All reviews ordered by creation time.
    pub fn list(&self) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        reviews.sort_by_key(|review| review.created_at);
        reviews
    }

    /// Reviews belonging to one book, ordered by creation time.
    pub fn list_for_book(&self, book_uid: Uuid) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|entry| entry.value().book_uid == book_uid)
            .map(|entry| entry.value().clone())
            .collect();
        reviews.sort_by_key(|review| review.created_at);
        reviews
    }

    pub fn get(&self, uid: Uuid) -> Option<Review> {
        self.reviews.get(&uid).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, uid: Uuid) -> bool {
        self.reviews.remove(&uid).is_some()
    }

    /// Drop every review owned by a book; used when the book is deleted.
    pub fn remove_for_book(&self, book_uid: Uuid) {
        self.reviews.retain(|_, review| review.book_uid != book_uid);
    }
}

impl Default for ReviewStore {
    fn default() -> Self {
        Self::new()
    }
}

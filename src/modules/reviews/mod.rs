pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use bookly_http::error::AppError;
use bookly_kernel::{InitCtx, Module};

use crate::modules::books::store::BookStore;
use models::{Review, ReviewCreate};
use store::ReviewStore;

/// Reviews resource module: reviews are created against an existing book
pub struct ReviewsModule {
    books: Arc<BookStore>,
    reviews: Arc<ReviewStore>,
}

impl ReviewsModule {
    pub fn new(books: Arc<BookStore>, reviews: Arc<ReviewStore>) -> Self {
        Self { books, reviews }
    }
}

#[derive(Clone)]
struct ReviewsState {
    books: Arc<BookStore>,
    reviews: Arc<ReviewStore>,
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "reviews module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let state = ReviewsState {
            books: self.books.clone(),
            reviews: self.reviews.clone(),
        };
        Router::new()
            .route("/", get(list_reviews))
            .route("/book/{book_uid}", post(create_review))
            .route("/{review_uid}", get(get_review).delete(delete_review))
            .with_state(state)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List reviews",
                        "tags": ["Reviews"],
                        "responses": {
                            "200": {
                                "description": "All reviews ordered by creation time",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Review"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/book/{book_uid}": {
                    "post": {
                        "summary": "Add a review to a book",
                        "tags": ["Reviews"],
                        "parameters": [{
                            "name": "book_uid",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/ReviewCreate"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created review",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Review"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            },
                            "422": {
                                "description": "Validation error",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{review_uid}": {
                    "get": {
                        "summary": "Get a review",
                        "tags": ["Reviews"],
                        "parameters": [{
                            "name": "review_uid",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Review",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Review"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Review not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "delete": {
                        "summary": "Delete a review",
                        "tags": ["Reviews"],
                        "parameters": [{
                            "name": "review_uid",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "responses": {
                            "204": {
                                "description": "Deleted"
                            },
                            "404": {
                                "description": "Review not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Review": {
                        "type": "object",
                        "properties": {
                            "uid": { "type": "string", "format": "uuid" },
                            "book_uid": { "type": "string", "format": "uuid" },
                            "user_uid": { "type": "string", "format": "uuid", "nullable": true },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "review_text": { "type": "string" },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["uid", "book_uid", "rating", "review_text", "created_at", "updated_at"]
                    },
                    "ReviewCreate": {
                        "type": "object",
                        "properties": {
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "review_text": { "type": "string" },
                            "user_uid": { "type": "string", "format": "uuid" }
                        },
                        "required": ["rating", "review_text"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module stopped");
        Ok(())
    }
}

async fn list_reviews(State(state): State<ReviewsState>) -> Json<Vec<Review>> {
    Json(state.reviews.list())
}

async fn create_review(
    State(state): State<ReviewsState>,
    Path(book_uid): Path<Uuid>,
    Json(payload): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    payload
        .validate()
        .map_err(|errors| AppError::from_validation_errors(&errors))?;

    if !state.books.contains(book_uid) {
        return Err(AppError::not_found("book not found"));
    }

    let review = state.reviews.insert(book_uid, payload);
    tracing::info!(review_uid = %review.uid, book_uid = %book_uid, "review created");
    Ok((StatusCode::CREATED, Json(review)))
}

async fn get_review(
    State(state): State<ReviewsState>,
    Path(review_uid): Path<Uuid>,
) -> Result<Json<Review>, AppError> {
    state
        .reviews
        .get(review_uid)
        .map(Json)
        .ok_or_else(|| AppError::not_found("review not found"))
}

async fn delete_review(
    State(state): State<ReviewsState>,
    Path(review_uid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.reviews.remove(review_uid) {
        return Err(AppError::not_found("review not found"));
    }

    tracing::info!(review_uid = %review_uid, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}

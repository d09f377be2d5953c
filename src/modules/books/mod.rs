pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use bookly_http::error::AppError;
use bookly_kernel::{InitCtx, Module};

use crate::modules::reviews::store::ReviewStore;
use models::{Book, BookCreate, BookDetail, BookUpdate};
use store::BookStore;

/// Books resource module: CRUD plus the detail view embedding reviews
pub struct BooksModule {
    books: Arc<BookStore>,
    reviews: Arc<ReviewStore>,
}

impl BooksModule {
    pub fn new(books: Arc<BookStore>, reviews: Arc<ReviewStore>) -> Self {
        Self { books, reviews }
    }
}

#[derive(Clone)]
struct BooksState {
    books: Arc<BookStore>,
    reviews: Arc<ReviewStore>,
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let state = BooksState {
            books: self.books.clone(),
            reviews: self.reviews.clone(),
        };
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route(
                "/{book_uid}",
                get(get_book).patch(update_book).delete(delete_book),
            )
            .with_state(state)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/BookCreate"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
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
                "/{book_uid}": {
                    "get": {
                        "summary": "Get a book with its reviews",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "book_uid",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Book detail",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/BookDetail"
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
                            }
                        }
                    },
                    "patch": {
                        "summary": "Update a book",
                        "tags": ["Books"],
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
                                        "$ref": "#/components/schemas/BookUpdate"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Updated book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
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
                            }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "book_uid",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "responses": {
                            "204": {
                                "description": "Deleted"
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
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "uid": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "publisher": { "type": "string" },
                            "published_date": { "type": "string", "format": "date" },
                            "page_count": { "type": "integer" },
                            "language": { "type": "string" },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["uid", "title", "author", "publisher", "published_date", "page_count", "language", "created_at", "updated_at"]
                    },
                    "BookDetail": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Book" },
                            {
                                "type": "object",
                                "properties": {
                                    "reviews": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Review" }
                                    }
                                },
                                "required": ["reviews"]
                            }
                        ]
                    },
                    "BookCreate": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "publisher": { "type": "string" },
                            "published_date": { "type": "string", "format": "date" },
                            "page_count": { "type": "integer" },
                            "language": { "type": "string" }
                        },
                        "required": ["title", "author", "publisher", "published_date", "page_count", "language"]
                    },
                    "BookUpdate": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "publisher": { "type": "string" },
                            "page_count": { "type": "integer" },
                            "language": { "type": "string" }
                        },
                        "required": ["title", "author", "publisher", "page_count", "language"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

async fn list_books(State(state): State<BooksState>) -> Json<Vec<Book>> {
    Json(state.books.list())
}

async fn create_book(
    State(state): State<BooksState>,
    Json(payload): Json<BookCreate>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    payload
        .validate()
        .map_err(|errors| AppError::from_validation_errors(&errors))?;

    let book = state.books.insert(payload);
    tracing::info!(book_uid = %book.uid, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    State(state): State<BooksState>,
    Path(book_uid): Path<Uuid>,
) -> Result<Json<BookDetail>, AppError> {
    let book = state
        .books
        .get(book_uid)
        .ok_or_else(|| AppError::not_found("book not found"))?;

    let reviews = state.reviews.list_for_book(book_uid);
    Ok(Json(BookDetail { book, reviews }))
}

async fn update_book(
    State(state): State<BooksState>,
    Path(book_uid): Path<Uuid>,
    Json(payload): Json<BookUpdate>,
) -> Result<Json<Book>, AppError> {
    payload
        .validate()
        .map_err(|errors| AppError::from_validation_errors(&errors))?;

    let book = state
        .books
        .update(book_uid, payload)
        .ok_or_else(|| AppError::not_found("book not found"))?;

    tracing::info!(book_uid = %book.uid, "book updated");
    Ok(Json(book))
}

async fn delete_book(
    State(state): State<BooksState>,
    Path(book_uid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.books.remove(book_uid) {
        return Err(AppError::not_found("book not found"));
    }

    // Reviews are owned by the book for display purposes; drop them with it.
    state.reviews.remove_for_book(book_uid);

    tracing::info!(book_uid = %book_uid, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

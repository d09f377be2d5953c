//! Black-box tests against the fully wired application router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use bookly_app::modules;
use bookly_kernel::settings::Settings;
use bookly_kernel::ModuleRegistry;
use bookly_mail::MailClient;

fn build_app() -> (ModuleRegistry, axum::Router) {
    let settings = Settings::default();
    let mail = Arc::new(MailClient::new(&settings.mail).unwrap());

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, mail);

    let router = bookly_http::build_router(&registry, &settings);
    (registry, router)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn bootstrap_registers_exactly_three_modules() {
    let (registry, _router) = build_app();

    assert_eq!(registry.len(), 3);
    assert!(registry.get_module("books").is_some());
    assert!(registry.get_module("auths").is_some());
    assert!(registry.get_module("reviews").is_some());
}

#[tokio::test]
async fn healthz_responds_ok() {
    let (_registry, router) = build_app();

    let response = router
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_lists_all_module_paths() {
    let (_registry, router) = build_app();

    let response = router
        .oneshot(
            Request::get("/api/v1/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let spec = json_body(response).await;
    assert_eq!(spec["info"]["title"], "Bookly API");
    let paths = spec["paths"].as_object().unwrap();
    assert!(paths.keys().any(|p| p.starts_with("/api/v1/books")));
    assert!(paths.keys().any(|p| p.starts_with("/api/v1/auths")));
    assert!(paths.keys().any(|p| p.starts_with("/api/v1/reviews")));
}

#[tokio::test]
async fn book_crud_and_review_attachment_round_trip() {
    let (_registry, router) = build_app();

    // Create a book.
    let create = serde_json::json!({
        "title": "The Left Hand of Darkness",
        "author": "Ursula K. Le Guin",
        "publisher": "Ace Books",
        "published_date": "1969-03-01",
        "page_count": 304,
        "language": "en"
    });
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/books/")
                .header("content-type", "application/json")
                .body(Body::from(create.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let book = json_body(response).await;
    let uid = book["uid"].as_str().unwrap().to_string();

    // Attach a review through the reviews router.
    let review = serde_json::json!({"rating": 5, "review_text": "remarkable"});
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/reviews/book/{uid}"))
                .header("content-type", "application/json")
                .body(Body::from(review.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Detail view embeds the review.
    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/books/{uid}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = json_body(response).await;
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(detail["reviews"][0]["rating"], 5);

    // Deleting the book also drops its reviews.
    let response = router
        .clone()
        .oneshot(
            Request::delete(format!("/api/v1/books/{uid}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(
            Request::get("/api/v1/reviews/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reviews = json_body(response).await;
    assert!(reviews.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn validation_failure_surfaces_error_envelope() {
    let (_registry, router) = build_app();

    let create = serde_json::json!({
        "title": "",
        "author": "Nobody",
        "publisher": "Nowhere",
        "published_date": "2020-01-01",
        "page_count": 0,
        "language": "en"
    });
    let response = router
        .oneshot(
            Request::post("/api/v1/books/")
                .header("content-type", "application/json")
                .body(Body::from(create.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let error = json_body(response).await;
    assert_eq!(error["error"]["code"], "validation_error");
    assert!(error["error"]["trace_id"].as_str().is_some());
    assert!(!error["error"]["details"].as_array().unwrap().is_empty());
}

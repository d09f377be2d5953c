pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use bookly_http::error::AppError;
use bookly_kernel::{InitCtx, Module};
use bookly_mail::{create_message, MailClient};

use models::{LoginRequest, LoginResponse, SignupRequest, UserView};
use store::UserStore;

/// Auth resource module: signup, email verification, and login.
/// Sessions are opaque tokens; there is no JWT stack here.
pub struct AuthModule {
    users: Arc<UserStore>,
    mail: Arc<MailClient>,
}

impl AuthModule {
    pub fn new(users: Arc<UserStore>, mail: Arc<MailClient>) -> Self {
        Self { users, mail }
    }
}

#[derive(Clone)]
struct AuthState {
    users: Arc<UserStore>,
    mail: Arc<MailClient>,
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auths"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "auths module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let state = AuthState {
            users: self.users.clone(),
            mail: self.mail.clone(),
        };
        Router::new()
            .route("/signup", post(signup))
            .route("/verify/{token}", get(verify))
            .route("/login", post(login))
            .route("/me", get(me))
            .with_state(state)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/signup": {
                    "post": {
                        "summary": "Register an account",
                        "tags": ["Auths"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/SignupRequest"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created account; a verification email is dispatched",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/User"
                                        }
                                    }
                                }
                            },
                            "409": {
                                "description": "Email already registered",
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
                "/verify/{token}": {
                    "get": {
                        "summary": "Verify an account by emailed token",
                        "tags": ["Auths"],
                        "parameters": [{
                            "name": "token",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Account verified",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/User"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Unknown or already used token",
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
                "/login": {
                    "post": {
                        "summary": "Log in",
                        "tags": ["Auths"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/LoginRequest"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Session token and account",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/LoginResponse"
                                        }
                                    }
                                }
                            },
                            "401": {
                                "description": "Invalid credentials",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            },
                            "403": {
                                "description": "Account not verified",
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
                "/me": {
                    "get": {
                        "summary": "Account behind the presented session token",
                        "tags": ["Auths"],
                        "parameters": [{
                            "name": "Authorization",
                            "in": "header",
                            "required": true,
                            "description": "Bearer session token from login",
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Current account",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/User"
                                        }
                                    }
                                }
                            },
                            "401": {
                                "description": "Missing, malformed, or unknown session token",
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
                    "User": {
                        "type": "object",
                        "properties": {
                            "uid": { "type": "string", "format": "uuid" },
                            "username": { "type": "string" },
                            "email": { "type": "string", "format": "email" },
                            "is_verified": { "type": "boolean" },
                            "created_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["uid", "username", "email", "is_verified", "created_at"]
                    },
                    "SignupRequest": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string", "format": "password" }
                        },
                        "required": ["username", "email", "password"]
                    },
                    "LoginRequest": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string", "format": "password" }
                        },
                        "required": ["email", "password"]
                    },
                    "LoginResponse": {
                        "type": "object",
                        "properties": {
                            "token": { "type": "string", "format": "uuid" },
                            "user": { "$ref": "#/components/schemas/User" }
                        },
                        "required": ["token", "user"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auths module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auths module stopped");
        Ok(())
    }
}

async fn signup(
    State(state): State<AuthState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    payload
        .validate()
        .map_err(|errors| AppError::from_validation_errors(&errors))?;

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?;

    let user = state
        .users
        .insert(payload.username, payload.email, password_hash)
        .ok_or_else(|| AppError::conflict(Vec::new(), "email already registered"))?;

    // Verification mail is fire-and-forget: a provider outage must not
    // fail the signup.
    if let Some(token) = user.verification_token {
        let mail = state.mail.clone();
        let message = create_message(
            vec![user.email.clone()],
            "Verify your Bookly account",
            format!(
                "<h1>Welcome to Bookly</h1>\
                 <p>Your verification token is <strong>{token}</strong>.</p>"
            ),
        );
        tokio::spawn(async move {
            if let Err(e) = mail.send(&message).await {
                tracing::error!(error = %e, "failed to send verification email");
            }
        });
    }

    tracing::info!(user_uid = %user.uid, "account created");
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

async fn verify(
    State(state): State<AuthState>,
    Path(token): Path<Uuid>,
) -> Result<Json<UserView>, AppError> {
    let user = state
        .users
        .verify(token)
        .ok_or_else(|| AppError::not_found("unknown verification token"))?;

    tracing::info!(user_uid = %user.uid, "account verified");
    Ok(Json(UserView::from(&user)))
}

async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload
        .validate()
        .map_err(|errors| AppError::from_validation_errors(&errors))?;

    let user = state
        .users
        .find_by_email(&payload.email)
        .ok_or_else(|| AppError::unauthorized("invalid email or password"))?;

    let password_matches = bcrypt::verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to verify password: {e}")))?;
    if !password_matches {
        return Err(AppError::unauthorized("invalid email or password"));
    }

    if !user.is_verified {
        return Err(AppError::forbidden("account not verified"));
    }

    let token = state.users.create_session(user.uid);
    tracing::info!(user_uid = %user.uid, "login succeeded");
    Ok(Json(LoginResponse {
        token,
        user: UserView::from(&user),
    }))
}

async fn me(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<UserView>, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| Uuid::parse_str(token.trim()).ok())
        .ok_or_else(|| AppError::unauthorized("missing or malformed session token"))?;

    let user = state
        .users
        .session_user(token)
        .and_then(|uid| state.users.get(uid))
        .ok_or_else(|| AppError::unauthorized("unknown session token"))?;

    Ok(Json(UserView::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use bookly_kernel::settings::MailSettings;

    fn module() -> (Arc<UserStore>, Router) {
        let users = Arc::new(UserStore::new());
        let mail = Arc::new(MailClient::new(&MailSettings::default()).unwrap());
        let router = AuthModule::new(users.clone(), mail).routes();
        (users, router)
    }

    fn signup_body() -> serde_json::Value {
        serde_json::json!({
            "username": "reader",
            "email": "reader@example.com",
            "password": "correct horse battery"
        })
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn signup_creates_unverified_account() {
        let (_users, router) = module();

        let response = router
            .oneshot(
                Request::post("/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(signup_body().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let user = json_body(response).await;
        assert_eq!(user["email"], "reader@example.com");
        assert_eq!(user["is_verified"], false);
        assert!(user.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn duplicate_signup_returns_409() {
        let (_users, router) = module();

        let first = router
            .clone()
            .oneshot(
                Request::post("/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(signup_body().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = router
            .oneshot(
                Request::post("/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(signup_body().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_requires_verification() {
        let (users, router) = module();

        let response = router
            .clone()
            .oneshot(
                Request::post("/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(signup_body().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let login_body = serde_json::json!({
            "email": "reader@example.com",
            "password": "correct horse battery"
        });
        let response = router
            .clone()
            .oneshot(
                Request::post("/login")
                    .header("content-type", "application/json")
                    .body(Body::from(login_body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Verify via the emailed token, then login succeeds.
        let token = users
            .find_by_email("reader@example.com")
            .unwrap()
            .verification_token
            .unwrap();
        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/verify/{token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::post("/login")
                    .header("content-type", "application/json")
                    .body(Body::from(login_body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let login = json_body(response).await;
        assert!(login["token"].as_str().is_some());
        assert_eq!(login["user"]["is_verified"], true);
    }

    #[tokio::test]
    async fn me_returns_the_account_behind_the_session() {
        let (users, router) = module();
        let hash = bcrypt::hash("secret password", bcrypt::DEFAULT_COST).unwrap();
        let user = users
            .insert(
                "reader".to_string(),
                "reader@example.com".to_string(),
                hash,
            )
            .unwrap();
        users.verify(user.verification_token.unwrap()).unwrap();
        let token = users.create_session(user.uid);

        let response = router
            .oneshot(
                Request::get("/me")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["uid"], user.uid.to_string());
        assert_eq!(body["email"], "reader@example.com");
    }

    #[tokio::test]
    async fn me_rejects_missing_and_unknown_tokens() {
        let (_users, router) = module();

        let response = router
            .clone()
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::get("/me")
                    .header("authorization", format!("Bearer {}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_with_wrong_password_returns_401() {
        let (users, router) = module();
        let hash = bcrypt::hash("right password", bcrypt::DEFAULT_COST).unwrap();
        let user = users
            .insert(
                "reader".to_string(),
                "reader@example.com".to_string(),
                hash,
            )
            .unwrap();
        users.verify(user.verification_token.unwrap()).unwrap();

        let login_body = serde_json::json!({
            "email": "reader@example.com",
            "password": "wrong password"
        });
        let response = router
            .oneshot(
                Request::post("/login")
                    .header("content-type", "application/json")
                    .body(Body::from(login_body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

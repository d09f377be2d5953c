//! Outbound email for Bookly.
//!
//! The transport is an HTTP mail provider: messages are posted as JSON to
//! the provider endpoint configured in [`MailSettings`]. The client is
//! built once at startup and shared read-only afterwards. This layer is
//! fire-and-forget: no retry, no queuing, no delivery confirmation.

use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use thiserror::Error;

use bookly_kernel::settings::MailSettings;

/// MIME subtype of an outgoing message body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    Plain,
}

/// Ephemeral outgoing message value. Constructed per send, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub content_type: ContentType,
}

/// Build an HTML message ready for dispatch through [`MailClient::send`].
pub fn create_message(
    recipients: Vec<String>,
    subject: impl Into<String>,
    body: impl Into<String>,
) -> Message {
    Message {
        recipients,
        subject: subject.into(),
        body: body.into(),
        content_type: ContentType::Html,
    }
}

/// Errors surfaced by the mail transport
#[derive(Error, Debug)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail provider rejected message with status {0}")]
    Rejected(reqwest::StatusCode),
}

/// Client for the outbound mail provider, configured once at process start.
pub struct MailClient {
    http_client: reqwest::Client,
    server: String,
    username: String,
    password: String,
    from_address: String,
    from_name: String,
}

impl MailClient {
    /// Build the client from settings. Fails only on invalid client
    /// configuration, not on provider unavailability.
    pub fn new(settings: &MailSettings) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.send_timeout_ms))
            .build()
            .context("failed to build mail HTTP client")?;

        Ok(Self {
            http_client,
            server: settings.server.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            from_address: settings.from_address.clone(),
            from_name: settings.from_name.clone(),
        })
    }

    /// Dispatch a message to the provider. Errors propagate to the caller;
    /// callers that must not fail on mail problems spawn the send and log.
    pub async fn send(&self, message: &Message) -> Result<(), MailError> {
        let url = format!("{}/messages", self.server);
        let payload = SendRequest {
            from: Sender {
                email: &self.from_address,
                name: &self.from_name,
            },
            to: &message.recipients,
            subject: &message.subject,
            body: &message.body,
            content_type: message.content_type,
        };

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::Rejected(response.status()));
        }

        tracing::debug!(
            recipients = message.recipients.len(),
            subject = %message.subject,
            "message accepted by mail provider"
        );

        Ok(())
    }
}

#[derive(Serialize)]
struct Sender<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: Sender<'a>,
    to: &'a [String],
    subject: &'a str,
    body: &'a str,
    content_type: ContentType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_message_builds_html_message() {
        let message = create_message(
            vec!["a@example.com".to_string()],
            "Subject",
            "<p>body</p>",
        );

        assert_eq!(message.recipients, vec!["a@example.com".to_string()]);
        assert_eq!(message.subject, "Subject");
        assert_eq!(message.body, "<p>body</p>");
        assert_eq!(message.content_type, ContentType::Html);
    }

    #[test]
    fn create_message_keeps_all_recipients() {
        let message = create_message(
            vec!["a@example.com".to_string(), "b@example.com".to_string()],
            "Welcome",
            "<h1>Hi</h1>",
        );

        assert_eq!(message.recipients.len(), 2);
    }

    #[test]
    fn client_carries_sender_identity_from_settings() {
        let settings = MailSettings::default();
        let client = MailClient::new(&settings).unwrap();

        assert_eq!(client.from_address, "noreply@bookly.dev");
        assert_eq!(client.from_name, "Bookly");
    }

    #[test]
    fn client_trims_trailing_slash_from_server() {
        let settings = MailSettings {
            server: "http://mail.example.com/".to_string(),
            ..MailSettings::default()
        };
        let client = MailClient::new(&settings).unwrap();
        assert_eq!(client.server, "http://mail.example.com");
    }

    /// Captured request from the stub provider: the Authorization header
    /// and the JSON body the client posted.
    type CapturedSend = (Option<String>, serde_json::Value);

    /// Spin up a local stub mail provider that records incoming sends and
    /// answers with the given status. Returns its base URL and the channel
    /// carrying captured requests.
    async fn spawn_stub_provider(
        status: axum::http::StatusCode,
    ) -> (String, tokio::sync::mpsc::UnboundedReceiver<CapturedSend>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<CapturedSend>();

        let app = axum::Router::new()
            .route(
                "/messages",
                axum::routing::post(
                    move |axum::extract::State(tx): axum::extract::State<
                        tokio::sync::mpsc::UnboundedSender<CapturedSend>,
                    >,
                          headers: axum::http::HeaderMap,
                          axum::extract::Json(body): axum::extract::Json<serde_json::Value>| async move {
                        let auth = headers
                            .get(axum::http::header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let _ = tx.send((auth, body));
                        status
                    },
                ),
            )
            .with_state(tx);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), rx)
    }

    fn client_for(server: String) -> MailClient {
        let settings = MailSettings {
            server,
            username: "user".to_string(),
            password: "pass".to_string(),
            ..MailSettings::default()
        };
        MailClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn send_posts_json_payload_with_basic_auth() {
        let (server, mut rx) = spawn_stub_provider(axum::http::StatusCode::OK).await;
        let client = client_for(server);

        let message = create_message(
            vec!["reader@example.com".to_string()],
            "Verify your account",
            "<p>Welcome</p>",
        );
        client.send(&message).await.unwrap();

        let (auth, body) = rx.recv().await.expect("provider saw no request");
        // "user:pass" base64-encoded
        assert_eq!(auth.as_deref(), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(body["from"]["email"], "noreply@bookly.dev");
        assert_eq!(body["from"]["name"], "Bookly");
        assert_eq!(body["to"], serde_json::json!(["reader@example.com"]));
        assert_eq!(body["subject"], "Verify your account");
        assert_eq!(body["body"], "<p>Welcome</p>");
        assert_eq!(body["content_type"], "html");
    }

    #[tokio::test]
    async fn send_surfaces_provider_rejection_with_status() {
        let (server, _rx) =
            spawn_stub_provider(axum::http::StatusCode::INTERNAL_SERVER_ERROR).await;
        let client = client_for(server);

        let message = create_message(
            vec!["reader@example.com".to_string()],
            "Verify your account",
            "<p>Welcome</p>",
        );
        let err = client.send(&message).await.unwrap_err();

        match err {
            MailError::Rejected(status) => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("expected provider rejection, got {other:?}"),
        }
    }
}

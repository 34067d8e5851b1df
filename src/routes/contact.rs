/**
 * Contact Routes
 * Stores contact-form messages and sends a notification email
 */
use axum::{http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::db::{self, models::NewContactMessage};
use crate::routes::ErrorResponse;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

const EMAIL_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    /// Whether the notification email went out. The message itself is stored
    /// either way.
    pub emailed: bool,
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// POST /api/contact
///
/// The message is persisted first; a failed email notification is logged and
/// does not fail the request.
pub async fn submit_message(Json(payload): Json<NewContactMessage>) -> impl IntoResponse {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.subject.trim().is_empty()
        || payload.message.trim().is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Please fill in all the fields.")),
        )
            .into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Database not available")),
            )
                .into_response();
        }
    };

    let stored = match db::messages::insert(pool.as_ref(), &payload).await {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(error = %e, "failed to store contact message");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to store message")),
            )
                .into_response();
        }
    };

    let emailed = match send_notification(&payload).await {
        Ok(sent) => sent,
        Err(e) => {
            tracing::error!(message_id = %stored.id, error = %e, "notification email failed");
            false
        }
    };

    (
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            emailed,
        }),
    )
        .into_response()
}

/// Send the notification through the email provider's HTTP API.
/// Returns Ok(false) when no API key is configured.
async fn send_notification(message: &NewContactMessage) -> Result<bool, String> {
    let api_key = match std::env::var("RESEND_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            tracing::debug!("RESEND_API_KEY not set; skipping notification email");
            return Ok(false);
        }
    };

    let from = std::env::var("CONTACT_FROM").unwrap_or_else(|_| "noreply@localhost".to_string());
    let to = std::env::var("CONTACT_TO").unwrap_or_else(|_| from.clone());

    let body = serde_json::json!({
        "from": from,
        "to": [to],
        "subject": format!("New Contact Form Message: {}", message.subject),
        "html": format!(
            "<p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Message:</strong><br/>{}</p>",
            escape_html(&message.name),
            escape_html(&message.email),
            escape_html(&message.message),
        ),
    });

    let response = HTTP_CLIENT
        .post(EMAIL_API_URL)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("email provider returned {status}"));
    }

    Ok(true)
}

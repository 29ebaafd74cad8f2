use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::models::Submission;
use crate::services::{record_submission, render_notification, DeliveryPath, EmailMessage};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub ok: bool,
    /// Set only when the fallback provider delivered the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<Json<ContactResponse>, AppError> {
    if let Err(e) = submission.validate() {
        record_submission("invalid");
        return Err(e.into());
    }

    let body_html = render_notification(&submission, Utc::now(), &state.config.site_name)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render email: {}", e)))?;

    let message = EmailMessage {
        to: state.config.recipient.clone(),
        subject: state.config.subject.clone(),
        body_html,
        reply_to: submission.email.clone(),
    };

    match state.notifier.deliver(&message).await {
        Ok(delivery) => {
            let via = match delivery.path {
                DeliveryPath::Primary => {
                    record_submission("primary");
                    None
                }
                DeliveryPath::Fallback => {
                    record_submission("fallback");
                    Some(delivery.provider.to_string())
                }
            };

            tracing::info!(
                provider = delivery.provider,
                source = submission.source.as_deref().unwrap_or("-"),
                provider_id = ?delivery.response.provider_id,
                "Contact submission delivered"
            );

            Ok(Json(ContactResponse { ok: true, via }))
        }
        Err(failure) => {
            record_submission("failed");
            tracing::error!(error = %failure, "Contact submission could not be delivered");
            Err(AppError::EmailError(failure.to_string()))
        }
    }
}

// --- File: crates/classbook_booking/src/notifier.rs ---
use async_trait::async_trait;
use classbook_common::http::client::{create_client, join_url};
use classbook_common::models::Invitation;
use classbook_common::services::{InvitationNotifier, NotifyError};
use classbook_config::InvitationConfig;
use reqwest::Client;
use tracing::{debug, info};

/// Writes the invitation to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl InvitationNotifier for LoggingNotifier {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), NotifyError> {
        info!(
            "Invitation for booking {}: {} <{}> from {} to {} ({})",
            invitation.booking_id,
            invitation.name,
            invitation.email,
            invitation.start,
            invitation.end,
            invitation.time_zone
        );
        Ok(())
    }
}

/// Posts invitations to `<base_url>/bookings/send-invitation`.
pub struct HttpInvitationNotifier {
    client: Client,
    base_url: String,
}

impl HttpInvitationNotifier {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &InvitationConfig) -> Result<Self, NotifyError> {
        let client = create_client(config.timeout_secs)
            .map_err(|e| NotifyError::Delivery(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client, config.base_url.clone()))
    }
}

#[async_trait]
impl InvitationNotifier for HttpInvitationNotifier {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), NotifyError> {
        let url = join_url(&self.base_url, "bookings/send-invitation");
        debug!("POST {} for booking {}", url, invitation.booking_id);

        let response = self
            .client
            .post(&url)
            .json(invitation)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            Err(NotifyError::Rejected(format!("{status}: {body}")))
        } else {
            Err(NotifyError::Delivery(format!("{status}: {body}")))
        }
    }
}

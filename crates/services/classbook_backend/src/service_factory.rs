// --- File: crates/services/classbook_backend/src/service_factory.rs ---
//! Builds the booking collaborators from configuration.
//!
//! A configured `[gateway]` selects the REST booking store, otherwise bookings live in
//! memory and the in-memory store refuses creates past `max_spots` per date. A configured `[invitation]` selects HTTP delivery, otherwise invitations are
//! only logged.

use classbook_booking::clock::SystemClock;
use classbook_booking::gateway::memory::InMemorySlotGateway;
use classbook_booking::gateway::HttpSlotGateway;
use classbook_booking::handlers::BookingState;
use classbook_booking::notifier::{HttpInvitationNotifier, LoggingNotifier};
use classbook_booking::BookingSettings;
use classbook_common::services::{BookingAdminGateway, InvitationNotifier, SlotCapacityGateway};
use classbook_common::{config_error, external_service_error, ClassbookError};
use classbook_config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};

pub fn booking_state(config: &AppConfig) -> Result<BookingState, ClassbookError> {
    let settings = BookingSettings::from_config(config).map_err(config_error)?;
    info!(
        "Booking {} spots per day at {} ({}), branches: {}",
        settings.max_spots,
        settings.session_start.format("%H:%M"),
        settings.time_zone.name(),
        settings.branches.names().join(", ")
    );

    let (gateway, admin): (Arc<dyn SlotCapacityGateway>, Arc<dyn BookingAdminGateway>) =
        match &config.gateway {
            Some(gateway_config) => {
                info!("Using booking store at {}", gateway_config.base_url);
                let store = Arc::new(
                    HttpSlotGateway::from_config(gateway_config)
                        .map_err(|e| external_service_error("booking store", e))?,
                );
                (store.clone(), store)
            }
            None => {
                warn!("No [gateway] configured, bookings are kept in memory only");
                let store = Arc::new(InMemorySlotGateway::with_capacity(settings.max_spots));
                (store.clone(), store)
            }
        };

    let notifier: Arc<dyn InvitationNotifier> = match &config.invitation {
        Some(invitation_config) => {
            info!("Sending invitations through {}", invitation_config.base_url);
            Arc::new(
                HttpInvitationNotifier::from_config(invitation_config)
                    .map_err(|e| external_service_error("invitation", e))?,
            )
        }
        None => Arc::new(LoggingNotifier),
    };

    Ok(BookingState {
        settings: Arc::new(settings),
        gateway,
        admin,
        notifier,
        clock: Arc::new(SystemClock),
    })
}

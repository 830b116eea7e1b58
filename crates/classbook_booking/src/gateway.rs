// --- File: crates/classbook_booking/src/gateway.rs ---
//! Booking store clients.
//!
//! [`HttpSlotGateway`] talks to the REST booking store; [`memory::InMemorySlotGateway`]
//! keeps bookings in process and is used when no store is configured and in tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use classbook_common::http::client::{create_client, join_url};
use classbook_common::logging::log_error;
use classbook_common::models::{BookingCount, BookingRecord, CreateBookingRequest, CreatedBooking};
use classbook_common::services::{BookingAdminGateway, GatewayError, SlotCapacityGateway};
use classbook_config::GatewayConfig;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

pub struct HttpSlotGateway {
    client: Client,
    base_url: String,
}

impl HttpSlotGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = create_client(config.timeout_secs)
            .map_err(|e| GatewayError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client, config.base_url.clone()))
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    log_error(&e, "Booking store request failed");
    GatewayError::Unavailable(e.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|e| GatewayError::InvalidResponse(format!("{e}: {body}")))
}

async fn unexpected_status(response: Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        GatewayError::Unavailable(format!("{status}: {body}"))
    } else {
        GatewayError::InvalidResponse(format!("{status}: {body}"))
    }
}

#[async_trait]
impl SlotCapacityGateway for HttpSlotGateway {
    async fn count_by_date(&self, date: NaiveDate) -> Result<u32, GatewayError> {
        let url = self.url(&format!("bookings/count/{}", date.format("%Y-%m-%d")));
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(unexpected_status(response).await);
        }
        let count: BookingCount = read_json(response).await?;
        Ok(count.count)
    }

    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreatedBooking, GatewayError> {
        let url = self.url("bookings");
        debug!("POST {} for {} on {}", url, request.email, request.date);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => read_json(response).await,
            StatusCode::CONFLICT => Err(GatewayError::DuplicateBooking {
                email: request.email.clone(),
                date: request.date,
            }),
            StatusCode::UNPROCESSABLE_ENTITY => Err(GatewayError::DateFull(request.date)),
            _ => Err(unexpected_status(response).await),
        }
    }
}

#[async_trait]
impl BookingAdminGateway for HttpSlotGateway {
    async fn list_bookings(&self) -> Result<Vec<BookingRecord>, GatewayError> {
        let url = self.url("bookings");
        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(unexpected_status(response).await);
        }
        read_json(response).await
    }

    async fn delete_booking(&self, id: &str) -> Result<(), GatewayError> {
        let url = self.url(&format!("bookings/{id}"));
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(id.to_string())),
            _ => Err(unexpected_status(response).await),
        }
    }
}

pub mod memory {
    //! In-process booking store.

    use super::*;
    use classbook_common::models::same_email;
    use std::sync::{Mutex, MutexGuard};
    use uuid::Uuid;

    #[derive(Debug, Default)]
    pub struct InMemorySlotGateway {
        bookings: Mutex<Vec<BookingRecord>>,
        /// When set, the store itself refuses bookings past this many per date.
        capacity: Option<u32>,
    }

    impl InMemorySlotGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// A store that arbitrates capacity on commit.
        pub fn with_capacity(capacity: u32) -> Self {
            Self {
                capacity: Some(capacity),
                ..Self::default()
            }
        }

        fn lock(&self) -> MutexGuard<'_, Vec<BookingRecord>> {
            self.bookings.lock().unwrap_or_else(|e| e.into_inner())
        }

        /// Adds `count` placeholder bookings on `date`.
        pub fn seed(&self, date: NaiveDate, count: u32) {
            let mut bookings = self.lock();
            for n in 0..count {
                bookings.push(BookingRecord {
                    id: Uuid::new_v4().to_string(),
                    date,
                    branch: String::new(),
                    name: format!("Seeded student {n}"),
                    email: format!("seeded-{n}-{date}@example.com"),
                    lesson: String::new(),
                    course: String::new(),
                });
            }
        }

        pub fn bookings(&self) -> Vec<BookingRecord> {
            self.lock().clone()
        }
    }

    #[async_trait]
    impl SlotCapacityGateway for InMemorySlotGateway {
        async fn count_by_date(&self, date: NaiveDate) -> Result<u32, GatewayError> {
            let count = self.lock().iter().filter(|b| b.date == date).count();
            u32::try_from(count).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
        }

        async fn create_booking(
            &self,
            request: &CreateBookingRequest,
        ) -> Result<CreatedBooking, GatewayError> {
            let mut bookings = self.lock();
            if bookings
                .iter()
                .any(|b| b.date == request.date && same_email(&b.email, &request.email))
            {
                return Err(GatewayError::DuplicateBooking {
                    email: request.email.clone(),
                    date: request.date,
                });
            }
            if let Some(capacity) = self.capacity {
                let taken = bookings.iter().filter(|b| b.date == request.date).count();
                if taken >= capacity as usize {
                    return Err(GatewayError::DateFull(request.date));
                }
            }

            let id = Uuid::new_v4().to_string();
            bookings.push(BookingRecord {
                id: id.clone(),
                date: request.date,
                branch: request.branch.clone(),
                name: request.name.clone(),
                email: request.email.clone(),
                lesson: request.lesson.clone(),
                course: request.course.clone(),
            });
            Ok(CreatedBooking { id })
        }
    }

    #[async_trait]
    impl BookingAdminGateway for InMemorySlotGateway {
        async fn list_bookings(&self) -> Result<Vec<BookingRecord>, GatewayError> {
            Ok(self.bookings())
        }

        async fn delete_booking(&self, id: &str) -> Result<(), GatewayError> {
            let mut bookings = self.lock();
            let before = bookings.len();
            bookings.retain(|b| b.id != id);
            if bookings.len() == before {
                return Err(GatewayError::NotFound(id.to_string()));
            }
            Ok(())
        }
    }
}

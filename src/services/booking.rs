//! Оформление брони: проверки до любых побочных эффектов, расчёт цены,
//! ровно один `POST /bookings`, затем перечитывание события с сервера.
//!
//! Занятые места события меняет только сервер. После успешной брони клиент
//! никогда не дописывает места сам, а берёт свежий снимок `GET /events/:id`.

use tracing::{info, warn};

use crate::api_client::{ApiClient, ApiError, ApiEvent, BookingRequest, BookingResponse};
use crate::error::{BookingError, MirrorError};
use crate::mirror::MirrorStore;
use crate::models::seat::{price_of, SeatLayout};
use crate::models::{Booking, BookingAttributes, Event, EventAttributes, SeatCategory, User, UserAttributes};
use crate::services::phone::{PhoneValidator, PlausiblePhone};
use crate::session::Session;

/// Событие, на которое можно забронировать места: снимок из API или из зеркала.
pub trait BookableEvent {
    fn event_id(&self) -> &str;
    fn total_seats(&self) -> u32;
    fn booked_seats(&self) -> Vec<u32>;

    /// Поля события для зеркала, когда свежий снимок с сервера получить не удалось.
    fn snapshot(&self) -> EventAttributes;
}

impl BookableEvent for ApiEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn total_seats(&self) -> u32 {
        self.total_seats.unwrap_or(0)
    }

    fn booked_seats(&self) -> Vec<u32> {
        self.booked_seats.clone().unwrap_or_default()
    }

    fn snapshot(&self) -> EventAttributes {
        self.to_attributes()
    }
}

impl BookableEvent for Event {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn total_seats(&self) -> u32 {
        self.total_seats
    }

    fn booked_seats(&self) -> Vec<u32> {
        Event::booked_seats(self)
    }

    fn snapshot(&self) -> EventAttributes {
        EventAttributes {
            name: Some(self.name.clone()),
            date: Some(self.date.clone()),
            location: self.location.clone(),
            description: self.description.clone(),
            total_seats: Some(self.total_seats),
            booked_seats: Some(Event::booked_seats(self)),
            image_url: self.image_url.clone(),
        }
    }
}

/// Проверенная и посчитанная бронь, готовая к отправке.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBooking {
    pub request: BookingRequest,
    pub total_price: u32,
}

impl PreparedBooking {
    pub fn seat_numbers(&self) -> &[u32] {
        &self.request.seat_numbers
    }

    pub fn seat_categories(&self) -> &[SeatCategory] {
        &self.request.seat_categories
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: Option<String>,
    pub ticket_number: Option<String>,
    pub event_id: String,
    pub seat_numbers: Vec<u32>,
    pub seat_categories: Vec<SeatCategory>,
    pub qr_codes: Vec<String>,
    pub total_price: u32,
    /// Свежий снимок события; `None`, если перечитать его не удалось.
    pub refreshed_event: Option<ApiEvent>,
}

impl BookingConfirmation {
    /// Сумма для платёжного провайдера в минимальных единицах валюты.
    pub fn amount_in_minor_units(&self) -> u64 {
        u64::from(self.total_price) * 100
    }
}

pub struct BookingReconciler<P = PlausiblePhone> {
    api: ApiClient,
    mirror: MirrorStore,
    phone_validator: P,
}

impl BookingReconciler<PlausiblePhone> {
    pub fn new(api: ApiClient, mirror: MirrorStore) -> Self {
        Self::with_phone_validator(api, mirror, PlausiblePhone)
    }
}

impl<P: PhoneValidator> BookingReconciler<P> {
    pub fn with_phone_validator(api: ApiClient, mirror: MirrorStore, phone_validator: P) -> Self {
        Self { api, mirror, phone_validator }
    }

    /// Все проверки и расчёт цены без сетевых вызовов и записи в зеркало.
    ///
    /// Порядок проверок: вход, телефон, выбор мест, границы зала, занятость.
    /// Повторы в выборе схлопываются, остаётся первое вхождение.
    pub fn prepare(
        &self,
        session: Option<&Session>,
        event: &impl BookableEvent,
        selected_seats: &[u32],
        contact_phone: &str,
    ) -> Result<PreparedBooking, BookingError> {
        let session = session.ok_or(BookingError::NotAuthenticated)?;

        let phone = contact_phone.trim();
        if phone.is_empty() || !self.phone_validator.is_valid(phone) {
            return Err(BookingError::MissingContact);
        }

        let mut seats: Vec<u32> = Vec::with_capacity(selected_seats.len());
        for &seat in selected_seats {
            if !seats.contains(&seat) {
                seats.push(seat);
            }
        }
        if seats.is_empty() {
            return Err(BookingError::NoSeatSelected);
        }

        let total_seats = event.total_seats();
        let layout = SeatLayout::new(total_seats);
        if let Some(&seat) = seats.iter().find(|&&seat| !layout.contains(seat)) {
            return Err(BookingError::SeatOutOfRange { seat, total_seats });
        }

        let booked = event.booked_seats();
        let taken: Vec<u32> = seats.iter().copied().filter(|seat| booked.contains(seat)).collect();
        if !taken.is_empty() {
            return Err(BookingError::SeatAlreadyBooked(taken));
        }

        let seat_categories: Vec<SeatCategory> = seats.iter().map(|&seat| layout.category_of(seat)).collect();
        let total_price = seat_categories.iter().map(|&category| price_of(category)).sum();

        Ok(PreparedBooking {
            request: BookingRequest {
                event_id: event.event_id().to_string(),
                user_id: session.user.id.clone(),
                phone: phone.to_string(),
                seat_numbers: seats,
                seat_categories,
                email: session.user.email.clone(),
                name: session.user.name.clone(),
            },
            total_price,
        })
    }

    /// Отправляет бронь. Повторов нет: при любой ошибке сервера решение за пользователем.
    pub async fn submit_booking(
        &self,
        session: Option<&Session>,
        event: &impl BookableEvent,
        selected_seats: &[u32],
        contact_phone: &str,
    ) -> Result<BookingConfirmation, BookingError> {
        let prepared = self.prepare(session, event, selected_seats, contact_phone)?;
        let session = session.ok_or(BookingError::NotAuthenticated)?;

        let response = self
            .api
            .create_booking(&session.credentials, &prepared.request)
            .await
            .map_err(into_booking_error)?;

        // Без явного success=true бронь не состоялась
        if response.success != Some(true) {
            let message = response.message.unwrap_or_else(|| "booking failed".to_string());
            warn!("Booking for event {} rejected: {}", prepared.request.event_id, message);
            return Err(BookingError::Rejected(message));
        }

        info!(
            "Booking confirmed: event={}, seats={:?}, total={}",
            prepared.request.event_id, prepared.request.seat_numbers, prepared.total_price
        );

        let refreshed_event = match self.api.get_event(&prepared.request.event_id).await {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                warn!("Event {} disappeared right after booking", prepared.request.event_id);
                None
            }
            Err(e) => {
                warn!("Failed to refresh event {} after booking: {}", prepared.request.event_id, e);
                None
            }
        };

        // Бронь на сервере уже есть, поэтому сбой зеркала её не отменяет
        if let Err(e) = self.mirror_confirmed(session, event, &prepared, &response, refreshed_event.as_ref()).await {
            warn!("Failed to mirror confirmed booking: {}", e);
        }

        let created = response.booking.unwrap_or_default();
        Ok(BookingConfirmation {
            booking_id: created.id,
            ticket_number: created.ticket_number,
            event_id: prepared.request.event_id,
            seat_numbers: prepared.request.seat_numbers,
            seat_categories: prepared.request.seat_categories,
            qr_codes: created.qr_codes.unwrap_or_default(),
            total_price: prepared.total_price,
            refreshed_event,
        })
    }

    async fn mirror_confirmed(
        &self,
        session: &Session,
        event: &impl BookableEvent,
        prepared: &PreparedBooking,
        response: &BookingResponse,
        refreshed_event: Option<&ApiEvent>,
    ) -> Result<(), MirrorError> {
        let request = &prepared.request;
        // Без свежего снимка пишем то, что видел пользователь: свои места не дописываем
        let event_attributes = match refreshed_event {
            Some(refreshed) => refreshed.to_attributes(),
            None => event.snapshot(),
        };

        let mut batch = self.mirror.begin().await?;
        batch.upsert::<Event>(&request.event_id, &event_attributes).await?;
        batch
            .upsert::<User>(
                &session.user.id,
                &UserAttributes {
                    name: Some(session.user.name.clone()),
                    email: Some(session.user.email.clone()),
                    is_admin: Some(session.user.is_admin),
                },
            )
            .await?;

        if let Some(created) = &response.booking {
            if let Some(booking_id) = &created.id {
                let attributes = BookingAttributes {
                    event_id: Some(request.event_id.clone()),
                    user_id: Some(request.user_id.clone()),
                    ticket_number: created.ticket_number.clone(),
                    status: created.status.clone(),
                    seat_numbers: Some(request.seat_numbers.clone()),
                    seat_categories: Some(request.seat_categories.iter().map(|c| c.to_string()).collect()),
                    qr_codes: created.qr_codes.clone(),
                    ..BookingAttributes::default()
                };
                batch.upsert::<Booking>(booking_id, &attributes).await?;
            }
        }

        batch.commit().await
    }
}

// 4xx и отказ в теле ответа - решение сервера; всё остальное - сеть, можно повторить вручную
fn into_booking_error(err: ApiError) -> BookingError {
    let client_error = err.is_client_error();
    match err {
        ApiError::Status { message, .. } if client_error => BookingError::Rejected(message),
        ApiError::Invalid(e) => BookingError::Rejected(e.to_string()),
        ApiError::Refused(message) => BookingError::Rejected(message),
        other => BookingError::Network(other),
    }
}

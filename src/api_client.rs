//! api_client.rs
//!
//! Клиент удалённого REST API билетной системы.
//!
//! Ключевые компоненты:
//! 1.  **CircuitBreaker**: "Автоматический выключатель". После серии сетевых сбоев или
//!     ответов 5xx перестаёт ходить в сеть и сразу отвечает [`ApiError::CircuitOpen`],
//!     что для UI означает "offline".
//! 2.  **ApiClient**: все вызовы API. Токен передаётся явно в каждый защищённый вызов,
//!     клиент сам его нигде не хранит.
//! 3.  **DTO**: формы запросов и ответов. Сервер отдаёт id то как `id`, то как `_id`.
//!
//! Вход и регистрация тоже здесь: [`ApiClient::login`] отдаёт готовую [`Session`],
//! хранить её между запусками - забота UI-оболочки.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::config::{CircuitBreakerConfig, Config};
use crate::error::ErrorKind;
use crate::models::booking::authoritative;
use crate::models::{BookingAttributes, EventAttributes, SeatCategory, UserAttributes};
use crate::session::{AuthUser, Credentials, Session};

/// Состояния "Автоматического выключателя".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Нормальный режим, запросы разрешены.
    Closed,
    /// Запросы запрещены до истечения таймаута.
    Open,
    /// После таймаута: пробные запросы разрешены, первый же сбой возвращает в Open.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerState>,
    failure_threshold: u32,
    timeout_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout_seconds: u64) -> Self {
        Self {
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
            }),
            failure_threshold: failure_threshold.max(1),
            timeout_duration: Duration::from_secs(timeout_seconds),
        }
    }

    // Состояние простое, отравленный мьютекс не делает его некорректным
    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn can_execute(&self) -> bool {
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let timed_out = inner
                    .opened_at
                    .map_or(true, |opened| opened.elapsed() >= self.timeout_duration);
                if timed_out {
                    inner.state = CircuitState::HalfOpen;
                    info!("Circuit breaker transitioning to HalfOpen state");
                }
                timed_out
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();

        if inner.state == CircuitState::HalfOpen {
            info!("Circuit breaker recovered - transitioning to Closed state");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count += 1;

        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.failure_threshold => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                error!(
                    "Circuit breaker OPENED - {} failures reached threshold {}",
                    inner.failure_count, self.failure_threshold
                );
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!("Circuit breaker test failed - returning to Open state");
            }
            _ => {}
        }
    }

    pub fn get_state(&self) -> CircuitState {
        self.lock().state
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("remote API is temporarily unavailable (circuit breaker open)")]
    CircuitOpen,

    #[error("request to remote API failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("remote API responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response from remote API: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid request: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    /// Сервер ответил 2xx, но в теле отказал (нет токена, `success` не `true`).
    #[error("remote API refused the request: {0}")]
    Refused(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::CircuitOpen | ApiError::Transport(_) | ApiError::Decode(_) => ErrorKind::TransientNetwork,
            ApiError::Status { status: 409, .. } => ErrorKind::Conflict,
            ApiError::Status { status, .. } if *status >= 500 => ErrorKind::TransientNetwork,
            ApiError::Status { .. } | ApiError::Invalid(_) | ApiError::Refused(_) => ErrorKind::Validation,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    /// Сервер ответил отказом (4xx), а не упал.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if (400..500).contains(status))
    }
}

// === Модели данных API ===

/// Событие в том виде, в каком его отдаёт API.
/// Вложенные в бронь события приходят урезанными, поэтому почти всё опционально.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_seats: Option<u32>,
    #[serde(default)]
    pub booked_seats: Option<Vec<u32>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ApiEvent {
    /// `name` сохранён для совместимости, основное поле - `title`.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.title.as_deref())
    }

    pub fn seats_left(&self) -> u32 {
        crate::models::event::seats_left(
            self.total_seats.unwrap_or(0),
            self.booked_seats.as_deref().unwrap_or_default(),
        )
    }

    pub fn is_sold_out(&self) -> bool {
        self.seats_left() == 0
    }

    pub fn to_attributes(&self) -> EventAttributes {
        EventAttributes {
            name: self.display_name().map(str::to_string),
            date: self.date.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            total_seats: self.total_seats,
            booked_seats: self.booked_seats.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl ApiUser {
    pub fn to_attributes(&self) -> UserAttributes {
        UserAttributes {
            name: self.name.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// Строка админского списка всех билетов: бронь вместе с пользователем и событием.
/// `user` и `event` бывают `null`, если их удалили на сервере.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBooking {
    pub booking_id: String,
    #[serde(default)]
    pub ticket_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub seat_numbers: Option<Vec<u32>>,
    #[serde(default)]
    pub seat_categories: Option<Vec<String>>,
    #[serde(default)]
    pub qr_codes: Option<Vec<String>>,
    #[serde(default)]
    pub seat_number: Option<u32>,
    #[serde(default)]
    pub seat_category: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
    // контакты из самой брони, нужны когда user = null
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub event: Option<ApiEvent>,
}

impl AdminBooking {
    pub fn effective_seat_numbers(&self) -> Vec<u32> {
        authoritative(self.seat_numbers.clone().unwrap_or_default(), self.seat_number)
    }

    pub fn effective_seat_categories(&self) -> Vec<String> {
        authoritative(self.seat_categories.clone().unwrap_or_default(), self.seat_category.clone())
    }

    pub fn effective_qr_codes(&self) -> Vec<String> {
        authoritative(self.qr_codes.clone().unwrap_or_default(), self.qr_code.clone())
    }

    pub fn to_attributes(&self, event_id: &str, user_id: &str) -> BookingAttributes {
        BookingAttributes {
            event_id: Some(event_id.to_string()),
            user_id: Some(user_id.to_string()),
            ticket_number: self.ticket_number.clone(),
            status: self.status.clone(),
            seat_number: self.seat_number.map(|seat| seat.to_string()),
            seat_category: self.seat_category.clone(),
            qr_code: self.qr_code.clone(),
            seat_numbers: self.seat_numbers.clone(),
            seat_categories: self.seat_categories.clone(),
            qr_codes: self.qr_codes.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AllTicketsResponse {
    #[serde(default)]
    bookings: Vec<AdminBooking>,
}

/// Событие со своими местами пользователя (страница "Мои билеты").
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBookedEvent {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_seats: u32,
    #[serde(default)]
    pub booked_seats: Vec<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub seat_numbers: Vec<u32>,
    #[serde(default)]
    pub seat_categories: Vec<String>,
    #[serde(default)]
    pub qr_codes: Option<Vec<String>>,
    #[serde(default)]
    pub seat_number: Option<u32>,
    #[serde(default)]
    pub seat_category: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

impl UserBookedEvent {
    pub fn my_seats(&self) -> Vec<u32> {
        authoritative(self.seat_numbers.clone(), self.seat_number)
    }

    pub fn my_categories(&self) -> Vec<String> {
        authoritative(self.seat_categories.clone(), self.seat_category.clone())
    }

    pub fn my_qr_codes(&self) -> Vec<String> {
        authoritative(self.qr_codes.clone().unwrap_or_default(), self.qr_code.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct UserBookedEventsResponse {
    #[serde(default)]
    events: Vec<UserBookedEvent>,
}

/// `GET /events` отдаёт то голый массив, то `{ events: [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventsPayload {
    List(Vec<ApiEvent>),
    Wrapped { events: Vec<ApiEvent> },
}

/// Ответ с одним событием. Отсутствие события сервер иногда сообщает телом
/// `{ "message": "Event not found" }` со статусом 200.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventEnvelope {
    Wrapped { event: ApiEvent },
    Plain(ApiEvent),
    Missing {
        #[allow(dead_code)]
        message: Option<String>,
    },
}

impl EventEnvelope {
    fn into_event(self) -> Option<ApiEvent> {
        match self {
            EventEnvelope::Wrapped { event } | EventEnvelope::Plain(event) => Some(event),
            EventEnvelope::Missing { .. } => None,
        }
    }
}

/// Тело `POST /users/register`.
#[derive(Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Тело `POST /users/login`.
#[derive(Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Пароли в логи не попадают
impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Ответ регистрации: `{ success, message }`. Токен сервер не выдаёт, нужен отдельный вход.
#[derive(Debug, Default, Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

/// Ответ входа: `{ token, user }` при успехе, иначе только `{ message }`.
#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,
    #[validate(length(min = 1))]
    pub date: String,
    #[validate(range(min = 1))]
    pub total_seats: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[validate(length(min = 1))]
    pub location: String,
}

/// Тело `POST /bookings`. Массивы мест и категорий параллельны.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[validate(length(min = 1))]
    pub event_id: String,
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub seat_numbers: Vec<u32>,
    #[validate(length(min = 1))]
    pub seat_categories: Vec<SeatCategory>,
    pub email: String,
    pub name: String,
}

/// Созданная бронь из ответа `POST /bookings`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBooking {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub ticket_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub seat_numbers: Option<Vec<u32>>,
    #[serde(default)]
    pub seat_categories: Option<Vec<String>>,
    #[serde(default)]
    pub qr_codes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookingResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub booking: Option<CreatedBooking>,
}

/// Тело `POST /bookings/validate`: расшифрованный QR или, если расшифровать
/// не удалось, сама картинка data-URL для распознавания на сервере.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketValidationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TicketValidation {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ticket: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Клиент удалённого API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, breaker: &CircuitBreakerConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                breaker.failure_threshold,
                breaker.timeout_seconds,
            )),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_seconds),
            &config.circuit_breaker,
        )
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.get_state()
    }

    fn request(&self, method: Method, path: &str, credentials: Option<&Credentials>) -> RequestBuilder {
        let builder = self.http_client.request(method, format!("{}{}", self.base_url, path));
        match credentials {
            Some(credentials) => builder.bearer_auth(credentials.token()),
            None => builder,
        }
    }

    /// Выполняет запрос через Circuit Breaker. Сбоем считаются ошибки транспорта и 5xx;
    /// ответы 4xx - нормальная работа сервера и возвращаются вызывающему как есть.
    async fn execute_with_circuit_breaker(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking remote API request");
            return Err(ApiError::CircuitOpen);
        }

        match request.send().await {
            Ok(response) if response.status().is_server_error() => {
                self.circuit_breaker.record_failure();
                let err = status_error(response).await;
                error!("Remote API request failed: {}", err);
                Err(err)
            }
            Ok(response) => {
                self.circuit_breaker.record_success();
                Ok(response)
            }
            Err(e) => {
                error!("Remote API request failed: {:?}", e);
                self.circuit_breaker.record_failure();
                Err(ApiError::Transport(e))
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.execute_with_circuit_breaker(request).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        response.json::<T>().await.map_err(ApiError::Decode)
    }

    // === Пользователи ===

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        request.validate()?;
        info!("Registering user {}", request.email);

        let response: RegisterResponse = self
            .send_json(self.request(Method::POST, "/users/register", None).json(request))
            .await?;
        if response.success != Some(true) {
            let message = response.message.unwrap_or_else(|| "registration failed".to_string());
            warn!("Registration of {} refused: {}", request.email, message);
            return Err(ApiError::Refused(message));
        }
        Ok(())
    }

    /// Вход. Без токена и пользователя в ответе вход считается неудавшимся.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        request.validate()?;

        let response: LoginResponse = self
            .send_json(self.request(Method::POST, "/users/login", None).json(request))
            .await?;
        match (response.token, response.user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                info!("Logged in as {} (admin={})", user.id, user.is_admin);
                Ok(Session::new(Credentials::bearer(token), user))
            }
            _ => {
                let message = response.message.unwrap_or_else(|| "login failed".to_string());
                warn!("Login of {} refused: {}", request.email, message);
                Err(ApiError::Refused(message))
            }
        }
    }

    // === События ===

    pub async fn get_events(&self) -> Result<Vec<ApiEvent>, ApiError> {
        debug!("Fetching event list");
        let payload: EventsPayload = self.send_json(self.request(Method::GET, "/events", None)).await?;
        Ok(match payload {
            EventsPayload::List(events) | EventsPayload::Wrapped { events } => events,
        })
    }

    /// Одно событие. `None`, если сервер его не знает.
    pub async fn get_event(&self, event_id: &str) -> Result<Option<ApiEvent>, ApiError> {
        let response = self
            .execute_with_circuit_breaker(self.request(Method::GET, &format!("/events/{}", event_id), None))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Event {} not found on server", event_id);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let envelope: EventEnvelope = response.json().await.map_err(ApiError::Decode)?;
        Ok(envelope.into_event())
    }

    pub async fn create_event(&self, credentials: &Credentials, request: &CreateEventRequest) -> Result<ApiEvent, ApiError> {
        request.validate()?;
        info!("Creating event '{}' with {} seats", request.title, request.total_seats);

        let envelope: EventEnvelope = self
            .send_json(self.request(Method::POST, "/events", Some(credentials)).json(request))
            .await?;
        envelope.into_event().ok_or_else(|| ApiError::Status {
            status: StatusCode::OK.as_u16(),
            message: "event missing from create response".to_string(),
        })
    }

    // === Брони ===

    pub async fn create_booking(&self, credentials: &Credentials, request: &BookingRequest) -> Result<BookingResponse, ApiError> {
        request.validate()?;
        info!(
            "Submitting booking: event={}, seats={:?}",
            request.event_id, request.seat_numbers
        );

        self.send_json(self.request(Method::POST, "/bookings", Some(credentials)).json(request))
            .await
    }

    pub async fn validate_ticket(
        &self,
        credentials: &Credentials,
        request: &TicketValidationRequest,
    ) -> Result<TicketValidation, ApiError> {
        self.send_json(self.request(Method::POST, "/bookings/validate", Some(credentials)).json(request))
            .await
    }

    pub async fn user_booked_events(&self, credentials: &Credentials, user_id: &str) -> Result<Vec<UserBookedEvent>, ApiError> {
        let response: UserBookedEventsResponse = self
            .send_json(self.request(
                Method::GET,
                &format!("/bookings/events-with-seats/user/{}", user_id),
                Some(credentials),
            ))
            .await?;
        Ok(response.events)
    }

    // === Администрирование ===

    pub async fn all_tickets(&self, credentials: &Credentials) -> Result<Vec<AdminBooking>, ApiError> {
        let response: AllTicketsResponse = self
            .send_json(self.request(Method::GET, "/bookings/admin/all-tickets", Some(credentials)))
            .await?;
        info!("Fetched {} tickets from remote API", response.bookings.len());
        Ok(response.bookings)
    }

    pub async fn delete_booking(&self, credentials: &Credentials, booking_id: &str) -> Result<(), ApiError> {
        let response = self
            .execute_with_circuit_breaker(self.request(
                Method::DELETE,
                &format!("/admin/booking/{}", booking_id),
                Some(credentials),
            ))
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        info!("Booking {} deleted on server", booking_id);
        Ok(())
    }
}

/// Ошибка по статусу ответа; текст берётся из `message`/`error` JSON-тела, если он есть.
async fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    ApiError::Status { status: status.as_u16(), message }
}

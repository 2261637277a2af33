//! Таксономия ошибок клиентского ядра.
//!
//! Каждый слой имеет свой `thiserror`-enum, а `kind()` сводит его к одной из
//! категорий [`ErrorKind`], по которой UI решает, что показать пользователю:
//! исправить ввод, выбрать другое место, повторить позже или просто предупредить.

use thiserror::Error;

use crate::api_client::ApiError;

/// Категория ошибки. Ни одна из них не фатальна для процесса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Неверный или неполный ввод, пойман до любых побочных эффектов.
    Validation,
    /// Место уже занято или дубликат. Нужен другой выбор, а не повтор.
    Conflict,
    /// Запрос не дошёл до сервера или истёк таймаут.
    TransientNetwork,
    /// Локальное удаление прошло, удалённое - нет. Состояние дождётся следующей синхронизации.
    PartialSync,
    /// Ошибка локального зеркала.
    Storage,
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("mirror database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("mirror migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("field '{field}' is not mapped to a column of table '{table}'")]
    UnmappedField { table: &'static str, field: String },

    #[error("column '{column}' is not part of table '{table}'")]
    UnknownColumn { table: &'static str, column: &'static str },

    #[error("value of field '{field}' cannot be stored as {codec}")]
    Encode { field: String, codec: &'static str },

    #[error("attributes must serialize to a JSON object")]
    NotAnObject,

    #[error("attribute serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl MirrorError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Storage
    }
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("please log in first")]
    NotAuthenticated,

    #[error("please select at least one seat")]
    NoSeatSelected,

    #[error("seats already booked: {0:?}")]
    SeatAlreadyBooked(Vec<u32>),

    #[error("seat {seat} does not exist in a hall of {total_seats} seats")]
    SeatOutOfRange { seat: u32, total_seats: u32 },

    #[error("please enter a valid phone number")]
    MissingContact,

    #[error("booking rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Network(ApiError),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::NotAuthenticated
            | BookingError::NoSeatSelected
            | BookingError::SeatOutOfRange { .. }
            | BookingError::MissingContact => ErrorKind::Validation,
            BookingError::SeatAlreadyBooked(_) | BookingError::Rejected(_) => ErrorKind::Conflict,
            BookingError::Network(_) => ErrorKind::TransientNetwork,
        }
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("access denied: admin rights required")]
    AccessDenied,

    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::AccessDenied => ErrorKind::Validation,
            AdminError::Mirror(e) => e.kind(),
        }
    }
}

/// Предупреждение: бронь удалена локально, но сервер удаление не подтвердил.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("booking {booking_id} was removed locally but the remote delete failed: {reason}")]
pub struct PartialSyncError {
    pub booking_id: String,
    pub reason: String,
}

impl PartialSyncError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PartialSync
    }
}

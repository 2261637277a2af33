//! Явная таблица соответствий «поле модели ↔ колонка ↔ кодек».
//!
//! Хранилище строит по ней списки SELECT, INSERT/UPDATE и кодирует атрибуты.
//! Имена полей - это camelCase-имена из JSON API (в них сериализуются `*Attributes`).

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::MirrorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Text,
    Integer,
    Bool,
    /// JSON-массив, сохранённый строкой
    JsonArray,
}

impl Codec {
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Text => "text",
            Codec::Integer => "integer",
            Codec::Bool => "bool",
            Codec::JsonArray => "json array",
        }
    }

    pub fn encode(&self, field: &str, value: &Value) -> Result<SqlValue, MirrorError> {
        let encoded = match (self, value) {
            (_, Value::Null) => Some(SqlValue::Null),
            (Codec::Text, Value::String(s)) => Some(SqlValue::Text(s.clone())),
            // номер места в старом однострочном формате приходит числом
            (Codec::Text, Value::Number(n)) => Some(SqlValue::Text(n.to_string())),
            (Codec::Integer, Value::Number(n)) => n.as_i64().map(SqlValue::Integer),
            (Codec::Bool, Value::Bool(b)) => Some(SqlValue::Bool(*b)),
            (Codec::JsonArray, Value::Array(_)) => Some(SqlValue::Text(value.to_string())),
            _ => None,
        };
        encoded.ok_or_else(|| MirrorError::Encode { field: field.to_string(), codec: self.name() })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub field: &'static str,
    pub name: &'static str,
    pub codec: Codec,
}

const fn col(field: &'static str, name: &'static str, codec: Codec) -> Column {
    Column { field, name, codec }
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

pub const ID_COLUMN: &str = "id";
pub const DELETED_AT_COLUMN: &str = "deleted_at";

pub const EVENTS: Table = Table {
    name: "events",
    columns: &[
        col("name", "name", Codec::Text),
        col("date", "date", Codec::Text),
        col("location", "location", Codec::Text),
        col("description", "description", Codec::Text),
        col("totalSeats", "total_seats", Codec::Integer),
        col("bookedSeats", "booked_seats", Codec::JsonArray),
        col("imageUrl", "image_url", Codec::Text),
    ],
};

pub const USERS: Table = Table {
    name: "users",
    columns: &[
        col("name", "name", Codec::Text),
        col("email", "email", Codec::Text),
        col("isAdmin", "is_admin", Codec::Bool),
    ],
};

pub const BOOKINGS: Table = Table {
    name: "bookings",
    columns: &[
        col("eventId", "event_id", Codec::Text),
        col("userId", "user_id", Codec::Text),
        col("ticketNumber", "ticket_number", Codec::Text),
        col("status", "status", Codec::Text),
        col("seatNumber", "seat_number", Codec::Text),
        col("seatCategory", "seat_category", Codec::Text),
        col("qrCode", "qr_code", Codec::Text),
        col("seatNumbers", "seat_numbers", Codec::JsonArray),
        col("seatCategories", "seat_categories", Codec::JsonArray),
        col("qrCodes", "qr_codes", Codec::JsonArray),
    ],
};

impl Table {
    pub fn column_for_field(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == ID_COLUMN || name == DELETED_AT_COLUMN || self.columns.iter().any(|c| c.name == name)
    }

    /// `id, <колонки>, deleted_at` - в порядке таблицы соответствий.
    pub fn select_list(&self) -> String {
        let mut names = Vec::with_capacity(self.columns.len() + 2);
        names.push(ID_COLUMN);
        names.extend(self.columns.iter().map(|c| c.name));
        names.push(DELETED_AT_COLUMN);
        names.join(", ")
    }

    /// Кодирует заданные (не `None`) поля атрибутов в пары «колонка - значение».
    pub fn encode<A: Serialize>(&self, attributes: &A) -> Result<Vec<(&'static str, SqlValue)>, MirrorError> {
        let Value::Object(fields) = serde_json::to_value(attributes)? else {
            return Err(MirrorError::NotAnObject);
        };

        fields
            .iter()
            .map(|(field, value)| {
                let column = self.column_for_field(field).ok_or_else(|| MirrorError::UnmappedField {
                    table: self.name,
                    field: field.clone(),
                })?;
                Ok((column.name, column.codec.encode(field, value)?))
            })
            .collect()
    }
}

/// Ленивое чтение JSON-колонки. Отсутствующее, битое или не того типа значение
/// превращается в пустой список, ошибка наружу не выходит.
pub fn decode_json_array<T: DeserializeOwned>(raw: Option<&str>) -> Vec<T> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw).unwrap_or_default(),
        _ => Vec::new(),
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::mirror::columns::decode_json_array;
use crate::models::seat::SeatCategory;

/// Бронь в зеркале.
///
/// Многоместная форма хранится тремя JSON-колонками и декодируется только при чтении.
/// Старые однострочные поля (`seat_number`, `seat_category`, `qr_code`) остаются для
/// обратной совместимости; если заполнены обе формы, верить нужно массивам.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Booking {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub ticket_number: Option<String>,
    pub status: String,
    pub seat_number: Option<String>,
    pub seat_category: Option<String>,
    pub qr_code: Option<String>,
    #[sqlx(rename = "seat_numbers")]
    seat_numbers_json: Option<String>,
    #[sqlx(rename = "seat_categories")]
    seat_categories_json: Option<String>,
    #[sqlx(rename = "qr_codes")]
    qr_codes_json: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn seat_numbers(&self) -> Vec<u32> {
        decode_json_array(self.seat_numbers_json.as_deref())
    }

    pub fn seat_categories(&self) -> Vec<SeatCategory> {
        decode_json_array(self.seat_categories_json.as_deref())
    }

    pub fn qr_codes(&self) -> Vec<String> {
        decode_json_array(self.qr_codes_json.as_deref())
    }

    /// Места брони: массив, а если он пуст - старое одиночное поле.
    pub fn effective_seat_numbers(&self) -> Vec<u32> {
        authoritative(
            self.seat_numbers(),
            self.seat_number.as_deref().and_then(|s| s.trim().parse().ok()),
        )
    }

    pub fn effective_seat_categories(&self) -> Vec<SeatCategory> {
        authoritative(
            self.seat_categories(),
            self.seat_category.as_deref().and_then(|s| s.parse().ok()),
        )
    }

    pub fn effective_qr_codes(&self) -> Vec<String> {
        authoritative(
            self.qr_codes(),
            self.qr_code.clone().filter(|qr| !qr.is_empty()),
        )
    }
}

/// Массивная форма главнее одиночной.
pub fn authoritative<T>(array: Vec<T>, legacy: Option<T>) -> Vec<T> {
    if array.is_empty() {
        legacy.into_iter().collect()
    } else {
        array
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_numbers: Option<Vec<u32>>,
    // строки, а не SeatCategory: неизвестное значение от сервера не должно ломать синхронизацию
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_codes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(seat_numbers: Option<&str>, seat_number: Option<&str>) -> Booking {
        Booking {
            id: "b1".into(),
            event_id: "e1".into(),
            user_id: "u1".into(),
            ticket_number: None,
            status: "confirmed".into(),
            seat_number: seat_number.map(str::to_string),
            seat_category: Some("premium".into()),
            qr_code: Some("data:image/png;base64,AAA".into()),
            seat_numbers_json: seat_numbers.map(str::to_string),
            seat_categories_json: Some(r#"["diamond","silver"]"#.into()),
            qr_codes_json: Some("{broken".into()),
            deleted_at: None,
        }
    }

    #[test]
    fn array_form_wins_over_legacy() {
        let b = booking(Some("[3,77]"), Some("12"));
        assert_eq!(b.effective_seat_numbers(), vec![3, 77]);
        assert_eq!(
            b.effective_seat_categories(),
            vec![SeatCategory::Diamond, SeatCategory::Silver]
        );
    }

    #[test]
    fn legacy_fields_fill_in_for_missing_arrays() {
        let b = booking(None, Some("12"));
        assert_eq!(b.effective_seat_numbers(), vec![12]);
    }

    #[test]
    fn broken_qr_column_degrades_to_legacy_or_empty() {
        let b = booking(Some("[1]"), None);
        assert!(b.qr_codes().is_empty());
        assert_eq!(b.effective_qr_codes(), vec!["data:image/png;base64,AAA".to_string()]);
    }
}

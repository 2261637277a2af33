use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::mirror::columns::decode_json_array;
use crate::models::seat::SeatLayout;

/// Событие в локальном зеркале.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub total_seats: u32,
    #[sqlx(rename = "booked_seats")]
    booked_seats_json: Option<String>,
    pub image_url: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn booked_seats(&self) -> Vec<u32> {
        decode_json_array(self.booked_seats_json.as_deref())
    }

    pub fn layout(&self) -> SeatLayout {
        SeatLayout::new(self.total_seats)
    }

    pub fn seats_left(&self) -> u32 {
        seats_left(self.total_seats, &self.booked_seats())
    }
}

/// Свободные места: считаются только уникальные номера внутри зала.
pub fn seats_left(total_seats: u32, booked_seats: &[u32]) -> u32 {
    let mut taken: Vec<u32> = booked_seats
        .iter()
        .copied()
        .filter(|seat| (1..=total_seats).contains(seat))
        .collect();
    taken.sort_unstable();
    taken.dedup();
    total_seats.saturating_sub(taken.len() as u32)
}

// Частичное обновление: None означает "поле не пришло, локальное значение не трогать"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seats: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_seats: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_left_ignores_duplicates_and_strays() {
        assert_eq!(seats_left(10, &[1, 1, 2, 11, 0]), 8);
        assert_eq!(seats_left(0, &[1]), 0);
    }
}

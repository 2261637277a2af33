use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// Ценовая категория места. Вычисляется только из позиции места в зале.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatCategory {
    Diamond,
    Premium,
    Silver,
}

// Фиксированная тарифная сетка
pub const DIAMOND_PRICE: u32 = 1000;
pub const PREMIUM_PRICE: u32 = 700;
pub const SILVER_PRICE: u32 = 400;

// Доли зала в процентах: первые 10% - diamond, следующие 30% - premium
const DIAMOND_PERCENT: u32 = 10;
const PREMIUM_PERCENT: u32 = 30;

impl SeatCategory {
    pub const ALL: [SeatCategory; 3] = [SeatCategory::Diamond, SeatCategory::Premium, SeatCategory::Silver];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatCategory::Diamond => "diamond",
            SeatCategory::Premium => "premium",
            SeatCategory::Silver => "silver",
        }
    }
}

impl fmt::Display for SeatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown seat category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for SeatCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diamond" => Ok(SeatCategory::Diamond),
            "premium" => Ok(SeatCategory::Premium),
            "silver" => Ok(SeatCategory::Silver),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Разбиение зала на категории.
///
/// `diamond_end` и `premium_end` - последние номера мест (включительно) своих категорий.
/// Потолок считается в целых числах, поэтому 10% и 30% не страдают от ошибок округления float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatLayout {
    pub total_seats: u32,
    pub diamond_end: u32,
    pub premium_end: u32,
}

impl SeatLayout {
    pub fn new(total_seats: u32) -> Self {
        let diamond_end = ceil_percent(total_seats, DIAMOND_PERCENT);
        let premium_end = diamond_end + ceil_percent(total_seats, PREMIUM_PERCENT);
        Self { total_seats, diamond_end, premium_end }
    }

    pub fn category_of(&self, seat_number: u32) -> SeatCategory {
        if seat_number <= self.diamond_end {
            SeatCategory::Diamond
        } else if seat_number <= self.premium_end {
            SeatCategory::Premium
        } else {
            SeatCategory::Silver
        }
    }

    /// Диапазон мест категории, обрезанный по размеру зала. Пустой диапазон возможен
    /// для маленьких залов (например, у зала из одного места нет premium и silver).
    pub fn range(&self, category: SeatCategory) -> RangeInclusive<u32> {
        let clamp = |n: u32| n.min(self.total_seats);
        match category {
            SeatCategory::Diamond => 1..=clamp(self.diamond_end),
            SeatCategory::Premium => clamp(self.diamond_end) + 1..=clamp(self.premium_end),
            SeatCategory::Silver => clamp(self.premium_end) + 1..=self.total_seats,
        }
    }

    pub fn contains(&self, seat_number: u32) -> bool {
        (1..=self.total_seats).contains(&seat_number)
    }
}

// Произведение считается в u64: total * percent не помещается в u32 для огромных залов.
// При percent <= 100 результат не больше total, так что обратное приведение без потерь.
fn ceil_percent(total: u32, percent: u32) -> u32 {
    (u64::from(total) * u64::from(percent)).div_ceil(100) as u32
}

/// Категория места. Номер вне `1..=total_seats` - нарушение контракта вызывающей стороны.
pub fn category_of(seat_number: u32, total_seats: u32) -> SeatCategory {
    SeatLayout::new(total_seats).category_of(seat_number)
}

pub fn price_of(category: SeatCategory) -> u32 {
    match category {
        SeatCategory::Diamond => DIAMOND_PRICE,
        SeatCategory::Premium => PREMIUM_PRICE,
        SeatCategory::Silver => SILVER_PRICE,
    }
}

/// Суммарная стоимость набора мест одного события.
pub fn total_price(seat_numbers: &[u32], total_seats: u32) -> u32 {
    let layout = SeatLayout::new(total_seats);
    seat_numbers
        .iter()
        .map(|&seat| price_of(layout.category_of(seat)))
        .sum()
}

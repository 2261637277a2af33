/// Проверка контактного телефона перед бронированием.
/// Реальная проверка (например, библиотека номеров) подключается снаружи через этот трейт.
pub trait PhoneValidator: Send + Sync {
    fn is_valid(&self, phone: &str) -> bool;
}

/// Проверка по умолчанию: необязательный `+` в начале, разделители
/// (пробел, `-`, `.`, скобки) игнорируются, цифр от 8 до 15.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlausiblePhone;

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

impl PhoneValidator for PlausiblePhone {
    fn is_valid(&self, phone: &str) -> bool {
        let phone = phone.trim();
        let body = phone.strip_prefix('+').unwrap_or(phone);

        let mut digits = 0;
        for c in body.chars() {
            match c {
                '0'..='9' => digits += 1,
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return false,
            }
        }
        (MIN_DIGITS..=MAX_DIGITS).contains(&digits)
    }
}

impl<F> PhoneValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, phone: &str) -> bool {
        self(phone)
    }
}

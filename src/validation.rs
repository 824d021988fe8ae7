use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::error::{AppError, FieldErrors};
use crate::models::request::is_valid_category;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PRICE: f64 = 100_000.0;
pub const MAX_ATTACHMENTS: usize = 5;

/// Collects field errors so a handler can report every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` unless `ok`. The first error per field wins.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_valid_email(value), field, "Must be a valid email address")
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        self.check(
            (min..=max).contains(&len),
            field,
            &format!("Must be between {min} and {max} characters"),
        )
    }

    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            value.chars().count() >= MIN_PASSWORD_LEN,
            field,
            &format!("Must be at least {MIN_PASSWORD_LEN} characters"),
        )
    }

    pub fn nif(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_valid_nif(value), field, "Must be a valid 9-digit NIF")
    }

    pub fn birth_date(&mut self, field: &str, value: NaiveDate) -> &mut Self {
        self.check(
            value < Utc::now().date_naive(),
            field,
            "Must be in the past",
        )
    }

    pub fn category(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_valid_category(value), field, "Unknown category")
    }

    pub fn categories(&mut self, field: &str, values: &[String]) -> &mut Self {
        self.check(
            values.iter().all(|c| is_valid_category(c)),
            field,
            "Contains an unknown category",
        )
    }

    pub fn price(&mut self, field: &str, value: f64) -> &mut Self {
        self.check(
            value.is_finite() && (0.0..=MAX_PRICE).contains(&value),
            field,
            &format!("Must be between 0 and {MAX_PRICE}"),
        )
    }

    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_valid_url(value), field, "Must be an http(s) or /uploads URL")
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL_RE.is_match(value)
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Portuguese NIF: nine digits, the last being a mod-11 check digit.
pub fn is_valid_nif(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if value.len() != 9 || digits.len() != 9 {
        return false;
    }

    let sum: u32 = digits[..8]
        .iter()
        .enumerate()
        .map(|(i, d)| d * (9 - i as u32))
        .sum();
    let remainder = sum % 11;
    let check = if remainder < 2 { 0 } else { 11 - remainder };

    digits[8] == check
}

pub fn is_valid_url(value: &str) -> bool {
    value.len() <= 2048
        && (value.starts_with("https://")
            || value.starts_with("http://")
            || value.starts_with("/uploads/"))
}

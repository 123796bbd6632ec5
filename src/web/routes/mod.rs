use crate::error::AppError;

pub mod admin;
pub mod auth;
pub mod home;
pub mod registration;
pub mod webhook;

/// Record ids from the URL; anything that is not an integer is an unknown record.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim().parse().map_err(|_| AppError::NotFound)
}

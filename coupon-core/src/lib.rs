//! Coupon issuing core
//!
//! Everything behind the staff form: random ticket tokens, the SQLite-backed
//! coupon table, CSV export, coupon rendering (template + text + QR code) and
//! delivery by email or chat link.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod delivery;
pub mod export;
pub mod form;
pub mod render;
pub mod service;
pub mod store;
pub mod tokens;

pub use config::AppConfig;
pub use form::{check_staff_password, CouponForm, NewCoupon, ValidationError};
pub use service::{CouponService, IssuedCoupon};
pub use store::CouponStore;

/// Discount tiers offered at the counter, in whole currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Discount {
    Five,
    Ten,
    Twenty,
}

impl Discount {
    pub const ALL: [Discount; 3] = [Discount::Five, Discount::Ten, Discount::Twenty];

    pub fn amount(self) -> u32 {
        match self {
            Discount::Five => 5,
            Discount::Ten => 10,
            Discount::Twenty => 20,
        }
    }
}

impl From<Discount> for u32 {
    fn from(discount: Discount) -> Self {
        discount.amount()
    }
}

impl TryFrom<u32> for Discount {
    type Error = CouponError;

    fn try_from(amount: u32) -> Result<Self> {
        match amount {
            5 => Ok(Discount::Five),
            10 => Ok(Discount::Ten),
            20 => Ok(Discount::Twenty),
            other => Err(CouponError::InvalidRecord(format!(
                "unsupported discount amount: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount())
    }
}

/// One issued coupon, exactly as stored in the `coupons` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRecord {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub ticket_number: u32,
    pub unique_id: String,
    pub discount: Discount,
}

/// Error types for coupon operations
#[derive(Debug, thiserror::Error)]
pub enum CouponError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("QR code error: {0}")]
    Qr(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Coupon not issued: {0}")]
    UnknownCoupon(String),
}

impl From<qrcode::types::QrError> for CouponError {
    fn from(err: qrcode::types::QrError) -> Self {
        CouponError::Qr(err.to_string())
    }
}

impl From<lettre::error::Error> for CouponError {
    fn from(err: lettre::error::Error) -> Self {
        CouponError::Delivery(err.to_string())
    }
}

impl From<lettre::address::AddressError> for CouponError {
    fn from(err: lettre::address::AddressError) -> Self {
        CouponError::Delivery(format!("invalid address: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for CouponError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        CouponError::Delivery(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CouponError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_amounts_round_trip() {
        for discount in Discount::ALL {
            assert_eq!(Discount::try_from(discount.amount()).unwrap(), discount);
        }
        assert!(Discount::try_from(15).is_err());
    }

    #[test]
    fn test_discount_serializes_as_integer() {
        let json = serde_json::to_string(&Discount::Twenty).unwrap();
        assert_eq!(json, "20");
        let parsed: Discount = serde_json::from_str("5").unwrap();
        assert_eq!(parsed, Discount::Five);
        assert!(serde_json::from_str::<Discount>("7").is_err());
    }
}

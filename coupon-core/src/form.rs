//! Staff form submission and its validation

use crate::Discount;
use serde::{Deserialize, Serialize};

/// Raw form input as entered by staff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub discount: Discount,
    pub password: String,
}

/// Customer details that passed validation, ready for token generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub discount: Discount,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in all fields. Missing: {0}")]
    MissingField(&'static str),

    #[error("Incorrect password.")]
    IncorrectPassword,
}

/// Gate for every staff action: the entered password must be present and
/// equal the configured one
pub fn check_staff_password(entered: &str, staff_password: &str) -> Result<(), ValidationError> {
    if entered.trim().is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    if entered != staff_password {
        return Err(ValidationError::IncorrectPassword);
    }
    Ok(())
}

impl CouponForm {
    /// Check that every field is filled in and the staff password matches.
    /// Field values are passed through untouched.
    pub fn validate(self, staff_password: &str) -> Result<NewCoupon, ValidationError> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
            ("password", &self.password),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ValidationError::MissingField(*field));
        }

        check_staff_password(&self.password, staff_password)?;

        Ok(NewCoupon {
            name: self.name,
            phone: self.phone,
            email: self.email,
            discount: self.discount,
        })
    }
}

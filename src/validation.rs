//! Field checks run by handlers before anything is written to the database.

use std::sync::LazyLock;

use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_BIO_LEN: usize = 250;
pub const MAX_NAME_LEN: usize = 100;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[^\s@<>()\[\]\\.,;:"]+(\.[^\s@<>()\[\]\\.,;:"]+)*@([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$"#)
        .expect("email pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Returns the trimmed value, or `None` when it is absent or blank.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Trimmed, lower-cased form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email", "Please enter a valid email"))
    }
}

pub fn validate_password(field: &'static str, password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            field,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::new(
            "name",
            format!("Name must not be more than {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), ValidationError> {
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(ValidationError::new(
            "bio",
            format!("Bio must not be more than {MAX_BIO_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::new(
            "price",
            "Price must be a non-negative number",
        ));
    }
    Ok(())
}

pub fn validate_quantity(quantity: i32) -> Result<(), ValidationError> {
    if quantity < 0 {
        return Err(ValidationError::new(
            "quantity",
            "Quantity must not be negative",
        ));
    }
    Ok(())
}

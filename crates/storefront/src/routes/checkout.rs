//! Checkout placeholder.

use crate::error::{AppError, Result};

/// Checkout is not available yet.
pub async fn checkout() -> Result<()> {
    Err(AppError::NotImplemented("checkout".to_string()))
}

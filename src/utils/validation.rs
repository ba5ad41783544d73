use rust_decimal::Decimal;

use crate::error::{Error, Result};

/// Monetary amounts are never negative; zero is allowed for unpriced work.
pub fn ensure_non_negative(field: &str, amount: Option<Decimal>) -> Result<()> {
    match amount {
        Some(value) if value.is_sign_negative() && !value.is_zero() => Err(Error::BadRequest(
            format!("{} must not be negative", field),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(ensure_non_negative("budget", Some(Decimal::new(-1, 0))).is_err());
        assert!(ensure_non_negative("budget", Some(Decimal::ZERO)).is_ok());
        assert!(ensure_non_negative("budget", None).is_ok());
    }
}

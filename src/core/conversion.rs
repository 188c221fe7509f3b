//! Conversion requests, input validation and result arithmetic

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Amount must be a number greater than 0.")]
    InvalidAmount,
    #[error("Please specify the currency to convert from.")]
    MissingFromCurrency,
    #[error("Please specify the currency to convert to.")]
    MissingToCurrency,
    #[error("Please choose a different currency to convert to.")]
    SameCurrency,
}

/// Largest accepted amount. Keeps `amount * rate` finite for any real rate.
pub const MAX_AMOUNT: f64 = 1e15;

/// A validated request to convert `amount` units of `from` into `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

impl ConversionRequest {
    /// Parses raw user input. Currency ids are trimmed and upper-cased.
    pub fn parse(amount: &str, from: &str, to: &str) -> Result<Self, ValidationError> {
        let amount = amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite() && *a > 0.0 && *a <= MAX_AMOUNT)
            .ok_or(ValidationError::InvalidAmount)?;

        let from = from.trim().to_uppercase();
        if from.is_empty() {
            return Err(ValidationError::MissingFromCurrency);
        }
        let to = to.trim().to_uppercase();
        if to.is_empty() {
            return Err(ValidationError::MissingToCurrency);
        }
        if from == to {
            return Err(ValidationError::SameCurrency);
        }

        Ok(Self { amount, from, to })
    }

    pub fn convert(&self, rate: f64) -> f64 {
        round_to_cents(self.amount * rate)
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    let cents = value * 100.0;
    if !cents.is_finite() {
        // Too large to carry cents
        return value;
    }
    cents.round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_request() {
        let req = ConversionRequest::parse(" 12.5 ", "usd", " eur").unwrap();
        assert_eq!(req.amount, 12.5);
        assert_eq!(req.from, "USD");
        assert_eq!(req.to, "EUR");
    }

    #[test]
    fn test_parse_rejects_bad_amounts() {
        for amount in ["", "0", "-3", "abc", "NaN", "inf", "1e308", "1e16"] {
            assert_eq!(
                ConversionRequest::parse(amount, "USD", "EUR"),
                Err(ValidationError::InvalidAmount),
                "amount {amount:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_currencies() {
        assert_eq!(
            ConversionRequest::parse("1", "", "EUR"),
            Err(ValidationError::MissingFromCurrency)
        );
        assert_eq!(
            ConversionRequest::parse("1", "USD", "  "),
            Err(ValidationError::MissingToCurrency)
        );
        assert_eq!(
            ConversionRequest::parse("1", "usd", "USD"),
            Err(ValidationError::SameCurrency)
        );
        assert_eq!(
            ValidationError::SameCurrency.to_string(),
            "Please choose a different currency to convert to."
        );
    }

    #[test]
    fn test_convert_rounds_to_two_decimals() {
        let req = ConversionRequest::parse("3", "USD", "EUR").unwrap();
        assert_eq!(req.convert(0.333333), 1.0);
        assert_eq!(req.convert(1.23456), 3.7);
        assert_eq!(round_to_cents(10.0 * 0.91827), 9.18);
    }

    #[test]
    fn test_large_values_stay_finite() {
        let req = ConversionRequest::parse("1e15", "USD", "VND").unwrap();
        let result = req.convert(25_000.0);
        assert!(result.is_finite());
        assert_eq!(result, 2.5e19);

        assert_eq!(round_to_cents(1e307), 1e307);
        assert_eq!(round_to_cents(f64::MAX), f64::MAX);
    }
}

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::unwrap_used)]
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-\s*)?([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap());

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("no amount in {0:?}")]
    Missing(String),
    #[error("negative amount in {0:?}")]
    Negative(String),
    #[error("malformed amount in {0:?}")]
    Invalid(String),
}

/// Largest amount the `numeric(10, 2)` price column holds.
pub const MAX_PRICE: f64 = 99_999_999.99;
/// Digits kept after the decimal point.
pub const SCALE: usize = 2;

/// Parses the first amount of a fare string such as `"₹ 1,250"`, `"INR 650.50"`
/// or `"Starts from Rs. 1,23,456"`.
///
/// Currency markers and surrounding words are ignored, `,` is treated as a
/// grouping separator wherever it appears inside the digits. Amounts with more
/// than [`SCALE`] fractional digits or above [`MAX_PRICE`] are `Invalid`, so
/// the stored value is always exactly the parsed one.
pub fn parse_price(text: &str) -> Result<f64, PriceError> {
    let Some(cap) = NUMBER.captures(text) else {
        return Err(PriceError::Missing(text.to_owned()));
    };
    if cap.get(1).is_some() {
        return Err(PriceError::Negative(text.to_owned()));
    }

    let digits = cap[2].replace(',', "");
    if digits.split_once('.').is_some_and(|(_, frac)| frac.len() > SCALE) {
        return Err(PriceError::Invalid(text.to_owned()));
    }
    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() && value <= MAX_PRICE => Ok(value),
        _ => Err(PriceError::Invalid(text.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_symbols_and_codes() {
        assert_eq!(parse_price("₹650"), Ok(650.0));
        assert_eq!(parse_price("INR 1,250"), Ok(1250.0));
        assert_eq!(parse_price("Rs. 899.50"), Ok(899.5));
        assert_eq!(parse_price("$ 12"), Ok(12.0));
    }

    #[test]
    fn grouping_separators() {
        assert_eq!(parse_price("1,23,456"), Ok(123_456.0));
        assert_eq!(parse_price("₹ 12,345.75"), Ok(12_345.75));
    }

    #[test]
    fn surrounding_words() {
        assert_eq!(parse_price("Starts from\n  INR 799 onwards"), Ok(799.0));
        assert_eq!(parse_price("Fare - INR 450"), Ok(450.0));
    }

    #[test]
    fn zero_is_allowed() {
        assert_eq!(parse_price("INR 0"), Ok(0.0));
    }

    #[test]
    fn negative_is_rejected() {
        assert!(matches!(parse_price("INR -450"), Err(PriceError::Negative(_))));
        assert!(matches!(parse_price("- 12"), Err(PriceError::Negative(_))));
    }

    #[test]
    fn more_than_two_decimals_is_rejected() {
        assert_eq!(parse_price("INR 899.99"), Ok(899.99));
        assert!(matches!(parse_price("INR 899.999"), Err(PriceError::Invalid(_))));
        assert!(matches!(parse_price("₹ 1,250.505"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn column_range_upper_bound() {
        assert_eq!(parse_price("₹ 9,99,99,999.99"), Ok(MAX_PRICE));
        assert!(matches!(parse_price("₹ 10,00,00,000"), Err(PriceError::Invalid(_))));
        assert!(matches!(parse_price("₹ 1,23,45,67,890"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn missing_digits() {
        assert!(matches!(parse_price("Sold out"), Err(PriceError::Missing(_))));
        assert!(matches!(parse_price(""), Err(PriceError::Missing(_))));
    }
}

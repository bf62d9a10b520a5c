//! Text parsing for prices, totals and the order confirmation.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Leading price token, optionally prefixed with `$`
pub const PRICE_PATTERN: &str = r"\$?(\d+\.?\d*)";
/// Order id inside the confirmation details
pub const ORDER_ID_PATTERN: &str = r"Id:\s*(\d+)";
/// Order amount inside the confirmation details
pub const ORDER_AMOUNT_PATTERN: &str = r"Amount:\s*(\d+)\s*USD";

fn price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PRICE_PATTERN).expect("static pattern compiles"))
}

fn order_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ORDER_ID_PATTERN).expect("static pattern compiles"))
}

fn order_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ORDER_AMOUNT_PATTERN).expect("static pattern compiles"))
}

/// Parse the longest leading decimal number, like JavaScript `parseFloat`.
///
/// Leading whitespace is skipped. Returns `None` when the text does not start
/// with a number.
#[must_use]
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || has_digits {
            has_digits |= frac_end > frac_start;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }
    text[..end].trim_end_matches('.').parse().ok()
}

/// Price shown in a cart cell, 0 when unparsable or negative
#[must_use]
pub fn parse_cell_price(text: &str) -> f64 {
    parse_leading_float(text)
        .filter(|price| price.is_finite() && *price >= 0.0)
        .unwrap_or(0.0)
}

/// First price token in a product price label (`$360 *includes tax`), 0 when absent
#[must_use]
pub fn parse_product_price(text: &str) -> f64 {
    price_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Order id from the confirmation details, empty when absent
#[must_use]
pub fn parse_order_id(text: &str) -> String {
    order_id_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Order amount from the confirmation details, 0 when absent
#[must_use]
pub fn parse_order_amount(text: &str) -> f64 {
    order_amount_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Parsed purchase confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    /// Order id, empty when the details did not contain one
    pub order_id: String,
    /// Charged amount, 0 when the details did not contain one
    pub amount: f64,
}

impl OrderConfirmation {
    /// Parse the confirmation details paragraph
    #[must_use]
    pub fn parse(details: &str) -> Self {
        Self {
            order_id: parse_order_id(details),
            amount: parse_order_amount(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DETAILS: &str = "Id: 7364158\nAmount: 1150 USD\nCard Number: 4111111111111111\nName: Jane Doe\nDate: 18/9/2026";

    mod float_tests {
        use super::*;

        #[test]
        fn test_leading_float_variants() {
            assert_eq!(parse_leading_float("360"), Some(360.0));
            assert_eq!(parse_leading_float("  790.5 USD"), Some(790.5));
            assert_eq!(parse_leading_float("12."), Some(12.0));
            assert_eq!(parse_leading_float(".5"), Some(0.5));
            assert_eq!(parse_leading_float("-3"), Some(-3.0));
            assert_eq!(parse_leading_float("$360"), None);
            assert_eq!(parse_leading_float(""), None);
            assert_eq!(parse_leading_float("."), None);
        }

        #[test]
        fn test_cell_price_defaults_to_zero() {
            assert_eq!(parse_cell_price("n/a"), 0.0);
            assert_eq!(parse_cell_price("820"), 820.0);
        }

        #[test]
        fn test_cell_price_rejects_negative() {
            assert_eq!(parse_cell_price("-5"), 0.0);
            assert_eq!(parse_cell_price(" -790.5 USD"), 0.0);
            assert_eq!(parse_cell_price("+360"), 360.0);
        }
    }

    mod price_tests {
        use super::*;

        #[test]
        fn test_product_price_label() {
            assert_eq!(parse_product_price("$360 *includes tax"), 360.0);
            assert_eq!(parse_product_price("$790.99 *includes tax"), 790.99);
            assert_eq!(parse_product_price("*includes tax"), 0.0);
        }
    }

    mod confirmation_tests {
        use super::*;

        #[test]
        fn test_parse_details() {
            let confirmation = OrderConfirmation::parse(DETAILS);
            assert_eq!(confirmation.order_id, "7364158");
            assert_eq!(confirmation.amount, 1150.0);
        }

        #[test]
        fn test_missing_fields_default() {
            let confirmation = OrderConfirmation::parse("Thank you!");
            assert_eq!(confirmation.order_id, "");
            assert_eq!(confirmation.amount, 0.0);
        }

        #[test]
        fn test_amount_requires_usd_suffix() {
            assert_eq!(parse_order_amount("Amount: 1150 EUR"), 0.0);
        }
    }

    proptest! {
        #[test]
        fn prop_product_price_roundtrips_integers(n in 0u32..1_000_000) {
            let label = format!("${n} *includes tax");
            prop_assert_eq!(parse_product_price(&label), f64::from(n));
        }

        #[test]
        fn prop_product_price_never_negative(s in ".*") {
            prop_assert!(parse_product_price(&s) >= 0.0);
        }

        #[test]
        fn prop_cell_price_never_negative(s in ".*") {
            prop_assert!(parse_cell_price(&s) >= 0.0);
        }

        #[test]
        fn prop_cell_price_matches_integer_prefix(n in 0u32..100_000, suffix in "[ a-zA-Z]*") {
            let cell = format!("{n}{suffix}");
            prop_assert_eq!(parse_cell_price(&cell), f64::from(n));
        }
    }
}

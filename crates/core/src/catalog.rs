//! Catalog field rules for categories and products.
//!
//! These run before anything is persisted; a failing rule means no write
//! happens at all.

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::slug::validate_slug;

/// Maximum length of a category name.
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Prices are stored as `NUMERIC(10, 2)`.
pub const PRICE_MAX_DIGITS: u32 = 10;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Validate a product price: strictly positive, at most two decimal places,
/// and small enough for `NUMERIC(10, 2)`.
pub fn validate_price(price: Decimal) -> Result<(), CoreError> {
    if price <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "Price must be greater than zero.".into(),
        ));
    }
    let normalized = price.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(CoreError::Validation(format!(
            "Price must have no more than {PRICE_DECIMAL_PLACES} decimal places."
        )));
    }
    let integer_digits = normalized.trunc().to_string().trim_start_matches('-').len() as u32;
    if integer_digits > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
        return Err(CoreError::Validation(format!(
            "Price must have no more than {} digits before the decimal point.",
            PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
        )));
    }
    Ok(())
}

/// Render a price with exactly two decimal places (`19.9` -> `"19.90"`).
pub fn format_price(price: Decimal) -> String {
    let mut rounded = price.round_dp(PRICE_DECIMAL_PLACES);
    rounded.rescale(PRICE_DECIMAL_PLACES);
    rounded.to_string()
}

/// Validate a stock quantity (must not be negative).
pub fn validate_stock_quantity(stock_quantity: i32) -> Result<(), CoreError> {
    if stock_quantity < 0 {
        return Err(CoreError::Validation(
            "Stock quantity cannot be negative.".into(),
        ));
    }
    Ok(())
}

/// Validate a required, length-bounded name field.
pub fn validate_name(field: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank.")));
    }
    if trimmed.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max_len} characters."
        )));
    }
    Ok(())
}

/// Product fields as they will be persisted (after merging a partial update).
#[derive(Debug, Clone, Copy)]
pub struct ProductFields<'a> {
    pub name: &'a str,
    pub price: Decimal,
    pub stock_quantity: i32,
}

/// Run every product rule, reporting the first failure.
pub fn validate_product(fields: &ProductFields<'_>) -> Result<(), CoreError> {
    validate_name("Name", fields.name, MAX_PRODUCT_NAME_LEN)?;
    validate_price(fields.price)?;
    validate_stock_quantity(fields.stock_quantity)?;
    Ok(())
}

/// Validate a category's name and (already resolved) slug.
pub fn validate_category(name: &str, slug: &str) -> Result<(), CoreError> {
    validate_name("Name", name, MAX_CATEGORY_NAME_LEN)?;
    validate_slug(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("valid decimal literal")
    }

    #[test]
    fn positive_price_is_accepted() {
        assert!(validate_price(dec("19.99")).is_ok());
        assert!(validate_price(dec("0.01")).is_ok());
        assert!(validate_price(dec("99999999.99")).is_ok());
    }

    #[test]
    fn zero_and_negative_prices_are_rejected() {
        assert_matches!(validate_price(Decimal::ZERO), Err(CoreError::Validation(_)));
        assert_matches!(validate_price(dec("-5")), Err(CoreError::Validation(_)));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        assert!(validate_price(dec("10.500")).is_ok());
        assert_matches!(validate_price(dec("10.505")), Err(CoreError::Validation(_)));
    }

    #[test]
    fn price_overflowing_numeric_10_2_is_rejected() {
        assert_matches!(
            validate_price(dec("100000000")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn prices_render_with_two_places() {
        assert_eq!(format_price(dec("19.9")), "19.90");
        assert_eq!(format_price(dec("5")), "5.00");
        assert_eq!(format_price(dec("10.500")), "10.50");
    }

    #[test]
    fn stock_quantity_bounds() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(12).is_ok());
        assert_matches!(validate_stock_quantity(-1), Err(CoreError::Validation(_)));
    }

    #[test]
    fn blank_product_name_is_rejected() {
        let fields = ProductFields {
            name: "   ",
            price: dec("1"),
            stock_quantity: 1,
        };
        assert_matches!(validate_product(&fields), Err(CoreError::Validation(_)));
    }

    #[test]
    fn category_requires_url_safe_slug() {
        assert!(validate_category("Shoes", "shoes").is_ok());
        assert_matches!(
            validate_category("Shoes", "Shoes & Boots"),
            Err(CoreError::Validation(_))
        );
    }
}

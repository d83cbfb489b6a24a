// Front desk
pub mod guests;
pub mod rooms;

// Inventory and point of sale
pub mod categories;
pub mod products;
pub mod sales;

// Spreadsheet-style exports
pub mod reports;

use crate::errors::ServiceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use validator::ValidationError;

/// Upper bound for any paginated listing
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Rejects page numbers below 1 and page sizes outside `1..=MAX_PAGE_SIZE`
pub(crate) fn validate_pagination(page: u64, limit: u64) -> Result<(), ServiceError> {
    if page == 0 {
        return Err(ServiceError::ValidationError(
            "Page number must be greater than 0".to_string(),
        ));
    }
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ServiceError::ValidationError(format!(
            "Limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

/// Trims a free-text search term, mapping blank input to `None`
pub(crate) fn normalize_search(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Prices and amounts are stored as `DECIMAL(10, 2)`
const AMOUNT_SCALE: u32 = 2;
/// Exclusive upper bound for a price or amount paid (eight integer digits)
pub const MAX_AMOUNT: Decimal = dec!(100000000);
/// Exclusive upper bound for a sale total, stored as `DECIMAL(12, 2)`
pub const MAX_SALE_TOTAL: Decimal = dec!(10000000000);

/// Prices and amounts paid: zero or positive, at most two decimals and
/// below [`MAX_AMOUNT`]
pub(crate) fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    let problem = if value.is_sign_negative() && !value.is_zero() {
        Some(("non_negative", "Amount must not be negative"))
    } else if value.normalize().scale() > AMOUNT_SCALE {
        Some(("scale", "Amount must have at most two decimal places"))
    } else if *value >= MAX_AMOUNT {
        Some(("max_amount", "Amount must be below 100000000"))
    } else {
        None
    };

    match problem {
        Some((code, message)) => {
            let mut err = ValidationError::new(code);
            err.message = Some(message.into());
            Err(err)
        }
        None => Ok(()),
    }
}

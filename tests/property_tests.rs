//! Property-based tests for stock and money arithmetic.
//!
//! These use proptest to check the sale and pagination rules across a wide
//! range of inputs.

use hotel_backoffice::config::AppConfig;
use hotel_backoffice::handlers::common::total_pages;
use hotel_backoffice::services::sales::compute_total;
use proptest::prelude::*;
use rust_decimal::Decimal;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000, 0u32..=2).prop_map(|(units, scale)| Decimal::new(units, scale))
}

/// Mirrors the conditional decrement performed when a sale is recorded
fn apply_sale(stock: i32, quantity: i32) -> Option<i32> {
    (quantity > 0 && stock >= quantity).then(|| stock - quantity)
}

fn test_config() -> AppConfig {
    AppConfig::new(
        "sqlite::memory:".into(),
        "127.0.0.1".into(),
        8080,
        "test".into(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn total_is_linear_in_quantity(quantity in 1i32..10_000, price in price_strategy()) {
        let total = compute_total(quantity, price);
        prop_assert_eq!(total, price * Decimal::from(quantity));
        prop_assert_eq!(compute_total(quantity + 1, price) - total, price);
    }

    #[test]
    fn totals_are_never_negative(quantity in 1i32..10_000, price in price_strategy()) {
        prop_assert!(!compute_total(quantity, price).is_sign_negative() || compute_total(quantity, price).is_zero());
    }

    #[test]
    fn stock_never_goes_below_zero(
        initial in 0i32..1_000,
        sales in prop::collection::vec(1i32..50, 0..40),
    ) {
        let mut stock = initial;
        let mut sold = 0;
        for quantity in sales {
            match apply_sale(stock, quantity) {
                Some(next) => {
                    sold += quantity;
                    stock = next;
                }
                None => prop_assert!(quantity > stock),
            }
            prop_assert!(stock >= 0);
        }
        prop_assert_eq!(stock + sold, initial);
    }
}

proptest! {
    #[test]
    fn page_size_is_always_within_bounds(requested in proptest::option::of(0u64..100_000)) {
        let cfg = test_config();
        let size = cfg.effective_page_size(requested);
        prop_assert!(size >= 1);
        prop_assert!(size <= cfg.max_page_size);
    }

    #[test]
    fn pages_cover_every_item(total in 0u64..100_000, per_page in 1u64..1_000) {
        let pages = total_pages(total, per_page);
        prop_assert!(pages * per_page >= total);
        if total > 0 {
            prop_assert!((pages - 1) * per_page < total);
        } else {
            prop_assert_eq!(pages, 0);
        }
    }
}

//! Order total arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::types::Price;

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Price = Price::new(Decimal::ONE_HUNDRED);

/// Flat shipping fee charged below the threshold.
pub const FLAT_SHIPPING_FEE: Price = Price::new(Decimal::from_parts(13, 0, 0, false, 0));

/// Computed totals for a list of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub shipping_fee: Price,
    pub total: Price,
}

impl OrderTotals {
    /// `subtotal = Σ quantity × price`, then shipping and total from it.
    #[must_use]
    pub fn for_items(items: &[CartItem]) -> Self {
        Self::from_subtotal(items.iter().map(CartItem::line_total).sum())
    }

    /// Shipping is free when `subtotal ≥ 100`, otherwise a flat 13.
    #[must_use]
    pub fn from_subtotal(subtotal: Price) -> Self {
        let shipping_fee = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Price::ZERO
        } else {
            FLAT_SHIPPING_FEE
        };

        Self {
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
        }
    }

    /// Whether shipping was waived.
    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        self.shipping_fee == Price::ZERO
    }

    /// How much more the customer must add to reach free shipping.
    #[must_use]
    pub fn remaining_for_free_shipping(&self) -> Price {
        if self.has_free_shipping() {
            Price::ZERO
        } else {
            Price::new(FREE_SHIPPING_THRESHOLD.amount() - self.subtotal.amount())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::records::CatalogKind;
    use crate::types::ProductId;

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_shipping_threshold_table() {
        let cases = [
            ("0", "13", "13"),
            ("99.99", "13", "112.99"),
            ("100", "0", "100"),
            ("150", "0", "150"),
        ];

        for (subtotal, fee, total) in cases {
            let totals = OrderTotals::from_subtotal(price(subtotal));
            assert_eq!(totals.shipping_fee, price(fee), "fee for {subtotal}");
            assert_eq!(totals.total, price(total), "total for {subtotal}");
            assert_eq!(totals.total, totals.subtotal + totals.shipping_fee);
        }
    }

    #[test]
    fn test_for_items_multiplies_quantities() {
        let line = |id: &str, cents: i64, quantity: u32| CartItem {
            id: ProductId::new(id),
            code: String::new(),
            name: id.to_owned(),
            price: Price::from_cents(cents),
            size: String::new(),
            quantity,
            image: None,
            kind: CatalogKind::Product,
        };

        let totals = OrderTotals::for_items(&[line("a", 2000, 3), line("b", 1999, 2)]);
        assert_eq!(totals.subtotal, price("99.98"));
        assert_eq!(totals.total, price("112.98"));
        assert_eq!(totals.remaining_for_free_shipping(), price("0.02"));
    }

    #[test]
    fn test_empty_cart_still_charges_flat_fee() {
        let totals = OrderTotals::for_items(&[]);
        assert_eq!(totals.subtotal, Price::ZERO);
        assert_eq!(totals.total, FLAT_SHIPPING_FEE);
        assert!(!totals.has_free_shipping());
    }
}

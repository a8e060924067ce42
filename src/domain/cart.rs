//! Cart Aggregate
//!
//! Source of truth for a buyer's pending line items until checkout. The
//! derived total is recomputed on every mutation before the cart is
//! persisted, so a stored cart never carries a stale total.

use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    Active,
    Abandoned,
    Ordered,
}

impl CartStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Abandoned => "abandoned",
            Self::Ordered => "ordered",
        }
    }
}

impl FromStr for CartStatus {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "abandoned" => Ok(Self::Abandoned),
            "ordered" => Ok(Self::Ordered),
            _ => Err(CartError::UnknownStatus),
        }
    }
}

/// A single pending line. `unit_price_cents` is a snapshot taken when the
/// line was first added; it is never re-fetched from the product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

impl CartItem {
    pub fn line_total(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price_cents
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Cart {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub status: CartStatus,
    pub items: Vec<CartItem>,
    pub total_cents: i64,
}

impl Cart {
    /// Carts are created lazily on the first add-to-cart.
    pub fn new(buyer_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            status: CartStatus::Active,
            items: vec![],
            total_cents: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds a line, or increments the quantity of an existing line for the
    /// same product. The price snapshot of an existing line is kept; the
    /// stock check is against current stock only, nothing is reserved.
    pub fn add_item(
        &mut self,
        product_id: Uuid,
        quantity: i32,
        unit_price_cents: i64,
        available_stock: i32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        if quantity > available_stock {
            return Err(CartError::InsufficientStock);
        }

        if let Some(line) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            line.quantity += quantity;
        } else {
            self.items.push(CartItem {
                product_id,
                quantity,
                unit_price_cents,
            });
        }
        self.recalculate();
        Ok(())
    }

    /// Replaces the quantity of an existing line after re-checking stock.
    pub fn update_quantity(
        &mut self,
        product_id: Uuid,
        quantity: i32,
        available_stock: i32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        if quantity > available_stock {
            return Err(CartError::InsufficientStock);
        }
        let line = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CartError::ItemNotFound)?;
        line.quantity = quantity;
        self.recalculate();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(CartError::ItemNotFound);
        }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate();
    }

    /// Checkout leaves the cart empty and marks it `ordered`. The cart row
    /// itself is retained for history.
    pub fn mark_ordered(&mut self) {
        self.items.clear();
        self.status = CartStatus::Ordered;
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.total_cents = self.items.iter().map(CartItem::line_total).sum();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item not found in cart")]
    ItemNotFound,
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Not enough stock")]
    InsufficientStock,
    #[error("Unknown cart status")]
    UnknownStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new(Uuid::new_v4())
    }

    #[test]
    fn total_tracks_every_mutation() {
        let mut cart = cart();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();

        cart.add_item(p1, 2, 1000, 10).unwrap();
        assert_eq!(cart.total_cents, 2000);

        cart.add_item(p2, 1, 550, 10).unwrap();
        assert_eq!(cart.total_cents, 2550);

        cart.update_quantity(p1, 3, 10).unwrap();
        assert_eq!(cart.total_cents, 3550);

        cart.remove_item(p2).unwrap();
        assert_eq!(cart.total_cents, 3000);

        cart.clear();
        assert_eq!(cart.total_cents, 0);
    }

    #[test]
    fn duplicate_add_merges_line_and_keeps_price_snapshot() {
        let mut cart = cart();
        let p1 = Uuid::new_v4();

        cart.add_item(p1, 2, 1000, 10).unwrap();
        // Product price changed between the two adds; the snapshot wins.
        cart.add_item(p1, 1, 1200, 10).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].unit_price_cents, 1000);
        assert_eq!(cart.total_cents, 3000);
    }

    #[test]
    fn quantity_below_one_is_rejected() {
        let mut cart = cart();
        let p1 = Uuid::new_v4();

        assert_eq!(cart.add_item(p1, 0, 1000, 10), Err(CartError::InvalidQuantity));
        cart.add_item(p1, 1, 1000, 10).unwrap();
        assert_eq!(
            cart.update_quantity(p1, 0, 10),
            Err(CartError::InvalidQuantity)
        );
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[test]
    fn add_checks_requested_quantity_against_stock() {
        let mut cart = cart();
        let p1 = Uuid::new_v4();

        assert_eq!(
            cart.add_item(p1, 6, 1000, 5),
            Err(CartError::InsufficientStock)
        );
        assert!(cart.is_empty());
        assert_eq!(cart.total_cents, 0);
    }

    #[test]
    fn update_sets_quantity_after_stock_check() {
        let mut cart = cart();
        let p1 = Uuid::new_v4();
        cart.add_item(p1, 1, 1000, 5).unwrap();

        assert_eq!(
            cart.update_quantity(p1, 6, 5),
            Err(CartError::InsufficientStock)
        );
        assert_eq!(cart.items[0].quantity, 1);

        cart.update_quantity(p1, 4, 5).unwrap();
        assert_eq!(cart.items[0].quantity, 4);
        assert_eq!(cart.total_cents, 4000);
    }

    #[test]
    fn missing_line_is_reported() {
        let mut cart = cart();
        let p1 = Uuid::new_v4();

        assert_eq!(cart.update_quantity(p1, 1, 5), Err(CartError::ItemNotFound));
        assert_eq!(cart.remove_item(p1), Err(CartError::ItemNotFound));
    }

    #[test]
    fn mark_ordered_empties_cart_and_flips_status() {
        let mut cart = cart();
        cart.add_item(Uuid::new_v4(), 2, 1000, 10).unwrap();

        cart.mark_ordered();
        assert!(cart.is_empty());
        assert_eq!(cart.status, CartStatus::Ordered);
        assert_eq!(cart.total_cents, 0);
    }
}

//! Order Aggregate
//!
//! An order is an immutable snapshot taken from a cart at checkout: line
//! prices, the denormalized store id per line, and the charged total are
//! frozen at creation and never recomputed. Later price changes to the
//! underlying products do not touch existing orders.
//!
//! Status moves through an explicit transition table. Stock side effects are
//! edge-triggered: they fire when an order *enters* `shipped` and when it
//! moves from `shipped` into `cancelled`, so they apply exactly once per
//! edge crossing.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::cart::Cart;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// The transition table. Forward moves only, except the single backward
    /// edge `shipped -> cancelled`. `delivered` and `cancelled` are terminal;
    /// self-transitions are not edges.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Processing | Shipped | Cancelled)
                | (Processing, Shipped | Cancelled)
                | (Shipped, Delivered | Cancelled)
        )
    }

    /// Buyer self-cancel window: only before the order ships.
    pub fn buyer_cancel(self) -> Result<OrderStatus, OrderError> {
        match self {
            Self::Pending | Self::Processing => Ok(Self::Cancelled),
            _ => Err(OrderError::CannotCancel),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(OrderError::InvalidStatus),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PaymentMethod {
    #[serde(rename = "COD")]
    Cod,
    CardOnFile,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "COD",
            Self::CardOnFile => "CardOnFile",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(Self::Cod),
            "CardOnFile" => Ok(Self::CardOnFile),
            _ => Err(OrderError::InvalidStatus),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

/// Full address snapshot stored on the order; every field is mandatory.
#[derive(Clone, Debug, Serialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

/// Immutable once created. `store_id` is denormalized from the product so
/// store-scoped order queries need no join through products.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub buyer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
}

/// What checkout needs to know about each referenced product.
#[derive(Clone, Debug)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub store_id: Uuid,
    pub title: String,
    pub stock: i32,
}

impl Order {
    /// The cart-to-order transition. Re-validates stock for every line at
    /// this instant (independently of the add-time check) and aborts as a
    /// whole if any line fails; no partial order exists. `total_cents` is
    /// copied from the cart, not recomputed from the lines.
    ///
    /// Stock is not touched here: commit-at-ship means nothing is reserved
    /// between creation and shipment.
    pub fn checkout(
        buyer_id: Uuid,
        cart: &Cart,
        products: &[ProductSnapshot],
        shipping_address: ShippingAddress,
    ) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(OrderError::ProductNotFound)?;
            if product.stock < line.quantity {
                return Err(OrderError::InsufficientStock {
                    title: product.title.clone(),
                    available: product.stock,
                    requested: line.quantity,
                });
            }
            items.push(OrderItem {
                product_id: line.product_id,
                store_id: product.store_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            order_number: format!("ORD-{:08}", rand::random::<u32>() % 100_000_000),
            buyer_id,
            items,
            total_cents: cart.total_cents,
            shipping_address,
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
        })
    }
}

/// Per-item stock ledger effect of a status edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockEffect {
    /// No ledger movement.
    None,
    /// Entering `shipped`: stock -quantity, sold +quantity.
    Commit,
    /// `shipped -> cancelled`: stock +quantity, sold -quantity.
    Restock,
}

impl StockEffect {
    fn for_edge(from: OrderStatus, to: OrderStatus) -> Self {
        use OrderStatus::*;
        match (from, to) {
            (f, Shipped) if f != Shipped => Self::Commit,
            (Shipped, Cancelled) => Self::Restock,
            _ => Self::None,
        }
    }

    /// `(stock_delta, sold_delta)` for one item, or `None` when the edge
    /// moves no stock.
    pub fn deltas(self, quantity: i32) -> Option<(i32, i32)> {
        match self {
            Self::None => None,
            Self::Commit => Some((-quantity, quantity)),
            Self::Restock => Some((quantity, -quantity)),
        }
    }
}

/// A validated seller/admin status update, ready to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub status: OrderStatus,
    pub stock: StockEffect,
    /// COD settles on delivery: payment flips to `paid`.
    pub settle_cod: bool,
}

impl Transition {
    pub fn plan(
        current: OrderStatus,
        target: OrderStatus,
        payment_method: PaymentMethod,
    ) -> Result<Self, OrderError> {
        // Sellers may not move an order back to `pending`.
        if target == OrderStatus::Pending {
            return Err(OrderError::InvalidStatus);
        }
        if !current.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: target,
            });
        }
        Ok(Self {
            status: target,
            stock: StockEffect::for_edge(current, target),
            settle_cod: target == OrderStatus::Delivered && payment_method == PaymentMethod::Cod,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Product no longer available")]
    ProductNotFound,
    #[error("Not enough stock for '{title}'. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        title: String,
        available: i32,
        requested: i32,
    },
    #[error("Order cannot be canceled once it has been shipped")]
    CannotCancel,
    #[error("Invalid status update")]
    InvalidStatus,
    #[error("Order cannot move from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: Uuid, store_id: Uuid, stock: i32) -> ProductSnapshot {
        ProductSnapshot {
            id,
            store_id,
            title: "Widget".into(),
            stock,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Ada".into(),
            phone: "+2348000000".into(),
            street: "1 Market Rd".into(),
            city: "Lagos".into(),
            country: "NG".into(),
            postal_code: "100001".into(),
        }
    }

    #[test]
    fn checkout_freezes_cart_state_into_the_order() {
        let buyer = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let store = Uuid::new_v4();
        let mut cart = Cart::new(buyer);
        cart.add_item(p1, 2, 1000, 5).unwrap();

        let order = Order::checkout(buyer, &cart, &[snapshot(p1, store, 5)], address()).unwrap();

        assert_eq!(order.total_cents, 2000);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].store_id, store);
        assert_eq!(order.items[0].unit_price_cents, 1000);
        assert_eq!(order.payment_method, PaymentMethod::Cod);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn checkout_rejects_empty_cart() {
        let buyer = Uuid::new_v4();
        let cart = Cart::new(buyer);
        assert_eq!(
            Order::checkout(buyer, &cart, &[], address()).unwrap_err(),
            OrderError::EmptyCart
        );
    }

    #[test]
    fn checkout_aborts_whole_order_when_one_line_lacks_stock() {
        let buyer = Uuid::new_v4();
        let store = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let mut cart = Cart::new(buyer);
        cart.add_item(p1, 2, 1000, 10).unwrap();
        cart.add_item(p2, 4, 500, 10).unwrap();

        // p2 stock dropped to 3 between add and checkout.
        let products = [snapshot(p1, store, 10), snapshot(p2, store, 3)];
        let err = Order::checkout(buyer, &cart, &products, address()).unwrap_err();
        assert_eq!(
            err,
            OrderError::InsufficientStock {
                title: "Widget".into(),
                available: 3,
                requested: 4,
            }
        );
    }

    #[test]
    fn checkout_requires_every_product_to_still_exist() {
        let buyer = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let mut cart = Cart::new(buyer);
        cart.add_item(p1, 1, 1000, 5).unwrap();

        assert_eq!(
            Order::checkout(buyer, &cart, &[], address()).unwrap_err(),
            OrderError::ProductNotFound
        );
    }

    #[test]
    fn transition_table_accepts_forward_edges_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Shipped));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Cancelled));

        assert!(!Processing.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Delivered)); // must pass shipped
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Shipped.can_transition_to(Shipped));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Processing));
    }

    #[test]
    fn shipping_commits_stock_exactly_once() {
        let t = Transition::plan(
            OrderStatus::Processing,
            OrderStatus::Shipped,
            PaymentMethod::Cod,
        )
        .unwrap();
        assert_eq!(t.stock, StockEffect::Commit);
        assert_eq!(t.stock.deltas(2), Some((-2, 2)));

        // A repeat of the same transition is rejected, so the deltas cannot
        // be applied a second time.
        assert_eq!(
            Transition::plan(OrderStatus::Shipped, OrderStatus::Shipped, PaymentMethod::Cod),
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Shipped,
            })
        );
    }

    #[test]
    fn cancelling_a_shipped_order_reverses_the_deltas() {
        let t = Transition::plan(
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
            PaymentMethod::Cod,
        )
        .unwrap();
        assert_eq!(t.stock, StockEffect::Restock);
        assert_eq!(t.stock.deltas(2), Some((2, -2)));
    }

    #[test]
    fn non_shipping_edges_move_no_stock() {
        let t = Transition::plan(
            OrderStatus::Pending,
            OrderStatus::Processing,
            PaymentMethod::Cod,
        )
        .unwrap();
        assert_eq!(t.stock, StockEffect::None);
        assert_eq!(t.stock.deltas(5), None);

        let t = Transition::plan(
            OrderStatus::Processing,
            OrderStatus::Cancelled,
            PaymentMethod::Cod,
        )
        .unwrap();
        assert_eq!(t.stock, StockEffect::None);
    }

    #[test]
    fn cod_settles_on_delivery() {
        let t = Transition::plan(
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            PaymentMethod::Cod,
        )
        .unwrap();
        assert!(t.settle_cod);

        let t = Transition::plan(
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            PaymentMethod::CardOnFile,
        )
        .unwrap();
        assert!(!t.settle_cod);
    }

    #[test]
    fn sellers_cannot_target_pending() {
        assert_eq!(
            Transition::plan(OrderStatus::Processing, OrderStatus::Pending, PaymentMethod::Cod),
            Err(OrderError::InvalidStatus)
        );
    }

    #[test]
    fn buyer_cancel_window_closes_at_shipment() {
        assert_eq!(
            OrderStatus::Pending.buyer_cancel(),
            Ok(OrderStatus::Cancelled)
        );
        assert_eq!(
            OrderStatus::Processing.buyer_cancel(),
            Ok(OrderStatus::Cancelled)
        );
        assert_eq!(OrderStatus::Shipped.buyer_cancel(), Err(OrderError::CannotCancel));
        assert_eq!(
            OrderStatus::Delivered.buyer_cancel(),
            Err(OrderError::CannotCancel)
        );
        assert_eq!(
            OrderStatus::Cancelled.buyer_cancel(),
            Err(OrderError::CannotCancel)
        );
    }

    #[test]
    fn checkout_then_ship_scenario() {
        // cart [{P1, qty 2, price 10.00}], stock(P1) = 5
        let buyer = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let store = Uuid::new_v4();
        let mut cart = Cart::new(buyer);
        cart.add_item(p1, 2, 1000, 5).unwrap();

        let order = Order::checkout(buyer, &cart, &[snapshot(p1, store, 5)], address()).unwrap();
        assert_eq!(order.total_cents, 2000);

        // Checkout reserves nothing; stock only moves at shipment.
        let ship = Transition::plan(order.status, OrderStatus::Shipped, order.payment_method)
            .unwrap();
        assert_eq!(ship.stock.deltas(order.items[0].quantity), Some((-2, 2)));
    }
}

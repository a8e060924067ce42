//! Domain aggregates and the order state machine.

pub mod cart;
pub mod order;

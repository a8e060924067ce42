//! Bazari Marketplace Backend
//!
//! Multi-tenant e-commerce service: buyers keep a cart, checkout turns the
//! cart into an immutable order snapshot, and sellers drive the order
//! through an explicit status workflow whose shipped/cancelled edges move
//! product stock.
//!
//! ## Layout
//! - [`domain`]: pure aggregates (cart, order) and the status transition table
//! - [`db`]: sqlx repositories over Postgres
//! - [`http`]: axum handlers and the response envelope
//! - [`auth`]: gateway-forwarded identity and role gating
//! - [`events`]: best-effort NATS notifications for collaborators

pub mod auth;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod http;
pub mod state;

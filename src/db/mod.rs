//! Persistence layer: sqlx repositories over Postgres.
//!
//! Status columns are plain text; parsing into the domain enums happens at
//! this boundary so handlers only ever see typed states.

pub mod carts;
pub mod orders;
pub mod products;
pub mod profiles;

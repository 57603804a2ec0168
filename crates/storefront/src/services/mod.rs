//! Application services.
//!
//! Services wrap the repositories and external clients behind the operations
//! the routes actually need. Pure pieces (cart resolution, invoice totals,
//! order snapshotting) live as free types/functions so they can be tested
//! without a running store.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod invoice;

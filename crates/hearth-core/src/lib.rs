//! hearth-core library.
//!
//! A household points ledger: users earn points from events, spend them on
//! rewards, and every change is a new immutable [`model::Snapshot`].
//!
//! # Conventions
//!
//! - **State**: operations in [`ops`] borrow a snapshot and return a new one;
//!   views in [`views`] are pure reads.
//! - **Errors**: `thiserror` enums with `code()` / `hint()`; config loading
//!   uses `anyhow::Result`.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod lock;
pub mod migrate;
pub mod model;
pub mod ops;
pub mod store;
pub mod views;

pub use error::ErrorCode;
pub use model::Snapshot;

//! Core types and trait definitions for the rollcall attendance service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; backends implement [`store::RecordStore`],
//! and the server wires the workflow functions to routes.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod blob;
pub mod credentials;
pub mod error;
pub mod memory;
pub mod record;
pub mod report;
pub mod roster;
pub mod selection;
pub mod store;

pub use error::{Error, Result};

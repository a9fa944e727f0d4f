//! Stand-in backend for offline use and tests.
//!
//! `taskboard stub` serves the REST surface from an in-memory store, with a
//! switch that rejects every move so rollback paths can be exercised.

pub mod api;
pub mod server;
pub mod store;

pub use server::{StubServerConfig, build_router, spawn, start_server};
pub use store::{StoreError, StoreHandle, StubStore};

//! Persistence layer: serialized session records and the store abstraction.

pub mod models;
pub mod session_store;
pub mod storage;

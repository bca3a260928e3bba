//! Library crate for trivia-host, exposing modules for binaries and integration tests.

pub mod bank;
pub mod config;
pub mod dao;
pub mod error;
pub mod matcher;
pub mod services;
pub mod state;
pub mod transport;

//! Shared library surface for harbor server utilities and tests.

pub mod api;
pub mod config;
pub mod loops;
pub mod state;

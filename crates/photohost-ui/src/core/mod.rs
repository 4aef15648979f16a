//! Core, DOM-free primitives and helpers for the Web UI.
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod nav;
pub mod notes;
pub mod routes;
pub mod upload;

//! Network services: partial fetches, form actions, and the instrumented upload request.

pub(crate) mod api;
pub(crate) mod upload;

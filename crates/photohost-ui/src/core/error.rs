//! Error types for the DOM-free UI core.

use thiserror::Error;

/// Failure to resolve a dashboard route.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// Route name is not part of the route table.
    #[error("Unknown route: {0}")]
    Unknown(String),
}

/// Reasons a file batch is refused before it reaches the network.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum UploadRejection {
    /// Submit was attempted with an empty selection.
    #[error("❌ Please select at least one file.")]
    NoFiles,
    /// Aggregate size is above the configured ceiling.
    #[error("❌ Total upload size must not exceed {ceiling_mb} MB")]
    TooLarge {
        /// Ceiling in mebibytes, as shown to the user.
        ceiling_mb: u64,
    },
}

/// Invalid widget configuration read from the page.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Variant attribute did not name a known variant.
    #[error("invalid upload variant")]
    InvalidVariant {
        /// Raw attribute value.
        value: String,
    },
    /// Ceiling attribute was not a positive integer.
    #[error("invalid upload ceiling")]
    InvalidCeiling {
        /// Raw attribute value.
        value: String,
    },
}

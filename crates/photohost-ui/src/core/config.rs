//! Widget configuration read from page attributes.
//!
//! # Design
//! - Defaults mirror the server-side limits; attributes only override them.
//! - Parsing is pure so the wasm layer only has to collect raw attribute strings.

use crate::core::error::ConfigError;

/// Ceiling for the simple upload form, in mebibytes.
pub const SIMPLE_CEILING_MB: u64 = 150;
/// Ceiling for the progress-tracked upload form, in mebibytes.
pub const TRACKED_CEILING_MB: u64 = 300;
/// Delay before the UI resets after a user cancellation.
pub const CANCEL_RESET_MS: u32 = 2_000;
/// Delay before the UI resets after a server or network failure.
pub const FAILURE_RESET_MS: u32 = 3_000;
/// Delay between a successful upload and the redirect/reload/resubmit follow-up.
pub const COMPLETE_FOLLOWUP_MS: u32 = 1_500;
/// How long the copy button shows its confirmation label.
pub const COPY_RESET_MS: u32 = 1_200;
/// Media query that starts the dashboard sidebar collapsed.
pub const COLLAPSE_MEDIA_QUERY: &str = "(max-width: 768px)";

/// Upload widget flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadVariant {
    /// Client-side validation, then native form submission.
    Simple,
    /// Instrumented request with progress, speed, and ETA.
    Tracked,
}

impl UploadVariant {
    /// Ceiling the server enforces for this variant.
    #[must_use]
    pub const fn default_ceiling_mb(self) -> u64 {
        match self {
            Self::Simple => SIMPLE_CEILING_MB,
            Self::Tracked => TRACKED_CEILING_MB,
        }
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "tracked" | "progress" => Ok(Self::Tracked),
            _ => Err(ConfigError::InvalidVariant {
                value: raw.to_string(),
            }),
        }
    }
}

/// Resolved upload widget settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    /// Widget flavour.
    pub variant: UploadVariant,
    /// Aggregate size ceiling in mebibytes.
    pub ceiling_mb: u64,
}

impl UploadConfig {
    /// Default settings for a variant.
    #[must_use]
    pub const fn for_variant(variant: UploadVariant) -> Self {
        Self {
            variant,
            ceiling_mb: variant.default_ceiling_mb(),
        }
    }

    /// Build settings from raw page attributes.
    ///
    /// `has_status_panel` decides the variant when no explicit variant attribute is present.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when an attribute is present but malformed.
    pub fn from_attributes(
        variant: Option<&str>,
        ceiling_mb: Option<&str>,
        has_status_panel: bool,
    ) -> Result<Self, ConfigError> {
        let variant = match variant.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => UploadVariant::parse(raw)?,
            None if has_status_panel => UploadVariant::Tracked,
            None => UploadVariant::Simple,
        };
        let mut config = Self::for_variant(variant);
        if let Some(raw) = ceiling_mb.filter(|raw| !raw.trim().is_empty()) {
            config.ceiling_mb = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|mb| *mb > 0)
                .ok_or_else(|| ConfigError::InvalidCeiling {
                    value: raw.to_string(),
                })?;
        }
        Ok(config)
    }

    /// Ceiling in bytes.
    #[must_use]
    pub const fn ceiling_bytes(&self) -> u64 {
        self.ceiling_mb.saturating_mul(1024 * 1024)
    }
}

/// Dashboard shell settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Route named by the shell's `data-initial-route`.
    pub initial_route: Option<String>,
}

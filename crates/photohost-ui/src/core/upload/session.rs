//! Upload widget state machine.
//!
//! # Design
//! - One owned session per mounted widget; the wasm layer renders whatever it returns.
//! - `Idle -> Uploading -> {Completed, Failed, Cancelled}`; the last three settle back to
//!   `Idle` through [`UploadSession::reset`] after the returned delay.
//! - Validation and rejection happen inside `select`/`submit` and never leave `Idle`.
//! - Network callbacks are ignored outside `Uploading`, so late progress ticks after a
//!   cancel cannot revive the UI.
//! - A reset keeps the accepted batch so the user can retry without reselecting.

use crate::core::config::{
    CANCEL_RESET_MS, COMPLETE_FOLLOWUP_MS, FAILURE_RESET_MS, UploadConfig, UploadVariant,
};
use crate::core::error::UploadRejection;
use crate::core::upload::progress::{FileRowState, ProgressSample, estimate_file_rows};
use crate::core::upload::selection::{FileBatch, FileMeta};
use serde_json::Value;

/// Lifecycle phase of the widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadPhase {
    /// Form visible, accepting selections.
    Idle,
    /// Request in flight.
    Uploading,
    /// Server accepted the upload; a follow-up is scheduled.
    Completed,
    /// Server or network failure; a reset is scheduled.
    Failed,
    /// User aborted; a reset is scheduled.
    Cancelled,
}

/// Visual tone of the status banner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerKind {
    /// Neutral progress.
    Info,
    /// Upload accepted.
    Success,
    /// User cancellation.
    Warning,
    /// Failure.
    Danger,
}

impl BannerKind {
    /// Bootstrap alert classes for the banner container.
    #[must_use]
    pub const fn alert_class(self) -> &'static str {
        match self {
            Self::Info => "alert alert-info",
            Self::Success => "alert alert-success",
            Self::Warning => "alert alert-warning",
            Self::Danger => "alert alert-danger",
        }
    }
}

/// Status banner shown above the progress bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusBanner {
    /// Tone.
    pub kind: BannerKind,
    /// Message text.
    pub text: String,
}

/// What the page should show after a selection or drop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionView {
    /// Count and size line; `None` clears it.
    pub summary: Option<String>,
    /// Warning line; `None` clears it.
    pub warning: Option<String>,
    /// Indices of files that get a thumbnail.
    pub previews: Vec<usize>,
    /// Whether the file input value must be cleared.
    pub clear_input: bool,
}

/// How a submit proceeds after validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitAction {
    /// Let the browser submit the form.
    Native,
    /// Start the instrumented request.
    Send,
    /// A previous upload has not settled yet.
    Ignore,
}

/// Step taken once a successful upload has been acknowledged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FollowUp {
    /// Navigate to the server-provided URL.
    Redirect(String),
    /// Reload the current page.
    Reload,
    /// Submit the form natively so the server can render its own response.
    Resubmit,
}

/// Deferred action after the upload settles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settled {
    /// Run a follow-up after `delay_ms`.
    FollowUp {
        /// What to do.
        action: FollowUp,
        /// Delay before acting.
        delay_ms: u32,
    },
    /// Call [`UploadSession::reset`] after `delay_ms`.
    Reset {
        /// Delay before resetting.
        delay_ms: u32,
    },
}

/// Progress snapshot to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressView {
    /// Aggregate progress.
    pub sample: ProgressSample,
    /// Approximate per-file rows.
    pub rows: Vec<FileRowState>,
}

/// Owned state of one upload widget.
#[derive(Clone, Debug)]
pub struct UploadSession {
    config: UploadConfig,
    batch: Option<FileBatch>,
    phase: UploadPhase,
    started_at_ms: u64,
    banner: Option<StatusBanner>,
}

impl UploadSession {
    /// New idle session.
    #[must_use]
    pub const fn new(config: UploadConfig) -> Self {
        Self {
            config,
            batch: None,
            phase: UploadPhase::Idle,
            started_at_ms: 0,
            banner: None,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// Accepted batch, if any.
    #[must_use]
    pub const fn batch(&self) -> Option<&FileBatch> {
        self.batch.as_ref()
    }

    /// Current status banner.
    #[must_use]
    pub const fn banner(&self) -> Option<&StatusBanner> {
        self.banner.as_ref()
    }

    /// Replace the selection with a new set of files.
    pub fn select(&mut self, files: Vec<FileMeta>) -> SelectionView {
        match FileBatch::select(files, self.config.ceiling_mb) {
            Ok(None) => {
                self.batch = None;
                SelectionView::default()
            }
            Ok(Some(batch)) => {
                let view = SelectionView {
                    summary: Some(batch.summary()),
                    warning: None,
                    previews: batch
                        .files()
                        .iter()
                        .enumerate()
                        .filter(|(_, file)| file.is_image())
                        .map(|(i, _)| i)
                        .collect(),
                    clear_input: false,
                };
                self.batch = Some(batch);
                view
            }
            Err(rejection) => {
                self.batch = None;
                SelectionView {
                    warning: Some(rejection.to_string()),
                    clear_input: true,
                    ..SelectionView::default()
                }
            }
        }
    }

    /// Validate and decide how the submit proceeds.
    ///
    /// # Errors
    /// Returns [`UploadRejection::NoFiles`] when nothing is selected, or
    /// [`UploadRejection::TooLarge`] when the batch is above the ceiling.
    pub fn submit(&mut self, now_ms: u64) -> Result<SubmitAction, UploadRejection> {
        if self.phase != UploadPhase::Idle {
            return Ok(SubmitAction::Ignore);
        }
        let batch = self.batch.as_ref().ok_or(UploadRejection::NoFiles)?;
        if batch.total_bytes() > self.config.ceiling_bytes() {
            return Err(UploadRejection::TooLarge {
                ceiling_mb: self.config.ceiling_mb,
            });
        }
        match self.config.variant {
            UploadVariant::Simple => Ok(SubmitAction::Native),
            UploadVariant::Tracked => {
                self.phase = UploadPhase::Uploading;
                self.started_at_ms = now_ms;
                self.banner = Some(StatusBanner {
                    kind: BannerKind::Info,
                    text: "Preparing upload...".to_string(),
                });
                Ok(SubmitAction::Send)
            }
        }
    }

    /// Apply a progress tick. Ignored unless uploading with a known total.
    pub fn progress(&mut self, loaded: u64, total: u64, now_ms: u64) -> Option<ProgressView> {
        if self.phase != UploadPhase::Uploading || total == 0 {
            return None;
        }
        let sample = ProgressSample {
            loaded,
            total,
            elapsed_ms: now_ms.saturating_sub(self.started_at_ms),
        };
        let rows = self.batch.as_ref().map_or_else(Vec::new, |batch| {
            estimate_file_rows(loaded, batch.total_bytes(), batch.len())
        });
        Some(ProgressView { sample, rows })
    }

    /// Apply the server response.
    pub fn complete(&mut self, status: u16, body: &str) -> Option<Settled> {
        if self.phase != UploadPhase::Uploading {
            return None;
        }
        if (200..300).contains(&status) {
            self.settle(
                UploadPhase::Completed,
                BannerKind::Success,
                "Upload complete! Processing files...".to_string(),
            );
            Some(Settled::FollowUp {
                action: classify_reply(body),
                delay_ms: COMPLETE_FOLLOWUP_MS,
            })
        } else {
            self.settle(UploadPhase::Failed, BannerKind::Danger, failure_text(status, body));
            Some(Settled::Reset {
                delay_ms: FAILURE_RESET_MS,
            })
        }
    }

    /// Apply a transport-level failure.
    pub fn network_error(&mut self) -> Option<Settled> {
        if self.phase != UploadPhase::Uploading {
            return None;
        }
        self.settle(
            UploadPhase::Failed,
            BannerKind::Danger,
            "Network error. Please check your connection.".to_string(),
        );
        Some(Settled::Reset {
            delay_ms: FAILURE_RESET_MS,
        })
    }

    /// User cancellation (or the abort event it triggers).
    ///
    /// Returns `None` when nothing is in flight; the caller aborts the request only on `Some`.
    pub fn cancel(&mut self) -> Option<Settled> {
        if self.phase != UploadPhase::Uploading {
            return None;
        }
        self.settle(
            UploadPhase::Cancelled,
            BannerKind::Warning,
            "Upload cancelled".to_string(),
        );
        Some(Settled::Reset {
            delay_ms: CANCEL_RESET_MS,
        })
    }

    /// Return to the pre-upload state, keeping the selection.
    pub fn reset(&mut self) {
        self.phase = UploadPhase::Idle;
        self.started_at_ms = 0;
        self.banner = None;
    }

    fn settle(&mut self, phase: UploadPhase, kind: BannerKind, text: String) {
        self.phase = phase;
        self.banner = Some(StatusBanner { kind, text });
    }
}

/// Decide the follow-up for a 2xx response body.
#[must_use]
pub fn classify_reply(body: &str) -> FollowUp {
    let Ok(reply) = serde_json::from_str::<Value>(body) else {
        return FollowUp::Resubmit;
    };
    match reply
        .get("redirect_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
    {
        Some(url) => FollowUp::Redirect(url.to_string()),
        None if body.contains("<html") => FollowUp::Reload,
        None => FollowUp::Resubmit,
    }
}

fn failure_text(status: u16, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|reply| {
        reply
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    });
    match message {
        Some(message) => format!("Upload failed ({status}). {message}"),
        None => format!("Upload failed ({status}). Please try again."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn file(name: &str, size: u64, mime: &str) -> FileMeta {
        FileMeta {
            name: name.into(),
            size,
            mime: mime.into(),
        }
    }

    fn tracked() -> UploadSession {
        UploadSession::new(UploadConfig::for_variant(UploadVariant::Tracked))
    }

    fn uploading() -> UploadSession {
        let mut session = tracked();
        session.select(vec![file("a.jpg", 100, "image/jpeg"), file("b.txt", 100, "text/plain")]);
        assert_eq!(session.submit(1_000), Ok(SubmitAction::Send));
        session
    }

    #[test]
    fn selection_summary_and_previews() {
        let mut session = tracked();
        let view = session.select(vec![
            file("a.jpg", MIB, "image/jpeg"),
            file("b.txt", MIB, "text/plain"),
            file("c.png", MIB, "image/png"),
        ]);
        assert_eq!(view.summary.as_deref(), Some("3 file(s) — 3.00 MB total"));
        assert_eq!(view.previews, vec![0, 2]);
        assert!(view.warning.is_none());
        assert!(!view.clear_input);
    }

    #[test]
    fn oversized_selection_clears_everything_and_names_the_ceiling() {
        let mut session = tracked();
        session.select(vec![file("a.jpg", MIB, "image/jpeg")]);
        let view = session.select(vec![file("huge.mov", 301 * MIB, "video/quicktime")]);
        assert_eq!(
            view.warning.as_deref(),
            Some("❌ Total upload size must not exceed 300 MB")
        );
        assert!(view.clear_input);
        assert!(view.summary.is_none());
        assert!(view.previews.is_empty());
        assert!(session.batch().is_none());
    }

    #[test]
    fn empty_submit_is_blocked_before_the_network() {
        let mut session = tracked();
        assert_eq!(session.submit(0), Err(UploadRejection::NoFiles));
        assert_eq!(session.phase(), UploadPhase::Idle);
        assert!(session.banner().is_none());
        assert_eq!(
            UploadRejection::NoFiles.to_string(),
            "❌ Please select at least one file."
        );
    }

    #[test]
    fn simple_variant_defers_to_native_submit() {
        let mut session = UploadSession::new(UploadConfig::for_variant(UploadVariant::Simple));
        let view = session.select(vec![file("a", 151 * MIB, "")]);
        assert_eq!(
            view.warning.as_deref(),
            Some("❌ Total upload size must not exceed 150 MB")
        );
        session.select(vec![file("a", 10, "")]);
        assert_eq!(session.submit(0), Ok(SubmitAction::Native));
        assert_eq!(session.phase(), UploadPhase::Idle);
    }

    #[test]
    fn progress_reports_rows_and_elapsed_time() {
        let mut session = uploading();
        let view = session.progress(150, 220, 3_000).unwrap();
        assert_eq!(view.sample.elapsed_ms, 2_000);
        assert_eq!(
            view.rows,
            vec![FileRowState::Completed, FileRowState::Uploading(50)]
        );
        assert!(session.progress(10, 0, 3_000).is_none());
    }

    #[test]
    fn cancel_aborts_then_resets_to_pre_upload_state() {
        let mut session = uploading();
        assert_eq!(
            session.cancel(),
            Some(Settled::Reset {
                delay_ms: CANCEL_RESET_MS
            })
        );
        assert_eq!(session.phase(), UploadPhase::Cancelled);
        assert_eq!(
            session.banner().map(|b| (b.kind, b.text.as_str())),
            Some((BannerKind::Warning, "Upload cancelled"))
        );
        // The abort event that follows is a no-op, as are queued progress ticks.
        assert!(session.cancel().is_none());
        assert!(session.progress(50, 220, 2_000).is_none());
        assert!(session.complete(200, "{}").is_none());

        session.reset();
        assert_eq!(session.phase(), UploadPhase::Idle);
        assert!(session.banner().is_none());
        assert_eq!(session.batch().map(FileBatch::len), Some(2));
        assert_eq!(session.submit(5_000), Ok(SubmitAction::Send));
    }

    #[test]
    fn cancel_when_idle_does_nothing() {
        let mut session = tracked();
        assert!(session.cancel().is_none());
        assert_eq!(session.phase(), UploadPhase::Idle);
    }

    #[test]
    fn submit_while_in_flight_is_ignored() {
        let mut session = uploading();
        assert_eq!(session.submit(2_000), Ok(SubmitAction::Ignore));
    }

    #[test]
    fn success_follow_up_depends_on_reply_shape() {
        let mut session = uploading();
        assert_eq!(
            session.complete(200, r#"{"status":"success","redirect_url":"/s/abc/"}"#),
            Some(Settled::FollowUp {
                action: FollowUp::Redirect("/s/abc/".into()),
                delay_ms: COMPLETE_FOLLOWUP_MS,
            })
        );
        assert_eq!(session.phase(), UploadPhase::Completed);
        assert_eq!(classify_reply(r#""<html>ok</html>""#), FollowUp::Reload);
        assert_eq!(classify_reply(r#"{"status":"success"}"#), FollowUp::Resubmit);
        assert_eq!(classify_reply("<html><body>done</body></html>"), FollowUp::Resubmit);
        assert_eq!(classify_reply(r#"{"redirect_url":""}"#), FollowUp::Resubmit);
    }

    #[test]
    fn server_errors_surface_status_and_message() {
        let mut session = uploading();
        assert_eq!(
            session.complete(
                400,
                r#"{"status":"error","message":"Total upload size must not exceed 300 MB."}"#
            ),
            Some(Settled::Reset {
                delay_ms: FAILURE_RESET_MS
            })
        );
        assert_eq!(
            session.banner().map(|b| b.text.clone()),
            Some("Upload failed (400). Total upload size must not exceed 300 MB.".into())
        );

        let mut session = uploading();
        session.complete(502, "<html>Bad gateway</html>");
        assert_eq!(
            session.banner().map(|b| (b.kind, b.text.clone())),
            Some((BannerKind::Danger, "Upload failed (502). Please try again.".into()))
        );
    }

    #[test]
    fn network_errors_reset_after_the_failure_delay() {
        let mut session = uploading();
        assert_eq!(
            session.network_error(),
            Some(Settled::Reset {
                delay_ms: FAILURE_RESET_MS
            })
        );
        assert_eq!(session.phase(), UploadPhase::Failed);
        assert!(session.network_error().is_none());
    }

    #[test]
    fn alert_classes_match_banner_kinds() {
        assert_eq!(BannerKind::Danger.alert_class(), "alert alert-danger");
        assert_eq!(BannerKind::Info.alert_class(), "alert alert-info");
    }
}

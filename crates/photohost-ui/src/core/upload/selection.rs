//! File batch validation against the upload ceiling.

use crate::core::error::UploadRejection;

const MIB: u64 = 1024 * 1024;

/// Metadata for a selected file; the browser handle stays in the wasm layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMeta {
    /// File name as reported by the browser.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type, possibly empty.
    pub mime: String,
}

impl FileMeta {
    /// Whether a local thumbnail should be rendered.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// An accepted, non-empty selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileBatch {
    files: Vec<FileMeta>,
    total_bytes: u64,
}

impl FileBatch {
    /// Validate a selection against `ceiling_mb`.
    ///
    /// Returns `Ok(None)` for an empty selection.
    ///
    /// # Errors
    /// Returns [`UploadRejection::TooLarge`] when the aggregate size exceeds the ceiling;
    /// the whole batch is refused.
    pub fn select(files: Vec<FileMeta>, ceiling_mb: u64) -> Result<Option<Self>, UploadRejection> {
        if files.is_empty() {
            return Ok(None);
        }
        let total_bytes = files
            .iter()
            .fold(0u64, |acc, file| acc.saturating_add(file.size));
        if total_bytes > ceiling_mb.saturating_mul(MIB) {
            return Err(UploadRejection::TooLarge { ceiling_mb });
        }
        Ok(Some(Self { files, total_bytes }))
    }

    /// Files in selection order.
    #[must_use]
    pub fn files(&self) -> &[FileMeta] {
        &self.files
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false for a constructed batch; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Aggregate size in bytes.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Count and size line shown under the drop zone.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} file(s) — {} MB total",
            self.files.len(),
            mebibytes_2dp(self.total_bytes)
        )
    }
}

fn mebibytes_2dp(bytes: u64) -> String {
    // Rounded to hundredths in integer space.
    let hundredths = (u128::from(bytes) * 100 + u128::from(MIB) / 2) / u128::from(MIB);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64, mime: &str) -> FileMeta {
        FileMeta {
            name: name.into(),
            size,
            mime: mime.into(),
        }
    }

    #[test]
    fn summary_matches_computed_total() {
        let batch = FileBatch::select(
            vec![
                file("a.jpg", 3 * MIB, "image/jpeg"),
                file("b.pdf", MIB / 2, "application/pdf"),
            ],
            150,
        )
        .unwrap()
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.total_bytes(), 3 * MIB + MIB / 2);
        assert_eq!(batch.summary(), "2 file(s) — 3.50 MB total");
    }

    #[test]
    fn batch_at_ceiling_is_accepted_and_above_is_refused() {
        let at = FileBatch::select(vec![file("a", 150 * MIB, "")], 150).unwrap();
        assert!(at.is_some());
        let over = FileBatch::select(
            vec![file("a", 150 * MIB, ""), file("b", 1, "")],
            150,
        );
        assert_eq!(over, Err(UploadRejection::TooLarge { ceiling_mb: 150 }));
    }

    #[test]
    fn empty_selection_is_not_an_error() {
        assert_eq!(FileBatch::select(Vec::new(), 300), Ok(None));
    }

    #[test]
    fn only_image_mimes_get_previews() {
        assert!(file("a", 1, "image/png").is_image());
        assert!(!file("a", 1, "video/mp4").is_image());
        assert!(!file("a", 1, "").is_image());
    }

    #[test]
    fn small_totals_round_to_hundredths() {
        assert_eq!(mebibytes_2dp(0), "0.00");
        assert_eq!(mebibytes_2dp(10_486), "0.01");
        assert_eq!(mebibytes_2dp(MIB * 299 + MIB * 99 / 100), "299.99");
    }
}

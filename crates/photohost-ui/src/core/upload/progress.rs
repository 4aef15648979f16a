//! Progress arithmetic for the tracked upload: percentage, speed, ETA, per-file estimate.

use std::fmt;

/// Human-readable size with binary units and trimmed decimals (`1.5 KB`, `0 Bytes`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    format_scaled(bytes as f64)
}

/// Transfer rate, e.g. `2.5 MB/s`. Fractional rates keep their decimals.
#[must_use]
pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", format_scaled(bytes_per_sec))
}

fn format_scaled(value: f64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if !value.is_finite() || value <= 0.0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut scaled = value;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let fixed = format!("{scaled:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "0" {
        return "0 Bytes".to_string();
    }
    format!("{trimmed} {}", UNITS[unit])
}

/// Estimated time remaining, rounded up to the coarsest sensible unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eta {
    /// No bytes observed yet.
    Calculating,
    /// Under a minute.
    Seconds(u64),
    /// Under an hour.
    Minutes(u64),
    /// An hour or more.
    Hours(u64),
}

impl Eta {
    /// Estimate from remaining bytes and the observed rate.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn estimate(remaining_bytes: u64, bytes_per_sec: f64) -> Self {
        if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
            return Self::Calculating;
        }
        let seconds = remaining_bytes as f64 / bytes_per_sec;
        if seconds < 60.0 {
            Self::Seconds(seconds.ceil() as u64)
        } else if seconds < 3600.0 {
            Self::Minutes((seconds / 60.0).ceil() as u64)
        } else {
            Self::Hours((seconds / 3600.0).ceil() as u64)
        }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calculating => f.write_str("Calculating..."),
            Self::Seconds(n) => write!(f, "{n} seconds"),
            Self::Minutes(n) => write!(f, "{n} minutes"),
            Self::Hours(n) => write!(f, "{n} hours"),
        }
    }
}

/// One progress tick from the upload channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSample {
    /// Bytes sent so far, request overhead included.
    pub loaded: u64,
    /// Total request bytes.
    pub total: u64,
    /// Milliseconds since the upload started.
    pub elapsed_ms: u64,
}

impl ProgressSample {
    /// Whole-percent completion, clamped to 0..=100.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (u128::from(self.loaded.min(self.total)) * 200 + u128::from(self.total))
            / (u128::from(self.total) * 2);
        u8::try_from(pct).unwrap_or(100)
    }

    /// Average rate since start, in bytes per second.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn speed(&self) -> f64 {
        if self.elapsed_ms == 0 {
            0.0
        } else {
            self.loaded as f64 / (self.elapsed_ms as f64 / 1000.0)
        }
    }

    /// Remaining-time estimate at the average rate.
    #[must_use]
    pub fn eta(&self) -> Eta {
        Eta::estimate(self.total.saturating_sub(self.loaded), self.speed())
    }

    /// `<speed> - <eta> remaining`.
    #[must_use]
    pub fn speed_line(&self) -> String {
        format!("{} - {} remaining", format_speed(self.speed()), self.eta())
    }

    /// `<loaded> of <total>`.
    #[must_use]
    pub fn bytes_line(&self) -> String {
        format!("{} of {}", format_bytes(self.loaded), format_bytes(self.total))
    }
}

/// Status of a row in the per-file list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileRowState {
    /// Not reached yet.
    Pending,
    /// Estimated to be in flight, with its estimated percentage.
    Uploading(u8),
    /// Estimated (or confirmed, after success) to be done.
    Completed,
}

/// Estimate per-file rows from the aggregate byte count.
///
/// This is known-approximate: it splits `selected_bytes` evenly across `count` files and
/// compares against request bytes, which include multipart overhead. Rows are a hint,
/// not a per-file boundary.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn estimate_file_rows(loaded: u64, selected_bytes: u64, count: usize) -> Vec<FileRowState> {
    if count == 0 {
        return Vec::new();
    }
    let avg = selected_bytes as f64 / count as f64;
    let (current, pct) = if avg <= 0.0 {
        (count - 1, 100)
    } else {
        let index = ((loaded as f64 / avg).floor() as usize).min(count - 1);
        let within = (loaded as f64 % avg) / avg * 100.0;
        (index, within.round().min(100.0) as u8)
    };
    (0..count)
        .map(|i| match i.cmp(&current) {
            std::cmp::Ordering::Less => FileRowState::Completed,
            std::cmp::Ordering::Equal => FileRowState::Uploading(pct),
            std::cmp::Ordering::Greater => FileRowState::Pending,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_use_binary_units_and_trim_zeros() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024 + 1024 * 1024 / 4), "5.25 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3 GB");
        assert_eq!(format_bytes(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn speed_keeps_fractional_rates() {
        assert_eq!(format_speed(0.0), "0 Bytes/s");
        assert_eq!(format_speed(f64::NAN), "0 Bytes/s");
        assert_eq!(format_speed(512.5), "512.5 Bytes/s");
        assert_eq!(format_speed(0.4), "0.4 Bytes/s");
        assert_eq!(format_speed(0.001), "0 Bytes/s");
        assert_eq!(format_speed(2048.9), "2 KB/s");
        assert_eq!(format_speed(1536.0 * 1024.0), "1.5 MB/s");
    }

    #[test]
    fn eta_picks_units_and_rounds_up() {
        assert_eq!(Eta::estimate(100, 0.0), Eta::Calculating);
        assert_eq!(Eta::estimate(100, 10.0), Eta::Seconds(10));
        assert_eq!(Eta::estimate(601, 10.0), Eta::Minutes(2));
        assert_eq!(Eta::estimate(36_000, 10.0), Eta::Hours(1));
        assert_eq!(Eta::Minutes(2).to_string(), "2 minutes");
        assert_eq!(Eta::Calculating.to_string(), "Calculating...");
    }

    #[test]
    fn sample_lines_describe_progress() {
        let sample = ProgressSample {
            loaded: 1024 * 1024,
            total: 4 * 1024 * 1024,
            elapsed_ms: 2_000,
        };
        assert_eq!(sample.percent(), 25);
        assert_eq!(sample.speed_line(), "512 KB/s - 6 seconds remaining");
        assert_eq!(sample.bytes_line(), "1 MB of 4 MB");
    }

    #[test]
    fn percent_rounds_half_up_and_handles_zero_total() {
        let sample = |loaded, total| ProgressSample {
            loaded,
            total,
            elapsed_ms: 0,
        };
        assert_eq!(sample(1, 200).percent(), 1);
        assert_eq!(sample(1, 201).percent(), 0);
        assert_eq!(sample(5, 0).percent(), 0);
        assert_eq!(sample(9, 3).percent(), 100);
        assert_eq!(sample(0, 10).speed_line(), "0 Bytes/s - Calculating... remaining");
    }

    #[test]
    fn file_rows_split_bytes_evenly() {
        let rows = estimate_file_rows(250, 300, 3);
        assert_eq!(
            rows,
            vec![
                FileRowState::Completed,
                FileRowState::Completed,
                FileRowState::Uploading(50),
            ]
        );
        let start = estimate_file_rows(0, 300, 3);
        assert_eq!(start[0], FileRowState::Uploading(0));
        assert_eq!(start[2], FileRowState::Pending);
    }

    #[test]
    fn file_rows_clamp_past_the_last_file() {
        // Request overhead pushes loaded beyond the selected bytes.
        let rows = estimate_file_rows(350, 300, 3);
        assert_eq!(rows[2], FileRowState::Uploading(50));
        assert!(estimate_file_rows(10, 0, 0).is_empty());
        assert_eq!(estimate_file_rows(10, 0, 2)[1], FileRowState::Uploading(100));
    }
}

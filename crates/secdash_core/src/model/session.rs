//! Session timing snapshot and duration formatting.

use serde::Serialize;

const MS_PER_SECOND: i64 = 1_000;

/// Point-in-time view of one identity's session accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTimeInfo {
    /// Current session start, epoch milliseconds.
    pub session_start: i64,
    /// Stored total plus the running session, milliseconds.
    pub total_time_spent: i64,
    pub formatted_session_duration: String,
    pub formatted_total_time: String,
}

impl SessionTimeInfo {
    /// Zero-duration record returned for empty emails and storage failures.
    pub fn empty(now_ms: i64) -> Self {
        Self {
            session_start: now_ms,
            total_time_spent: 0,
            formatted_session_duration: format_duration(0),
            formatted_total_time: format_duration(0),
        }
    }
}

/// Formats milliseconds using the coarsest non-zero unit pair.
///
/// `Xd Yh Zm`, `Xh Ym`, `Xm Ys` or `Xs`. Negative input formats as `0s`.
pub fn format_duration(ms: i64) -> String {
    let seconds = ms.max(0) / MS_PER_SECOND;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h {}m", hours % 24, minutes % 60)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

//! Display helpers shared by alerts and API responses

use crate::models::PullRequest;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// English weekday name for a 0-based index (0 = Sunday)
pub fn day_name(day: usize) -> &'static str {
    DAY_NAMES.get(day).copied().unwrap_or("")
}

/// Human-readable duration from milliseconds, e.g. "3h 20m" or "2d 4h"
pub fn format_duration(ms: i64) -> String {
    let ms = ms.max(0);
    if ms < 60_000 {
        return format!("{}s", div_round(ms, 1_000));
    }
    if ms < 3_600_000 {
        return format!("{}m", div_round(ms, 60_000));
    }
    if ms < 86_400_000 {
        let hours = ms / 3_600_000;
        let minutes = div_round(ms % 3_600_000, 60_000);
        return if minutes > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}h", hours)
        };
    }
    let days = ms / 86_400_000;
    let hours = div_round(ms % 86_400_000, 3_600_000);
    if hours > 0 {
        format!("{}d {}h", days, hours)
    } else {
        format!("{}d", days)
    }
}

fn div_round(num: i64, den: i64) -> i64 {
    (num + den / 2) / den
}

/// PR size class on total lines changed (additions + deletions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeBucket {
    S,
    M,
    L,
    XL,
}

impl SizeBucket {
    pub const ALL: [SizeBucket; 4] = [SizeBucket::S, SizeBucket::M, SizeBucket::L, SizeBucket::XL];

    pub fn for_lines(lines: i64) -> Self {
        if lines <= 100 {
            SizeBucket::S
        } else if lines <= 300 {
            SizeBucket::M
        } else if lines <= 500 {
            SizeBucket::L
        } else {
            SizeBucket::XL
        }
    }

    pub fn for_pr(pr: &PullRequest) -> Self {
        Self::for_lines(pr.additions as i64 + pr.deletions as i64)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SizeBucket::S => "S (1-100 lines)",
            SizeBucket::M => "M (101-300 lines)",
            SizeBucket::L => "L (301-500 lines)",
            SizeBucket::XL => "XL (500+ lines)",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeBucket::S => "S",
            SizeBucket::M => "M",
            SizeBucket::L => "L",
            SizeBucket::XL => "XL",
        }
    }
}

/// Badge award period for the ISO week containing `date`, e.g. "2024-W07"
pub fn iso_week_period(date: chrono::DateTime<chrono::Utc>) -> String {
    use chrono::Datelike;
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

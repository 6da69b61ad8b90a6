//! Presentation mapping for notification types, log statuses, and timestamps.
//!
//! Every mapping is an exhaustive `match`; a new variant is a compile error
//! here rather than a silent fallback style.

#[cfg(test)]
#[path = "display_test.rs"]
mod display_test;

use chrono::{DateTime, Local, Utc};

use crate::net::types::{NotificationStatus, NotificationType};

/// Badge palette shared by type and status badges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeColor {
    Blue,
    Green,
    Purple,
    Red,
    Yellow,
}

impl BadgeColor {
    /// ANSI SGR foreground code for terminal rendering.
    #[must_use]
    pub fn ansi_code(self) -> u8 {
        match self {
            Self::Red => 31,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Purple => 35,
        }
    }
}

#[must_use]
pub fn status_badge(status: NotificationStatus) -> BadgeColor {
    match status {
        NotificationStatus::Sent => BadgeColor::Green,
        NotificationStatus::Failed => BadgeColor::Red,
        NotificationStatus::Pending => BadgeColor::Blue,
        NotificationStatus::Scheduled => BadgeColor::Yellow,
    }
}

#[must_use]
pub fn type_badge(kind: NotificationType) -> BadgeColor {
    match kind {
        NotificationType::Email => BadgeColor::Blue,
        NotificationType::Sms => BadgeColor::Green,
        NotificationType::Push => BadgeColor::Purple,
    }
}

/// Render `label` upper-cased, colored when `color` is set.
#[must_use]
pub fn badge(label: &str, palette: BadgeColor, color: bool) -> String {
    let label = label.to_uppercase();
    if color { format!("\x1b[{}m{label}\x1b[0m", palette.ansi_code()) } else { label }
}

/// Local-time rendering of a backend timestamp; `-` when absent.
#[must_use]
pub fn format_timestamp(instant: Option<&DateTime<Utc>>) -> String {
    instant.map_or_else(
        || "-".to_owned(),
        |at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

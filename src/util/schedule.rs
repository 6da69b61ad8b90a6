//! Send-now vs. schedule-later request building.
//!
//! Users pick a wall-clock time in their own zone; the backend expects a UTC
//! ISO-8601 instant with millisecond precision (`2024-05-01T08:00:00.000Z`).

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::net::error::ApiError;
use crate::net::types::SendNotificationRequest;

const LOCAL_INPUT_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendMode {
    Immediately,
    /// Local wall-clock time in the user's zone.
    ScheduledAt(NaiveDateTime),
}

/// Build a send request using the system time zone and clock.
///
/// # Errors
///
/// See [`build_send_request_in`].
pub fn build_send_request(notification_id: &str, mode: SendMode) -> Result<SendNotificationRequest, ApiError> {
    build_send_request_in(notification_id, mode, &Local, Utc::now())
}

/// Build a send request resolving scheduled times in `tz` relative to `now`.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for a blank id, a local time that does not
/// exist in `tz`, or a scheduled time that is not after `now`.
pub fn build_send_request_in<Tz: TimeZone>(
    notification_id: &str,
    mode: SendMode,
    tz: &Tz,
    now: DateTime<Utc>,
) -> Result<SendNotificationRequest, ApiError> {
    let notification_id = notification_id.trim();
    if notification_id.is_empty() {
        return Err(ApiError::Validation("notification id is required".to_owned()));
    }
    let scheduled_at = match mode {
        SendMode::Immediately => None,
        SendMode::ScheduledAt(local) => {
            let instant = local_to_utc(local, tz)?;
            if instant <= now {
                return Err(ApiError::Validation("scheduled time must be in the future".to_owned()));
            }
            Some(format_utc_iso(instant))
        }
    };
    Ok(SendNotificationRequest { notification_id: notification_id.to_owned(), scheduled_at })
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier instant.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] when the time falls in a DST gap.
pub fn local_to_utc<Tz: TimeZone>(local: NaiveDateTime, tz: &Tz) -> Result<DateTime<Utc>, ApiError> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|resolved| resolved.with_timezone(&Utc))
        .ok_or_else(|| ApiError::Validation(format!("{local} does not exist in the local time zone")))
}

#[must_use]
pub fn format_utc_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse `YYYY-MM-DDTHH:MM[:SS]` (a space may replace the `T`).
///
/// # Errors
///
/// Returns [`ApiError::Validation`] if no accepted format matches.
pub fn parse_local_datetime(input: &str) -> Result<NaiveDateTime, ApiError> {
    let trimmed = input.trim();
    LOCAL_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ApiError::Validation(format!("invalid date/time `{trimmed}` (expected YYYY-MM-DDTHH:MM)")))
}

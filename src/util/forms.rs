//! Create/edit form validation for notifications.
//!
//! Validation runs before any request is built, so a rejected form never
//! reaches the gateway.

#[cfg(test)]
#[path = "forms_test.rs"]
mod forms_test;

use crate::net::error::ApiError;
use crate::net::types::{CreateNotificationRequest, NotificationType, UpdateNotificationRequest};

pub const NO_RECIPIENTS_MESSAGE: &str = "At least one recipient is required";

/// Split a comma-separated recipient field, trimming entries and dropping empties.
#[must_use]
pub fn parse_recipients(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Raw values of the create form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationForm {
    pub kind: NotificationType,
    pub recipients: String,
    pub subject: String,
    pub message: String,
}

impl Default for NotificationForm {
    fn default() -> Self {
        Self { kind: NotificationType::Email, recipients: String::new(), subject: String::new(), message: String::new() }
    }
}

impl NotificationForm {
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when no recipient remains after parsing.
    pub fn into_create_request(self) -> Result<CreateNotificationRequest, ApiError> {
        let recipients = parse_recipients(&self.recipients);
        if recipients.is_empty() {
            return Err(ApiError::Validation(NO_RECIPIENTS_MESSAGE.to_owned()));
        }
        Ok(CreateNotificationRequest { kind: self.kind, recipients, subject: self.subject, message: self.message })
    }
}

/// Edited fields of an existing notification; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationEdit {
    pub kind: Option<NotificationType>,
    pub recipients: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl NotificationEdit {
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when nothing was edited or the edited
    /// recipient field parses to an empty list.
    pub fn into_update_request(self) -> Result<UpdateNotificationRequest, ApiError> {
        let recipients = match self.recipients {
            Some(raw) => {
                let parsed = parse_recipients(&raw);
                if parsed.is_empty() {
                    return Err(ApiError::Validation(NO_RECIPIENTS_MESSAGE.to_owned()));
                }
                Some(parsed)
            }
            None => None,
        };
        let request =
            UpdateNotificationRequest { kind: self.kind, recipients, subject: self.subject, message: self.message };
        if request.is_empty() {
            return Err(ApiError::Validation("nothing to update".to_owned()));
        }
        Ok(request)
    }
}

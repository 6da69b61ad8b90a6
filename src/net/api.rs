//! Authenticated REST gateway for the notification service.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every backend call goes through [`ApiClient`]. It reads the bearer token
//! from the session store before each request and applies the global
//! session-expiry policy to every response.
//!
//! ERROR HANDLING
//! ==============
//! A 401 from any endpoint clears the session store and fires the
//! auth-expired listeners once, then returns [`ApiError::Unauthorized`].
//! Every other non-success status is returned as [`ApiError::Backend`] with
//! the server's message. Nothing is retried.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, extract_backend_message, status_failed_message};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
use super::types::{
    AuthResponse, CreateNotificationRequest, LoginRequest, Notification, NotificationLog, NotificationStatus,
    SendNotificationRequest, SignupRequest, UpdateNotificationRequest,
};
use crate::config::ClientConfig;
use crate::state::session::SessionStore;

/// Callback fired when the backend rejects the current session.
pub type AuthExpiredHook = Arc<dyn Fn() + Send + Sync>;

const AUTHORIZATION: &str = "authorization";
const CONTENT_TYPE: &str = "content-type";
const ACCEPT: &str = "accept";
const JSON_MIME: &str = "application/json";

fn notification_endpoint(id: &str) -> String {
    format!("/notifications/{}", urlencoding::encode(id))
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    session: Arc<SessionStore>,
    expiry_listeners: Mutex<Vec<AuthExpiredHook>>,
}

impl ApiClient {
    /// `base_url` must already be normalized (no trailing `/`).
    #[must_use]
    pub fn new(transport: impl Transport + 'static, base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self {
            transport: Arc::new(transport),
            base_url: base_url.into(),
            session,
            expiry_listeners: Mutex::new(Vec::new()),
        }
    }

    /// Build a gateway over [`ReqwestTransport`] from typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.timeouts)?;
        Ok(Self::new(transport, config.api_base_url.clone(), session))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Register a listener for the auth-expired event.
    ///
    /// Listeners run after the session store has been cleared, once per 401
    /// response, in registration order.
    pub fn on_auth_expired(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.expiry_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status, or decode failure.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.request(Method::POST, "/auth/login", &[], Some(request)).await
    }

    /// `POST /auth/signup`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status, or decode failure.
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        self.request(Method::POST, "/auth/signup", &[], Some(request)).await
    }

    // =========================================================================
    // NOTIFICATIONS
    // =========================================================================

    /// `GET /notifications`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status, or decode failure.
    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.request(Method::GET, "/notifications", &[], None::<&()>).await
    }

    /// `GET /notifications/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank id, otherwise any gateway error.
    pub async fn get_notification(&self, id: &str) -> Result<Notification, ApiError> {
        let id = require_id(id)?;
        self.request(Method::GET, &notification_endpoint(id), &[], None::<&()>)
            .await
    }

    /// `POST /notifications`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when there are no recipients, otherwise any gateway error.
    pub async fn create_notification(&self, request: &CreateNotificationRequest) -> Result<Notification, ApiError> {
        if request.recipients.is_empty() {
            return Err(ApiError::Validation(crate::util::forms::NO_RECIPIENTS_MESSAGE.to_owned()));
        }
        self.request(Method::POST, "/notifications", &[], Some(request)).await
    }

    /// `PATCH /notifications/{id}` with only the supplied fields.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank id or an explicitly empty
    /// recipient list, otherwise any gateway error.
    pub async fn update_notification(
        &self,
        id: &str,
        request: &UpdateNotificationRequest,
    ) -> Result<Notification, ApiError> {
        let id = require_id(id)?;
        if request.recipients.as_ref().is_some_and(Vec::is_empty) {
            return Err(ApiError::Validation(crate::util::forms::NO_RECIPIENTS_MESSAGE.to_owned()));
        }
        self.request(Method::PATCH, &notification_endpoint(id), &[], Some(request))
            .await
    }

    /// `DELETE /notifications/{id}`. Any 2xx, including an empty 204, is success.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank id, otherwise any gateway error.
    pub async fn delete_notification(&self, id: &str) -> Result<(), ApiError> {
        let id = require_id(id)?;
        self.execute(Method::DELETE, &notification_endpoint(id), &[], None)
            .await?;
        Ok(())
    }

    /// `POST /notifications/send`; immediate when `scheduled_at` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank notification id, otherwise any gateway error.
    pub async fn send_notification(&self, request: &SendNotificationRequest) -> Result<NotificationLog, ApiError> {
        require_id(&request.notification_id)?;
        self.request(Method::POST, "/notifications/send", &[], Some(request))
            .await
    }

    /// `GET /notifications/logs`, optionally filtered by `?status=`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status, or decode failure.
    pub async fn list_logs(&self, status: Option<NotificationStatus>) -> Result<Vec<NotificationLog>, ApiError> {
        let query: Vec<(&str, &str)> = status.map(|s| ("status", s.as_str())).into_iter().collect();
        self.request(Method::GET, "/notifications/logs", &query, None::<&()>)
            .await
    }

    // =========================================================================
    // PIPELINE
    // =========================================================================

    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::Decode(format!("request body encode failed: {e}")))?;
        let response = self.execute(method, path, query, body).await?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<HttpResponse, ApiError> {
        let mut request = HttpRequest::new(method, format!("{}{}", self.base_url, path));
        request.headers.push((ACCEPT.to_owned(), JSON_MIME.to_owned()));
        let token = self.session.token();
        if let Some(token) = &token {
            request.headers.push((AUTHORIZATION.to_owned(), bearer(token)));
        }
        if body.is_some() {
            request.headers.push((CONTENT_TYPE.to_owned(), JSON_MIME.to_owned()));
        }
        request.query = query
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        request.body = body;

        tracing::debug!(method = %request.method, path, authenticated = token.is_some(), "api request");
        let response = self.transport.send(request).await.map_err(|e| {
            tracing::debug!(path, error = %e, "api transport failure");
            ApiError::Transport(e)
        })?;

        if response.status == 401 {
            let message = extract_backend_message(&response.body);
            tracing::warn!(path, "session rejected by backend; forcing logout");
            self.force_logout(token.as_deref());
            return Err(ApiError::Unauthorized { message });
        }
        if !response.is_success() {
            let message =
                extract_backend_message(&response.body).unwrap_or_else(|| status_failed_message(response.status));
            tracing::debug!(path, status = response.status, %message, "api error response");
            return Err(ApiError::Backend { status: response.status, message });
        }
        Ok(response)
    }

    /// Clears the session the rejected request was sent under. A session
    /// saved while the request was in flight is left alone.
    fn force_logout(&self, sent_token: Option<&str>) {
        let current = self.session.token();
        if current.is_some() && current.as_deref() != sent_token {
            tracing::debug!("401 for a superseded session; keeping the current one");
            return;
        }
        if let Err(e) = self.session.clear() {
            tracing::warn!(error = %e, "failed to clear session after 401");
        }
        let listeners: Vec<AuthExpiredHook> = self
            .expiry_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener();
        }
    }
}

fn require_id(id: &str) -> Result<&str, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("notification id is required".to_owned()));
    }
    Ok(trimmed)
}

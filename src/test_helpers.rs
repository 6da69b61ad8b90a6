//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::net::api::ApiClient;
use crate::net::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::net::types::User;
use crate::state::session::SessionStore;
use crate::state::storage::MemoryStorage;

pub const BASE_URL: &str = "http://api.test";

pub fn sample_user() -> User {
    User {
        id: "1".to_owned(),
        email: "a@b.com".to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        designation: "Engineer".to_owned(),
    }
}

pub fn sample_user_json() -> Value {
    json!({
        "id": "1",
        "email": "a@b.com",
        "fname": "Ada",
        "lname": "Lovelace",
        "designation": "Engineer"
    })
}

pub fn notification_json(id: &str) -> Value {
    json!({
        "_id": id,
        "type": "email",
        "recipients": ["a@b.com"],
        "subject": "Subject",
        "message": "Body",
        "userId": "1",
        "createdAt": "2024-05-01T08:00:00.000Z",
        "updatedAt": "2024-05-01T08:00:00.000Z"
    })
}

pub fn log_json(id: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "notificationId": "n1",
        "status": status,
        "createdAt": "2024-05-01T08:00:00.000Z"
    })
}

/// Recording transport that replays queued responses in order.
///
/// When the queue is empty it answers `200 {}`.
#[derive(Default)]
pub struct MockTransport {
    pub requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: &Value) {
        self.push_raw(status, &body.to_string());
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse { status, body: body.to_owned() }));
    }

    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse { status: 200, body: "{}".to_owned() }))
    }
}

/// Gateway over a mock transport and in-memory storage.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub storage: Arc<MemoryStorage>,
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
}

pub fn harness() -> Harness {
    let transport = MockTransport::new();
    let storage = Arc::new(MemoryStorage::new());
    let session = Arc::new(SessionStore::new(storage.clone()));
    let api = Arc::new(ApiClient::new(transport.clone(), BASE_URL, session.clone()));
    Harness { transport, storage, session, api }
}

//! Scripted transport and dialog for the dashboard unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use super::client::{AdminClient, ApiError, Transport};
use super::dialog::Dialog;
use crate::models::{PermissionMatrix, Query, QueryType, User};

type Reply = Result<Value, ApiError>;

/// Answers each `(method, path)` from a queue and records every request.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<(Method, String, Option<Value>)>>,
}

impl FakeTransport {
    pub fn reply(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<(Method, String, Option<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, path, _)| path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.paths().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.clone(), path.to_string(), body));
        self.replies
            .lock()
            .unwrap()
            .get_mut(&(method.clone(), path.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ApiError::status(404, format!("unscripted {} {}", method, path))))
    }
}

pub fn client() -> AdminClient<FakeTransport> {
    AdminClient::new(FakeTransport::default())
}

/// Fixed confirm and prompt answers; alerts are recorded.
pub struct ScriptedDialog {
    pub confirm: bool,
    pub answer: Option<String>,
    pub alerts: Mutex<Vec<String>>,
}

impl ScriptedDialog {
    pub fn new(confirm: bool, answer: Option<&str>) -> Self {
        Self {
            confirm,
            answer: answer.map(str::to_string),
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialog for ScriptedDialog {
    async fn confirm(&self, _message: &str) -> bool {
        self.confirm
    }

    async fn prompt(&self, _message: &str) -> Option<String> {
        self.answer.clone()
    }

    async fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

pub fn user(id: i64, username: &str, permissions: PermissionMatrix) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{}@drones.in", username),
        permissions,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

pub fn user_json(id: i64, username: &str, permissions: &PermissionMatrix) -> Value {
    serde_json::to_value(user(id, username, permissions.clone())).unwrap()
}

pub fn error(status: u16, message: &str) -> Reply {
    Err(ApiError::status(status, message))
}

pub fn message(text: &str) -> Reply {
    Ok(json!({ "message": text }))
}

pub fn query_json(id: &str, status: &str) -> Value {
    serde_json::to_value(Query {
        id: id.to_string(),
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        query_type: QueryType::ServiceFirst,
        status: status.to_string(),
        data: Default::default(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    })
    .unwrap()
}

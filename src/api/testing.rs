//! In-memory transports for unit tests.
use super::transport::{HttpRequest, HttpResponse, Method, Transport};
use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

/// Replays a fixed list of responses and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, status: u16, body: &str) -> Self {
        self.responses.borrow_mut().push_back(HttpResponse {
            status,
            set_cookie: None,
            body: body.to_string(),
        });
        self
    }

    pub fn with_json(self, status: u16, body: Value) -> Self {
        self.with_response(status, &body.to_string())
    }

    pub fn with_cookie_response(self, status: u16, cookie: &str) -> Self {
        self.responses.borrow_mut().push_back(HttpResponse {
            status,
            set_cookie: Some(cookie.to_string()),
            body: String::new(),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted response for {} {}", request.method, request.url))
    }
}

/// A stateful stand-in for the Turbonomic API.
///
/// Resources live in per-collection maps keyed by uuid. Deletes answer 200 or
/// 404 from that state unless a status was queued with `fail_deletes`.
#[derive(Default)]
pub struct FakeTurbonomic {
    collections: RefCell<BTreeMap<String, BTreeMap<String, Value>>>,
    workflows: RefCell<Vec<Value>>,
    delete_statuses: RefCell<VecDeque<u16>>,
    next_id: Cell<u32>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl FakeTurbonomic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(self, uuid: &str, group_type: &str) -> Self {
        self.insert(
            "groups",
            uuid,
            json!({"uuid": uuid, "displayName": uuid, "groupType": group_type}),
        );
        self
    }

    pub fn with_workflow(
        self,
        uuid: &str,
        name: &str,
        entity_type: &str,
        action_type: &str,
    ) -> Self {
        self.workflows.borrow_mut().push(json!({
            "uuid": uuid,
            "displayName": name,
            "entityType": entity_type,
            "actionType": action_type,
        }));
        self
    }

    /// Queue statuses returned by the next DELETE calls, in order.
    pub fn fail_deletes(self, statuses: &[u16]) -> Self {
        self.delete_statuses.borrow_mut().extend(statuses);
        self
    }

    pub fn insert(&self, collection: &str, uuid: &str, value: Value) {
        self.collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .insert(uuid.to_string(), value);
    }

    pub fn get(&self, collection: &str, uuid: &str) -> Option<Value> {
        self.collections
            .borrow()
            .get(collection)
            .and_then(|items| items.get(uuid).cloned())
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Requests whose method matches and whose URL contains `fragment`.
    pub fn count(&self, method: Method, fragment: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|req| req.method == method && req.url.contains(fragment))
            .count()
    }

    fn respond(status: u16, body: Value) -> HttpResponse {
        HttpResponse {
            status,
            set_cookie: None,
            body: body.to_string(),
        }
    }

    fn create(&self, collection: &str, body: Option<&Value>) -> HttpResponse {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let uuid = format!("{collection}-{id}");
        let mut stored = body.cloned().unwrap_or_else(|| json!({}));
        if let Some(object) = stored.as_object_mut() {
            object.insert("uuid".to_string(), json!(uuid));
        }
        self.insert(collection, &uuid, stored.clone());
        Self::respond(200, stored)
    }

    fn delete(&self, collection: &str, uuid: &str) -> HttpResponse {
        let scripted = self.delete_statuses.borrow_mut().pop_front();
        let mut collections = self.collections.borrow_mut();
        let items = collections.entry(collection.to_string()).or_default();
        match scripted {
            Some(200) | None => match items.remove(uuid) {
                Some(_) => Self::respond(200, json!({})),
                None => Self::respond(404, json!({"message": "not found"})),
            },
            Some(status) => Self::respond(status, json!({"message": "scripted failure"})),
        }
    }
}

impl Transport for FakeTurbonomic {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        let path = request
            .url
            .split_once("/api/v3/")
            .map(|(_, path)| path)
            .ok_or_else(|| anyhow!("unexpected url {}", request.url))?;
        let (collection, id) = match path.split_once('/') {
            Some((collection, id)) => (collection, Some(id)),
            None => (path, None),
        };

        let response = match (request.method, collection, id) {
            (Method::Post, "login", None) => HttpResponse {
                status: 200,
                set_cookie: Some("JSESSIONID=fake; Path=/".to_string()),
                body: String::new(),
            },
            (Method::Get, "workflows", None) => {
                Self::respond(200, Value::Array(self.workflows.borrow().clone()))
            }
            (Method::Post, collection, None) => self.create(collection, request.body.as_ref()),
            (Method::Get, collection, Some(id)) => match self.get(collection, id) {
                Some(value) => Self::respond(200, value),
                None => Self::respond(404, json!({"message": "not found"})),
            },
            (Method::Delete, collection, Some(id)) => self.delete(collection, id),
            _ => Self::respond(405, json!({"message": "unsupported"})),
        };
        Ok(response)
    }
}

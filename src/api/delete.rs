//! Shared delete protocol for groups, services, and policies.
//!
//! A 500 gets exactly one more attempt: deleting a service while one of its
//! member groups is being deleted can fail transiently. 404 counts as done.
use super::error::ApiError;
use super::session::Session;
use super::transport::{Method, Transport};
use crate::util::truncate_string;

const MAX_DELETE_ATTEMPTS: u8 = 2;

/// Resource collections that support deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Group,
    Service,
    Policy,
}

impl ResourceKind {
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Group => "groups",
            ResourceKind::Service => "topologydefinitions",
            ResourceKind::Policy => "settingspolicies",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Group => "group",
            ResourceKind::Service => "service",
            ResourceKind::Policy => "policy",
        }
    }
}

/// Final status of a delete after any retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub status: u16,
    pub attempts: u8,
}

impl DeleteOutcome {
    /// Deleted now, or already absent.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 404)
    }
}

pub fn delete_resource(
    transport: &dyn Transport,
    session: &Session,
    kind: ResourceKind,
    id: &str,
) -> Result<DeleteOutcome, ApiError> {
    let label = kind.label();
    tracing::info!(id, "deleting {label}");
    let path = format!("{}/{id}", kind.collection());

    let mut attempts = 0;
    loop {
        attempts += 1;
        let response = transport.send(&session.request(Method::Delete, &path))?;
        let outcome = DeleteOutcome {
            status: response.status,
            attempts,
        };
        match response.status {
            200 => tracing::info!(id, "{label} deleted"),
            404 => tracing::info!(id, "{label} does not exist"),
            500 if attempts < MAX_DELETE_ATTEMPTS => {
                tracing::warn!(id, attempt = attempts, "status 500 deleting {label}; trying again");
                continue;
            }
            status => tracing::error!(
                id,
                status,
                body = %truncate_string(&response.body, 512),
                "failed to delete {label}"
            ),
        }
        return Ok(outcome);
    }
}

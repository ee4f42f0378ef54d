//! Settings policies and the workflows they bind to.
use super::delete::{delete_resource, DeleteOutcome, ResourceKind};
use super::error::ApiError;
use super::session::Session;
use super::transport::{Method, Transport};
use super::{created_uuid, remote_failure};
use crate::util::{split_ids, truncate_string};
use serde::Deserialize;
use serde_json::{json, Value};

/// Display name of the custom scale workflow the policy delegates to.
pub const SCALE_WORKFLOW_NAME: &str = "IAScaleAction";
pub const SCALE_WORKFLOW_ENTITY_TYPE: &str = "VIRTUAL_MACHINE";
pub const SCALE_WORKFLOW_ACTION_TYPE: &str = "SCALE";

/// Workflow entry from `GET /workflows`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub uuid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub action_type: String,
}

impl Workflow {
    fn matches(&self, name: &str, entity_type: &str, action_type: &str) -> bool {
        self.display_name == name
            && self.entity_type == entity_type
            && self.action_type == action_type
    }
}

/// Find a workflow id by exact name, entity type, and action type.
///
/// A failed listing is logged and treated as "not found".
pub fn lookup_workflow(
    transport: &dyn Transport,
    session: &Session,
    name: &str,
    entity_type: &str,
    action_type: &str,
) -> Result<Option<String>, ApiError> {
    tracing::info!(name, entity_type, action_type, "looking up workflow");

    let response = transport.send(&session.request(Method::Get, "workflows"))?;
    if !response.is_ok() {
        tracing::error!(
            status = response.status,
            body = %truncate_string(&response.body, 512),
            "listing workflows failed"
        );
        return Ok(None);
    }

    let workflows: Vec<Workflow> = response.json()?;
    let found = workflows
        .into_iter()
        .find(|wf| wf.matches(name, entity_type, action_type))
        .map(|wf| wf.uuid);
    match &found {
        Some(id) => tracing::info!(name, id = %id, "workflow found"),
        None => tracing::warn!(name, "workflow does not exist"),
    }
    Ok(found)
}

fn scale_policy_body(name: &str, group_ids: Option<&str>, workflow_id: &str) -> Value {
    let scopes: Vec<Value> = group_ids
        .map(split_ids)
        .unwrap_or_default()
        .into_iter()
        .map(|id| json!({"uuid": id}))
        .collect();

    json!({
        "disabled": false,
        "entityType": "VirtualMachine",
        "displayName": name,
        "scopes": scopes,
        "settingsManagers": [
            {
                "uuid": "automationmanager",
                "settings": [{"uuid": "cloudComputeScale", "value": "MANUAL"}],
            },
            {
                "uuid": "marketsettingsmanager",
                "settings": [{"uuid": "ignoreNvmePreRequisite", "value": true}],
            },
            {
                "uuid": "controlmanager",
                "settings": [{"uuid": "cloudComputeScaleActionWorkflow", "value": workflow_id}],
            },
        ],
    })
}

/// Create a VM policy that forces manual scaling through the custom workflow.
pub fn create_vm_scale_policy(
    transport: &dyn Transport,
    session: &Session,
    name: &str,
    group_ids: Option<&str>,
) -> Result<String, ApiError> {
    tracing::info!(name, host = %session.host, "creating virtual machine policy");

    let workflow_id = lookup_workflow(
        transport,
        session,
        SCALE_WORKFLOW_NAME,
        SCALE_WORKFLOW_ENTITY_TYPE,
        SCALE_WORKFLOW_ACTION_TYPE,
    )?
    .ok_or_else(|| {
        ApiError::not_found(format!(
            "workflow {SCALE_WORKFLOW_NAME} is required to create policy {name}"
        ))
    })?;

    let body = scale_policy_body(name, group_ids, &workflow_id);
    tracing::debug!(body = %body, "policy request body");

    let response = transport.send(
        &session
            .request(Method::Post, ResourceKind::Policy.collection())
            .json(body),
    )?;
    if !response.is_ok() {
        return Err(remote_failure("create policy", name, response));
    }
    let id = created_uuid(&response)?;
    tracing::info!(name, id = %id, "virtual machine policy created");
    Ok(id)
}

pub fn delete(
    transport: &dyn Transport,
    session: &Session,
    id: &str,
) -> Result<DeleteOutcome, ApiError> {
    delete_resource(transport, session, ResourceKind::Policy, id)
}

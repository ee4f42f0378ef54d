//! Services: topology definitions connecting at most one VM group and one
//! database-server group.
use super::delete::{delete_resource, DeleteOutcome, ResourceKind};
use super::error::ApiError;
use super::groups::{self, GroupDetails, GroupType, ServiceSlot};
use super::session::Session;
use super::transport::{Method, Transport};
use super::{created_uuid, remote_failure};
use crate::util::split_ids;
use serde_json::{json, Map, Value};

/// Groups accepted into a service, one per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMembers {
    pub virtual_machine: Option<String>,
    pub database_server: Option<String>,
}

impl ServiceMembers {
    /// Sort fetched groups into service slots and enforce slot limits.
    ///
    /// Groups that fit no slot are skipped with a warning.
    pub fn from_groups(groups: &[GroupDetails]) -> Result<Self, ApiError> {
        let mut vm_groups = Vec::new();
        let mut db_server_groups = Vec::new();

        for group in groups {
            match group.known_type().and_then(GroupType::service_slot) {
                Some(ServiceSlot::VirtualMachine) => vm_groups.push(group.uuid.clone()),
                Some(ServiceSlot::DatabaseServer) => db_server_groups.push(group.uuid.clone()),
                None => tracing::warn!(
                    id = %group.uuid,
                    group_type = %group.group_type,
                    "{} groups can not be added to a service; ignoring",
                    group.group_type
                ),
            }
        }

        if vm_groups.is_empty() && db_server_groups.is_empty() {
            return Err(ApiError::bad_request(
                "at least one VirtualMachine or DatabaseServer group must be added to a service",
            ));
        }
        if vm_groups.len() > 1 {
            return Err(ApiError::bad_request(format!(
                "only one VirtualMachine group can be added to a service (got {})",
                vm_groups.join(", ")
            )));
        }
        if db_server_groups.len() > 1 {
            return Err(ApiError::bad_request(format!(
                "only one DatabaseServer group can be added to a service (got {})",
                db_server_groups.join(", ")
            )));
        }

        Ok(Self {
            virtual_machine: vm_groups.pop(),
            database_server: db_server_groups.pop(),
        })
    }

    fn connection_data(&self) -> Value {
        let mut connected = Map::new();
        let slots = [
            (GroupType::VirtualMachine, &self.virtual_machine),
            (GroupType::DatabaseServer, &self.database_server),
        ];
        for (ty, id) in slots {
            if let Some(id) = id {
                connected.insert(
                    ty.as_str().to_string(),
                    json!({"connectedGroup": {"uuid": id}}),
                );
            }
        }
        Value::Object(connected)
    }
}

/// Create a service from a comma-separated list of group ids.
pub fn create(
    transport: &dyn Transport,
    session: &Session,
    name: &str,
    group_ids: &str,
) -> Result<String, ApiError> {
    tracing::info!(name, host = %session.host, "creating service");

    let mut fetched = Vec::new();
    for id in split_ids(group_ids) {
        // Connect the requested id, whatever the body reports.
        let mut details = groups::fetch(transport, session, id)?;
        details.uuid = id.to_string();
        fetched.push(details);
    }

    let members = ServiceMembers::from_groups(&fetched).inspect_err(|err| {
        tracing::error!(name, "{err}");
    })?;

    let body = json!({
        "displayName": name,
        "entityType": "Service",
        "entityDefinitionData": {
            "manualConnectionData": members.connection_data(),
        },
    });

    let response = transport.send(
        &session
            .request(Method::Post, ResourceKind::Service.collection())
            .json(body),
    )?;
    if !response.is_ok() {
        return Err(remote_failure("create service", name, response));
    }
    let id = created_uuid(&response)?;
    tracing::info!(name, id = %id, "service created");
    Ok(id)
}

pub fn delete(
    transport: &dyn Transport,
    session: &Session,
    id: &str,
) -> Result<DeleteOutcome, ApiError> {
    delete_resource(transport, session, ResourceKind::Service, id)
}

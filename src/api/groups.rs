//! Dynamic, tag-filtered groups.
use super::delete::{delete_resource, DeleteOutcome, ResourceKind};
use super::error::ApiError;
use super::session::Session;
use super::transport::{Method, Transport};
use super::{created_uuid, remote_failure};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Entity types a group can be built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupType {
    VirtualMachine,
    Database,
    DatabaseServer,
}

/// Service connection slot a group type may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSlot {
    VirtualMachine,
    DatabaseServer,
}

impl GroupType {
    pub const ALL: [GroupType; 3] = [
        GroupType::VirtualMachine,
        GroupType::Database,
        GroupType::DatabaseServer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupType::VirtualMachine => "VirtualMachine",
            GroupType::Database => "Database",
            GroupType::DatabaseServer => "DatabaseServer",
        }
    }

    /// Criteria filter that selects members of this type by tag.
    pub fn filter_type(self) -> &'static str {
        match self {
            GroupType::VirtualMachine => "vmsByTag",
            GroupType::Database => "databaseByTag",
            GroupType::DatabaseServer => "databaseServerByTag",
        }
    }

    /// Slot this type fills when attached to a service, if any.
    pub fn service_slot(self) -> Option<ServiceSlot> {
        match self {
            GroupType::VirtualMachine => Some(ServiceSlot::VirtualMachine),
            GroupType::DatabaseServer => Some(ServiceSlot::DatabaseServer),
            GroupType::Database => None,
        }
    }

    /// Exact match on the canonical name.
    pub fn from_canonical(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == name)
    }

    /// Case-insensitive match, as accepted on the command line.
    pub fn parse_loose(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(name.trim()))
    }

    pub const VALID_NAMES: &'static str = "VirtualMachine, Database, and DatabaseServer";
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One membership criterion of a dynamic group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub exp_type: String,
    pub exp_val: String,
    pub filter_type: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Group as reported by `GET /groups/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Kept raw: the API reports types this tool does not manage.
    pub group_type: String,
    #[serde(default)]
    pub criteria_list: Vec<Criterion>,
}

impl GroupDetails {
    pub fn known_type(&self) -> Option<GroupType> {
        GroupType::from_canonical(&self.group_type)
    }
}

pub fn fetch(
    transport: &dyn Transport,
    session: &Session,
    id: &str,
) -> Result<GroupDetails, ApiError> {
    tracing::info!(id, "fetching group");
    let response = transport.send(&session.request(Method::Get, &format!("groups/{id}")))?;
    if !response.is_ok() {
        return Err(remote_failure("fetch group", id, response));
    }
    let details: GroupDetails = response.json()?;
    tracing::debug!(
        id,
        name = details.display_name.as_deref().unwrap_or_default(),
        group_type = %details.group_type,
        criteria = details.criteria_list.len(),
        "group fetched"
    );
    Ok(details)
}

/// Create a dynamic group whose members carry `tag_name=tag_value`.
pub fn create(
    transport: &dyn Transport,
    session: &Session,
    name: &str,
    group_type: &str,
    tag_name: &str,
    tag_value: &str,
) -> Result<String, ApiError> {
    tracing::info!(name, group_type, host = %session.host, "creating group");

    let Some(ty) = GroupType::from_canonical(group_type) else {
        let message = format!(
            "group type \"{group_type}\" is not valid; valid values are {}",
            GroupType::VALID_NAMES
        );
        tracing::error!("{message}");
        return Err(ApiError::bad_request(message));
    };

    let criterion = Criterion {
        exp_type: "EQ".to_string(),
        exp_val: format!("{tag_name}={tag_value}"),
        filter_type: ty.filter_type().to_string(),
        case_sensitive: false,
    };
    let body = json!({
        "isStatic": false,
        "displayName": name,
        "memberUuidList": [],
        "criteriaList": [criterion],
        "groupType": ty,
    });

    let response = transport.send(&session.request(Method::Post, "groups").json(body))?;
    if !response.is_ok() {
        return Err(remote_failure("create group", name, response));
    }
    let id = created_uuid(&response)?;
    tracing::info!(name, id = %id, "group created");
    Ok(id)
}

pub fn delete(
    transport: &dyn Transport,
    session: &Session,
    id: &str,
) -> Result<DeleteOutcome, ApiError> {
    delete_resource(transport, session, ResourceKind::Group, id)
}

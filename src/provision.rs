//! Create/delete orchestration.
//!
//! Arguments are validated into a [`Plan`] before any environment read or
//! request. Execution stops at the first failed step; nothing is rolled back.
use crate::api::groups::GroupType;
use crate::api::{groups, policies, services, ApiError, DeleteOutcome, Session, Transport};
use crate::cli::Args;
use crate::util::split_ids;
use anyhow::{bail, Result};
use serde::Serialize;
use thiserror::Error;

/// Ids of resources created in this run, printed for the calling tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionSummary {
    pub service_id: Option<String>,
    pub group_id: Option<String>,
    pub policy_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub name: String,
    pub group_ids: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRequest {
    pub name: String,
    pub group_type: GroupType,
    pub tag_name: String,
    pub tag_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRequest {
    pub name: String,
    pub group_ids: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePlan {
    pub service: Option<ServiceRequest>,
    pub group: Option<GroupRequest>,
    pub policy: Option<PolicyRequest>,
}

/// Ids to delete. Processed policies first, then groups, then services, so
/// dependents go before the resources they reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletePlan {
    pub policy_ids: Vec<String>,
    pub group_ids: Vec<String>,
    pub service_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Create(CreatePlan),
    Delete(DeletePlan),
}

impl Plan {
    /// Check flag combinations and normalize the group type.
    pub fn from_args(args: &Args) -> Result<Self> {
        if args.service_name.is_some() && args.group_ids.is_none() {
            bail!("--create_service requires at least one group id in --group_ids");
        }

        let group_type = match args.group_type.as_deref() {
            Some(raw) => match GroupType::parse_loose(raw) {
                Some(ty) => Some(ty),
                None => bail!(
                    "group type \"{raw}\" is not valid; valid values are {}",
                    GroupType::VALID_NAMES
                ),
            },
            None => None,
        };

        if args.group_name.is_some() {
            let missing: Vec<&str> = [
                ("--group_type", group_type.is_none()),
                ("--tag_name", args.tag_name.is_none()),
                ("--tag_value", args.tag_value.is_none()),
            ]
            .into_iter()
            .filter_map(|(flag, absent)| absent.then_some(flag))
            .collect();
            if !missing.is_empty() {
                bail!("--create_group requires {}", missing.join(", "));
            }
        }

        if args.vm_policy_name.is_some() && args.group_ids.is_none() {
            bail!("--create_vm_policy requires --group_ids");
        }

        if args.delete {
            let ids = |list: &Option<String>| -> Vec<String> {
                list.as_deref()
                    .map(split_ids)
                    .unwrap_or_default()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            };
            return Ok(Plan::Delete(DeletePlan {
                policy_ids: ids(&args.policy_ids),
                group_ids: ids(&args.group_ids),
                service_ids: ids(&args.service_ids),
            }));
        }

        let group_ids = args.group_ids.clone().unwrap_or_default();
        let service = args.service_name.as_ref().map(|name| ServiceRequest {
            name: name.clone(),
            group_ids: group_ids.clone(),
        });
        let group = match (&args.group_name, group_type, &args.tag_name, &args.tag_value) {
            (Some(name), Some(group_type), Some(tag_name), Some(tag_value)) => Some(GroupRequest {
                name: name.clone(),
                group_type,
                tag_name: tag_name.clone(),
                tag_value: tag_value.clone(),
            }),
            _ => None,
        };
        let policy = args.vm_policy_name.as_ref().map(|name| PolicyRequest {
            name: name.clone(),
            group_ids: group_ids.clone(),
        });

        Ok(Plan::Create(CreatePlan {
            service,
            group,
            policy,
        }))
    }
}

/// A step that stopped the run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("creating {kind} {name} failed")]
    Create {
        kind: &'static str,
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("deleting {kind} {id} failed with status {status}")]
    Delete {
        kind: &'static str,
        id: String,
        status: u16,
    },

    #[error("deleting {kind} {id} failed")]
    DeleteRequest {
        kind: &'static str,
        id: String,
        #[source]
        source: ApiError,
    },
}

/// Run a validated plan. Create mode yields the summary to print.
pub fn execute(
    plan: &Plan,
    transport: &dyn Transport,
    session: &Session,
) -> Result<Option<ProvisionSummary>, ProvisionError> {
    match plan {
        Plan::Create(create) => run_create(create, transport, session).map(Some),
        Plan::Delete(delete) => run_delete(delete, transport, session).map(|()| None),
    }
}

fn created(
    kind: &'static str,
    name: &str,
    result: Result<String, ApiError>,
) -> Result<String, ProvisionError> {
    result.map_err(|source| {
        tracing::error!(kind, name, status = ?source.status(), "create failed");
        ProvisionError::Create {
            kind,
            name: name.to_string(),
            source,
        }
    })
}

fn run_create(
    plan: &CreatePlan,
    transport: &dyn Transport,
    session: &Session,
) -> Result<ProvisionSummary, ProvisionError> {
    tracing::info!("creating Turbonomic resources");
    let mut summary = ProvisionSummary::default();

    if let Some(service) = &plan.service {
        let result = services::create(transport, session, &service.name, &service.group_ids);
        summary.service_id = Some(created("service", &service.name, result)?);
    }

    if let Some(group) = &plan.group {
        let result = groups::create(
            transport,
            session,
            &group.name,
            group.group_type.as_str(),
            &group.tag_name,
            &group.tag_value,
        );
        summary.group_id = Some(created("group", &group.name, result)?);
    }

    if let Some(policy) = &plan.policy {
        let result = policies::create_vm_scale_policy(
            transport,
            session,
            &policy.name,
            Some(policy.group_ids.as_str()),
        );
        summary.policy_id = Some(created("policy", &policy.name, result)?);
    }

    Ok(summary)
}

type DeleteFn = fn(&dyn Transport, &Session, &str) -> Result<DeleteOutcome, ApiError>;

fn run_delete(
    plan: &DeletePlan,
    transport: &dyn Transport,
    session: &Session,
) -> Result<(), ProvisionError> {
    tracing::info!("deleting Turbonomic resources");

    let steps: [(&'static str, &[String], DeleteFn); 3] = [
        ("policy", plan.policy_ids.as_slice(), policies::delete),
        ("group", plan.group_ids.as_slice(), groups::delete),
        ("service", plan.service_ids.as_slice(), services::delete),
    ];

    for (kind, ids, delete) in steps {
        for id in ids {
            let outcome = delete(transport, session, id).map_err(|source| {
                ProvisionError::DeleteRequest {
                    kind,
                    id: id.clone(),
                    source,
                }
            })?;
            if !outcome.is_success() {
                return Err(ProvisionError::Delete {
                    kind,
                    id: id.clone(),
                    status: outcome.status,
                });
            }
            tracing::debug!(kind, id = %id, attempts = outcome.attempts, "delete settled");
        }
    }
    Ok(())
}

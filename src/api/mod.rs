//! Turbonomic REST API operations.
//!
//! Every operation is one or a few blocking calls against `/api/v3`. Results
//! are explicit: a created id, a delete outcome, or an [`ApiError`] carrying
//! the status code the orchestrator uses to decide whether to continue.
pub mod delete;
mod error;
pub mod groups;
pub mod policies;
pub mod services;
mod session;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use delete::DeleteOutcome;
pub use error::ApiError;
pub use session::{authenticate, Session};
pub use transport::{Transport, UreqTransport};

use crate::util::truncate_string;
use serde::Deserialize;
use transport::HttpResponse;

#[derive(Deserialize)]
struct Created {
    uuid: String,
}

/// Server-assigned id from a successful create response.
fn created_uuid(response: &HttpResponse) -> Result<String, ApiError> {
    let created: Created = response.json().map_err(|err| {
        tracing::error!(error = %err, "create response carried no uuid");
        ApiError::Remote {
            status: response.status,
            body: truncate_string(&response.body, 512),
        }
    })?;
    Ok(created.uuid)
}

/// Log a failed call and convert it into an error value.
fn remote_failure(action: &str, subject: &str, response: HttpResponse) -> ApiError {
    tracing::error!(
        status = response.status,
        subject,
        body = %truncate_string(&response.body, 512),
        "{action} failed"
    );
    ApiError::Remote {
        status: response.status,
        body: response.body,
    }
}

use thiserror::Error;

/// Failure of a single API operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The login call did not produce a session.
    #[error("authentication failed with status {status}")]
    Auth { status: u16 },

    /// A constraint checked locally, before (or instead of) a request.
    #[error("{message} (status {status})")]
    Validation { status: u16, message: String },

    /// The API answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Remote { status: u16, body: String },

    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Validation {
            status: 400,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        ApiError::Validation {
            status: 404,
            message: message.into(),
        }
    }

    /// HTTP-style status for the failure, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status }
            | ApiError::Validation { status, .. }
            | ApiError::Remote { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }
}

//! Connection settings for the target Turbonomic instance.
//!
//! Settings come from the environment exactly once, after the command line has
//! been validated and before any request is made.
use anyhow::{anyhow, Result};

pub const USER_VAR: &str = "TURBONOMIC_USER";
pub const PASSWORD_VAR: &str = "TURBONOMIC_PASSWORD";
pub const ENDPOINT_VAR: &str = "TURBONOMIC_ENDPOINT";

/// Credentials and base URL for one invocation.
#[derive(Clone)]
pub struct Connection {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Connection {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &str| -> Result<String> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("environment variable {name} must be set"))
        };
        let user = require(USER_VAR)?;
        let password = require(PASSWORD_VAR)?;
        let host = normalize_host(&require(ENDPOINT_VAR)?);
        Ok(Self {
            host,
            user,
            password,
        })
    }
}

fn normalize_host(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

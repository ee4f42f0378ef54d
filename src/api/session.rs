use super::error::ApiError;
use super::transport::{HttpRequest, Method, Transport};
use crate::config::Connection;

/// An authenticated session against one Turbonomic host.
#[derive(Debug, Clone)]
pub struct Session {
    pub host: String,
    pub cookie: String,
}

impl Session {
    /// Full URL for an API path such as `groups/abc`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v3/{}", self.host, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.url(path)).cookie(&self.cookie)
    }
}

/// Log in and capture the session cookie.
pub fn authenticate(transport: &dyn Transport, conn: &Connection) -> Result<Session, ApiError> {
    tracing::info!(user = %conn.user, host = %conn.host, "authenticating");

    let request = HttpRequest::new(Method::Post, format!("{}/api/v3/login", conn.host))
        .query("username", &conn.user)
        .query("password", &conn.password);
    let response = transport.send(&request)?;

    if !response.is_ok() {
        tracing::error!(status = response.status, user = %conn.user, "authentication failed");
        return Err(ApiError::Auth {
            status: response.status,
        });
    }

    let cookie = response
        .set_cookie
        .as_deref()
        .and_then(session_token)
        .ok_or_else(|| {
            tracing::error!(user = %conn.user, "login response carried no session cookie");
            ApiError::Auth {
                status: response.status,
            }
        })?;

    Ok(Session {
        host: conn.host.clone(),
        cookie,
    })
}

/// First `;`-delimited segment of a `set-cookie` header.
fn session_token(header: &str) -> Option<String> {
    let token = header.split(';').next()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

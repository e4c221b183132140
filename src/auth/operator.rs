// src/auth/operator.rs
use crate::auth::sessions::{create_session, load_operator_from_session, revoke_session};
use crate::config::AppConfig;
use crate::db::connection::Database;
use crate::errors::ServerError;

pub const SESSION_COOKIE: &str = "session";

/// Checks the credentials against the configured operator and opens a
/// session. With no operator configured every attempt is refused.
pub fn login(
    db: &Database,
    config: &AppConfig,
    username: &str,
    password: &str,
    now: i64,
) -> Result<String, ServerError> {
    let Some(operator) = config.operator.as_ref() else {
        tracing::warn!("login attempted but no operator is configured");
        return Err(ServerError::Unauthorized("login is disabled".into()));
    };

    if !operator.verify(username, password) {
        tracing::info!(username, "rejected operator login");
        return Err(ServerError::Unauthorized("invalid credentials".into()));
    }

    let token = db.with_conn(|conn| {
        create_session(conn, &operator.username, now, config.session_ttl_secs)
    })?;
    tracing::info!(username = %operator.username, "operator signed in");
    Ok(token)
}

pub fn current_operator(db: &Database, token: Option<&str>, now: i64) -> Result<Option<String>, ServerError> {
    match token {
        Some(t) if !t.is_empty() => db.with_conn(|conn| load_operator_from_session(conn, t, now)),
        _ => Ok(None),
    }
}

pub fn require_operator(db: &Database, token: Option<&str>, now: i64) -> Result<String, ServerError> {
    current_operator(db, token, now)?
        .ok_or_else(|| ServerError::Unauthorized("operator session required".into()))
}

pub fn logout(db: &Database, token: Option<&str>, now: i64) -> Result<(), ServerError> {
    match token {
        Some(t) => db.with_conn(|conn| revoke_session(conn, t, now)),
        None => Ok(()),
    }
}

/// `Set-Cookie` value for a fresh session.
pub fn session_cookie(token: &str, ttl_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_secs}")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

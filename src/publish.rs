// src/publish.rs
//
// Mirrors operator changes to the listings API so other front ends see them.
// Local storage stays the source of truth; a failed mirror is only logged.

use crate::config::PublishCredentials;
use crate::domain::property::PropertyRecord;
use crate::remote::{RemoteError, RemotePublisher};
use std::sync::Mutex;

pub enum Change<'a> {
    Upsert(&'a PropertyRecord),
    Delete(&'a str),
}

pub struct Publisher {
    credentials: Option<PublishCredentials>,
    session: Mutex<Option<String>>,
}

impl Publisher {
    pub fn new(credentials: Option<PublishCredentials>) -> Self {
        Self {
            credentials,
            session: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Sends one change. Does nothing when no credentials are configured.
    /// The API session is opened lazily and reopened once if it expired.
    pub fn publish<R: RemotePublisher + ?Sized>(&self, remote: &R, change: &Change) -> Result<(), RemoteError> {
        let Some(credentials) = &self.credentials else {
            return Ok(());
        };

        let session = self.session(remote, credentials, false)?;
        match apply(remote, &session, change) {
            Err(RemoteError::Status { status: 401, .. }) => {
                let session = self.session(remote, credentials, true)?;
                apply(remote, &session, change)
            }
            other => other,
        }
    }

    fn session<R: RemotePublisher + ?Sized>(
        &self,
        remote: &R,
        credentials: &PublishCredentials,
        refresh: bool,
    ) -> Result<String, RemoteError> {
        let mut slot = self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let (false, Some(session)) = (refresh, slot.as_ref()) {
            return Ok(session.clone());
        }

        let session = remote.login(&credentials.username, &credentials.password)?;
        tracing::debug!(username = %credentials.username, "opened listings API session");
        *slot = Some(session.clone());
        Ok(session)
    }
}

// Update first; the API answers 404 for listings it has never seen.
fn apply<R: RemotePublisher + ?Sized>(remote: &R, session: &str, change: &Change) -> Result<(), RemoteError> {
    match change {
        Change::Upsert(record) => {
            let body = serde_json::to_value(record).map_err(|e| RemoteError::Decode(e.to_string()))?;
            match remote.update_property(session, &record.id, &body) {
                Err(RemoteError::Status { status: 404, .. }) => {
                    remote.create_property(session, &body).map(|_| ())
                }
                other => other,
            }
        }
        Change::Delete(id) => match remote.delete_property(session, id) {
            Err(RemoteError::Status { status: 404, .. }) => Ok(()),
            other => other,
        },
    }
}

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use crate::config::SessionConfig;
use crate::error::GradeError;

/// A sandboxed execution target bound to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    /// Identifier the executor uses to reach the sandbox
    pub container: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Looks up live sessions. Lifecycle is owned by whoever fills the store.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str) -> Result<Session, StoreError>;
}

/// Finds a named instance inside an already resolved session
pub trait InstanceRegistry: Send + Sync {
    fn get(&self, session: &Session, instance_name: &str) -> Option<Instance>;
}

/// Resolves a session id and instance name into a live instance
pub fn resolve(
    sessions: &dyn SessionStore,
    instances: &dyn InstanceRegistry,
    session_id: &str,
    instance_name: &str,
) -> Result<Instance, GradeError> {
    let session = match sessions.get(session_id) {
        Ok(session) => session,
        Err(StoreError::NotFound) => {
            log::info!("Session {session_id} not found");
            return Err(GradeError::not_found(format!("session {session_id}")));
        }
        Err(StoreError::Backend(e)) => {
            log::error!("Failed to look up session {session_id}: {e:#}");
            return Err(GradeError::Internal(e));
        }
    };

    instances.get(&session, instance_name).ok_or_else(|| {
        log::info!("Instance {instance_name} not found in session {session_id}");
        GradeError::not_found(format!("instance {instance_name}"))
    })
}

/// In-process session store, also serving as the instance registry
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(sessions: &[SessionConfig]) -> Self {
        let store = Self::new();
        for session in sessions {
            store.insert(Session {
                id: session.id.clone(),
                instances: session
                    .instances
                    .iter()
                    .map(|i| Instance {
                        name: i.name.clone(),
                        container: i.container.clone(),
                    })
                    .collect(),
            });
        }
        store
    }

    pub fn insert(&self, session: Session) {
        log::debug!(
            "Registered session {} with {} instance(s)",
            session.id,
            session.instances.len()
        );
        self.sessions.write().insert(session.id.clone(), session);
    }

    pub fn remove(&self, session_id: &str) -> Option<Session> {
        self.sessions.write().remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Result<Session, StoreError> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

impl InstanceRegistry for MemorySessionStore {
    fn get(&self, session: &Session, instance_name: &str) -> Option<Instance> {
        session
            .instances
            .iter()
            .find(|i| i.name == instance_name)
            .cloned()
    }
}

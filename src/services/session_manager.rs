// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use super::catalog::CatalogScope;
use crate::models::{ClarificationForm, Message};

const DEFAULT_DISPLAY_NAME: &str = "Gestor";
const GENERIC_USER_NAMES: [&str; 2] = ["Gestor Spartan", "Vendedor Spartan"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("session {0} is already processing a message")]
    Busy(String),
    #[error("message {0} not found")]
    MessageNotFound(String),
    #[error("message {0} has no clarification form")]
    NoForm(String),
    #[error("the form of message {0} was already submitted")]
    FormAlreadySubmitted(String),
}

#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub catalog: CatalogScope,
    pub messages: Vec<Message>,
    pub last_active: Instant,
    turn_lock: Arc<Mutex<()>>,
}

impl Session {
    pub fn new(id: impl Into<String>, catalog: CatalogScope) -> Self {
        Self {
            id: id.into(),
            catalog,
            messages: Vec::new(),
            last_active: Instant::now(),
            turn_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Held for the duration of one turn. Dropping it lets the session accept
/// the next one.
#[derive(Debug)]
pub struct Turn {
    pub catalog: CatalogScope,
    _guard: OwnedMutexGuard<()>,
}

/// Name used to greet the user. Generic account names become "Gestor".
pub fn display_name(user_name: Option<&str>) -> &str {
    match user_name.map(str::trim) {
        Some(name) if !name.is_empty() && !GENERIC_USER_NAMES.contains(&name) => name,
        _ => DEFAULT_DISPLAY_NAME,
    }
}

pub fn welcome_message(user_name: Option<&str>, catalog: CatalogScope) -> String {
    format!(
        "Olá, {}. Sou seu assistente técnico para escolha de ferramentas profissionais.\n\nEstou consultando o catálogo: {}.\n\nPor favor, descreva a necessidade, o ambiente e o tipo de superfície.",
        display_name(user_name),
        catalog.label()
    )
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create a fresh session seeded with the welcome message and return its id.
    pub async fn create_session(&self, catalog: CatalogScope, user_name: Option<&str>) -> String {
        let id = Uuid::new_v4().to_string();
        let mut session = Session::new(id.clone(), catalog);
        session
            .messages
            .push(Message::assistant(welcome_message(user_name, catalog)));

        let mut guard = self.inner.write().await;
        guard.insert(id.clone(), session);
        id
    }

    /// Claim the session for one turn. Fails instead of waiting if a turn is
    /// already running.
    pub async fn begin_turn(&self, session_id: &str) -> Result<Turn, SessionError> {
        let (catalog, lock) = {
            let guard = self.inner.read().await;
            let session = guard
                .get(session_id)
                .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
            (session.catalog, session.turn_lock.clone())
        };

        let guard = lock
            .try_lock_owned()
            .map_err(|_| SessionError::Busy(session_id.to_string()))?;

        Ok(Turn { catalog, _guard: guard })
    }

    /// Append a message to a session's history and touch last_active.
    pub async fn append_message(&self, session_id: &str, message: Message) -> Result<usize, SessionError> {
        let mut guard = self.inner.write().await;
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        session.messages.push(message);
        session.last_active = Instant::now();
        Ok(session.messages.len())
    }

    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        let guard = self.inner.read().await;
        guard.get(session_id).cloned()
    }

    /// Get a copy of the session history
    pub async fn get_history(&self, session_id: &str) -> Option<Vec<Message>> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|s| s.messages.clone())
    }

    /// The still unanswered form attached to a message.
    pub async fn clarification_form(
        &self,
        session_id: &str,
        message_id: &str,
    ) -> Result<ClarificationForm, SessionError> {
        let guard = self.inner.read().await;
        let message = find_message(&guard, session_id, message_id)?;
        let form = message
            .clarification_form
            .clone()
            .ok_or_else(|| SessionError::NoForm(message_id.to_string()))?;
        if message.form_submitted {
            return Err(SessionError::FormAlreadySubmitted(message_id.to_string()));
        }
        Ok(form)
    }

    /// Flag a message's form as answered. The flag is the only part of a
    /// message that changes after it is appended.
    pub async fn mark_form_submitted(&self, session_id: &str, message_id: &str) -> Result<(), SessionError> {
        let mut guard = self.inner.write().await;
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        let message = session
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| SessionError::MessageNotFound(message_id.to_string()))?;

        if message.clarification_form.is_none() {
            return Err(SessionError::NoForm(message_id.to_string()));
        }
        if message.form_submitted {
            return Err(SessionError::FormAlreadySubmitted(message_id.to_string()));
        }
        message.form_submitted = true;
        session.last_active = Instant::now();
        Ok(())
    }

    /// Remove a session by id
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| now.duration_since(s.last_active) < self.ttl);
        before - guard.len()
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }
}

fn find_message<'a>(
    sessions: &'a HashMap<String, Session>,
    session_id: &str,
    message_id: &str,
) -> Result<&'a Message, SessionError> {
    sessions
        .get(session_id)
        .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?
        .messages
        .iter()
        .find(|m| m.id == message_id)
        .ok_or_else(|| SessionError::MessageNotFound(message_id.to_string()))
}

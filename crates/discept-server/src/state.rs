//! Shared application state: configuration and the live editing sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use discept_core::DisceptConfig;
use discept_model::AlignmentDocument;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::info;

/// One client's working document.
pub struct Session {
    pub id: String,
    pub document: Mutex<AlignmentDocument>,
    pub created_at: DateTime<Utc>,
    last_used: AtomicU64,
}

/// Listing entry for `GET /api/sessions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub created_at: String,
    pub languages: Vec<String>,
    pub changed: bool,
}

impl Session {
    pub fn info(&self) -> SessionInfo {
        let doc = self.document.lock();
        SessionInfo {
            id: self.id.clone(),
            created_at: self.created_at.to_rfc3339(),
            languages: doc.get_document_languages(),
            changed: doc.is_changed(),
        }
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: DisceptConfig,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    /// Logical clock for least-recently-used eviction.
    clock: AtomicU64,
}

impl AppState {
    pub fn new(config: DisceptConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Open a session on the demo document, evicting the least recently
    /// used session when the limit is reached.
    pub fn create_session(&self) -> Arc<Session> {
        let session = Arc::new(Session {
            id: uuid::Uuid::new_v4().to_string(),
            document: Mutex::new(AlignmentDocument::demo()),
            created_at: Utc::now(),
            last_used: AtomicU64::new(self.tick()),
        });

        let mut sessions = self.sessions.write();
        while sessions.len() >= self.config.max_sessions {
            let oldest = sessions
                .values()
                .min_by_key(|s| s.last_used.load(Ordering::Relaxed))
                .map(|s| s.id.clone());
            match oldest {
                Some(id) => {
                    info!("Evicting idle session {}", id);
                    sessions.remove(&id);
                }
                None => break,
            }
        }
        sessions.insert(session.id.clone(), session.clone());
        info!("Opened session {} ({} live)", session.id, sessions.len());
        session
    }

    /// Look up a session and mark it as used.
    pub fn session(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.read().get(id).cloned()?;
        session.last_used.store(self.tick(), Ordering::Relaxed);
        Some(session)
    }

    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self.sessions.read().values().map(|s| s.info()).collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        infos
    }

    pub fn remove_session(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }
}

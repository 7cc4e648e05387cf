//! Canonical conversation log, kept in step with the backend.
//!
//! Every fetch is stamped with a generation number. Only the fetch holding
//! the latest generation may land, so an older fetch that resolves late can
//! never overwrite a newer snapshot. [`HistorySynchronizer::replace`] also
//! bumps the generation: a server-confirmed log always beats a snapshot
//! requested before it.
use crate::api::RagBackend;
use crate::lock;
use crate::types::{ChatEntry, ChatHistory};
use std::sync::{Arc, Mutex};

pub const HISTORY_LOAD_ERROR: &str = "Could not load the conversation history. Try reloading.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryStatus {
    Loading,
    Ready,
    Failed(String),
}

struct HistoryState {
    entries: ChatHistory,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

pub struct HistorySynchronizer {
    backend: Arc<dyn RagBackend>,
    state: Mutex<HistoryState>,
}

impl HistorySynchronizer {
    /// Starts in `Loading`; call [`refresh`](Self::refresh) to populate.
    pub fn new(backend: Arc<dyn RagBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(HistoryState {
                entries: Vec::new(),
                loading: true,
                error: None,
                generation: 0,
            }),
        }
    }

    /// Fetches the server log. Returns `false` when a later fetch or
    /// replacement superseded this one and its result was dropped.
    pub async fn refresh(&self) -> bool {
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.loading = true;
            state.error = None;
            state.generation
        };

        let fetched = self.backend.fetch_history().await;

        let mut state = lock(&self.state);
        if state.generation != generation {
            tracing::debug!(generation, latest = state.generation, "dropping superseded history fetch");
            return false;
        }
        match fetched {
            Ok(entries) => {
                tracing::debug!(entries = entries.len(), "history loaded");
                state.entries = entries;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load history");
                state.error = Some(err.user_message(HISTORY_LOAD_ERROR));
            }
        }
        state.loading = false;
        true
    }

    /// Swaps in a server-confirmed log wholesale.
    pub fn replace(&self, entries: ChatHistory) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.entries = entries;
        state.loading = false;
        state.error = None;
    }

    /// Empties the log, then reconciles with the server.
    ///
    /// Only the destructive-action coordinator calls this, after the backend
    /// accepted the clear.
    pub(crate) async fn clear(&self) {
        self.replace(Vec::new());
        self.refresh().await;
    }

    pub fn entries(&self) -> ChatHistory {
        lock(&self.state).entries.clone()
    }

    pub fn last_entry(&self) -> Option<ChatEntry> {
        lock(&self.state).entries.last().cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    pub fn status(&self) -> HistoryStatus {
        let state = lock(&self.state);
        if state.loading {
            HistoryStatus::Loading
        } else if let Some(error) = &state.error {
            HistoryStatus::Failed(error.clone())
        } else {
            HistoryStatus::Ready
        }
    }
}

//! Client-side orchestration for a retrieval-augmented chat backend.
//!
//! The crate keeps a conversation log in sync with the backend, dispatches
//! questions to a selectable model, drives document ingestion and gates
//! destructive operations behind an explicit confirmation.
pub mod api;
pub mod config;
pub mod confirm;
pub mod dispatcher;
pub mod history;
pub mod ingest;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, ApiResult, HttpBackend, RagBackend};
pub use config::ClientConfig;
pub use confirm::{
    ActionOutcome, ConfirmationRequest, DestructiveAction, DestructiveActionCoordinator,
    Interaction, NoticeKind,
};
pub use dispatcher::{Dispatch, QueryDispatcher, QueryRequest, QueryState, TriggerId};
pub use history::{HistoryStatus, HistorySynchronizer};
pub use ingest::{IngestionOrchestrator, UploadPayload};
pub use session::ChatSession;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// State guards never panic while held, so a poisoned lock still holds
/// consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

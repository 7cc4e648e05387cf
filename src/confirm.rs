//! Confirmation gate for irreversible operations.
//!
//! Clearing the conversation and wiping the document index only ever happen
//! through [`DestructiveActionCoordinator`]. The wrapped call runs if and
//! only if the user affirms the prompt.
use crate::api::{ApiResult, RagBackend};
use crate::history::HistorySynchronizer;
use crate::ingest::IngestionOrchestrator;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Failure,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

/// User-facing capabilities the orchestration layer needs: a yes/no prompt
/// and fire-and-forget notifications.
#[async_trait]
pub trait Interaction: Send + Sync {
    async fn confirm(&self, request: &ConfirmationRequest) -> bool;

    fn notify(&self, kind: NoticeKind, title: &str, message: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestructiveAction {
    ClearHistory,
    ResetIndex,
}

impl DestructiveAction {
    pub fn confirmation(self) -> ConfirmationRequest {
        let message = match self {
            DestructiveAction::ClearHistory => {
                "Delete the entire conversation history? This cannot be undone."
            }
            DestructiveAction::ResetIndex => {
                "Delete every indexed document from the database? This cannot be undone."
            }
        };
        ConfirmationRequest {
            title: "Confirm".to_string(),
            message: message.to_string(),
            confirm_label: "Yes, delete".to_string(),
            cancel_label: "No, cancel".to_string(),
        }
    }

    fn failure_fallback(self) -> &'static str {
        match self {
            DestructiveAction::ClearHistory => "Could not clear the history.",
            DestructiveAction::ResetIndex => "Unexpected error while contacting the server.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Cancelled,
    Succeeded(String),
    Failed(String),
}

pub struct DestructiveActionCoordinator {
    backend: Arc<dyn RagBackend>,
    interaction: Arc<dyn Interaction>,
    history: Arc<HistorySynchronizer>,
    ingest: Arc<IngestionOrchestrator>,
}

impl DestructiveActionCoordinator {
    pub fn new(
        backend: Arc<dyn RagBackend>,
        interaction: Arc<dyn Interaction>,
        history: Arc<HistorySynchronizer>,
        ingest: Arc<IngestionOrchestrator>,
    ) -> Self {
        Self {
            backend,
            interaction,
            history,
            ingest,
        }
    }

    pub async fn clear_history(&self) -> ActionOutcome {
        self.run(DestructiveAction::ClearHistory).await
    }

    pub async fn reset_index(&self) -> ActionOutcome {
        self.run(DestructiveAction::ResetIndex).await
    }

    pub async fn run(&self, action: DestructiveAction) -> ActionOutcome {
        let request = action.confirmation();
        if !self.interaction.confirm(&request).await {
            tracing::info!(?action, "destructive action cancelled");
            self.interaction.notify(
                NoticeKind::Info,
                "Action cancelled",
                "The operation has been cancelled.",
            );
            return ActionOutcome::Cancelled;
        }

        let result = match action {
            DestructiveAction::ClearHistory => self.execute_clear().await,
            DestructiveAction::ResetIndex => self.execute_reset().await,
        };

        match result {
            Ok(message) => {
                tracing::info!(?action, "destructive action completed");
                self.interaction.notify(NoticeKind::Success, "Done", &message);
                ActionOutcome::Succeeded(message)
            }
            Err(err) => {
                tracing::error!(?action, error = %err, "destructive action failed");
                let message = err.user_message(action.failure_fallback());
                self.interaction.notify(NoticeKind::Failure, "Error", &message);
                ActionOutcome::Failed(message)
            }
        }
    }

    async fn execute_clear(&self) -> ApiResult<String> {
        self.backend.clear_history().await?;
        self.history.clear().await;
        Ok("Conversation history deleted.".to_string())
    }

    async fn execute_reset(&self) -> ApiResult<String> {
        let response = self.backend.reset_index().await?;
        self.ingest.reset_selection();
        if response.message.trim().is_empty() {
            Ok("Document index reset.".to_string())
        } else {
            Ok(response.message)
        }
    }
}

//! Document upload workflow.
//!
//! Holds the current file selection and the result of the last upload.
//! Every failure is folded into an [`UploadResult`] so successes, per-file
//! errors and transport errors all render through the same path.
use crate::api::RagBackend;
use crate::confirm::{Interaction, NoticeKind};
use crate::lock;
use crate::types::{UploadConfig, UploadFile, UploadResult};
use std::sync::{Arc, Mutex};

pub const UPLOAD_ERROR: &str = "An error occurred while uploading the files.";
pub const GENERAL_ERROR_FILE: &str = "General error";

/// A fully resolved ingestion request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPayload {
    pub files: Arc<Vec<UploadFile>>,
    pub config: UploadConfig,
}

impl UploadPayload {
    /// Raw chunk values that are missing or invalid resolve to the defaults
    /// here, so the request always carries both fields.
    pub fn new(
        files: Arc<Vec<UploadFile>>,
        chunk_size: Option<i64>,
        chunk_overlap: Option<i64>,
    ) -> Self {
        Self {
            files,
            config: UploadConfig::resolve(chunk_size, chunk_overlap),
        }
    }
}

struct IngestState {
    selected: Arc<Vec<UploadFile>>,
    result: Option<UploadResult>,
    in_flight: usize,
    // bumped whenever the selection changes so a late upload cannot
    // resurrect a result for files no longer selected
    generation: u64,
    // bumped per upload attempt; only the latest attempt may land
    attempt: u64,
}

pub struct IngestionOrchestrator {
    backend: Arc<dyn RagBackend>,
    interaction: Arc<dyn Interaction>,
    state: Mutex<IngestState>,
}

impl IngestionOrchestrator {
    pub fn new(backend: Arc<dyn RagBackend>, interaction: Arc<dyn Interaction>) -> Self {
        Self {
            backend,
            interaction,
            state: Mutex::new(IngestState {
                selected: Arc::new(Vec::new()),
                result: None,
                in_flight: 0,
                generation: 0,
                attempt: 0,
            }),
        }
    }

    /// Replaces the selection. Any previous result is dropped, even when the
    /// new selection is empty.
    pub fn select_files(&self, files: Vec<UploadFile>) {
        let mut state = lock(&self.state);
        state.selected = Arc::new(files);
        state.result = None;
        state.generation += 1;
    }

    /// Uploads the current selection.
    ///
    /// With nothing selected this only raises a warning and returns `None`;
    /// no request is made and the previous result stays as it was. Otherwise
    /// the previous result is cleared as the attempt starts. When uploads
    /// overlap, the last one issued wins and earlier ones return `None`.
    pub async fn upload(
        &self,
        chunk_size: Option<i64>,
        chunk_overlap: Option<i64>,
    ) -> Option<UploadResult> {
        let (payload, (generation, attempt)) = {
            let mut state = lock(&self.state);
            if state.selected.is_empty() {
                drop(state);
                self.interaction.notify(
                    NoticeKind::Warning,
                    "File selection",
                    "Please select at least one file to upload.",
                );
                return None;
            }
            state.result = None;
            state.in_flight += 1;
            state.attempt += 1;
            let payload = UploadPayload::new(state.selected.clone(), chunk_size, chunk_overlap);
            (payload, (state.generation, state.attempt))
        };

        tracing::info!(
            files = payload.files.len(),
            chunk_size = payload.config.chunk_size(),
            chunk_overlap = payload.config.chunk_overlap(),
            "uploading documents"
        );
        let response = self
            .backend
            .upload_documents(
                &payload.files,
                Some(payload.config.chunk_size()),
                Some(payload.config.chunk_overlap()),
            )
            .await;

        let (result, failure) = match response {
            Ok(result) => {
                tracing::info!(
                    indexed = result.files_indexed.len(),
                    chunks = result.total_chunks,
                    errors = result.errors.len(),
                    "upload finished"
                );
                (result, None)
            }
            Err(err) => {
                tracing::error!(error = %err, "upload failed");
                let message = err.user_message(UPLOAD_ERROR);
                (UploadResult::failed(GENERAL_ERROR_FILE, message.clone()), Some(message))
            }
        };

        {
            let mut state = lock(&self.state);
            state.in_flight -= 1;
            if state.generation != generation {
                tracing::debug!("selection changed during upload, dropping result");
                return None;
            }
            if state.attempt != attempt {
                tracing::debug!(
                    attempt,
                    latest = state.attempt,
                    "superseded upload, dropping result"
                );
                return None;
            }
            state.result = Some(result.clone());
        }
        if let Some(message) = failure {
            self.interaction
                .notify(NoticeKind::Failure, "Ingestion error", &message);
        }
        Some(result)
    }

    /// Drops the selection and the last result. Used after the index is wiped.
    pub(crate) fn reset_selection(&self) {
        self.select_files(Vec::new());
    }

    pub fn selected_files(&self) -> Vec<String> {
        lock(&self.state)
            .selected
            .iter()
            .map(|file| file.name.clone())
            .collect()
    }

    pub fn result(&self) -> Option<UploadResult> {
        lock(&self.state).result.clone()
    }

    pub fn is_uploading(&self) -> bool {
        lock(&self.state).in_flight > 0
    }

    pub fn has_indexed(&self) -> bool {
        lock(&self.state)
            .result
            .as_ref()
            .is_some_and(UploadResult::has_indexed)
    }

    pub fn has_errors(&self) -> bool {
        lock(&self.state)
            .result
            .as_ref()
            .is_some_and(UploadResult::has_errors)
    }
}

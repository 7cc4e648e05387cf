use crate::api::RagBackend;
use crate::confirm::{ActionOutcome, DestructiveActionCoordinator, Interaction};
use crate::dispatcher::{Dispatch, QueryDispatcher};
use crate::history::HistorySynchronizer;
use crate::ingest::IngestionOrchestrator;
use crate::lock;
use crate::types::{ModelCatalog, UploadFile, UploadResult};
use std::sync::{Arc, Mutex};

/// Everything one chat session needs, wired to a single backend.
///
/// All state is rebuilt from the backend by [`ChatSession::load`]; dropping
/// the session discards it.
pub struct ChatSession {
    backend: Arc<dyn RagBackend>,
    history: Arc<HistorySynchronizer>,
    dispatcher: QueryDispatcher,
    ingest: Arc<IngestionOrchestrator>,
    coordinator: DestructiveActionCoordinator,
    catalog: Mutex<ModelCatalog>,
    selected_model: Mutex<Option<String>>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn RagBackend>, interaction: Arc<dyn Interaction>) -> Self {
        let history = Arc::new(HistorySynchronizer::new(backend.clone()));
        let ingest = Arc::new(IngestionOrchestrator::new(
            backend.clone(),
            interaction.clone(),
        ));
        let dispatcher = QueryDispatcher::new(backend.clone(), history.clone());
        let coordinator = DestructiveActionCoordinator::new(
            backend.clone(),
            interaction,
            history.clone(),
            ingest.clone(),
        );
        Self {
            backend,
            history,
            dispatcher,
            ingest,
            coordinator,
            catalog: Mutex::new(ModelCatalog::default()),
            selected_model: Mutex::new(None),
        }
    }

    /// Startup load: the model catalog and the history are requested
    /// concurrently. A failed catalog degrades to an empty one.
    pub async fn load(&self) {
        let (catalog, _) = futures::join!(
            self.backend.list_models_or_empty(),
            self.history.refresh()
        );
        tracing::info!(models = catalog.models.len(), "model catalog loaded");

        let default_model = catalog.first().map(str::to_string);
        *lock(&self.catalog) = catalog;
        let mut selected = lock(&self.selected_model);
        if selected.is_none() {
            *selected = default_model;
        }
    }

    pub fn models(&self) -> ModelCatalog {
        lock(&self.catalog).clone()
    }

    pub fn selected_model(&self) -> Option<String> {
        lock(&self.selected_model).clone()
    }

    /// Selects a model. Blank names are refused and leave the selection
    /// untouched. Names outside the catalog are kept; the backend is the one
    /// that rejects unknown models.
    pub fn select_model(&self, model: impl Into<String>) -> bool {
        let model = model.into();
        let model = model.trim();
        if model.is_empty() {
            return false;
        }
        if !lock(&self.catalog).contains(model) {
            tracing::warn!(model, "selected model is not in the catalog");
        }
        *lock(&self.selected_model) = Some(model.to_string());
        true
    }

    /// Asks `question` with the selected model.
    pub async fn ask(&self, question: &str) -> Dispatch {
        let model = self.selected_model();
        self.dispatcher.submit(model.as_deref(), question).await
    }

    /// Submits whatever is in the question input.
    pub async fn ask_input(&self) -> Dispatch {
        let question = self.dispatcher.question_input();
        self.ask(&question).await
    }

    pub fn select_files(&self, files: Vec<UploadFile>) {
        self.ingest.select_files(files);
    }

    pub async fn upload(
        &self,
        chunk_size: Option<i64>,
        chunk_overlap: Option<i64>,
    ) -> Option<UploadResult> {
        self.ingest.upload(chunk_size, chunk_overlap).await
    }

    pub async fn clear_history(&self) -> ActionOutcome {
        self.coordinator.clear_history().await
    }

    pub async fn reset_index(&self) -> ActionOutcome {
        self.coordinator.reset_index().await
    }

    /// The chat view shows the question error first, then the history one.
    pub fn visible_error(&self) -> Option<String> {
        self.dispatcher.error().or_else(|| self.history.error())
    }

    pub fn history(&self) -> &HistorySynchronizer {
        &self.history
    }

    pub fn dispatcher(&self) -> &QueryDispatcher {
        &self.dispatcher
    }

    pub fn ingest(&self) -> &IngestionOrchestrator {
        &self.ingest
    }
}

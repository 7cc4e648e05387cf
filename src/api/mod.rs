/// Remote service layer for the RAG backend
///
/// Every call is a single-shot request with no retry and no local state
/// mutation. Components above this layer decide what to do with the result.
///
/// # Architecture
///
/// - `RagBackend` - the seam orchestration code depends on (swappable in tests)
/// - `http` - reqwest implementation speaking the backend's REST contract
/// - `error` - `ApiError` and the `detail` error convention
mod error;
mod http;

pub use error::{ApiError, ApiResult};
pub use http::HttpBackend;

use crate::types::{AskResponse, ChatHistory, ModelCatalog, ResetResponse, UploadFile, UploadResult};
use async_trait::async_trait;

#[async_trait]
pub trait RagBackend: Send + Sync {
    /// `GET /models`
    async fn list_models(&self) -> ApiResult<ModelCatalog>;

    /// Best-effort catalog: any failure is logged and yields an empty catalog.
    async fn list_models_or_empty(&self) -> ModelCatalog {
        match self.list_models().await {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!(error = %err, "failed to list models");
                ModelCatalog::default()
            }
        }
    }

    /// `GET /history`
    async fn fetch_history(&self) -> ApiResult<ChatHistory>;

    /// `POST /ask_model`. The returned history is the backend's full log.
    async fn submit_question(&self, model: &str, question: &str) -> ApiResult<AskResponse>;

    /// `POST /clearHistory`. Safe to repeat.
    async fn clear_history(&self) -> ApiResult<()>;

    /// `POST /ingest` as multipart. Chunk fields are left out when `None`.
    async fn upload_documents(
        &self,
        files: &[UploadFile],
        chunk_size: Option<u32>,
        chunk_overlap: Option<u32>,
    ) -> ApiResult<UploadResult>;

    /// `DELETE /reset_embeddings`
    async fn reset_index(&self) -> ApiResult<ResetResponse>;
}

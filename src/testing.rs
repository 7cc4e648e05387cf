//! Test doubles for the orchestration components.
use crate::api::{ApiError, ApiResult, RagBackend};
use crate::confirm::{ConfirmationRequest, Interaction, NoticeKind};
use crate::lock;
use crate::types::{
    AskResponse, ChatEntry, ChatHistory, ModelCatalog, ResetResponse, UploadFile, UploadResult,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

pub(crate) fn entry(question: &str, answer: &str) -> ChatEntry {
    ChatEntry {
        question: question.to_string(),
        answer: answer.to_string(),
        timestamp: "2025-01-01T10:00:00+00:00".to_string(),
    }
}

pub(crate) fn answer(text: &str, history: ChatHistory) -> AskResponse {
    AskResponse {
        answer: text.to_string(),
        history,
        question: None,
        model: None,
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Failure {
    pub status: u16,
    pub detail: Option<String>,
}

impl Failure {
    pub fn detail(status: u16, detail: &str) -> Self {
        Self {
            status,
            detail: Some(detail.to_string()),
        }
    }

    pub fn bare(status: u16) -> Self {
        Self {
            status,
            detail: None,
        }
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        ApiError::Backend {
            status: failure.status,
            detail: failure.detail,
        }
    }
}

pub(crate) type Reply<T> = Result<T, Failure>;

struct Step<T> {
    reply: Reply<T>,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    ListModels,
    FetchHistory,
    Ask { model: String, question: String },
    ClearHistory,
    Upload {
        files: Vec<String>,
        chunk_size: Option<u32>,
        chunk_overlap: Option<u32>,
    },
    ResetIndex,
}

/// Backend whose replies are queued per operation and optionally held back
/// until a gate is released, so tests decide arrival order.
pub(crate) struct ScriptedBackend {
    models: Mutex<Reply<ModelCatalog>>,
    history: Mutex<VecDeque<Step<ChatHistory>>>,
    answers: Mutex<VecDeque<Step<AskResponse>>>,
    clear: Mutex<Reply<()>>,
    uploads: Mutex<VecDeque<Step<UploadResult>>>,
    reset: Mutex<Reply<ResetResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            models: Mutex::new(Ok(ModelCatalog::default())),
            history: Mutex::new(VecDeque::new()),
            answers: Mutex::new(VecDeque::new()),
            clear: Mutex::new(Ok(())),
            uploads: Mutex::new(VecDeque::new()),
            reset: Mutex::new(Ok(ResetResponse::default())),
            calls: Mutex::new(Vec::new()),
        }
    }
}

fn push<T>(queue: &Mutex<VecDeque<Step<T>>>, reply: Reply<T>) {
    lock(queue).push_back(Step { reply, gate: None });
}

fn push_gated<T>(queue: &Mutex<VecDeque<Step<T>>>, reply: Reply<T>) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    lock(queue).push_back(Step {
        reply,
        gate: Some(rx),
    });
    tx
}

async fn take<T>(queue: &Mutex<VecDeque<Step<T>>>, fallback: Reply<T>) -> ApiResult<T> {
    let step = lock(queue).pop_front();
    let reply = match step {
        Some(Step { reply, gate }) => {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            reply
        }
        None => fallback,
    };
    reply.map_err(ApiError::from)
}

impl ScriptedBackend {
    pub fn with_models(self, models: &[&str]) -> Self {
        *lock(&self.models) = Ok(ModelCatalog {
            models: models.iter().map(|m| m.to_string()).collect(),
        });
        self
    }

    pub fn fail_models(self, failure: Failure) -> Self {
        *lock(&self.models) = Err(failure);
        self
    }

    pub fn fail_clear(self, failure: Failure) -> Self {
        *lock(&self.clear) = Err(failure);
        self
    }

    pub fn reset_reply(self, reply: Reply<ResetResponse>) -> Self {
        *lock(&self.reset) = reply;
        self
    }

    pub fn push_history(&self, reply: Reply<ChatHistory>) {
        push(&self.history, reply);
    }

    pub fn push_gated_history(&self, reply: Reply<ChatHistory>) -> oneshot::Sender<()> {
        push_gated(&self.history, reply)
    }

    pub fn push_answer(&self, reply: Reply<AskResponse>) {
        push(&self.answers, reply);
    }

    pub fn push_gated_answer(&self, reply: Reply<AskResponse>) -> oneshot::Sender<()> {
        push_gated(&self.answers, reply)
    }

    pub fn push_upload(&self, reply: Reply<UploadResult>) {
        push(&self.uploads, reply);
    }

    pub fn push_gated_upload(&self, reply: Reply<UploadResult>) -> oneshot::Sender<()> {
        push_gated(&self.uploads, reply)
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, wanted: fn(&Call) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| wanted(call)).count()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl RagBackend for ScriptedBackend {
    async fn list_models(&self) -> ApiResult<ModelCatalog> {
        self.record(Call::ListModels);
        let reply = lock(&self.models).clone();
        reply.map_err(ApiError::from)
    }

    async fn fetch_history(&self) -> ApiResult<ChatHistory> {
        self.record(Call::FetchHistory);
        take(&self.history, Ok(Vec::new())).await
    }

    async fn submit_question(&self, model: &str, question: &str) -> ApiResult<AskResponse> {
        self.record(Call::Ask {
            model: model.to_string(),
            question: question.to_string(),
        });
        take(&self.answers, Err(Failure::bare(500))).await
    }

    async fn clear_history(&self) -> ApiResult<()> {
        self.record(Call::ClearHistory);
        let reply = lock(&self.clear).clone();
        reply.map_err(ApiError::from)
    }

    async fn upload_documents(
        &self,
        files: &[UploadFile],
        chunk_size: Option<u32>,
        chunk_overlap: Option<u32>,
    ) -> ApiResult<UploadResult> {
        self.record(Call::Upload {
            files: files.iter().map(|f| f.name.clone()).collect(),
            chunk_size,
            chunk_overlap,
        });
        take(&self.uploads, Err(Failure::bare(500))).await
    }

    async fn reset_index(&self) -> ApiResult<ResetResponse> {
        self.record(Call::ResetIndex);
        let reply = lock(&self.reset).clone();
        reply.map_err(ApiError::from)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

/// Answers every confirmation the same way and keeps what it was shown.
pub(crate) struct RecordingInteraction {
    affirm: bool,
    confirmations: Mutex<Vec<ConfirmationRequest>>,
    notices: Mutex<Vec<Notice>>,
}

impl RecordingInteraction {
    pub fn confirming() -> Self {
        Self::answering(true)
    }

    pub fn cancelling() -> Self {
        Self::answering(false)
    }

    fn answering(affirm: bool) -> Self {
        Self {
            affirm,
            confirmations: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn confirmations(&self) -> Vec<ConfirmationRequest> {
        lock(&self.confirmations).clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn last_notice(&self) -> Option<Notice> {
        lock(&self.notices).last().cloned()
    }
}

#[async_trait]
impl Interaction for RecordingInteraction {
    async fn confirm(&self, request: &ConfirmationRequest) -> bool {
        lock(&self.confirmations).push(request.clone());
        self.affirm
    }

    fn notify(&self, kind: NoticeKind, title: &str, message: &str) {
        lock(&self.notices).push(Notice {
            kind,
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

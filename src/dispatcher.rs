//! Question submission with stale-result suppression.
//!
//! Each accepted submission gets a [`TriggerId`] strictly greater than every
//! id issued before it. The backend cannot cancel a request, so the only
//! guard against an answer landing under the wrong question is at merge
//! time: a response is applied only while its id is still the latest one.
use crate::api::{ApiResult, RagBackend};
use crate::history::HistorySynchronizer;
use crate::lock;
use crate::types::AskResponse;
use std::fmt;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

pub const ASK_ERROR: &str = "Unexpected error from the API.";

/// Identifies one submission attempt. Derived from the submission time in
/// milliseconds, bumped when two submissions share a millisecond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerId(u64);

impl TriggerId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRequest {
    pub model: String,
    pub question: String,
    pub trigger: TriggerId,
}

/// `Answered` and `Failed` are idle states that remember how the latest
/// submission ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Pending(TriggerId),
    Answered(TriggerId),
    Failed(TriggerId),
}

/// What became of a call to [`QueryDispatcher::submit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Model or question missing; nothing was sent.
    Rejected,
    /// The response belonged to the latest submission and was merged.
    Applied(TriggerId),
    /// A newer submission superseded this one; its response was dropped.
    Discarded(TriggerId),
}

struct DispatchState {
    latest: Option<TriggerId>,
    state: QueryState,
    error: Option<String>,
    question_input: String,
    last_answer: Option<String>,
}

pub struct QueryDispatcher {
    backend: Arc<dyn RagBackend>,
    history: Arc<HistorySynchronizer>,
    state: Mutex<DispatchState>,
}

fn now_millis() -> u64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    u64::try_from(millis).unwrap_or(0)
}

impl QueryDispatcher {
    pub fn new(backend: Arc<dyn RagBackend>, history: Arc<HistorySynchronizer>) -> Self {
        Self {
            backend,
            history,
            state: Mutex::new(DispatchState {
                latest: None,
                state: QueryState::Idle,
                error: None,
                question_input: String::new(),
                last_answer: None,
            }),
        }
    }

    /// Submits `question` to `model` and merges the answer if it is still
    /// wanted when it arrives.
    pub async fn submit(&self, model: Option<&str>, question: &str) -> Dispatch {
        let Some(request) = self.begin(model, question) else {
            return Dispatch::Rejected;
        };
        let result = self
            .backend
            .submit_question(&request.model, &request.question)
            .await;
        self.complete(request.trigger, result)
    }

    /// Validates the input and registers a new latest submission.
    ///
    /// Returns `None` without touching any state when the model or question
    /// is blank.
    pub fn begin(&self, model: Option<&str>, question: &str) -> Option<QueryRequest> {
        let model = model.map(str::trim).filter(|m| !m.is_empty())?;
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        let mut state = lock(&self.state);
        let floor = state.latest.map_or(0, |latest| latest.0 + 1);
        let trigger = TriggerId(now_millis().max(floor));
        state.latest = Some(trigger);
        state.state = QueryState::Pending(trigger);
        state.error = None;
        state.question_input.clear();
        tracing::debug!(%trigger, model, "question submitted");

        Some(QueryRequest {
            model: model.to_string(),
            question: question.to_string(),
            trigger,
        })
    }

    /// Merges the response for `trigger`, or drops it if a newer submission
    /// has been issued since.
    pub fn complete(&self, trigger: TriggerId, result: ApiResult<AskResponse>) -> Dispatch {
        let mut state = lock(&self.state);
        if state.latest != Some(trigger) {
            tracing::debug!(%trigger, latest = ?state.latest, "discarding stale answer");
            return Dispatch::Discarded(trigger);
        }

        match result {
            Ok(response) => {
                self.history.replace(response.history);
                state.last_answer = Some(response.answer);
                state.question_input.clear();
                state.error = None;
                state.state = QueryState::Answered(trigger);
            }
            Err(err) => {
                tracing::error!(%trigger, error = %err, "question failed");
                state.error = Some(err.user_message(ASK_ERROR));
                state.state = QueryState::Failed(trigger);
            }
        }
        Dispatch::Applied(trigger)
    }

    pub fn state(&self) -> QueryState {
        lock(&self.state).state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state(), QueryState::Pending(_))
    }

    pub fn latest_trigger(&self) -> Option<TriggerId> {
        lock(&self.state).latest
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    pub fn last_answer(&self) -> Option<String> {
        lock(&self.state).last_answer.clone()
    }

    pub fn question_input(&self) -> String {
        lock(&self.state).question_input.clone()
    }

    pub fn set_question_input(&self, text: impl Into<String>) {
        lock(&self.state).question_input = text.into();
    }
}

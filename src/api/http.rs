use super::{ApiError, ApiResult, RagBackend};
use crate::config::ClientConfig;
use crate::types::{AskResponse, ChatHistory, ModelCatalog, ResetResponse, UploadFile, UploadResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct HttpBackend {
    client: Client,
    config: ClientConfig,
}

#[derive(Serialize)]
struct AskRequest<'a> {
    model: &'a str,
    question: &'a str,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::from_response(status.as_u16(), &body))
        }
    }
}

fn upload_form(
    files: &[UploadFile],
    chunk_size: Option<u32>,
    chunk_overlap: Option<u32>,
) -> ApiResult<Form> {
    let mut form = Form::new();
    for file in files {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())?;
        form = form.part("files", part);
    }
    if let Some(size) = chunk_size {
        form = form.text("chunk_size", size.to_string());
    }
    if let Some(overlap) = chunk_overlap {
        form = form.text("chunk_overlap", overlap.to_string());
    }
    Ok(form)
}

#[async_trait]
impl RagBackend for HttpBackend {
    async fn list_models(&self) -> ApiResult<ModelCatalog> {
        tracing::debug!("GET /models");
        self.send_json(self.client.get(self.config.url("models")))
            .await
    }

    async fn fetch_history(&self) -> ApiResult<ChatHistory> {
        tracing::debug!("GET /history");
        self.send_json(self.client.get(self.config.url("history")))
            .await
    }

    async fn submit_question(&self, model: &str, question: &str) -> ApiResult<AskResponse> {
        tracing::debug!(model, "POST /ask_model");
        let request = self
            .client
            .post(self.config.url("ask_model"))
            .json(&AskRequest { model, question });
        self.send_json(request).await
    }

    async fn clear_history(&self) -> ApiResult<()> {
        tracing::debug!("POST /clearHistory");
        self.send(self.client.post(self.config.url("clearHistory")))
            .await?;
        Ok(())
    }

    async fn upload_documents(
        &self,
        files: &[UploadFile],
        chunk_size: Option<u32>,
        chunk_overlap: Option<u32>,
    ) -> ApiResult<UploadResult> {
        tracing::debug!(files = files.len(), ?chunk_size, ?chunk_overlap, "POST /ingest");
        let form = upload_form(files, chunk_size, chunk_overlap)?;
        let request = self
            .client
            .post(self.config.url("ingest"))
            .multipart(form);
        self.send_json(request).await
    }

    async fn reset_index(&self) -> ApiResult<ResetResponse> {
        tracing::debug!("DELETE /reset_embeddings");
        self.send_json(self.client.delete(self.config.url("reset_embeddings")))
            .await
    }
}

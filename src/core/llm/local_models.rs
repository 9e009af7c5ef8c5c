//! Self-hosted chat models
//!
//! OpenAI-compatible endpoints running on the learner's own machine. The
//! registry probes each model's health route and forwards chat messages to
//! whichever ones answered.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
pub const CHAT_TEMPERATURE: f32 = 0.7;
pub const CHAT_MAX_TOKENS: u32 = 2000;

/// Returned when a model answers with no usable choice
pub const EMPTY_RESPONSE: &str = "模型响应为空";

#[derive(Debug, thiserror::Error)]
pub enum LocalModelError {
    #[error("Model {0} has no endpoint configured")]
    NoEndpoint(String),

    #[error("Model {0} is currently unavailable")]
    Unavailable(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, LocalModelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelLanguage {
    Chinese,
    English,
    Multilingual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model_size: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Set by the last health scan, never persisted
    #[serde(skip)]
    pub available: bool,
    #[serde(default)]
    pub language: Option<ModelLanguage>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl LocalModel {
    fn builtin(
        id: &str,
        name: &str,
        description: &str,
        provider: &str,
        size: &str,
        capabilities: &[&str],
        language: ModelLanguage,
        port: u16,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            provider: provider.to_string(),
            model_size: Some(size.to_string()),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            available: false,
            language: Some(language),
            endpoint: Some(format!("http://localhost:{port}/v1/chat/completions")),
            api_key: None,
        }
    }

    /// `{endpoint}/health`, or `None` without an endpoint
    pub fn health_url(&self) -> Option<String> {
        self.endpoint
            .as_deref()
            .map(|ep| format!("{}/health", ep.trim_end_matches('/')))
    }
}

/// The models probed when the config names none
pub fn default_models() -> Vec<LocalModel> {
    use ModelLanguage::*;
    vec![
        LocalModel::builtin(
            "qwen-7b",
            "通义千问 7B",
            "阿里云开源中文大模型，适合对话和文本生成",
            "阿里云",
            "7B",
            &["中文对话", "文本生成", "代码生成", "翻译"],
            Chinese,
            8000,
        ),
        LocalModel::builtin(
            "chatglm3-6b",
            "ChatGLM3 6B",
            "清华大学开源对话模型，支持中英文",
            "清华大学",
            "6B",
            &["中英文对话", "代码生成", "数学推理"],
            Multilingual,
            8001,
        ),
        LocalModel::builtin(
            "baichuan2-7b",
            "百川2 7B",
            "百川智能开源模型，中文能力强",
            "百川智能",
            "7B",
            &["中文理解", "知识问答", "创意写作"],
            Chinese,
            8002,
        ),
        LocalModel::builtin(
            "llama2-7b",
            "Llama 2 7B",
            "Meta开源模型，英文能力优秀",
            "Meta",
            "7B",
            &["英文对话", "推理分析", "代码生成"],
            English,
            8003,
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelStatus {
    pub total_models: usize,
    pub available_models: usize,
    pub last_checked: Option<DateTime<Utc>>,
}

/// Stateless HTTP side: one probe or one chat call at a time
#[derive(Debug, Clone)]
pub struct LocalModelClient {
    client: Client,
    health_timeout: Duration,
}

impl LocalModelClient {
    pub fn new(health_timeout: Duration) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, health_timeout })
    }

    /// True only when `{endpoint}/health` answers 2xx within the timeout
    pub async fn check_availability(&self, model: &LocalModel) -> bool {
        let Some(url) = model.health_url() else {
            return false;
        };

        match self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!(model = %model.id, error = %e, "Local model not reachable");
                false
            }
        }
    }

    pub async fn send_message(&self, model: &LocalModel, messages: &[ChatMessage]) -> Result<String> {
        let endpoint = model
            .endpoint
            .as_deref()
            .ok_or_else(|| LocalModelError::NoEndpoint(model.name.clone()))?;

        let body = serde_json::json!({
            "model": model.id,
            "messages": messages,
            "temperature": CHAT_TEMPERATURE,
            "max_tokens": CHAT_MAX_TOKENS,
            "stream": false,
        });

        let mut request = self
            .client
            .post(endpoint)
            .header("content-type", "application/json")
            .json(&body);
        if let Some(key) = model.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(model = %model.id, status = status.as_u16(), "Local model call failed");
            return Err(LocalModelError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let json: serde_json::Value = resp.json().await?;
        let content = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["message"]["content"].as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(EMPTY_RESPONSE);

        Ok(content.to_string())
    }
}

/// Known models plus their last scan result
pub struct LocalModelRegistry {
    client: LocalModelClient,
    models: Vec<LocalModel>,
    last_checked: Option<DateTime<Utc>>,
}

impl LocalModelRegistry {
    pub fn new(client: LocalModelClient, models: Vec<LocalModel>) -> Self {
        Self {
            client,
            models,
            last_checked: None,
        }
    }

    pub fn models(&self) -> &[LocalModel] {
        &self.models
    }

    pub fn model(&self, id: &str) -> Option<&LocalModel> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Probe every model concurrently and record which ones answered
    pub async fn scan(&mut self) -> ModelStatus {
        let client = &self.client;
        let results = join_all(self.models.iter().map(|m| client.check_availability(m))).await;

        for (model, available) in self.models.iter_mut().zip(results) {
            model.available = available;
        }
        self.last_checked = Some(Utc::now());

        let status = self.status();
        tracing::info!(
            total = status.total_models,
            available = status.available_models,
            "Local model scan finished"
        );
        status
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            total_models: self.models.len(),
            available_models: self.models.iter().filter(|m| m.available).count(),
            last_checked: self.last_checked,
        }
    }

    /// Chat with a model that passed the last scan
    pub async fn send_message(&self, model_id: &str, messages: &[ChatMessage]) -> Result<String> {
        let model = self
            .model(model_id)
            .ok_or_else(|| LocalModelError::UnknownModel(model_id.to_string()))?;
        if !model.available {
            return Err(LocalModelError::Unavailable(model.name.clone()));
        }
        self.client.send_message(model, messages).await
    }
}

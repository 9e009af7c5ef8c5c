//! LLM Client Module
//!
//! Only self-hosted, OpenAI-compatible models are supported; see
//! `local_models`.

pub mod local_models;

pub use local_models::{
    default_models, ChatMessage, LocalModel, LocalModelClient, LocalModelError,
    LocalModelRegistry, ModelLanguage, ModelStatus, DEFAULT_HEALTH_TIMEOUT,
};

//! AI provider adapters.
//!
//! A single reqwest client for OpenAI-compatible chat-completions endpoints
//! backs both the `ContentGenerator` and `AnswerGrader` ports.

mod chat_client;
mod dto;

pub use chat_client::{ChatClientConfig, ChatClientError, ChatCompletionsClient};

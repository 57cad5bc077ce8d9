//! Reqwest-backed client for an OpenAI-compatible chat-completions API.
//!
//! One client serves both AI ports. It owns transport details only: prompt
//! assembly, the request timeout, HTTP status mapping, fence stripping, and
//! strict JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::dto::{ChatMessageDto, ChatRequestDto, ChatResponseDto, GeneratedModuleDto, GradingDto};
use crate::domain::ports::{
    AiProviderError, AnswerGrader, ContentGenerator, GENERATED_OPEN_COUNT, GENERATED_QCM_COUNT,
    GeneratedModule, GenerationRequest, GradingItem, OPEN_POINTS_PER_QUESTION,
};

const GENERATION_TEMPERATURE: f32 = 0.7;
const GRADING_TEMPERATURE: f32 = 0.0;
const GENERATION_SYSTEM_PROMPT: &str = "You generate teaching material. Reply with valid JSON \
     only, without markdown.";

/// Connection settings for the chat-completions endpoint.
#[derive(Clone)]
pub struct ChatClientConfig {
    /// API root such as `https://api.openai.com/v1`.
    pub base_url: Url,
    pub api_key: Zeroizing<String>,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ChatClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Chat-completions adapter implementing [`ContentGenerator`] and
/// [`AnswerGrader`].
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    model: String,
}

impl ChatCompletionsClient {
    /// Build the client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint URL cannot be derived or the
    /// reqwest client cannot be constructed.
    pub fn new(config: ChatClientConfig) -> Result<Self, ChatClientError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let endpoint = completions_endpoint(&config.base_url)?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model: config.model,
        })
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, AiProviderError> {
        let body = ChatRequestDto {
            model: &self.model,
            messages: [
                ChatMessageDto {
                    role: "system",
                    content: system,
                },
                ChatMessageDto {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }

        let decoded: ChatResponseDto = serde_json::from_slice(bytes.as_ref())
            .map_err(|err| AiProviderError::decode(format!("invalid completion payload: {err}")))?;
        decoded.into_text().map_err(AiProviderError::decode)
    }
}

/// Failure while building the client.
#[derive(Debug, thiserror::Error)]
pub enum ChatClientError {
    #[error("invalid AI base url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn completions_endpoint(base_url: &Url) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
}

#[async_trait]
impl ContentGenerator for ChatCompletionsClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedModule, AiProviderError> {
        let prompt = generation_prompt(request);
        let text = self
            .complete(GENERATION_SYSTEM_PROMPT, &prompt, GENERATION_TEMPERATURE)
            .await?;
        let dto: GeneratedModuleDto = decode_json(&text)?;
        let module = dto.into_domain().map_err(AiProviderError::decode)?;
        debug!(
            course = %request.course_slug,
            module = %request.module_number,
            qcm = module.questions.qcm.len(),
            open = module.questions.open.len(),
            "decoded generated module"
        );
        Ok(module)
    }
}

#[async_trait]
impl AnswerGrader for ChatCompletionsClient {
    async fn grade(&self, items: &[GradingItem]) -> Result<Vec<u32>, AiProviderError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let system = grading_system_prompt(items.len());
        let text = self
            .complete(&system, &grading_prompt(items), GRADING_TEMPERATURE)
            .await?;
        let dto: GradingDto = decode_json(&text)?;
        validate_scores(dto.scores, items.len())
    }
}

fn generation_prompt(request: &GenerationRequest) -> String {
    format!(
        "Write module {number}/10 of the course \"{title}\" (level: {level}).\n\
         Return only a JSON object with exactly these fields:\n\
         {{\"title\": string, \"explanation\": string (at least 300 words, in paragraphs), \
         \"examples\": [{{\"title\": string, \"description\": string, \"code\": string or null}}], \
         \"exercise\": {{\"title\": string, \"description\": string, \"hint\": string}}, \
         \"qcm_questions\": [{{\"question\": string, \"options\": [string], \
         \"correct\": zero-based index, \"explanation\": string}}], \
         \"open_questions\": [{{\"question\": string, \"expected_answer\": string}}]}}\n\
         Produce exactly {GENERATED_QCM_COUNT} qcm_questions with four options each \
         and exactly {GENERATED_OPEN_COUNT} open_questions.",
        number = request.module_number,
        title = request.course_title,
        level = request.course_level,
    )
}

fn grading_system_prompt(count: usize) -> String {
    format!(
        "You are a fair grader. Score {count} answers, each from 0 to \
         {OPEN_POINTS_PER_QUESTION}. A broadly correct answer earns at least 3. \
         Reply with JSON only, shaped as {{\"scores\": [integer, ...]}} with one score per answer \
         in order."
    )
}

fn grading_prompt(items: &[GradingItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            format!(
                "Question {n}: {question}\nExpected answer: {expected}\nLearner answer: {answer}",
                n = index + 1,
                question = item.question,
                expected = item.expected_answer,
                answer = item.learner_answer.as_deref().unwrap_or("(no answer)"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Remove a surrounding markdown code fence, with or without a language tag.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, AiProviderError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|err| {
        AiProviderError::decode(format!("model output is not the expected JSON: {err}"))
    })
}

fn validate_scores(scores: Vec<u32>, expected: usize) -> Result<Vec<u32>, AiProviderError> {
    if scores.len() != expected {
        return Err(AiProviderError::decode(format!(
            "expected {expected} scores, got {}",
            scores.len()
        )));
    }
    if let Some(score) = scores.iter().find(|score| **score > OPEN_POINTS_PER_QUESTION) {
        return Err(AiProviderError::decode(format!(
            "score {score} exceeds {OPEN_POINTS_PER_QUESTION}"
        )));
    }
    Ok(scores)
}

fn map_transport_error(error: reqwest::Error) -> AiProviderError {
    if error.is_timeout() {
        warn!("AI provider request timed out");
    }
    AiProviderError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AiProviderError {
    debug!(status = status.as_u16(), body = %body_preview(body), "AI provider rejected request");
    match status {
        StatusCode::TOO_MANY_REQUESTS => AiProviderError::rate_limited(),
        StatusCode::PAYMENT_REQUIRED => AiProviderError::quota_exceeded(),
        _ => AiProviderError::upstream(status.as_u16()),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
#[path = "chat_client_tests.rs"]
mod tests;

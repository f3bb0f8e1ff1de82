use std::cell::RefCell;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::error::AgentError;

/// One prompt in, one completion out. Every model-backed component in the
/// crate (field mapping, CV structuring, cover letters) goes through this.
pub trait TextInference {
    fn infer_text(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Model calls can take a while on local hardware.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

fn http_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::blocking::Client::new())
}

/// Pull the body out of a fenced code block, if the model wrapped its answer
/// in one. A one-word language tag on the opening fence (`json`, `yaml`, ...)
/// is dropped, whether it sits on its own line or in front of a one-line
/// body such as `json {...}`. Text without a fence is returned trimmed.
pub fn extract_fenced(content: &str) -> &str {
    let Some(open) = content.find("```") else {
        return content.trim();
    };

    let rest = &content[open + 3..];
    let inner = match rest.find("```") {
        Some(close) => &rest[..close],
        None => rest,
    };

    let body = match inner.split_once('\n') {
        Some((tag, body)) if is_language_tag(tag) => body,
        None if is_language_tag(inner) => "",
        _ => strip_inline_tag(inner),
    };

    body.trim()
}

/// Tags recognized in front of a body that does not open with `{` or `[`.
const INLINE_TAGS: [&str; 3] = ["json", "yaml", "yml"];

/// `json {...}` or `json{...}`: a tag word glued to the first line of the body.
fn strip_inline_tag(inner: &str) -> &str {
    let trimmed = inner.trim_start();
    if !trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return inner;
    }

    let word_end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+'))
        .unwrap_or(trimmed.len());
    let (word, rest) = trimmed.split_at(word_end);
    let body = rest.trim_start_matches([' ', '\t']);
    let separated = body.len() < rest.len();

    if body.starts_with(['{', '[']) {
        return body;
    }
    if separated && INLINE_TAGS.contains(&word.to_ascii_lowercase().as_str()) {
        return body;
    }
    inner
}

fn is_language_tag(line: &str) -> bool {
    let tag = line.trim();
    tag.is_empty()
        || tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+')
}

// ============================================================================
// Ollama Backend
// ============================================================================

pub struct OllamaBackend {
    pub endpoint: String,
    pub model: String,
    client: reqwest::blocking::Client,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new("http://localhost:11434/api/generate", "qwen2.5:1.5b")
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            client: http_client(),
        }
    }
}

impl TextInference for OllamaBackend {
    fn infer_text(&self, prompt: &str) -> Result<String, AgentError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "ollama request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| AgentError::Model(format!("ollama: {}", e)))?;

        let body: OllamaResponse = response
            .json()
            .map_err(|e| AgentError::Model(format!("ollama response: {}", e)))?;

        Ok(body.response)
    }
}

// ============================================================================
// OpenAI-compatible chat completions backend
// ============================================================================

pub struct OpenAiBackend {
    pub endpoint: String,
    pub model: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

impl OpenAiBackend {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            client: http_client(),
        }
    }
}

impl TextInference for OpenAiBackend {
    fn infer_text(&self, prompt: &str) -> Result<String, AgentError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            temperature: 0.2,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "chat completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| AgentError::Model(format!("chat completion: {}", e)))?;

        let body: ChatCompletionResponse = response
            .json()
            .map_err(|e| AgentError::Model(format!("chat completion response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AgentError::Model("chat completion returned no choices".into()))
    }
}

// ============================================================================
// Mock Backend (for testing without a model server)
// ============================================================================

/// Returns a canned response and remembers every prompt it was given.
/// With no response configured, every call fails like an unreachable server.
pub struct MockTextInference {
    pub response: Option<String>,
    prompts: RefCell<Vec<String>>,
}

impl MockTextInference {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            response: None,
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl TextInference for MockTextInference {
    fn infer_text(&self, prompt: &str) -> Result<String, AgentError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.response
            .clone()
            .ok_or_else(|| AgentError::Model("mock backend unavailable".into()))
    }
}

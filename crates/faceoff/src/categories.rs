//! Category generation through an OpenAI-compatible chat completions API.

use std::future::Future;

use faceoff_game::{CategoryError, CategorySource};
use reqwest::StatusCode;
use serde_json::{Value, json};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const SYSTEM_PROMPT: &str = "You design categories for a fast-paced word association party game. \
Every category is specific and concrete, so players can instantly name three or more examples.";

/// Asks a chat model for category labels.
///
/// Wrap it in [`ResilientCategories`](faceoff_game::ResilientCategories):
/// this source makes one request per call and reports every failure.
#[derive(Clone)]
pub struct OpenAiCategories {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCategories {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_API_BASE.to_owned(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_API_BASE`.
    /// Returns `None` when no key is set.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let mut source = Self::new(var("OPENAI_API_KEY")?);
        if let Some(model) = var("OPENAI_MODEL") {
            source = source.with_model(model);
        }
        if let Some(base) = var("OPENAI_API_BASE") {
            source = source.with_base_url(base);
        }
        Some(source)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, count: usize) -> Value {
        let prompt = format!(
            "Generate {count} unique game categories. Each must come from a different \
             subject area, be family-friendly, and not start with \"Type of\" or \"Kind of\". \
             Allow at most one category per base phrase (one \"Board Game\" category in total). \
             Reply with a JSON array of {count} strings and nothing else."
        );
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": 2000,
            "temperature": 0.8,
        })
    }

    async fn fetch(&self, count: usize) -> Result<Vec<String>, CategoryError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(count))
            .send()
            .await
            .map_err(|e| CategoryError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(CategoryError::Unavailable(format!(
                "chat completions returned {}",
                status.as_u16()
            )));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| CategoryError::Malformed(e.to_string()))?;

        let content = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| CategoryError::Malformed("response has no message content".into()))?;

        let labels = parse_category_list(content)?;
        tracing::debug!(model = %self.model, requested = count, got = labels.len(), "categories received");
        Ok(labels)
    }
}

// The API key stays out of logs.
impl std::fmt::Debug for OpenAiCategories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCategories")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl CategorySource for OpenAiCategories {
    fn generate(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<String>, CategoryError>> + Send {
        self.fetch(count)
    }
}

/// Extracts labels from a model reply: the outermost `[...]` is parsed as
/// JSON, and each element is either a string or an object with a
/// `category` field.
pub(crate) fn parse_category_list(content: &str) -> Result<Vec<String>, CategoryError> {
    let json = match (content.find('['), content.rfind(']')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    };
    let items: Vec<Value> = serde_json::from_str(json)
        .map_err(|e| CategoryError::Malformed(format!("expected a JSON array: {e}")))?;

    let labels: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(label) => Some(label),
            Value::Object(mut obj) => match obj.remove("category") {
                Some(Value::String(label)) => Some(label),
                _ => None,
            },
            _ => None,
        })
        .collect();

    if labels.is_empty() {
        return Err(CategoryError::Malformed("no category labels in reply".into()));
    }
    Ok(labels)
}

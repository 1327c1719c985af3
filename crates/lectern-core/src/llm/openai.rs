//! The LLM gateway: one structured-output request, no retry, no rate
//! limiting. The rate governor wraps every call made through here.

use std::future::Future;
use std::pin::Pin;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use crate::{Error, Result};

pub const DEFAULT_MODEL: &str = "gpt-5-mini";

const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

/// A file attached to a request; shipped base64-encoded inline.
#[derive(Debug, Clone)]
pub struct LlmFile {
    pub filename: String,
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Structured-output constraint for a request.
#[derive(Debug, Clone)]
pub struct LlmSchema {
    pub name: String,
    pub schema: Value,
}

/// One model invocation: a prompt, an optional file payload, and an
/// optional output schema.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub file: Option<LlmFile>,
    pub schema: Option<LlmSchema>,
}

impl LlmRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        LlmRequest {
            prompt: prompt.into(),
            file: None,
            schema: None,
        }
    }

    pub fn with_schema(mut self, name: &str, schema: Value) -> Self {
        self.schema = Some(LlmSchema {
            name: name.to_string(),
            schema,
        });
        self
    }

    pub fn with_pdf(mut self, filename: &str, data: Vec<u8>) -> Self {
        self.file = Some(LlmFile {
            filename: filename.to_string(),
            data,
            mime_type: "application/pdf".to_string(),
        });
        self
    }
}

/// Anything that can answer a single request with the model's output
/// text. Object-safe so the pipeline can be driven by a mock in tests.
pub trait LanguageModel: Send + Sync {
    fn generate<'a>(
        &'a self,
        request: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Production gateway against the OpenAI Responses API.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: &str) -> Self {
        OpenAiClient {
            http,
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn build_body(&self, request: &LlmRequest) -> Value {
        let mut content = Vec::new();
        if let Some(file) = &request.file {
            let encoded = BASE64.encode(&file.data);
            content.push(json!({
                "type": "input_file",
                "filename": file.filename,
                "file_data": format!("data:{};base64,{}", file.mime_type, encoded),
            }));
        }
        content.push(json!({"type": "input_text", "text": request.prompt}));

        let mut body = json!({
            "model": self.model,
            "input": [{"role": "user", "content": content}],
        });
        if let Some(schema) = &request.schema {
            body["text"] = json!({
                "format": {
                    "type": "json_schema",
                    "name": schema.name,
                    "schema": schema.schema,
                    "strict": true,
                }
            });
        }
        body
    }
}

impl LanguageModel for OpenAiClient {
    fn generate<'a>(
        &'a self,
        request: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let body = self.build_body(request);
            let resp = self
                .http
                .post(RESPONSES_URL)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if status.as_u16() == 429 {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::RateLimited(format!("HTTP 429: {}", truncate(&text))));
            }
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::Upstream(format!("HTTP {status}: {}", truncate(&text))));
            }

            let value: Value = resp
                .json()
                .await
                .map_err(|e| Error::Upstream(format!("response decode failed: {e}")))?;
            extract_output_text(&value)
        })
    }
}

/// Pull the model's output text out of a Responses API payload.
fn extract_output_text(value: &Value) -> Result<String> {
    if let Some(items) = value.get("output").and_then(|o| o.as_array()) {
        for item in items {
            let Some(contents) = item.get("content").and_then(|c| c.as_array()) else {
                continue;
            };
            for part in contents {
                if part.get("type").and_then(|t| t.as_str()) == Some("output_text")
                    && let Some(text) = part.get("text").and_then(|t| t.as_str())
                {
                    return Ok(text.to_string());
                }
            }
        }
    }
    if let Some(text) = value.get("output_text").and_then(|t| t.as_str()) {
        return Ok(text.to_string());
    }
    Err(Error::Upstream("no output_text in model response".into()))
}

fn truncate(text: &str) -> &str {
    if text.len() <= 200 {
        return text;
    }
    let mut end = 200;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

use async_trait::async_trait;
use modelops::{InstalledModelSnapshot, PullPart};
use serde::Serialize;
use std::time::Duration;

use crate::error::RuntimeError;
use crate::host::RuntimeEndpoint;
use crate::provider::{LlmProvider, ProviderInfo, PullStream};
use crate::types::{EmbedResponse, GenerateRequest, GenerateResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ollama-compatible HTTP runtime.
pub struct OllamaProvider {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl OllamaProvider {
    pub fn new(request_timeout: Duration) -> Result<Self, RuntimeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            request_timeout,
        })
    }
}

#[derive(Serialize)]
struct PullBody<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a serde_json::Value>,
    stream: bool,
}

#[derive(Serialize)]
struct EmbedBody<'a> {
    model: &'a str,
    input: &'a str,
}

/// Non-2xx -> `RuntimeError::Status`, preferring the runtime's `{"error": ..}` text.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, RuntimeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RuntimeError::Status {
        status: status.as_u16(),
        body: error_text(&body),
    })
}

fn error_text(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, RuntimeError> {
    let bytes = check(resp).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn list_models(&self, endpoint: &RuntimeEndpoint) -> Result<InstalledModelSnapshot, RuntimeError> {
        let resp = self
            .client
            .get(endpoint.url("/api/tags"))
            .timeout(self.request_timeout)
            .send()
            .await?;
        decode(resp).await
    }

    async fn pull(&self, endpoint: &RuntimeEndpoint, model: &str) -> Result<Box<dyn PullStream>, RuntimeError> {
        // No overall timeout: large models stream for a long time.
        let resp = self
            .client
            .post(endpoint.url("/api/pull"))
            .json(&PullBody { model, stream: true })
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(Box::new(NdjsonPullStream {
            response: resp,
            lines: LineBuffer::default(),
            eof: false,
        }))
    }

    async fn generate(&self, endpoint: &RuntimeEndpoint, req: &GenerateRequest) -> Result<GenerateResponse, RuntimeError> {
        let body = GenerateBody {
            model: &req.model,
            prompt: &req.prompt,
            format: req.format.as_ref(),
            stream: false,
        };
        let resp = self
            .client
            .post(endpoint.url("/api/generate"))
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await?;
        decode(resp).await
    }

    async fn embed(&self, endpoint: &RuntimeEndpoint, model: &str, input: &str) -> Result<EmbedResponse, RuntimeError> {
        let resp = self
            .client
            .post(endpoint.url("/api/embed"))
            .json(&EmbedBody { model, input })
            .timeout(self.request_timeout)
            .send()
            .await?;
        decode(resp).await
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "ollama".to_string(),
        }
    }
}

/// Splits newline-delimited JSON that arrives in arbitrary chunks.
#[derive(Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete non-blank line.
    fn next_line(&mut self) -> Option<String> {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }

    /// Whatever is left once the stream has closed.
    fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

struct NdjsonPullStream {
    response: reqwest::Response,
    lines: LineBuffer,
    eof: bool,
}

#[async_trait]
impl PullStream for NdjsonPullStream {
    async fn next_part(&mut self) -> Option<Result<PullPart, RuntimeError>> {
        loop {
            if let Some(line) = self.lines.next_line() {
                return Some(serde_json::from_str(&line).map_err(RuntimeError::from));
            }
            if self.eof {
                return self
                    .lines
                    .finish()
                    .map(|line| serde_json::from_str(&line).map_err(RuntimeError::from));
            }
            match self.response.chunk().await {
                Ok(Some(chunk)) => self.lines.push(&chunk),
                Ok(None) => self.eof = true,
                Err(e) => {
                    self.eof = true;
                    self.lines = LineBuffer::default();
                    return Some(Err(RuntimeError::Stream(e.to_string())));
                }
            }
        }
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Client for an OpenAI-compatible audio transcription endpoint

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::{Segment, Transcriber, Transcript};
use crate::config::TranscriptionConfig;
use crate::{OrganizerError, Result};

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const API_KEY_FILE: &str = ".open_ai_key";

#[derive(Deserialize)]
struct VerboseResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<ResponseSegment>,
}

#[derive(Deserialize)]
struct ResponseSegment {
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    text: String,
}

/// Whisper API client
pub struct WhisperClient {
    client: Client,
    url: String,
    model: String,
    language: String,
    prompt: Option<String>,
    api_key: String,
    retries: u32,
}

impl WhisperClient {
    pub fn new(config: &TranscriptionConfig, api_key: String, prompt: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            language: config.language.clone(),
            prompt,
            api_key,
            retries: config.retries,
        })
    }

    async fn request(&self, file_name: &str, bytes: Vec<u8>) -> Result<Transcript> {
        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .text("language", self.language.clone());
        if let Some(prompt) = &self.prompt {
            form = form.text("prompt", prompt.clone());
        }

        debug!("Sending transcription request: file={} model={}", file_name, self.model);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrganizerError::Transcription(format!(
                "Transcription service returned status {}: {}",
                status,
                body.trim()
            )));
        }

        let result: VerboseResponse = response.json().await?;
        Ok(Transcript {
            text: result.text,
            segments: result
                .segments
                .into_iter()
                .enumerate()
                .map(|(idx, s)| Segment {
                    start: s.start,
                    end: s.end,
                    text: s.text,
                    part: idx + 1,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, path: &Path) -> Result<Transcript> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| OrganizerError::io(path, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.request(&file_name, bytes.clone()).await {
                Ok(transcript) => return Ok(transcript),
                Err(e) if attempt <= self.retries => {
                    let delay = Duration::from_secs(1 << (attempt - 1).min(6));
                    warn!(
                        "Transcription of {} failed (attempt {}): {}; retrying in {:?}",
                        file_name, attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Resolve the service key: configured file, then `OPENAI_API_KEY`, then
/// `~/.open_ai_key`
pub fn load_api_key(configured: Option<&Path>) -> Result<String> {
    if let Some(path) = configured {
        return read_key_file(path);
    }
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }
    let home_file = dirs::home_dir()
        .map(|home| home.join(API_KEY_FILE))
        .ok_or_else(|| OrganizerError::Config("No API key: home directory not found".to_string()))?;
    read_key_file(&home_file)
}

fn read_key_file(path: &Path) -> Result<String> {
    let key = std::fs::read_to_string(path).map_err(|e| {
        OrganizerError::Config(format!("API key file not found at {}: {}", path.display(), e))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(OrganizerError::Config(format!("API key file {} is empty", path.display())));
    }
    Ok(key.to_string())
}

/// Where `config generate` suggests putting the key
pub fn default_key_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(API_KEY_FILE))
}

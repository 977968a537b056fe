//! Narakeet hosted text-to-speech API
//!
//! Sends the chunk as plain text and receives the rendered WAV bytes.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;

use crate::backend::{SynthesisBackend, SynthesisRequest, VoiceSelector};
use crate::error::{Result, TtsError};

const NARAKEET_API_URL: &str = "https://api.narakeet.com";
const DEFAULT_VOICE: &str = "mickey";

/// Backend for the Narakeet text-to-speech API
pub struct NarakeetBackend {
    api_key: String,
    base_url: String,
    speaker: String,
    client: Client,
}

impl NarakeetBackend {
    /// Create a new Narakeet backend
    pub fn new(api_key: String, base_url: Option<&str>, speaker: Option<&str>) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(TtsError::MissingApiKey {
                backend: "Narakeet".to_string(),
                env_var: "NARAKEET_API_KEY".to_string(),
            });
        }

        Ok(Self {
            api_key,
            base_url: base_url
                .unwrap_or(NARAKEET_API_URL)
                .trim_end_matches('/')
                .to_string(),
            speaker: speaker.unwrap_or(DEFAULT_VOICE).to_string(),
            client: Client::new(),
        })
    }

    fn endpoint(&self, voice: &str) -> String {
        format!(
            "{}/text-to-speech/wav?voice={}",
            self.base_url,
            encode_query_value(voice)
        )
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[async_trait]
impl SynthesisBackend for NarakeetBackend {
    async fn synthesize(&self, request: &SynthesisRequest, output_path: &Path) -> Result<()> {
        let voice = match &request.voice {
            VoiceSelector::Preset(name) => name.as_str(),
            VoiceSelector::Reference(_) => {
                return Err(TtsError::UnsupportedVoice {
                    backend: self.name().to_string(),
                });
            }
        };

        let response = self
            .client
            .post(self.endpoint(voice))
            .header("Accept", "application/octet-stream")
            .header("Content-Type", "text/plain")
            .header("x-api-key", &self.api_key)
            .body(request.text.clone().into_bytes())
            .send()
            .await
            .map_err(|e| TtsError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.message
                } else {
                    error_text
                };

            return Err(match status.as_u16() {
                429 => TtsError::RateLimited { retry_after },
                503 => TtsError::ServerOverloaded { message },
                code => TtsError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let bytes = response.bytes().await.map_err(|e| TtsError::ApiError {
            message: format!("Failed to read response body: {}", e),
            status_code: None,
        })?;

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output_path, &bytes).await?;

        log::debug!(
            "Narakeet returned {} bytes for {} chars",
            bytes.len(),
            request.text.chars().count()
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "Narakeet"
    }

    fn supports_voice_cloning(&self) -> bool {
        false
    }

    fn default_speaker(&self) -> &str {
        &self.speaker
    }
}

/// Percent-encode a query value (unreserved characters pass through)
fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_key() {
        let result = NarakeetBackend::new("  ".to_string(), None, None);
        assert!(matches!(result, Err(TtsError::MissingApiKey { .. })));
    }

    #[test]
    fn test_endpoint() {
        let backend =
            NarakeetBackend::new("key".to_string(), Some("http://localhost:8080/"), None).unwrap();
        assert_eq!(backend.default_speaker(), "mickey");
        assert_eq!(
            backend.endpoint("mai anh"),
            "http://localhost:8080/text-to-speech/wav?voice=mai%20anh"
        );
    }

    #[test]
    fn test_encode_query_value() {
        assert_eq!(encode_query_value("mickey"), "mickey");
        assert_eq!(encode_query_value("Ngọc"), "Ng%E1%BB%8Dc");
    }

    #[tokio::test]
    async fn test_reference_voice_rejected() {
        let backend = NarakeetBackend::new("key".to_string(), None, Some("hoa")).unwrap();
        let request = SynthesisRequest::new(
            "xin chào",
            "vi-vn",
            VoiceSelector::Reference("/tmp/ref.wav".into()),
        );
        let dir = tempfile::tempdir().unwrap();
        let err = backend
            .synthesize(&request, &dir.path().join("out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::UnsupportedVoice { .. }));
        assert!(!backend.supports_voice_cloning());
    }
}

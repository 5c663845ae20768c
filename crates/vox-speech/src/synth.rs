//! Speech synthesis collaborator.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SpeechError, SpeechResult};

/// Speech synthesis collaborator seam.
///
/// The inference engine is opaque: text + voice + speed in, PCM sample
/// chunks at [`crate::audio::SAMPLE_RATE`] out. Engines may stream output in
/// multiple chunks; callers concatenate them in order.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech, returning PCM chunks in playback order.
    async fn synthesize(&self, text: &str, voice: &str, speed: f64)
        -> SpeechResult<Vec<Vec<f32>>>;
}

/// Synthesis request body.
#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a str,
    speed: f64,
}

/// Synthesis response: PCM chunks as float samples.
#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    chunks: Vec<Vec<f32>>,
}

/// HTTP client for a TTS inference endpoint.
pub struct HttpSynthesizer {
    endpoint: String,
    client: Client,
}

impl HttpSynthesizer {
    /// Create a client for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> SpeechResult<Self> {
        let endpoint = std::env::var("TTS_ENDPOINT")
            .map_err(|_| SpeechError::config_error("TTS_ENDPOINT not set"))?;
        Ok(Self::new(endpoint))
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f64,
    ) -> SpeechResult<Vec<Vec<f32>>> {
        debug!(voice, speed, chars = text.len(), "Requesting synthesis");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SynthesisRequest { text, voice, speed })
            .send()
            .await
            .map_err(|e| SpeechError::synthesis(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SpeechError::synthesis(format!(
                "inference endpoint returned {}",
                response.status()
            )));
        }

        let body: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::synthesis(format!("bad response body: {}", e)))?;

        debug!(chunks = body.chunks.len(), "Synthesis response received");
        Ok(body.chunks)
    }
}

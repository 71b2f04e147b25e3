//! HTTP client for the remote effect service.
//!
//! The service answers a render request either with the rendered image or with a JSON error
//! envelope. Which one arrived is decided from the declared `Content-Type` alone: a JSON body is
//! an error even under a `200`, and binary bodies are never decoded as text.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::client::config::ClientConfig;
use crate::foundation::core::{EncodedImage, GridPoint};
use crate::foundation::error::{BrushError, BrushResult};
use crate::model::params::EffectParameters;

/// Everything the stroke endpoint needs to render one stroke.
#[derive(Clone, Copy, Debug)]
pub struct StrokeRequest<'a> {
    pub image: &'a EncodedImage,
    pub path: &'a [GridPoint],
    pub clicks: &'a [GridPoint],
    pub user_input: &'a EffectParameters,
}

impl StrokeRequest<'_> {
    /// Local payload checks, run before anything touches the network.
    pub fn validate(&self) -> BrushResult<()> {
        if !self.image.is_image() {
            return Err(BrushError::validation(format!(
                "stroke image must be an encoded image, got '{}'",
                self.image.media_type()
            )));
        }
        if self.path.is_empty() {
            return Err(BrushError::validation("stroke path must not be empty"));
        }
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct StrokeBody<'a> {
    image: String,
    path: &'a [GridPoint],
    clicks: &'a [GridPoint],
    #[serde(rename = "userInput")]
    user_input: &'a EffectParameters,
}

#[derive(serde::Deserialize)]
struct EffectsEnvelope {
    effects: Vec<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// The remote effect service as seen by the stroke pipeline.
///
/// [`EffectClient`] is the HTTP implementation; tests substitute their own.
#[async_trait]
pub trait EffectService: Send + Sync {
    /// Effect names offered by the service, in service order.
    async fn get_effects(&self) -> BrushResult<Vec<String>>;

    /// Apply `effect_name` to a whole image.
    async fn apply_effect(&self, effect_name: &str, image: &EncodedImage)
    -> BrushResult<EncodedImage>;

    /// Apply `effect_name` along one stroke.
    async fn apply_stroke_effect(
        &self,
        effect_name: &str,
        request: StrokeRequest<'_>,
    ) -> BrushResult<EncodedImage>;
}

/// Stateless HTTP client. Every call is a single attempt.
#[derive(Debug, Clone)]
pub struct EffectClient {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
}

impl EffectClient {
    pub fn new() -> BrushResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> BrushResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrushError::config(format!("build http client: {e}")))?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl EffectService for EffectClient {
    #[tracing::instrument(skip(self))]
    async fn get_effects(&self) -> BrushResult<Vec<String>> {
        let url = self.config.effects_url()?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BrushError::remote(format!(
                "Failed to load effects: {}",
                status_text(status)
            )));
        }
        let envelope: EffectsEnvelope = response
            .json()
            .await
            .map_err(|e| BrushError::remote(format!("malformed effects list: {e}")))?;
        debug!(count = envelope.effects.len(), "loaded effects");
        Ok(envelope.effects)
    }

    #[tracing::instrument(skip(self, image), fields(image_len = image.len()))]
    async fn apply_effect(
        &self,
        effect_name: &str,
        image: &EncodedImage,
    ) -> BrushResult<EncodedImage> {
        if !image.is_image() {
            return Err(BrushError::validation(format!(
                "image must be an encoded image, got '{}'",
                image.media_type()
            )));
        }
        let url = self.config.render_url(effect_name)?;
        let part = reqwest::multipart::Part::bytes(image.as_bytes().to_vec())
            .file_name("image")
            .mime_str(image.media_type())
            .map_err(|e| BrushError::validation(format!("invalid media type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let start = Instant::now();
        let response = self.http.post(url).multipart(form).send().await?;
        let out = read_image_response(response).await?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            result_len = out.len(),
            "effect applied"
        );
        Ok(out)
    }

    #[tracing::instrument(
        skip(self, request),
        fields(path_len = request.path.len(), clicks_len = request.clicks.len())
    )]
    async fn apply_stroke_effect(
        &self,
        effect_name: &str,
        request: StrokeRequest<'_>,
    ) -> BrushResult<EncodedImage> {
        request.validate()?;
        let url = self.config.stroke_url(effect_name)?;
        let body = StrokeBody {
            image: request.image.to_data_url(),
            path: request.path,
            clicks: request.clicks,
            user_input: request.user_input,
        };

        let start = Instant::now();
        let response = self.http.post(url).json(&body).send().await?;
        let out = read_image_response(response).await?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            result_len = out.len(),
            "stroke effect applied"
        );
        Ok(out)
    }
}

async fn read_image_response(response: reqwest::Response) -> BrushResult<EncodedImage> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = response.bytes().await?;
    classify_response(status, content_type.as_deref(), &body)
}

/// Turn a finished response into an image or a [`BrushError::Remote`].
pub(crate) fn classify_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> BrushResult<EncodedImage> {
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    if media_type.as_deref().is_some_and(is_json_media_type) {
        let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
        let msg = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| format!("Failed to apply effect: {}", status_text(status)));
        return Err(BrushError::remote(msg));
    }

    if !status.is_success() {
        return Err(BrushError::remote(format!(
            "Failed to apply effect: {}",
            status_text(status)
        )));
    }

    Ok(match media_type {
        Some(mt) if mt.starts_with("image/") => EncodedImage::new(mt, body.to_vec()),
        _ => EncodedImage::from_bytes(body.to_vec()),
    })
}

fn is_json_media_type(mt: &str) -> bool {
    mt == "application/json" || mt.ends_with("+json")
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/client/effects.rs"]
mod tests;

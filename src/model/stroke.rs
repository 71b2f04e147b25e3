use std::fmt;

use crate::foundation::core::{EncodedImage, GridPoint};
use crate::foundation::error::{BrushError, BrushResult};
use crate::model::params::EffectParameters;

/// Minimum number of captured points for a path to become a stroke.
pub const MIN_STROKE_POINTS: usize = 2;

/// Session-unique stroke identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StrokeId(String);

impl StrokeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a preview drawn by the canvas surface.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct PreviewHandle(pub u64);

/// Lifecycle label of a stroke, without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeState {
    Created,
    Processing,
    Completed,
    Error,
}

impl StrokeState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Position along `created -> processing -> {completed | error}`.
    fn rank(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Processing => 1,
            Self::Completed | Self::Error => 2,
        }
    }
}

impl fmt::Display for StrokeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state together with the data only that state may carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrokeStatus {
    Created,
    Processing,
    Completed { result: EncodedImage },
    Error { message: String },
}

impl StrokeStatus {
    pub fn state(&self) -> StrokeState {
        match self {
            Self::Created => StrokeState::Created,
            Self::Processing => StrokeState::Processing,
            Self::Completed { .. } => StrokeState::Completed,
            Self::Error { .. } => StrokeState::Error,
        }
    }
}

/// A single user-drawn path plus the effect and parameters to apply along it.
///
/// Everything except the status is frozen at creation. Status changes only move forward; the
/// transition methods return `false` and leave the stroke untouched when asked to do anything
/// else.
#[derive(Clone, Debug)]
pub struct Stroke {
    id: StrokeId,
    effect_name: String,
    path: Vec<GridPoint>,
    clicks: Vec<GridPoint>,
    user_input: EffectParameters,
    status: StrokeStatus,
    timestamp_ms: u64,
    preview: Option<PreviewHandle>,
}

impl Stroke {
    /// Materialize a stroke in `created` state.
    ///
    /// Fails with a validation error when `path` has fewer than [`MIN_STROKE_POINTS`] points.
    /// Empty `clicks` fall back to the first path point.
    pub fn new(
        id: StrokeId,
        effect_name: impl Into<String>,
        path: Vec<GridPoint>,
        clicks: Vec<GridPoint>,
        user_input: EffectParameters,
        timestamp_ms: u64,
        preview: Option<PreviewHandle>,
    ) -> BrushResult<Self> {
        if path.len() < MIN_STROKE_POINTS {
            return Err(BrushError::validation(format!(
                "stroke path needs at least {MIN_STROKE_POINTS} points, got {}",
                path.len()
            )));
        }
        let clicks = if clicks.is_empty() {
            path[..1].to_vec()
        } else {
            clicks
        };
        Ok(Self {
            id,
            effect_name: effect_name.into(),
            path,
            clicks,
            user_input,
            status: StrokeStatus::Created,
            timestamp_ms,
            preview,
        })
    }

    pub fn id(&self) -> &StrokeId {
        &self.id
    }

    pub fn effect_name(&self) -> &str {
        &self.effect_name
    }

    pub fn path(&self) -> &[GridPoint] {
        &self.path
    }

    pub fn clicks(&self) -> &[GridPoint] {
        &self.clicks
    }

    pub fn user_input(&self) -> &EffectParameters {
        &self.user_input
    }

    pub fn status(&self) -> &StrokeStatus {
        &self.status
    }

    pub fn state(&self) -> StrokeState {
        self.status.state()
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn preview(&self) -> Option<PreviewHandle> {
        self.preview
    }

    /// Rendered output, present only when completed.
    pub fn result(&self) -> Option<&EncodedImage> {
        match &self.status {
            StrokeStatus::Completed { result } => Some(result),
            _ => None,
        }
    }

    /// Failure reason, present only in error state.
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            StrokeStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    /// `created -> processing`. Returns `false` if the stroke was not in `created`.
    pub(crate) fn begin_processing(&mut self) -> bool {
        self.transition(StrokeStatus::Processing)
    }

    /// `processing -> completed`.
    pub(crate) fn complete(&mut self, result: EncodedImage) -> bool {
        self.transition(StrokeStatus::Completed { result })
    }

    /// `processing -> error`.
    pub(crate) fn fail(&mut self, message: impl Into<String>) -> bool {
        self.transition(StrokeStatus::Error {
            message: message.into(),
        })
    }

    fn transition(&mut self, next: StrokeStatus) -> bool {
        let (from, to) = (self.state(), next.state());
        if to.rank() != from.rank() + 1 {
            return false;
        }
        self.status = next;
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/stroke.rs"]
mod tests;

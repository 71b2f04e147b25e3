//! quantum-brush paints localized effects onto an image, one stroke at a time.
//!
//! A session turns captured pointer paths into strokes, sends each stroke to a remote effect
//! service, and layers the returned rasters back onto a working canvas.
//!
//! # Pipeline overview
//!
//! 1. **Capture**: pointer input -> [`CapturedPath`] (at least two `(row, col)` points)
//! 2. **Create**: [`StrokeManager::create_stroke`] snapshots the selected effect and parameters
//! 3. **Run**: [`StrokeManager::run_stroke`] / [`StrokeManager::run_all`] call the
//!    [`EffectService`]; each stroke ends `completed` or `error`
//! 4. **Apply / Export**: [`composite_stroke_result`] and [`export_composite_image`] layer results
//!    onto the base image owned by the [`CanvasSurface`]
//!
//! Compositing is deterministic and never mutates its inputs; a failed apply or export leaves the
//! canvas and every stroke as they were.
#![forbid(unsafe_code)]

mod canvas;
mod capture;
mod client;
mod compose;
mod foundation;
mod model;
mod session;

pub use canvas::surface::{CanvasSurface, InMemorySurface, Preview};
pub use capture::path::{CapturedPath, PathCapture};
pub use client::config::{BASE_URL_ENV, ClientConfig, DEFAULT_BASE_URL, TIMEOUT_ENV};
pub use client::effects::{EffectClient, EffectService, StrokeRequest};
pub use compose::blend::{PremulRgba8, over, over_in_place};
pub use compose::composite::{composite_stroke_result, export_composite_image, fit_to_canvas};
pub use compose::raster::{RgbaRaster, decode_raster, encode_png};
pub use foundation::core::{BezPath, CanvasSize, EncodedImage, GridPoint, PNG_MEDIA_TYPE, Point};
pub use foundation::error::{BrushError, BrushResult};
pub use model::params::EffectParameters;
pub use model::stroke::{
    MIN_STROKE_POINTS, PreviewHandle, Stroke, StrokeId, StrokeState, StrokeStatus,
};
pub use session::clock::{Clock, ManualClock, SystemClock};
pub use session::export::{ExportName, ExportedImage};
pub use session::manager::{DEFAULT_EFFECT, RunOutcome, StrokeManager};
pub use session::notify::{
    Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier,
};

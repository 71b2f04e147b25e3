//! Stroke lifecycle orchestration.
//!
//! [`StrokeManager`] owns the stroke list and drives each stroke through
//! `created -> processing -> {completed | error}`. It is meant to be driven from one task:
//! operations interleave only at their await points (the effect request, the canvas lock, and
//! off-thread compositing).
//!
//! Locking:
//! - the stroke list sits behind a plain mutex that is never held across an await;
//! - the canvas sits behind an async mutex that apply and base-image loads hold for the whole
//!   read-composite-write, so no reader ever sees a half-finished write. Whole-image requests
//!   release it while the service works.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde_json::Value;
use tokio::sync::MutexGuard;
use tracing::{debug, info, warn};

use crate::canvas::surface::CanvasSurface;
use crate::capture::path::CapturedPath;
use crate::client::effects::{EffectService, StrokeRequest};
use crate::compose::composite::{composite_stroke_result, export_composite_image, fit_to_canvas};
use crate::foundation::core::EncodedImage;
use crate::foundation::error::{BrushError, BrushResult};
use crate::model::params::EffectParameters;
use crate::model::stroke::{PreviewHandle, Stroke, StrokeId, StrokeState};
use crate::session::clock::{Clock, SystemClock};
use crate::session::export::{ExportName, ExportedImage};
use crate::session::notify::{Notification, Notifier, TracingNotifier};

/// Effect selected when a session starts.
pub const DEFAULT_EFFECT: &str = "heisenbrush";

/// What a run request ended up doing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Unknown stroke, or not in `created`; nothing was sent.
    Skipped,
    Completed,
    /// The service or transport failed; the stroke is now in `error` with this message.
    Failed(String),
    /// The stroke was deleted while its request was in flight and the response was dropped.
    Discarded,
}

#[derive(Debug)]
struct Selection {
    effect: String,
    params: EffectParameters,
    available: Vec<String>,
}

impl Selection {
    fn select(&mut self, effect: &str) {
        self.effect = effect.to_string();
        self.params = EffectParameters::defaults_for(effect);
    }
}

pub struct StrokeManager<S> {
    service: Arc<dyn EffectService>,
    surface: tokio::sync::Mutex<S>,
    strokes: Mutex<Vec<Stroke>>,
    selection: Mutex<Selection>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    next_seq: AtomicU64,
}

impl<S: CanvasSurface> std::fmt::Debug for StrokeManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeManager")
            .field("strokes", &self.len())
            .finish_non_exhaustive()
    }
}

impl<S: CanvasSurface> StrokeManager<S> {
    pub fn new(service: Arc<dyn EffectService>, surface: S) -> Self {
        Self {
            service,
            surface: tokio::sync::Mutex::new(surface),
            strokes: Mutex::new(Vec::new()),
            selection: Mutex::new(Selection {
                effect: DEFAULT_EFFECT.to_string(),
                params: EffectParameters::defaults_for(DEFAULT_EFFECT),
                available: Vec::new(),
            }),
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Lock the canvas. Holding the guard blocks apply, export and runs.
    pub async fn surface(&self) -> MutexGuard<'_, S> {
        self.surface.lock().await
    }

    pub fn selected_effect(&self) -> String {
        self.with_selection(|s| s.effect.clone())
    }

    /// Parameters the next stroke will snapshot.
    pub fn parameters(&self) -> EffectParameters {
        self.with_selection(|s| s.params.clone())
    }

    pub fn available_effects(&self) -> Vec<String> {
        self.with_selection(|s| s.available.clone())
    }

    /// Select an effect and reset the parameters to its defaults.
    pub fn select_effect(&self, effect: &str) {
        self.with_selection(|s| s.select(effect));
    }

    pub fn set_parameter(&self, key: &str, value: Value) {
        self.with_selection(|s| s.params.set(key, value));
    }

    /// Fetch the effect list. Falls back to the first offered effect when the selected one is
    /// not available.
    pub async fn load_effects(&self) -> BrushResult<Vec<String>> {
        match self.service.get_effects().await {
            Ok(effects) => {
                self.with_selection(|s| {
                    s.available = effects.clone();
                    if let Some(first) = effects.first()
                        && !effects.contains(&s.effect)
                    {
                        s.select(first);
                    }
                });
                Ok(effects)
            }
            Err(e) => {
                self.notifier.notify(Notification::error(
                    "Error loading effects",
                    "Could not fetch available quantum effects",
                ));
                Err(e)
            }
        }
    }

    /// Replace the base image, stretched to the canvas size.
    pub async fn load_base_image(&self, image: EncodedImage) -> BrushResult<()> {
        let mut surface = self.surface.lock().await;
        let size = surface.size();
        let fitted = run_blocking(move || fit_to_canvas(&image, size)).await?;
        surface.set_current_image(fitted);
        Ok(())
    }

    /// Materialize a captured path as a `created` stroke with the current effect selection.
    ///
    /// Paths with fewer than two points are rejected and nothing is added.
    pub fn create_stroke(
        &self,
        captured: CapturedPath,
        preview: Option<PreviewHandle>,
    ) -> BrushResult<StrokeId> {
        let (effect, params) = self.with_selection(|s| (s.effect.clone(), s.params.clone()));
        let now = self.clock.now_ms();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = StrokeId::new(format!("stroke-{now}-{seq}"));

        let stroke = Stroke::new(
            id.clone(),
            effect.clone(),
            captured.path,
            captured.clicks,
            params,
            now,
            preview,
        )?;
        let points = stroke.path().len();
        self.with_strokes(|strokes| strokes.push(stroke));

        debug!(stroke = %id, effect = %effect, points, "stroke created");
        self.notifier.notify(Notification::info(
            "Stroke created",
            format!("{effect} stroke ready to process ({points} points)"),
        ));
        Ok(id)
    }

    /// Draw a preview for `captured` on the canvas, then create the stroke.
    pub async fn draw_stroke(&self, captured: CapturedPath) -> BrushResult<StrokeId> {
        let handle = self.surface.lock().await.add_preview(&captured.path);
        match self.create_stroke(captured, Some(handle)) {
            Ok(id) => Ok(id),
            Err(e) => {
                self.surface.lock().await.remove_preview(handle);
                Err(e)
            }
        }
    }

    /// Snapshot of all strokes in creation order.
    pub fn strokes(&self) -> Vec<Stroke> {
        self.with_strokes(|s| s.clone())
    }

    pub fn stroke(&self, id: &StrokeId) -> Option<Stroke> {
        self.with_strokes(|s| s.iter().find(|st| st.id() == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.with_strokes(|s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send one `created` stroke to the effect service and record the outcome on it.
    ///
    /// Only a stroke in `created` is submitted; repeated requests while it is processing or
    /// after it finished are no-ops. Failures stay on the stroke and never surface as `Err`.
    #[tracing::instrument(skip(self, id), fields(stroke = %id))]
    pub async fn run_stroke(&self, id: &StrokeId) -> RunOutcome {
        let job = self.with_strokes(|strokes| {
            let stroke = strokes.iter_mut().find(|s| s.id() == id)?;
            if !stroke.begin_processing() {
                return None;
            }
            Some((
                stroke.effect_name().to_string(),
                stroke.path().to_vec(),
                stroke.clicks().to_vec(),
                stroke.user_input().clone(),
            ))
        });
        let Some((effect, path, clicks, params)) = job else {
            debug!("stroke is not runnable; skipped");
            return RunOutcome::Skipped;
        };

        let image = self.surface.lock().await.current_image();
        debug!(
            effect = %effect,
            path_len = path.len(),
            clicks_len = clicks.len(),
            image_len = image.len(),
            "processing stroke"
        );

        let start = Instant::now();
        let result = self
            .service
            .apply_stroke_effect(
                &effect,
                StrokeRequest {
                    image: &image,
                    path: &path,
                    clicks: &clicks,
                    user_input: &params,
                },
            )
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let outcome = self.record_result(id, result);
        match &outcome {
            RunOutcome::Completed => {
                info!(elapsed_ms, "stroke processed");
                self.notifier.notify(Notification::info(
                    "Stroke processed",
                    format!("{effect} effect applied in {elapsed_ms}ms"),
                ));
            }
            RunOutcome::Failed(msg) => {
                warn!(error = %msg, "stroke processing failed");
                self.notifier
                    .notify(Notification::error("Error processing stroke", msg.clone()));
            }
            RunOutcome::Discarded => {
                warn!("stroke was removed while processing; result discarded");
            }
            RunOutcome::Skipped => {}
        }
        outcome
    }

    fn record_result(&self, id: &StrokeId, result: BrushResult<EncodedImage>) -> RunOutcome {
        self.with_strokes(|strokes| {
            let Some(stroke) = strokes.iter_mut().find(|s| s.id() == id) else {
                return RunOutcome::Discarded;
            };
            match result {
                Ok(image) => {
                    if stroke.complete(image) {
                        RunOutcome::Completed
                    } else {
                        RunOutcome::Discarded
                    }
                }
                Err(e) => {
                    let msg = e.message();
                    if stroke.fail(msg.clone()) {
                        RunOutcome::Failed(msg)
                    } else {
                        RunOutcome::Discarded
                    }
                }
            }
        })
    }

    /// Run every `created` stroke, one at a time, in creation order.
    ///
    /// A failing stroke does not stop the batch.
    #[tracing::instrument(skip(self))]
    pub async fn run_all(&self) -> Vec<(StrokeId, RunOutcome)> {
        let pending: Vec<StrokeId> = self.with_strokes(|strokes| {
            strokes
                .iter()
                .filter(|s| s.state() == StrokeState::Created)
                .map(|s| s.id().clone())
                .collect()
        });
        info!(count = pending.len(), "running pending strokes");

        let mut outcomes = Vec::with_capacity(pending.len());
        for id in pending {
            let outcome = self.run_stroke(&id).await;
            outcomes.push((id, outcome));
        }
        outcomes
    }

    /// Composite a completed stroke's result onto the canvas and hide its preview.
    ///
    /// Returns `Ok(false)` when the stroke is unknown or not completed. On error the canvas
    /// keeps its previous image.
    #[tracing::instrument(skip(self, id), fields(stroke = %id))]
    pub async fn apply_stroke(&self, id: &StrokeId) -> BrushResult<bool> {
        let found = self.with_strokes(|strokes| {
            strokes
                .iter()
                .find(|s| s.id() == id)
                .and_then(|s| s.result().map(|r| (r.clone(), s.preview())))
        });
        let Some((result, preview)) = found else {
            debug!("stroke has no result to apply");
            return Ok(false);
        };

        let mut surface = self.surface.lock().await;
        let base = surface.current_image();
        match run_blocking(move || composite_stroke_result(&base, &result)).await {
            Ok(composed) => {
                surface.set_current_image(composed);
                if let Some(handle) = preview {
                    surface.hide_preview(handle);
                }
                drop(surface);
                self.notifier.notify(Notification::info(
                    "Stroke applied",
                    "Effect composited to canvas",
                ));
                Ok(true)
            }
            Err(e) => {
                drop(surface);
                self.notifier
                    .notify(Notification::error("Error applying stroke", e.message()));
                Err(e)
            }
        }
    }

    /// Remove a stroke and its preview. Unknown ids are a no-op returning `false`.
    ///
    /// A stroke that is still processing may be deleted; its response is dropped when it lands.
    pub async fn delete_stroke(&self, id: &StrokeId) -> bool {
        let removed = self.with_strokes(|strokes| {
            strokes
                .iter()
                .position(|s| s.id() == id)
                .map(|i| strokes.remove(i))
        });
        let Some(stroke) = removed else {
            return false;
        };
        if stroke.state() == StrokeState::Processing {
            debug!(stroke = %id, "deleted while processing; the late result will be dropped");
        }
        if let Some(handle) = stroke.preview() {
            self.surface.lock().await.remove_preview(handle);
        }
        self.notifier.notify(Notification::info(
            "Stroke deleted",
            "Stroke removed from manager",
        ));
        true
    }

    /// Layer every completed stroke, in list order, over the current canvas image.
    #[tracing::instrument(skip(self))]
    pub async fn export(&self, name: ExportName) -> BrushResult<ExportedImage> {
        let results: Vec<EncodedImage> = self.with_strokes(|strokes| {
            strokes
                .iter()
                .filter_map(|s| s.result().cloned())
                .collect()
        });
        let count = results.len();
        let base = self.surface.lock().await.current_image();

        match run_blocking(move || export_composite_image(&base, &results)).await {
            Ok(image) => {
                let file_name = name.file_name(self.clock.now_ms());
                info!(file = %file_name, strokes = count, bytes = image.len(), "exported");
                self.notifier.notify(Notification::info(
                    "Image exported",
                    format!("{file_name} ({count} strokes)"),
                ));
                Ok(ExportedImage { file_name, image })
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error("Export failed", e.message()));
                Err(e)
            }
        }
    }

    /// Single-image mode: run `effect` on the whole canvas and adopt the result as the new base.
    ///
    /// The canvas is only locked to read the image and, once the result is ready, to write it;
    /// the request itself runs unlocked.
    #[tracing::instrument(skip(self))]
    pub async fn apply_whole_image(&self, effect: &str) -> BrushResult<EncodedImage> {
        let (current, size) = {
            let surface = self.surface.lock().await;
            (surface.current_image(), surface.size())
        };

        let fitted = match self.service.apply_effect(effect, &current).await {
            Ok(result) => run_blocking(move || fit_to_canvas(&result, size)).await,
            Err(e) => Err(e),
        };
        match fitted {
            Ok(image) => {
                self.surface.lock().await.set_current_image(image.clone());
                self.notifier.notify(Notification::info(
                    "Effect applied",
                    format!("{effect} applied to the whole image"),
                ));
                Ok(image)
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error("Error applying effect", e.message()));
                Err(e)
            }
        }
    }

    fn with_strokes<R>(&self, f: impl FnOnce(&mut Vec<Stroke>) -> R) -> R {
        let mut guard = self.strokes.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn with_selection<R>(&self, f: impl FnOnce(&mut Selection) -> R) -> R {
        let mut guard = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

/// Run CPU-bound raster work off the async thread.
async fn run_blocking<T, F>(f: F) -> BrushResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> BrushResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BrushError::composition(format!("rendering task failed: {e}")))?
}

#[cfg(test)]
#[path = "../../tests/unit/session/manager.rs"]
mod tests;

//! Deterministic layering of per-stroke results onto a base image.
//!
//! Both operations are pure: inputs are never mutated and the same inputs always encode to the
//! same bytes. Callers keep the previous base image if anything here fails.

use tracing::debug;

use crate::compose::blend::over_in_place;
use crate::compose::raster::{RgbaRaster, decode_raster, encode_png};
use crate::foundation::core::{CanvasSize, EncodedImage};
use crate::foundation::error::BrushResult;

/// Layer `stroke_result` over `base_image` with source-over blending.
///
/// The overlay is stretched to the base image's dimensions rather than placed at its native
/// size. The output has the base image's dimensions and is PNG-encoded.
pub fn composite_stroke_result(
    base_image: &EncodedImage,
    stroke_result: &EncodedImage,
) -> BrushResult<EncodedImage> {
    let mut base = decode_raster(base_image)?;
    composite_onto(&mut base, stroke_result)?;
    encode_png(&base)
}

/// Fold [`composite_stroke_result`] over `stroke_results` left to right.
///
/// Later results paint over earlier ones. Any failing step fails the whole export; with no
/// results the base image is re-encoded as PNG.
pub fn export_composite_image(
    base_image: &EncodedImage,
    stroke_results: &[EncodedImage],
) -> BrushResult<EncodedImage> {
    let mut current = encode_png(&decode_raster(base_image)?)?;
    for (i, result) in stroke_results.iter().enumerate() {
        current = composite_stroke_result(&current, result)?;
        debug!(step = i, len = current.len(), "export step composited");
    }
    Ok(current)
}

/// Stretch `img` to `size` and re-encode it as PNG.
pub fn fit_to_canvas(img: &EncodedImage, size: CanvasSize) -> BrushResult<EncodedImage> {
    encode_png(&decode_raster(img)?.stretched_to(size)?)
}

fn composite_onto(base: &mut RgbaRaster, overlay: &EncodedImage) -> BrushResult<()> {
    let overlay = decode_raster(overlay)?.stretched_to(base.size())?;
    over_in_place(&mut base.data, &overlay.data)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/composite.rs"]
mod tests;

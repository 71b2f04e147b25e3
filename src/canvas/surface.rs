use std::collections::BTreeMap;

use crate::compose::raster::{RgbaRaster, decode_raster, encode_png};
use crate::foundation::core::{CanvasSize, EncodedImage, GridPoint};
use crate::foundation::error::BrushResult;
use crate::model::stroke::PreviewHandle;

/// The narrow contract the stroke pipeline has with whatever displays the canvas.
///
/// The surface owns the current base image; every write goes through
/// [`CanvasSurface::set_current_image`].
pub trait CanvasSurface: Send {
    fn size(&self) -> CanvasSize;

    /// Current base image, encoded.
    fn current_image(&self) -> EncodedImage;

    /// Adopt `image` as the new base image.
    fn set_current_image(&mut self, image: EncodedImage);

    /// Draw a preview of a captured path and return its handle.
    fn add_preview(&mut self, path: &[GridPoint]) -> PreviewHandle;

    /// Stop displaying a preview but keep it around.
    fn hide_preview(&mut self, handle: PreviewHandle);

    /// Discard a preview. Unknown handles are ignored.
    fn remove_preview(&mut self, handle: PreviewHandle);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    pub path: Vec<GridPoint>,
    pub visible: bool,
}

/// Headless surface keeping the base image and previews in memory.
#[derive(Debug)]
pub struct InMemorySurface {
    size: CanvasSize,
    image: EncodedImage,
    previews: BTreeMap<PreviewHandle, Preview>,
    next_handle: u64,
    writes: usize,
}

impl InMemorySurface {
    /// Start from an encoded image; its dimensions become the canvas size.
    pub fn from_image(image: EncodedImage) -> BrushResult<Self> {
        let raster = decode_raster(&image)?;
        Ok(Self::with_raster(raster.size(), image))
    }

    /// Start from a blank canvas filled with `rgba`.
    pub fn blank(size: CanvasSize, rgba: [u8; 4]) -> BrushResult<Self> {
        let image = encode_png(&RgbaRaster::filled(size, rgba)?)?;
        Ok(Self::with_raster(size, image))
    }

    fn with_raster(size: CanvasSize, image: EncodedImage) -> Self {
        Self {
            size,
            image,
            previews: BTreeMap::new(),
            next_handle: 1,
            writes: 0,
        }
    }

    pub fn preview(&self, handle: PreviewHandle) -> Option<&Preview> {
        self.previews.get(&handle)
    }

    pub fn preview_count(&self) -> usize {
        self.previews.len()
    }

    /// How many times the base image has been replaced.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl CanvasSurface for InMemorySurface {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn current_image(&self) -> EncodedImage {
        self.image.clone()
    }

    fn set_current_image(&mut self, image: EncodedImage) {
        self.image = image;
        self.writes += 1;
    }

    fn add_preview(&mut self, path: &[GridPoint]) -> PreviewHandle {
        let handle = PreviewHandle(self.next_handle);
        self.next_handle += 1;
        self.previews.insert(
            handle,
            Preview {
                path: path.to_vec(),
                visible: true,
            },
        );
        handle
    }

    fn hide_preview(&mut self, handle: PreviewHandle) {
        if let Some(p) = self.previews.get_mut(&handle) {
            p.visible = false;
        }
    }

    fn remove_preview(&mut self, handle: PreviewHandle) {
        self.previews.remove(&handle);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/surface.rs"]
mod tests;

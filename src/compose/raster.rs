use std::io::Cursor;

use image::imageops::FilterType;

use crate::foundation::core::{CanvasSize, EncodedImage};
use crate::foundation::error::{BrushError, BrushResult};
use crate::foundation::math::{mul_div255_u8, unpremul_u8};

/// Filter used when an overlay has to be stretched to the canvas.
const STRETCH_FILTER: FilterType = FilterType::Triangle;

/// Decoded pixels in premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaRaster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbaRaster {
    /// Allocate a surface filled with one straight-alpha color.
    pub fn filled(size: CanvasSize, rgba: [u8; 4]) -> BrushResult<Self> {
        let len = buffer_len(size.width, size.height)?;
        let px = premultiply([rgba[0], rgba[1], rgba[2], rgba[3]]);
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| BrushError::composition(format!("cannot allocate rendering surface: {e}")))?;
        for _ in 0..size.pixel_count() {
            data.extend_from_slice(&px);
        }
        Ok(Self {
            width: size.width,
            height: size.height,
            data,
        })
    }

    pub fn size(&self) -> CanvasSize {
        CanvasSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Resample to `size`. Returns `self` unchanged when it already matches.
    pub fn stretched_to(self, size: CanvasSize) -> BrushResult<Self> {
        if self.size() == size {
            return Ok(self);
        }
        let buf = image::RgbaImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| BrushError::composition("raster buffer does not match its dimensions"))?;
        // premultiplied data resamples without dark fringes
        let resized = image::imageops::resize(&buf, size.width, size.height, STRETCH_FILTER);
        Ok(Self {
            width: size.width,
            height: size.height,
            data: resized.into_raw(),
        })
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_raster(img: &EncodedImage) -> BrushResult<RgbaRaster> {
    let dyn_img = image::load_from_memory(img.as_bytes()).map_err(|e| {
        BrushError::composition(format!("decode {} ({} bytes): {e}", img.media_type(), img.len()))
    })?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(BrushError::composition("decoded image is empty"));
    }

    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    Ok(RgbaRaster {
        width,
        height,
        data,
    })
}

/// Encode premultiplied pixels as PNG.
pub fn encode_png(raster: &RgbaRaster) -> BrushResult<EncodedImage> {
    let expected = buffer_len(raster.width, raster.height)?;
    if raster.data.len() != expected {
        return Err(BrushError::composition(
            "raster buffer does not match its dimensions",
        ));
    }
    let mut straight = raster.data.clone();
    unpremultiply_rgba8_in_place(&mut straight);

    let mut buf = Vec::new();
    image::write_buffer_with_format(
        &mut Cursor::new(&mut buf),
        &straight,
        raster.width,
        raster.height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| BrushError::composition(format!("encode png: {e}")))?;
    Ok(EncodedImage::png(buf))
}

fn buffer_len(width: u32, height: u32) -> BrushResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| BrushError::composition("rendering surface size overflow"))
}

fn premultiply(px: [u8; 4]) -> [u8; 4] {
    let a = u16::from(px[3]);
    [
        mul_div255_u8(u16::from(px[0]), a),
        mul_div255_u8(u16::from(px[1]), a),
        mul_div255_u8(u16::from(px[2]), a),
        px[3],
    ]
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let out = premultiply([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        if a == 255 {
            continue;
        }
        px[0] = unpremul_u8(px[0], a);
        px[1] = unpremul_u8(px[1], a);
        px[2] = unpremul_u8(px[2], a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/raster.rs"]
mod tests;

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::foundation::error::{BrushError, BrushResult};

pub use kurbo::{BezPath, Point};

/// Media type used for everything this crate encodes itself.
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Integer canvas coordinate, serialized on the wire as `[row, col]`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct GridPoint {
    pub row: i32,
    pub col: i32,
}

impl GridPoint {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Round a surface position (x right, y down) onto the grid.
    pub fn from_xy(x: f64, y: f64) -> Self {
        Self {
            row: y.round() as i32,
            col: x.round() as i32,
        }
    }
}

impl From<[i32; 2]> for GridPoint {
    fn from([row, col]: [i32; 2]) -> Self {
        Self { row, col }
    }
}

impl From<GridPoint> for [i32; 2] {
    fn from(p: GridPoint) -> Self {
        [p.row, p.col]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> BrushResult<Self> {
        if width == 0 || height == 0 {
            return Err(BrushError::validation("canvas dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// A self-describing encoded image: raw bytes plus the media type they claim to be.
///
/// Bytes are shared, so cloning is cheap and stroke results can be handed to the compositor
/// without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    media_type: String,
    bytes: Arc<[u8]>,
}

impl EncodedImage {
    /// Wrap bytes with an explicit media type. No sniffing is done.
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Wrap bytes, deriving the media type from their magic number.
    ///
    /// Unrecognized data is tagged `application/octet-stream`.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let media_type = image::guess_format(&bytes)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        Self { media_type, bytes }
    }

    /// Wrap PNG bytes produced by this crate.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(PNG_MEDIA_TYPE, bytes)
    }

    /// Parse a `data:<media-type>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> BrushResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| BrushError::validation("data URL must start with 'data:'"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| BrushError::validation("data URL is missing a ',' separator"))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| BrushError::validation("only base64 data URLs are supported"))?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| BrushError::validation(format!("invalid base64 payload: {e}")))?;
        Ok(Self::new(media_type, bytes))
    }

    /// Render as a `data:` URL, the form the stroke endpoint expects.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.bytes))
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the declared media type marks this as an image.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

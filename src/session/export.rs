use crate::foundation::core::EncodedImage;

/// Which download name an export gets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportName {
    /// `quantum-art-<ms>.png`, for stroke compositions.
    Art,
    /// `quantum-<effect>-<ms>.png`, for single-image mode.
    SingleEffect(String),
}

impl ExportName {
    /// A bare file name. Characters of the effect name outside `[A-Za-z0-9_-]` become `_`, so
    /// the result never contains a path separator or `..`.
    pub fn file_name(&self, timestamp_ms: u64) -> String {
        match self {
            Self::Art => format!("quantum-art-{timestamp_ms}.png"),
            Self::SingleEffect(effect) => {
                format!("quantum-{}-{timestamp_ms}.png", file_safe(effect))
            }
        }
    }
}

fn file_safe(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "effect".to_string()
    } else {
        safe
    }
}

/// A finished PNG ready to be written out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub image: EncodedImage,
}

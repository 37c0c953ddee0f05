//! Image upload helpers.
//!
//! # Responsibility
//! - Encode uploaded image bytes as `data:` URLs for the image block.
//!
//! # Invariants
//! - Only `image/*` MIME types are accepted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    EmptyFile,
    UnsupportedMime(String),
}

impl Display for MediaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFile => write!(f, "uploaded file is empty"),
            Self::UnsupportedMime(mime) => write!(f, "unsupported image type `{mime}`"),
        }
    }
}

impl Error for MediaError {}

/// Encodes `bytes` as `data:<mime>;base64,<payload>`.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> Result<String, MediaError> {
    let mime = mime.trim().to_ascii_lowercase();
    let is_image = mime
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty());
    if !is_image {
        return Err(MediaError::UnsupportedMime(mime));
    }
    if bytes.is_empty() {
        return Err(MediaError::EmptyFile);
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

// Crate error type. Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A surface, field or form the caller asked for is not in the page.
    #[error("Element not found: #{0}")]
    MissingElement(String),
    /// The surface has no on-page area to draw into.
    #[error("Surface #{0} has zero width or height")]
    EmptySurface(String),
    /// The surface is wider or taller than a JPEG can be.
    #[error("Surface #{0} is {1}x{2}, larger than the 65535px limit per side")]
    OversizeSurface(String, usize, usize),
    /// Turning the raster into JPEG bytes failed.
    #[error("Failed to encode signature: {0}")]
    Encode(#[from] image::ImageError),
    /// A submitted data URL could not be turned back into an image.
    #[error("Failed to decode signature: {0}")]
    SignatureDecode(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid script: {0}")]
    Script(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "window")]
    #[error("Window init error: {0}")]
    WindowInit(String),
    #[cfg(feature = "window")]
    #[error("Window update error: {0}")]
    WindowUpdate(String),
}

// Raster -> companion-field string.

use crate::error::Error;
use crate::types::FrameBuffer;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use image::codecs::jpeg::JpegEncoder;

/// Lossy quality for the companion field (0.8 on a 0..1 scale).
pub const JPEG_QUALITY: u8 = 80;

pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Encode the raster as a baseline JPEG at the given quality.
pub fn encode_jpeg(fb: &FrameBuffer, quality: u8) -> Result<Vec<u8>, Error> {
    let rgb = fb.to_rgb_image();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&rgb)?;
    Ok(bytes)
}

/// `data:image/jpeg;base64,...` for the raster at [`JPEG_QUALITY`].
pub fn to_data_url(fb: &FrameBuffer) -> Result<String, Error> {
    let bytes = encode_jpeg(fb, JPEG_QUALITY)?;
    Ok(format!("{JPEG_DATA_URL_PREFIX}{}", B64.encode(bytes)))
}

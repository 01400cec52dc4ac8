// What the form hands off on submit, and turning a submitted signature back
// into a stored image file.

use crate::config::FormLayout;
use crate::error::Error;
use crate::page::Page;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Stored signatures are shrunk to fit inside this box.
pub const MAX_STORED_SIZE: (u32, u32) = (800, 600);
pub const STORED_JPEG_QUALITY: u8 = 85;
pub const SIN_NOVEDAD: &str = "Sin novedad";

/// Field values as the browser would submit them. Disabled fields submit nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSubmission {
    pub hallazgo: String,
    pub placa_equipo: String,
    pub orden_trabajo: String,
    pub eventos_seguridad: String,
    pub fuera_de_servicio: String,
    pub nombre_encargado_servicio: String,
    pub firma_servicio: String,
    pub nombre_encargado_ronda: String,
    pub firma_ronda: String,
    pub sin_novedad: bool,
}

impl RoundSubmission {
    pub fn collect(page: &Page, layout: &FormLayout) -> Self {
        let field = |id: &str| {
            page.get_by_id(id)
                .map(|n| page.element(n))
                .filter(|el| !el.disabled)
                .map(|el| el.value.clone())
                .unwrap_or_default()
        };
        Self {
            hallazgo: field(&layout.hallazgo),
            placa_equipo: field(&layout.placa_equipo),
            orden_trabajo: field(&layout.orden_trabajo),
            eventos_seguridad: field(&layout.eventos_seguridad),
            fuera_de_servicio: field(&layout.fuera_de_servicio),
            nombre_encargado_servicio: field(&layout.nombre_servicio),
            firma_servicio: field(&layout.servicio.field),
            nombre_encargado_ronda: field(&layout.nombre_ronda),
            firma_ronda: field(&layout.ronda.field),
            sin_novedad: field(&layout.sin_novedad_field) == "true",
        }
    }

    /// In no-incident mode, blank finding, tag and security events read "Sin novedad".
    pub fn apply_sin_novedad_defaults(&mut self) {
        if !self.sin_novedad {
            return;
        }
        for value in [&mut self.hallazgo, &mut self.placa_equipo, &mut self.eventos_seguridad] {
            if value.is_empty() {
                *value = SIN_NOVEDAD.to_owned();
            }
        }
    }
}

/// A decoded signature ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Data URL -> JPEG file named `<prefix>_<8 hex>.jpg`.
///
/// Empty or non-image strings give `Ok(None)`. Transparency is flattened onto
/// white and anything larger than [`MAX_STORED_SIZE`] is shrunk to fit.
pub fn decode_signature(data_url: &str, prefix: &str) -> Result<Option<SignatureFile>, Error> {
    if !data_url.starts_with("data:image") {
        return Ok(None);
    }
    let (_, payload) = data_url
        .split_once(";base64,")
        .ok_or_else(|| Error::SignatureDecode("missing ;base64, marker".into()))?;
    let raw = B64
        .decode(payload.trim())
        .map_err(|e| Error::SignatureDecode(e.to_string()))?;
    let img = image::load_from_memory(&raw).map_err(|e| Error::SignatureDecode(e.to_string()))?;

    let mut rgb = flatten_onto_white(&img);
    let (max_w, max_h) = MAX_STORED_SIZE;
    if rgb.width() > max_w || rgb.height() > max_h {
        rgb = DynamicImage::ImageRgb8(rgb).resize(max_w, max_h, FilterType::Lanczos3).to_rgb8();
    }

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, STORED_JPEG_QUALITY).encode_image(&rgb)?;

    let id = Uuid::new_v4().simple().to_string();
    Ok(Some(SignatureFile {
        filename: format!("{prefix}_{}.jpg", &id[..8]),
        bytes,
        width: rgb.width(),
        height: rgb.height(),
    }))
}

fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as u32;
        let mix = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([mix(p[0]), mix(p[1]), mix(p[2])])
    })
}

#[derive(Debug, Default)]
pub struct StoredSignatures {
    pub servicio: Option<SignatureFile>,
    pub ronda: Option<SignatureFile>,
}

/// Decode both signatures. A signature that fails to decode is logged and
/// dropped; the rest of the submission still goes through.
pub fn process_signatures(submission: &RoundSubmission) -> StoredSignatures {
    let decode = |data_url: &str, prefix: &str| match decode_signature(data_url, prefix) {
        Ok(file) => file,
        Err(e) => {
            warn!(prefix, "signature not stored: {e}");
            None
        }
    };
    StoredSignatures {
        servicio: decode(&submission.firma_servicio, "firma_servicio"),
        ronda: decode(&submission.firma_ronda, "firma_ronda"),
    }
}

// Form layout: which element ids and classes the validator binds to.
//
// Defaults match the round-entry template. A JSON file may override any
// subset of fields; missing keys fall back to the defaults.

use crate::error::Error;
use crate::page::{Element, ElementKind, Page};
use crate::signature::MAX_SURFACE_SIDE;
use crate::types::Rect;
use crate::validator::SignatureSlot;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ids for one signature slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotIds {
    pub surface: String,
    pub field: String,
}

impl SlotIds {
    fn new(surface: &str, field: &str) -> Self {
        Self { surface: surface.to_owned(), field: field.to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormLayout {
    pub form: String,
    pub toggle_button: String,
    /// Hidden field mirroring no-incident mode as "true"/"false".
    pub sin_novedad_field: String,
    pub servicio: SlotIds,
    pub ronda: SlotIds,
    pub nombre_servicio: String,
    pub nombre_ronda: String,
    pub hallazgo: String,
    pub placa_equipo: String,
    pub orden_trabajo: String,
    pub eventos_seguridad: String,
    pub fuera_de_servicio: String,
    /// Fields disabled and blanked while in no-incident mode.
    pub toggled_fields: Vec<String>,
    pub disabled_tint: String,
    pub clear_control_class: String,
    pub clear_control_attr: String,
    pub alert_class: String,
    /// On-page size of each signature surface, in pixels.
    pub surface_width: f32,
    pub surface_height: f32,
}

impl Default for FormLayout {
    fn default() -> Self {
        let toggled = ["id_hallazgo", "id_placa_equipo", "id_orden_trabajo", "id_eventos_seguridad", "id_fuera_de_servicio"];
        Self {
            form: "form-ronda".into(),
            toggle_button: "btn-sin-novedad".into(),
            sin_novedad_field: "id_sin_novedad".into(),
            servicio: SlotIds::new("canvas-firma-servicio", "id_firma_servicio"),
            ronda: SlotIds::new("canvas-firma-ronda", "id_firma_ronda"),
            nombre_servicio: "id_nombre_encargado_servicio".into(),
            nombre_ronda: "id_nombre_encargado_ronda".into(),
            hallazgo: "id_hallazgo".into(),
            placa_equipo: "id_placa_equipo".into(),
            orden_trabajo: "id_orden_trabajo".into(),
            eventos_seguridad: "id_eventos_seguridad".into(),
            fuera_de_servicio: "id_fuera_de_servicio".into(),
            toggled_fields: toggled.iter().map(|s| s.to_string()).collect(),
            disabled_tint: "#f8f9fa".into(),
            clear_control_class: "btn-clear-signature".into(),
            clear_control_attr: "data-canvas".into(),
            alert_class: "alert-validation".into(),
            surface_width: 400.0,
            surface_height: 150.0,
        }
    }
}

impl FormLayout {
    pub fn slot(&self, slot: SignatureSlot) -> &SlotIds {
        match slot {
            SignatureSlot::Servicio => &self.servicio,
            SignatureSlot::Ronda => &self.ronda,
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        let layout: Self = serde_json::from_str(&raw)?;
        layout.check()?;
        Ok(layout)
    }

    /// Reject layouts no page can be built from.
    pub fn check(&self) -> Result<(), Error> {
        if self.form.trim().is_empty() {
            return Err(Error::Config("form id must not be empty".into()));
        }
        if !(self.surface_width > 0.0 && self.surface_height > 0.0) {
            return Err(Error::Config(format!(
                "surface size must be positive, got {}x{}",
                self.surface_width, self.surface_height
            )));
        }
        let max = MAX_SURFACE_SIDE as f32;
        if self.surface_width > max || self.surface_height > max {
            return Err(Error::Config(format!(
                "surface size {}x{} exceeds {MAX_SURFACE_SIDE}px per side",
                self.surface_width, self.surface_height
            )));
        }
        Ok(())
    }

    /// Build the round-entry page: names, finding fields, both signature pads
    /// with their clear buttons, the no-incident toggle and its hidden field.
    pub fn build_page(&self) -> Page {
        let mut page = Page::new();
        let body = page.body();
        let form = page.append(body, Element::new(ElementKind::Form).with_id(&self.form));

        for id in [&self.hallazgo, &self.eventos_seguridad] {
            page.append(form, Element::new(ElementKind::TextArea).with_id(id));
        }
        for id in [&self.placa_equipo, &self.orden_trabajo, &self.fuera_de_servicio] {
            page.append(form, Element::new(ElementKind::Input).with_id(id));
        }
        page.append(
            form,
            Element::new(ElementKind::Button)
                .with_id(&self.toggle_button)
                .with_class_name("btn btn-secondary")
                .with_text("Sin novedad"),
        );
        page.append(form, Element::new(ElementKind::Hidden).with_id(&self.sin_novedad_field).with_value("false"));

        let slots = [("servicio", &self.servicio, &self.nombre_servicio), ("ronda", &self.ronda, &self.nombre_ronda)];
        let mut top = 300.0;
        for (key, ids, name) in slots {
            page.append(form, Element::new(ElementKind::Input).with_id(name));
            page.append(
                form,
                Element::new(ElementKind::Surface)
                    .with_id(&ids.surface)
                    .with_rect(Rect::new(20.0, top, self.surface_width, self.surface_height)),
            );
            page.append(form, Element::new(ElementKind::Hidden).with_id(&ids.field));
            page.append(
                form,
                Element::new(ElementKind::Button)
                    .with_class_name(&format!("btn btn-outline-secondary {}", self.clear_control_class))
                    .with_attr(&self.clear_control_attr, key)
                    .with_text("Limpiar firma"),
            );
            top += self.surface_height + 80.0;
        }
        page
    }
}

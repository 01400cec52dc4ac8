// Round form orchestration: signature pads, the "sin novedad" (no incident)
// toggle, and submit-time validation with an alert block listing every error.

use crate::config::FormLayout;
use crate::input::{PointerEvent, SubmitEvent, TouchEvent};
use crate::page::{Element, ElementKind, NodeId, Page, ScrollBehavior};
use crate::error::Error;
use crate::signature::SignatureCapture;
use crate::types::Point;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignatureSlot {
    Servicio,
    Ronda,
}

impl SignatureSlot {
    pub const ALL: [SignatureSlot; 2] = [SignatureSlot::Servicio, SignatureSlot::Ronda];

    /// Key used by `data-canvas` on the clear controls.
    pub fn key(self) -> &'static str {
        match self {
            SignatureSlot::Servicio => "servicio",
            SignatureSlot::Ronda => "ronda",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// One failed check. Display is the message shown to the user.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("El nombre del encargado del servicio es obligatorio")]
    NombreServicioRequired,
    #[error("El nombre del encargado de la ronda es obligatorio")]
    NombreRondaRequired,
    #[error("La firma del encargado del servicio es obligatoria")]
    FirmaServicioRequired,
    #[error("La firma del encargado de la ronda es obligatoria")]
    FirmaRondaRequired,
    #[error("El hallazgo es obligatorio")]
    HallazgoRequired,
    #[error("La placa del equipo es obligatoria")]
    PlacaEquipoRequired,
}

pub const ALERT_HEADING: &str = "Errores en el formulario:";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Binding {
    ToggleSinNovedad,
    ClearSignature(SignatureSlot),
}

pub struct RoundFormValidator {
    layout: FormLayout,
    form: NodeId,
    signatures: BTreeMap<SignatureSlot, SignatureCapture>,
    sin_novedad_mode: bool,
    clicks: HashMap<NodeId, Binding>,
    submit_bound: bool,
}

impl RoundFormValidator {
    /// `None` when the page has no round form. Signature pads are created for
    /// every slot whose surface exists.
    pub fn initialize(page: &Page, layout: FormLayout) -> Option<Self> {
        let form = page.get_by_id(&layout.form)?;

        let mut signatures = BTreeMap::new();
        for slot in SignatureSlot::ALL {
            let ids = layout.slot(slot);
            if page.get_by_id(&ids.surface).is_none() {
                continue;
            }
            match SignatureCapture::initialize(page, &ids.surface, &ids.field) {
                Ok(capture) => {
                    signatures.insert(slot, capture);
                }
                Err(e) => warn!(slot = slot.key(), "signature pad skipped: {e}"),
            }
        }

        debug!(form = %layout.form, pads = signatures.len(), "round form validator ready");
        Some(Self {
            layout,
            form,
            signatures,
            sin_novedad_mode: false,
            clicks: HashMap::new(),
            submit_bound: false,
        })
    }

    /// Hook up the toggle button, every clear control naming a known pad, and
    /// the form's submit.
    pub fn bind_controls(&mut self, page: &Page) {
        if let Some(btn) = page.get_by_id(&self.layout.toggle_button) {
            self.clicks.insert(btn, Binding::ToggleSinNovedad);
        }

        for control in page.query_class(&self.layout.clear_control_class) {
            let Some(slot) = page
                .element(control)
                .attr(&self.layout.clear_control_attr)
                .and_then(SignatureSlot::from_key)
            else {
                continue;
            };
            if self.signatures.contains_key(&slot) {
                self.clicks.insert(control, Binding::ClearSignature(slot));
            }
        }

        self.submit_bound = true;
        debug!(controls = self.clicks.len(), "controls bound");
    }

    /// Dispatch a click. Returns false when nothing is bound to `node`.
    pub fn click(&mut self, page: &mut Page, node: NodeId) -> bool {
        match self.clicks.get(&node).copied() {
            Some(Binding::ToggleSinNovedad) => self.toggle_sin_novedad(page),
            Some(Binding::ClearSignature(slot)) => self.clear_signature(page, slot),
            None => return false,
        }
        true
    }

    pub fn clear_signature(&mut self, page: &mut Page, slot: SignatureSlot) {
        if let Some(sig) = self.signatures.get_mut(&slot) {
            sig.clear(page);
        }
    }

    /// Dispatch a submit. Returns the errors that blocked it, if any.
    pub fn submit(&mut self, page: &mut Page, event: &mut SubmitEvent) -> Vec<ValidationError> {
        if !self.submit_bound {
            return Vec::new();
        }
        self.validate_form(page, event)
    }

    /// Route a pointer event to a pad. Encoding failures are logged, never raised.
    pub fn pointer(&mut self, page: &mut Page, slot: SignatureSlot, event: &PointerEvent) {
        if let Some(sig) = self.signatures.get_mut(&slot)
            && let Err(e) = sig.handle_pointer(page, event)
        {
            log_capture_error(slot, &e);
        }
    }

    pub fn touch(&mut self, page: &mut Page, slot: SignatureSlot, event: &mut TouchEvent) {
        if let Some(sig) = self.signatures.get_mut(&slot)
            && let Err(e) = sig.handle_touch(page, event)
        {
            log_capture_error(slot, &e);
        }
    }

    /// Pad whose surface contains the client point.
    pub fn slot_at(&self, page: &Page, client: Point) -> Option<SignatureSlot> {
        self.signatures
            .iter()
            .find(|(_, sig)| page.element(sig.surface()).rect.contains(client))
            .map(|(slot, _)| *slot)
    }

    pub fn toggle_sin_novedad(&mut self, page: &mut Page) {
        self.sin_novedad_mode = !self.sin_novedad_mode;
        let on = self.sin_novedad_mode;

        for id in &self.layout.toggled_fields {
            let Some(node) = page.get_by_id(id) else { continue };
            let field = page.element_mut(node);
            if on {
                field.disabled = true;
                field.background = Some(self.layout.disabled_tint.clone());
                field.value.clear();
            } else {
                field.disabled = false;
                field.background = None;
            }
        }

        if let Some(btn) = page.get_by_id(&self.layout.toggle_button) {
            let btn = page.element_mut(btn);
            if on {
                btn.text = "Habilitar campos".into();
                btn.set_class_name("btn btn-warning");
            } else {
                btn.text = "Sin novedad".into();
                btn.set_class_name("btn btn-secondary");
            }
        }
        page.set_value(&self.layout.sin_novedad_field, if on { "true" } else { "false" });
        info!(sin_novedad = on, "no-incident mode toggled");
    }

    /// Run every check in order; cancel the submit and render the alert when
    /// any fails. Fields missing from the page are not checked.
    pub fn validate_form(&self, page: &mut Page, event: &mut SubmitEvent) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if is_blank(page, &self.layout.nombre_servicio) {
            errors.push(ValidationError::NombreServicioRequired);
        }
        if is_blank(page, &self.layout.nombre_ronda) {
            errors.push(ValidationError::NombreRondaRequired);
        }
        if self.signatures.get(&SignatureSlot::Servicio).is_some_and(SignatureCapture::is_empty) {
            errors.push(ValidationError::FirmaServicioRequired);
        }
        if self.signatures.get(&SignatureSlot::Ronda).is_some_and(SignatureCapture::is_empty) {
            errors.push(ValidationError::FirmaRondaRequired);
        }
        if !self.sin_novedad_mode {
            if is_blank(page, &self.layout.hallazgo) {
                errors.push(ValidationError::HallazgoRequired);
            }
            if is_blank(page, &self.layout.placa_equipo) {
                errors.push(ValidationError::PlacaEquipoRequired);
            }
        }

        if errors.is_empty() {
            info!("round form valid, submitting");
        } else {
            info!(errors = errors.len(), "round form blocked");
            event.prevent_default();
            self.show_errors(page, &errors);
        }
        errors
    }

    /// Replace any previous alert with one listing `errors`, first in the form.
    pub fn show_errors(&self, page: &mut Page, errors: &[ValidationError]) {
        for old in page.query_class(&self.layout.alert_class) {
            page.remove(old);
        }

        let alert = page.prepend(
            self.form,
            Element::new(ElementKind::Alert)
                .with_class_name(&format!("alert alert-danger {}", self.layout.alert_class))
                .with_attr("role", "alert"),
        );
        page.append(alert, Element::new(ElementKind::Heading).with_text(ALERT_HEADING));
        let list = page.append(alert, Element::new(ElementKind::List).with_class_name("mb-0"));
        for e in errors {
            page.append(list, Element::new(ElementKind::ListItem).with_text(e.to_string()));
        }

        page.scroll_into_view(self.form, ScrollBehavior::Smooth);
    }

    pub fn sin_novedad_mode(&self) -> bool {
        self.sin_novedad_mode
    }

    pub fn signature(&self, slot: SignatureSlot) -> Option<&SignatureCapture> {
        self.signatures.get(&slot)
    }

    pub fn signatures(&self) -> impl Iterator<Item = (SignatureSlot, &SignatureCapture)> {
        self.signatures.iter().map(|(slot, sig)| (*slot, sig))
    }

    pub fn layout(&self) -> &FormLayout {
        &self.layout
    }

    pub fn form(&self) -> NodeId {
        self.form
    }
}

/// Present and whitespace-only. Absent fields are never blank.
fn is_blank(page: &Page, id: &str) -> bool {
    page.value(id).is_some_and(|v| v.trim().is_empty())
}

fn log_capture_error(slot: SignatureSlot, e: &Error) {
    warn!(slot = slot.key(), "signature capture failed: {e}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerKind;

    fn ready() -> (Page, RoundFormValidator) {
        let layout = FormLayout::default();
        let page = layout.build_page();
        let mut v = RoundFormValidator::initialize(&page, layout).unwrap();
        v.bind_controls(&page);
        (page, v)
    }

    fn draw(page: &mut Page, v: &mut RoundFormValidator, slot: SignatureSlot) {
        let rect = page.element(v.signature(slot).unwrap().surface()).rect;
        let (x, y) = (rect.left + 10.0, rect.top + 10.0);
        v.pointer(page, slot, &PointerEvent::new(PointerKind::Down, x, y));
        v.pointer(page, slot, &PointerEvent::new(PointerKind::Move, x + 40.0, y + 20.0));
        v.pointer(page, slot, &PointerEvent::new(PointerKind::Up, x + 40.0, y + 20.0));
    }

    #[test]
    fn slot_keys_round_trip() {
        for slot in SignatureSlot::ALL {
            assert_eq!(SignatureSlot::from_key(slot.key()), Some(slot));
        }
        assert_eq!(SignatureSlot::from_key("otro"), None);
    }

    #[test]
    fn no_form_means_no_validator() {
        let layout = FormLayout { form: "missing".into(), ..FormLayout::default() };
        let page = FormLayout::default().build_page();
        assert!(RoundFormValidator::initialize(&page, layout).is_none());
    }

    #[test]
    fn pads_only_for_present_surfaces() {
        let layout = FormLayout::default();
        let mut page = layout.build_page();
        let ronda = page.get_by_id(&layout.ronda.surface).unwrap();
        page.remove(ronda);
        let v = RoundFormValidator::initialize(&page, layout).unwrap();
        assert!(v.signature(SignatureSlot::Servicio).is_some());
        assert!(v.signature(SignatureSlot::Ronda).is_none());
    }

    #[test]
    fn clear_control_clears_its_own_pad() {
        let (mut page, mut v) = ready();
        draw(&mut page, &mut v, SignatureSlot::Servicio);
        draw(&mut page, &mut v, SignatureSlot::Ronda);

        let control = page
            .query_class("btn-clear-signature")
            .into_iter()
            .find(|&n| page.element(n).attr("data-canvas") == Some("ronda"))
            .unwrap();
        assert!(v.click(&mut page, control));

        assert!(v.signature(SignatureSlot::Ronda).unwrap().is_empty());
        assert_eq!(page.value("id_firma_ronda"), Some(""));
        assert!(!v.signature(SignatureSlot::Servicio).unwrap().is_empty());
        assert_ne!(page.value("id_firma_servicio"), Some(""));
    }

    #[test]
    fn unbound_click_is_ignored() {
        let (mut page, mut v) = ready();
        let form = v.form();
        assert!(!v.click(&mut page, form));
    }

    #[test]
    fn toggle_on_disables_tints_and_blanks() {
        let (mut page, mut v) = ready();
        page.set_value("id_hallazgo", "fuga");
        page.set_value("id_orden_trabajo", "OT-7");
        let btn = page.get_by_id("btn-sin-novedad").unwrap();
        assert!(v.click(&mut page, btn));

        assert!(v.sin_novedad_mode());
        for id in &v.layout().toggled_fields {
            let el = page.element(page.get_by_id(id).unwrap());
            assert!(el.disabled, "{id} enabled");
            assert_eq!(el.background.as_deref(), Some("#f8f9fa"));
            assert_eq!(el.value, "");
        }
        assert_eq!(page.element(btn).text, "Habilitar campos");
        assert_eq!(page.element(btn).class_name(), "btn btn-warning");
        assert_eq!(page.value("id_sin_novedad"), Some("true"));
    }

    #[test]
    fn toggle_off_reenables_without_restoring_values() {
        let (mut page, mut v) = ready();
        page.set_value("id_hallazgo", "fuga");
        v.toggle_sin_novedad(&mut page);
        v.toggle_sin_novedad(&mut page);

        assert!(!v.sin_novedad_mode());
        for id in &v.layout().toggled_fields {
            let el = page.element(page.get_by_id(id).unwrap());
            assert!(!el.disabled);
            assert_eq!(el.background, None);
        }
        assert_eq!(page.value("id_hallazgo"), Some(""));
        let btn = page.get_by_id("btn-sin-novedad").unwrap();
        assert_eq!(page.element(btn).text, "Sin novedad");
        assert_eq!(page.element(btn).class_name(), "btn btn-secondary");
        assert_eq!(page.value("id_sin_novedad"), Some("false"));
    }

    #[test]
    fn toggle_tolerates_missing_button_and_fields() {
        let layout = FormLayout::default();
        let mut page = layout.build_page();
        for id in ["btn-sin-novedad", "id_orden_trabajo", "id_sin_novedad"] {
            let n = page.get_by_id(id).unwrap();
            page.remove(n);
        }
        let mut v = RoundFormValidator::initialize(&page, layout).unwrap();
        v.bind_controls(&page);
        v.toggle_sin_novedad(&mut page);
        assert!(v.sin_novedad_mode());
        assert!(page.element(page.get_by_id("id_hallazgo").unwrap()).disabled);
    }

    #[test]
    fn whitespace_names_count_as_blank() {
        let (mut page, v) = ready();
        page.set_value("id_nombre_encargado_servicio", "   ");
        page.set_value("id_nombre_encargado_ronda", "\t");
        let mut ev = SubmitEvent::new();
        let errors = v.validate_form(&mut page, &mut ev);
        assert_eq!(&errors[..2], &[ValidationError::NombreServicioRequired, ValidationError::NombreRondaRequired]);
    }

    #[test]
    fn errors_render_as_first_child_alert() {
        let (mut page, mut v) = ready();
        let mut ev = SubmitEvent::new();
        let errors = v.submit(&mut page, &mut ev);
        assert!(ev.default_prevented());

        let alerts = page.query_class("alert-validation");
        assert_eq!(alerts.len(), 1);
        let alert = alerts[0];
        assert_eq!(page.element(v.form()).children()[0], alert);
        assert_eq!(page.element(alert).attr("role"), Some("alert"));
        let items = page.query_class("mb-0");
        let list = page.element(items[0]).children();
        assert_eq!(list.len(), errors.len());
        assert_eq!(page.element(list[0]).text, "El nombre del encargado del servicio es obligatorio");

        let scroll = page.last_scroll().unwrap();
        assert_eq!(scroll.target, v.form());
        assert_eq!(scroll.behavior, ScrollBehavior::Smooth);
    }

    #[test]
    fn resubmitting_replaces_the_alert() {
        let (mut page, mut v) = ready();
        v.submit(&mut page, &mut SubmitEvent::new());
        page.set_value("id_nombre_encargado_servicio", "Ana");
        let errors = v.submit(&mut page, &mut SubmitEvent::new());

        let alerts = page.query_class("alert-validation");
        assert_eq!(alerts.len(), 1);
        assert!(!page.text_content(alerts[0]).contains("servicio es obligatorio"));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn submit_before_binding_is_not_validated() {
        let layout = FormLayout::default();
        let mut page = layout.build_page();
        let mut v = RoundFormValidator::initialize(&page, layout).unwrap();
        let mut ev = SubmitEvent::new();
        assert!(v.submit(&mut page, &mut ev).is_empty());
        assert!(!ev.default_prevented());
    }

    #[test]
    fn slot_at_finds_the_pad_under_the_point() {
        let (page, v) = ready();
        let rect = page.element(v.signature(SignatureSlot::Ronda).unwrap().surface()).rect;
        let inside = Point::new(rect.left + 1.0, rect.top + 1.0);
        assert_eq!(v.slot_at(&page, inside), Some(SignatureSlot::Ronda));
        assert_eq!(v.slot_at(&page, Point::new(0.0, 0.0)), None);
    }
}

// A round form page plus its validator, driven by scripted user actions.
//
// Scripts are JSON arrays, e.g.
// `[{"action": "fill", "id": "id_hallazgo", "value": "fuga"},
//   {"action": "stroke", "slot": "servicio", "points": [[10, 10], [60, 30]]},
//   {"action": "submit"}]`.
// Pad coordinates in scripts are surface-local.

use crate::config::FormLayout;
use crate::error::Error;
use crate::input::{PointerEvent, PointerKind, SubmitEvent, TouchEvent, TouchKind};
use crate::page::Page;
use crate::submission::RoundSubmission;
use crate::types::Point;
use crate::validator::{RoundFormValidator, SignatureSlot};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerAction {
    Down,
    Move,
    Up,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    Start,
    Move,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Fill { id: String, value: String },
    Pointer { slot: String, kind: PointerAction, x: f32, y: f32 },
    Touch { slot: String, kind: TouchAction, #[serde(default)] touches: Vec<[f32; 2]> },
    /// Down at the first point, a move to each following point, then up.
    Stroke { slot: String, points: Vec<[f32; 2]> },
    Click { id: String },
    ClearSignature { slot: String },
    ToggleSinNovedad,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The last submit went through with this payload.
    Submitted(RoundSubmission),
    /// The last submit was cancelled with these messages.
    Blocked(Vec<String>),
    /// The script never submitted.
    NotSubmitted,
}

pub fn load_script(path: &Path) -> Result<Vec<Action>, Error> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub struct Session {
    page: Page,
    validator: RoundFormValidator,
}

impl Session {
    /// Build the round form page and bind its validator.
    pub fn new(layout: FormLayout) -> Result<Self, Error> {
        layout.check()?;
        let page = layout.build_page();
        Self::attach(page, layout)
    }

    /// Bind a validator to an existing page.
    pub fn attach(page: Page, layout: FormLayout) -> Result<Self, Error> {
        let form = layout.form.clone();
        let mut validator =
            RoundFormValidator::initialize(&page, layout).ok_or(Error::MissingElement(form))?;
        validator.bind_controls(&page);
        Ok(Self { page, validator })
    }

    pub fn run(&mut self, actions: &[Action]) -> Result<Outcome, Error> {
        let mut outcome = Outcome::NotSubmitted;
        for (i, action) in actions.iter().enumerate() {
            debug!(step = i, ?action, "replay");
            if let Some(o) = self.step(action)? {
                outcome = o;
            }
        }
        Ok(outcome)
    }

    /// Apply one action. Returns the submit outcome for `Submit`.
    pub fn step(&mut self, action: &Action) -> Result<Option<Outcome>, Error> {
        match action {
            Action::Fill { id, value } => {
                if !self.page.set_value(id, value.clone()) {
                    return Err(Error::Script(format!("no element #{id}")));
                }
            }
            Action::Pointer { slot, kind, x, y } => {
                let slot = parse_slot(slot)?;
                let kind = match kind {
                    PointerAction::Down => PointerKind::Down,
                    PointerAction::Move => PointerKind::Move,
                    PointerAction::Up => PointerKind::Up,
                    PointerAction::Out => PointerKind::Out,
                };
                let client = self.to_client(slot, Point::new(*x, *y))?;
                self.validator.pointer(&mut self.page, slot, &PointerEvent { kind, client });
            }
            Action::Touch { slot, kind, touches } => {
                let slot = parse_slot(slot)?;
                let kind = match kind {
                    TouchAction::Start => TouchKind::Start,
                    TouchAction::Move => TouchKind::Move,
                    TouchAction::End => TouchKind::End,
                };
                let touches = touches
                    .iter()
                    .map(|[x, y]| self.to_client(slot, Point::new(*x, *y)))
                    .collect::<Result<Vec<_>, _>>()?;
                self.validator.touch(&mut self.page, slot, &mut TouchEvent::new(kind, touches));
            }
            Action::Stroke { slot, points } => {
                let slot = parse_slot(slot)?;
                self.stroke(slot, points)?;
            }
            Action::Click { id } => {
                let node = self
                    .page
                    .get_by_id(id)
                    .ok_or_else(|| Error::Script(format!("no element #{id}")))?;
                if !self.validator.click(&mut self.page, node) {
                    debug!(id = %id, "click on unbound element");
                }
            }
            Action::ClearSignature { slot } => {
                let slot = parse_slot(slot)?;
                let layout = self.validator.layout();
                let control = self
                    .page
                    .query_class(&layout.clear_control_class)
                    .into_iter()
                    .find(|&n| self.page.element(n).attr(&layout.clear_control_attr) == Some(slot.key()))
                    .ok_or_else(|| Error::Script(format!("no clear control for {}", slot.key())))?;
                self.validator.click(&mut self.page, control);
            }
            Action::ToggleSinNovedad => self.validator.toggle_sin_novedad(&mut self.page),
            Action::Submit => return Ok(Some(self.submit())),
        }
        Ok(None)
    }

    fn stroke(&mut self, slot: SignatureSlot, points: &[[f32; 2]]) -> Result<(), Error> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        let mut last = self.to_client(slot, Point::new(first[0], first[1]))?;
        self.validator.pointer(&mut self.page, slot, &PointerEvent { kind: PointerKind::Down, client: last });
        for [x, y] in rest {
            last = self.to_client(slot, Point::new(*x, *y))?;
            self.validator.pointer(&mut self.page, slot, &PointerEvent { kind: PointerKind::Move, client: last });
        }
        self.validator.pointer(&mut self.page, slot, &PointerEvent { kind: PointerKind::Up, client: last });
        Ok(())
    }

    /// Fire a submit; on success collect the payload the form would send.
    pub fn submit(&mut self) -> Outcome {
        let mut event = SubmitEvent::new();
        let errors = self.validator.submit(&mut self.page, &mut event);
        if event.default_prevented() {
            return Outcome::Blocked(errors.iter().map(ToString::to_string).collect());
        }
        let mut submission = RoundSubmission::collect(&self.page, self.validator.layout());
        submission.apply_sin_novedad_defaults();
        info!(sin_novedad = submission.sin_novedad, "round submitted");
        Outcome::Submitted(submission)
    }

    fn to_client(&self, slot: SignatureSlot, local: Point) -> Result<Point, Error> {
        let sig = self
            .validator
            .signature(slot)
            .ok_or_else(|| Error::Script(format!("no signature pad for {}", slot.key())))?;
        let rect = self.page.element(sig.surface()).rect;
        Ok(Point::new(local.x + rect.left, local.y + rect.top))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn validator(&self) -> &RoundFormValidator {
        &self.validator
    }

    pub fn validator_mut(&mut self) -> &mut RoundFormValidator {
        &mut self.validator
    }

    /// Both halves at once, for callers that route raw events themselves.
    pub fn parts_mut(&mut self) -> (&mut Page, &mut RoundFormValidator) {
        (&mut self.page, &mut self.validator)
    }
}

fn parse_slot(key: &str) -> Result<SignatureSlot, Error> {
    SignatureSlot::from_key(key).ok_or_else(|| Error::Script(format!("unknown signature slot {key:?}")))
}

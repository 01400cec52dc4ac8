// Raw page events and the unified gesture both pointer and touch input collapse into.

use crate::types::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// Pointer left the surface.
    Out,
}

/// Mouse/pen event in client coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub client: Point,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, client_x: f32, client_y: f32) -> Self {
        Self { kind, client: Point::new(client_x, client_y) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchKind {
    Start,
    Move,
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TouchEvent {
    pub kind: TouchKind,
    /// Active touch points in client coordinates; the first one drives drawing.
    pub touches: Vec<Point>,
    default_prevented: bool,
}

impl TouchEvent {
    pub fn new(kind: TouchKind, touches: Vec<Point>) -> Self {
        Self { kind, touches, default_prevented: false }
    }

    /// Suppress the page's own scroll/zoom handling for this touch.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Down,
    Move,
    End,
}

/// Input normalized to surface-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gesture {
    pub kind: GestureKind,
    pub x: f32,
    pub y: f32,
}

impl Gesture {
    pub fn new(kind: GestureKind, at: Point) -> Self {
        Self { kind, x: at.x, y: at.y }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Form submit; handlers may cancel it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

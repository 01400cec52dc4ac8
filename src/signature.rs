// Freehand signature capture.
//
// A `SignatureCapture` owns the raster behind one drawing surface and keeps
// the surface's companion field in step with it: the field holds either `""`
// (never drawn, or cleared) or a JPEG data URL of the current raster.

use crate::draw::stroke_segment;
use crate::encode::to_data_url;
use crate::error::Error;
use crate::input::{Gesture, GestureKind, PointerEvent, PointerKind, TouchEvent, TouchKind};
use crate::page::{NodeId, Page};
use crate::types::{FrameBuffer, Point, StrokeStyle, WHITE};
use tracing::debug;

/// Largest surface side the JPEG encoder accepts.
pub const MAX_SURFACE_SIDE: usize = u16::MAX as usize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CaptureState {
    Idle,
    Drawing { last: Point },
}

#[derive(Clone, Debug)]
pub struct SignatureCapture {
    surface_id: String,
    surface: NodeId,
    field: NodeId,
    raster: FrameBuffer,
    style: StrokeStyle,
    state: CaptureState,
    segments: usize,
}

impl SignatureCapture {
    /// Bind to a surface and its companion field.
    ///
    /// The raster takes the surface's on-page size and starts opaque white.
    /// Callers skip construction on [`Error::MissingElement`].
    pub fn initialize(page: &Page, surface_id: &str, field_id: &str) -> Result<Self, Error> {
        let surface = page
            .get_by_id(surface_id)
            .ok_or_else(|| Error::MissingElement(surface_id.to_owned()))?;
        let field = page
            .get_by_id(field_id)
            .ok_or_else(|| Error::MissingElement(field_id.to_owned()))?;

        let rect = page.element(surface).rect;
        let width = rect.width.max(0.0).round() as usize;
        let height = rect.height.max(0.0).round() as usize;
        if width == 0 || height == 0 {
            return Err(Error::EmptySurface(surface_id.to_owned()));
        }
        if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
            return Err(Error::OversizeSurface(surface_id.to_owned(), width, height));
        }

        debug!(surface = surface_id, field = field_id, width, height, "signature surface ready");
        Ok(Self {
            surface_id: surface_id.to_owned(),
            surface,
            field,
            raster: FrameBuffer::filled(width, height, WHITE),
            style: StrokeStyle::default(),
            state: CaptureState::Idle,
            segments: 0,
        })
    }

    /// Client coordinates -> surface-local coordinates.
    pub fn position_from_event(&self, page: &Page, client: Point) -> Point {
        let rect = page.element(self.surface).rect;
        Point::new(client.x - rect.left, client.y - rect.top)
    }

    pub fn gesture_from_pointer(&self, page: &Page, event: &PointerEvent) -> Gesture {
        let kind = match event.kind {
            PointerKind::Down => GestureKind::Down,
            PointerKind::Move => GestureKind::Move,
            PointerKind::Up | PointerKind::Out => GestureKind::End,
        };
        Gesture::new(kind, self.position_from_event(page, event.client))
    }

    /// Touch -> gesture. Start and move stop the page from scrolling and use
    /// the first active touch; a start/move with no touches yields nothing.
    pub fn translate_touch(&self, page: &Page, event: &mut TouchEvent) -> Option<Gesture> {
        match event.kind {
            TouchKind::End => {
                let at = match self.state {
                    CaptureState::Drawing { last } => last,
                    CaptureState::Idle => Point::default(),
                };
                Some(Gesture::new(GestureKind::End, at))
            }
            TouchKind::Start | TouchKind::Move => {
                event.prevent_default();
                let first = *event.touches.first()?;
                let kind = if event.kind == TouchKind::Start { GestureKind::Down } else { GestureKind::Move };
                Some(Gesture::new(kind, self.position_from_event(page, first)))
            }
        }
    }

    pub fn handle_pointer(&mut self, page: &mut Page, event: &PointerEvent) -> Result<(), Error> {
        let gesture = self.gesture_from_pointer(page, event);
        self.apply(page, gesture)
    }

    pub fn handle_touch(&mut self, page: &mut Page, event: &mut TouchEvent) -> Result<(), Error> {
        match self.translate_touch(page, event) {
            Some(gesture) => self.apply(page, gesture),
            None => Ok(()),
        }
    }

    /// Drive the Idle/Drawing state machine with one gesture.
    pub fn apply(&mut self, page: &mut Page, gesture: Gesture) -> Result<(), Error> {
        let at = gesture.point();
        match (self.state, gesture.kind) {
            (_, GestureKind::Down) => {
                self.state = CaptureState::Drawing { last: at };
                debug!(surface = %self.surface_id, x = at.x, y = at.y, "stroke start");
                Ok(())
            }
            (CaptureState::Drawing { last }, GestureKind::Move) => {
                stroke_segment(&mut self.raster, last, at, &self.style);
                self.segments += 1;
                self.state = CaptureState::Drawing { last: at };
                self.sync_companion_field(page)
            }
            (CaptureState::Drawing { .. }, GestureKind::End) => {
                self.state = CaptureState::Idle;
                debug!(surface = %self.surface_id, segments = self.segments, "stroke end");
                // the last move may not have been encoded if it failed; capture the final raster
                self.sync_companion_field(page)
            }
            (CaptureState::Idle, GestureKind::Move | GestureKind::End) => Ok(()),
        }
    }

    /// Write the raster's JPEG data URL into the companion field.
    pub fn sync_companion_field(&self, page: &mut Page) -> Result<(), Error> {
        let url = to_data_url(&self.raster)?;
        page.element_mut(self.field).value = url;
        Ok(())
    }

    /// Repaint white and blank the companion field. Ends any stroke in progress.
    pub fn clear(&mut self, page: &mut Page) {
        self.raster.fill(WHITE);
        self.state = CaptureState::Idle;
        self.segments = 0;
        page.element_mut(self.field).value.clear();
        debug!(surface = %self.surface_id, "signature cleared");
    }

    /// True when the raster still matches a blank white surface of the same size.
    ///
    /// Compares pixels, not encoder output, so the answer does not depend on
    /// the encoder producing identical bytes twice.
    pub fn is_empty(&self) -> bool {
        self.raster.is_uniform(WHITE)
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, CaptureState::Drawing { .. })
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Segments drawn since the last clear.
    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn raster(&self) -> &FrameBuffer {
        &self.raster
    }

    pub fn surface(&self) -> NodeId {
        self.surface
    }

    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    pub fn field(&self) -> NodeId {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::JPEG_DATA_URL_PREFIX;
    use crate::page::{Element, ElementKind};
    use crate::types::Rect;

    fn page_with_surface(rect: Rect) -> Page {
        let mut page = Page::new();
        let body = page.body();
        page.append(body, Element::new(ElementKind::Surface).with_id("pad").with_rect(rect));
        page.append(body, Element::new(ElementKind::Hidden).with_id("pad_value"));
        page
    }

    fn capture() -> (Page, SignatureCapture) {
        let page = page_with_surface(Rect::new(100.0, 50.0, 120.0, 40.0));
        let sig = SignatureCapture::initialize(&page, "pad", "pad_value").unwrap();
        (page, sig)
    }

    fn pointer(sig: &mut SignatureCapture, page: &mut Page, kind: PointerKind, x: f32, y: f32) {
        sig.handle_pointer(page, &PointerEvent::new(kind, x, y)).unwrap();
    }

    #[test]
    fn raster_matches_surface_size_and_starts_blank() {
        let (page, sig) = capture();
        assert_eq!((sig.raster().width, sig.raster().height), (120, 40));
        assert!(sig.is_empty());
        assert_eq!(page.value("pad_value"), Some(""));
    }

    #[test]
    fn missing_elements_and_empty_surface_are_reported() {
        let page = page_with_surface(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(matches!(
            SignatureCapture::initialize(&page, "nope", "pad_value"),
            Err(Error::MissingElement(id)) if id == "nope"
        ));
        assert!(matches!(
            SignatureCapture::initialize(&page, "pad", "nope"),
            Err(Error::MissingElement(_))
        ));
        let flat = page_with_surface(Rect::new(0.0, 0.0, 10.0, 0.0));
        assert!(matches!(
            SignatureCapture::initialize(&flat, "pad", "pad_value"),
            Err(Error::EmptySurface(_))
        ));
        let huge = page_with_surface(Rect::new(0.0, 0.0, 1e12, 1e12));
        assert!(matches!(
            SignatureCapture::initialize(&huge, "pad", "pad_value"),
            Err(Error::OversizeSurface(id, _, _)) if id == "pad"
        ));
    }

    #[test]
    fn position_subtracts_surface_offset() {
        let (page, sig) = capture();
        assert_eq!(sig.position_from_event(&page, Point::new(110.0, 65.0)), Point::new(10.0, 15.0));
    }

    #[test]
    fn stroke_marks_raster_and_fills_companion_field() {
        let (mut page, mut sig) = capture();
        pointer(&mut sig, &mut page, PointerKind::Down, 110.0, 60.0);
        assert!(sig.is_drawing());
        assert!(sig.is_empty());
        pointer(&mut sig, &mut page, PointerKind::Move, 130.0, 70.0);
        pointer(&mut sig, &mut page, PointerKind::Move, 150.0, 62.0);
        pointer(&mut sig, &mut page, PointerKind::Up, 150.0, 62.0);

        assert!(!sig.is_drawing());
        assert!(!sig.is_empty());
        assert_eq!(sig.segments(), 2);
        let value = page.value("pad_value").unwrap();
        assert!(value.starts_with(JPEG_DATA_URL_PREFIX));
        assert!(value.len() > JPEG_DATA_URL_PREFIX.len());
    }

    #[test]
    fn move_while_idle_is_ignored() {
        let (mut page, mut sig) = capture();
        pointer(&mut sig, &mut page, PointerKind::Move, 120.0, 60.0);
        pointer(&mut sig, &mut page, PointerKind::Up, 120.0, 60.0);
        assert!(sig.is_empty());
        assert_eq!(sig.state(), CaptureState::Idle);
        assert_eq!(page.value("pad_value"), Some(""));
    }

    #[test]
    fn leaving_the_surface_ends_the_stroke() {
        let (mut page, mut sig) = capture();
        pointer(&mut sig, &mut page, PointerKind::Down, 110.0, 60.0);
        pointer(&mut sig, &mut page, PointerKind::Move, 115.0, 61.0);
        pointer(&mut sig, &mut page, PointerKind::Out, 300.0, 61.0);
        assert_eq!(sig.state(), CaptureState::Idle);
        pointer(&mut sig, &mut page, PointerKind::Move, 140.0, 80.0);
        assert_eq!(sig.segments(), 1);
    }

    #[test]
    fn touch_shares_the_pointer_path() {
        let (mut page, mut sig) = capture();
        let mut start = TouchEvent::new(TouchKind::Start, vec![Point::new(105.0, 55.0), Point::new(0.0, 0.0)]);
        sig.handle_touch(&mut page, &mut start).unwrap();
        assert!(start.default_prevented());
        assert_eq!(sig.state(), CaptureState::Drawing { last: Point::new(5.0, 5.0) });

        let mut mv = TouchEvent::new(TouchKind::Move, vec![Point::new(140.0, 70.0)]);
        sig.handle_touch(&mut page, &mut mv).unwrap();
        assert!(mv.default_prevented());

        let mut end = TouchEvent::new(TouchKind::End, Vec::new());
        sig.handle_touch(&mut page, &mut end).unwrap();
        assert!(!end.default_prevented());
        assert_eq!(sig.state(), CaptureState::Idle);
        assert!(!sig.is_empty());
        assert!(page.value("pad_value").unwrap().starts_with(JPEG_DATA_URL_PREFIX));
    }

    #[test]
    fn touch_without_points_does_nothing() {
        let (mut page, mut sig) = capture();
        let mut start = TouchEvent::new(TouchKind::Start, Vec::new());
        sig.handle_touch(&mut page, &mut start).unwrap();
        assert_eq!(sig.state(), CaptureState::Idle);
    }

    #[test]
    fn clear_mid_stroke_ends_it() {
        let (mut page, mut sig) = capture();
        pointer(&mut sig, &mut page, PointerKind::Down, 110.0, 60.0);
        pointer(&mut sig, &mut page, PointerKind::Move, 160.0, 75.0);
        sig.clear(&mut page);
        assert_eq!(sig.state(), CaptureState::Idle);

        pointer(&mut sig, &mut page, PointerKind::Move, 200.0, 85.0);
        assert!(sig.is_empty());
        assert_eq!(page.value("pad_value"), Some(""));
        assert_eq!(sig.segments(), 0);
    }

    #[test]
    fn down_while_drawing_restarts() {
        let (mut page, mut sig) = capture();
        pointer(&mut sig, &mut page, PointerKind::Down, 110.0, 60.0);
        pointer(&mut sig, &mut page, PointerKind::Down, 110.0, 85.0);
        pointer(&mut sig, &mut page, PointerKind::Move, 200.0, 60.0);
        assert_eq!(sig.state(), CaptureState::Drawing { last: Point::new(100.0, 10.0) });
        assert_eq!(sig.segments(), 1);

        // nothing along the old start's row between the two ends
        let w = sig.raster().width;
        for x in 20..90 {
            assert_eq!(sig.raster().pixels[9 * w + x], WHITE, "x={x}");
            assert_eq!(sig.raster().pixels[10 * w + x], WHITE, "x={x}");
        }
        assert!(!sig.is_empty());
    }

    #[test]
    fn clear_is_idempotent_and_blanks_the_field() {
        let (mut page, mut sig) = capture();
        pointer(&mut sig, &mut page, PointerKind::Down, 110.0, 60.0);
        pointer(&mut sig, &mut page, PointerKind::Move, 160.0, 75.0);

        sig.clear(&mut page);
        let once = (sig.raster().clone(), page.value("pad_value").map(str::to_owned), sig.state());
        sig.clear(&mut page);
        let twice = (sig.raster().clone(), page.value("pad_value").map(str::to_owned), sig.state());

        assert_eq!(once, twice);
        assert!(sig.is_empty());
        assert_eq!(page.value("pad_value"), Some(""));
        assert_eq!(sig.segments(), 0);
    }
}

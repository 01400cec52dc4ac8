// Core raster and geometry types shared by the capture, drawing and encoding code.

use image::{Rgb, RgbImage};

pub const WHITE: u32 = 0x00_FF_FF_FF;
pub const BLACK: u32 = 0x00_00_00_00;

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // raster width in pixels
    pub height: usize,     // raster height in pixels
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB (minifb layout)
}

impl FrameBuffer {
    /// A raster of the given size filled with one color.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        for p in &mut self.pixels { *p = color; }
    }

    /// True when every pixel equals `color`.
    pub fn is_uniform(&self, color: u32) -> bool {
        self.pixels.iter().all(|&p| p == color)
    }

    /// Unpack into an 8-bit RGB image for the encoders.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let px = self.pixels[y as usize * self.width + x as usize];
            Rgb([((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8])
        })
    }
}

/// A position in surface-local (or client) pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self { Self { x, y } }
}

/// On-page box of an element: top-left offset plus size, like a bounding client rect.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.y >= self.top
            && p.x < self.left + self.width && p.y < self.top + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineCap { Butt, Round }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineJoin { Miter, Round }

/// Pen used for signature strokes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: u32,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl Default for StrokeStyle {
    // black, 2px, round caps and joins
    fn default() -> Self {
        Self { color: BLACK, width: 2.0, cap: LineCap::Round, join: LineJoin::Round }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_buffer_is_uniform_until_touched() {
        let mut fb = FrameBuffer::filled(4, 3, WHITE);
        assert!(fb.is_uniform(WHITE));
        fb.pixels[5] = BLACK;
        assert!(!fb.is_uniform(WHITE));
        fb.fill(WHITE);
        assert!(fb.is_uniform(WHITE));
    }

    #[test]
    fn rgb_image_unpacks_channels() {
        let mut fb = FrameBuffer::filled(2, 2, WHITE);
        fb.pixels[3] = 0x00_12_34_56;
        let img = fb.to_rgb_image();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(1, 1), &Rgb([0x12, 0x34, 0x56]));
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10.0, 20.0, 5.0, 5.0);
        assert!(r.contains(Point::new(10.0, 20.0)));
        assert!(!r.contains(Point::new(15.0, 22.0)));
        assert!(!r.contains(Point::new(9.9, 22.0)));
    }
}

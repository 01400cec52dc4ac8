// Software drawing into signature rasters.
// 1) Round-capped pen segments (what a signature stroke looks like).
// 2) A stacked "pad view" of every surface, used by the interactive window.
// 3) The window itself, behind the `window` feature.

use crate::types::{FrameBuffer, LineCap, Point, StrokeStyle};

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0, x1, y1) = (x0, y0, x1, y1);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Stroke one pen segment from `from` to `to`.
///
/// Every pixel whose center lies within `width / 2` of the segment is painted.
/// With round caps the ends are half discs, so consecutive segments meet in a
/// round join and a zero-length segment still leaves a dot.
pub fn stroke_segment(fb: &mut FrameBuffer, from: Point, to: Point, style: &StrokeStyle) {
    let r = (style.width * 0.5).max(0.5);
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len2 = dx * dx + dy * dy;

    // Only scan the part of the bounding box that lands on the raster.
    let min_x = ((from.x.min(to.x) - r).floor() as i32).max(0);
    let max_x = ((from.x.max(to.x) + r).ceil() as i32).min(fb.width as i32 - 1);
    let min_y = ((from.y.min(to.y) - r).floor() as i32).max(0);
    let max_y = ((from.y.max(to.y) + r).ceil() as i32).min(fb.height as i32 - 1);
    if min_x > max_x || min_y > max_y {
        return;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let cx = x as f32 + 0.5;
            let cy = y as f32 + 0.5;
            let t = if len2 > 0.0 { ((cx - from.x) * dx + (cy - from.y) * dy) / len2 } else { 0.0 };
            let t = match style.cap {
                LineCap::Round => t.clamp(0.0, 1.0),
                LineCap::Butt if len2 == 0.0 || !(0.0..=1.0).contains(&t) => continue,
                LineCap::Butt => t,
            };
            let (px, py) = (from.x + t * dx - cx, from.y + t * dy - cy);
            if px * px + py * py <= r * r {
                put_pixel(fb, x, y, style.color);
            }
        }
    }
}

/// Stack the given rasters top to bottom with a 1px divider between them.
/// The window shows this so both signature pads are visible at once.
pub fn compose_pad_view(surfaces: &[&FrameBuffer], background: u32, divider: u32) -> FrameBuffer {
    let width = surfaces.iter().map(|s| s.width).max().unwrap_or(0);
    let height = surfaces.iter().map(|s| s.height).sum::<usize>() + surfaces.len().saturating_sub(1);
    let mut out = FrameBuffer::filled(width, height, background);

    let mut top = 0usize;
    for (i, s) in surfaces.iter().enumerate() {
        if i > 0 {
            draw_line(&mut out, 0, top as i32, width as i32 - 1, top as i32, divider);
            top += 1;
        }
        for row in 0..s.height {
            let src = &s.pixels[row * s.width..(row + 1) * s.width];
            let dst = (top + row) * width;
            out.pixels[dst..dst + s.width].copy_from_slice(src);
        }
        top += s.height;
    }
    out
}

#[cfg(feature = "window")]
pub use window::Drawer;

#[cfg(feature = "window")]
mod window {
    use crate::error::Error;
    use crate::types::FrameBuffer;
    use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

    pub struct Drawer {
        window: Window, // the on-screen signature pad
    }

    impl Drawer {
        /// Create a window sized to the stacked pad view.
        pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
            let mut window = Window::new(title, width, height, WindowOptions::default())
                .map_err(|e| Error::WindowInit(e.to_string()))?;
            window.set_target_fps(60);
            Ok(Self { window })
        }

        /// Push the pixels for this frame to the screen.
        pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
            self.window
                .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
                .map_err(|e| Error::WindowUpdate(e.to_string()))?;
            Ok(())
        }

        /// Returns false when the user closes the window.
        pub fn is_open(&self) -> bool {
            self.window.is_open()
        }

        pub fn esc_pressed(&self) -> bool {
            self.window.is_key_down(Key::Escape)
        }

        /// Mouse position in window pixels; None while the cursor is outside.
        pub fn mouse_pos(&self) -> Option<(f32, f32)> {
            self.window.get_mouse_pos(MouseMode::Discard)
        }

        pub fn left_mouse_down(&self) -> bool {
            self.window.get_mouse_down(MouseButton::Left)
        }

        pub fn pressed_once(&self, key: Key) -> bool {
            self.window.is_key_pressed(key, KeyRepeat::No)
        }
    }
}

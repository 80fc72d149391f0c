// Software drawing into a FrameBuffer.
// Visual effects provided here:
// 1) Sprites (terrain, cutouts) placed and rotated in world space.
// 2) Hit-box outlines for debugging collision shapes.
// 3) A tiny 5x7 bitmap font for the HUD, scalable for readability.
use image::RgbaImage;

use crate::types::{FrameBuffer, Point, Pose};

pub const BACKGROUND: u32 = 0x00_2F_4F_4F; // dark slate gray
pub const WHITE: u32 = 0x00_FF_FF_FF;
pub const RED: u32 = 0x00_FF_00_00;
pub const YELLOW: u32 = 0x00_FF_CC_33;

/// World (y up, scrolled by `offset`) <-> screen (y down) mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub offset: f32,
    pub screen_height: f32,
}

impl Viewport {
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x, self.screen_height - (p.y - self.offset))
    }

    pub fn to_world(&self, sx: f32, sy: f32) -> Point {
        Point::new(sx, self.screen_height - sy + self.offset)
    }
}

/// Anything the host can draw once per frame after the tick.
pub trait Drawable {
    fn draw(&self, fb: &mut FrameBuffer, view: &Viewport);

    /// Collision outline overlay; nothing by default.
    fn draw_hit_box(&self, _fb: &mut FrameBuffer, _view: &Viewport) {}
}

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
pub fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
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

/// Stroke a closed local-space polygon placed at `pose`.
/// Visual: the collision outline hugging the sprite.
pub fn draw_polygon(fb: &mut FrameBuffer, view: &Viewport, polygon: &[Point], pose: Pose, color: u32) {
    let angle = pose.rotation.to_radians();
    let screen: Vec<Point> = polygon
        .iter()
        .map(|p| {
            let r = p.rotated(angle);
            view.to_screen(Point::new(pose.x + r.x, pose.y + r.y))
        })
        .collect();
    for i in 0..screen.len() {
        let a = screen[i];
        let b = screen[(i + 1) % screen.len()];
        draw_line(fb, a.x.round() as i32, a.y.round() as i32, b.x.round() as i32, b.y.round() as i32, color);
    }
}

/// Draw an RGBA sprite centered at `pose` (world space), rotated counter-clockwise
/// by `pose.rotation` degrees. Inverse-mapped so rotation leaves no holes.
pub fn blit_sprite(fb: &mut FrameBuffer, view: &Viewport, sprite: &RgbaImage, pose: Pose) {
    let (w, h) = (sprite.width() as f32, sprite.height() as f32);
    if w == 0.0 || h == 0.0 { return; }
    let angle = pose.rotation.to_radians();

    // Screen-space bounding box of the rotated sprite.
    let reach = 0.5 * (w * w + h * h).sqrt();
    let c = view.to_screen(Point::new(pose.x, pose.y));
    let x0 = ((c.x - reach).floor() as i32).max(0);
    let x1 = ((c.x + reach).ceil() as i32).min(fb.width as i32 - 1);
    let y0 = ((c.y - reach).floor() as i32).max(0);
    let y1 = ((c.y + reach).ceil() as i32).min(fb.height as i32 - 1);

    for sy in y0..=y1 {
        for sx in x0..=x1 {
            let world = view.to_world(sx as f32 + 0.5, sy as f32 + 0.5);
            let local = Point::new(world.x - pose.x, world.y - pose.y).rotated(-angle);
            let ix = (local.x + w * 0.5).floor();
            let iy = (h * 0.5 - local.y).floor();
            if ix < 0.0 || iy < 0.0 || ix >= w || iy >= h { continue; }

            let px = sprite.get_pixel(ix as u32, iy as u32);
            let a = px[3] as u32;
            if a == 0 { continue; }
            let idx = sy as usize * fb.width + sx as usize;
            fb.pixels[idx] = blend(fb.pixels[idx], px[0], px[1], px[2], a);
        }
    }
}

/// Straight alpha "over" in sRGB space; cutouts are 0/255 so this is mostly a copy.
#[inline]
fn blend(dst: u32, r: u8, g: u8, b: u8, a: u32) -> u32 {
    if a >= 255 {
        return ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
    }
    let mix = |s: u8, d: u32| (s as u32 * a + d * (255 - a)) / 255;
    let dr = (dst >> 16) & 0xFF;
    let dg = (dst >> 8) & 0xFF;
    let db = dst & 0xFF;
    (mix(r, dr) << 16) | (mix(g, dg) << 8) | mix(b, db)
}

/* ---------- 5x7 bitmap font (uppercase, digits, a little punctuation) ---------- */

/// Return a 5x7 glyph bitmap. Each u8 is a row; the low 5 bits are the
/// pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '\'' => g!(0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000),

        _ => None,
    }
}

/// Draw one glyph, each font pixel as a `scale` x `scale` block, with a black
/// drop shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (shadow, c) in [(scale.max(1), 0x00000000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) == 0 { continue; }
                for by in 0..scale {
                    for bx in 0..scale {
                        put_pixel(fb, x + rx * scale + bx + shadow, y + ry as i32 * scale + by + shadow, c);
                    }
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; `scale` 1 is the native size.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: i32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color, scale);
        x += 6 * scale; // 5 pixels glyph width + 1 pixel spacing
    }
}

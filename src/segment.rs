// Camera frame -> silhouette cutout.
// Visual expectation: whoever stands in front of the green screen comes out as
// a transparent-background sprite, plus the polygon that outlines them.
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

use crate::config::{ChromaKey, GameConfig, MIN_SHAPE_AREA};
use crate::types::{Mask, Point};
use crate::vision;

/// A segmented silhouette at working resolution.
#[derive(Clone, Debug)]
pub struct Cutout {
    /// Source pixels inside the silhouette, fully transparent elsewhere.
    pub image: RgbaImage,
    /// Filled interior of the dominant contour.
    pub mask: Mask,
    /// Simplified outline around the image center, y up. Always >= 3 points.
    pub hit_polygon: Vec<Point>,
    /// Identity of the texture built from this cutout; bumps after each drop.
    pub texture_id: u64,
}

pub struct FrameSegmenter {
    width: u32,
    height: u32,
    key: ChromaKey,
    tolerance: f32,
}

impl FrameSegmenter {
    pub fn new(width: u32, height: u32, key: ChromaKey, tolerance: f32) -> Self {
        Self { width, height, key, tolerance }
    }

    pub fn from_config(cfg: &GameConfig) -> Self {
        Self::new(cfg.work_width, cfg.work_height, cfg.chroma_key, cfg.hit_box_tolerance)
    }

    /// Segment one camera frame. `None` when nothing but the key color (or no
    /// usable contour) is in view.
    pub fn segment(&self, frame: &RgbImage) -> Option<Cutout> {
        if frame.width() == 0 || frame.height() == 0 {
            return None;
        }

        // 1) Shrink for throughput and move to 4 channels.
        let small = imageops::resize(frame, self.width, self.height, FilterType::Triangle);
        let rgba = DynamicImage::ImageRgb8(small).into_rgba8();
        let (w, h) = rgba.dimensions();

        // 2) HSV chroma key, inverted: true = you, false = green screen.
        let foreground = vision::chroma_key_mask(&rgba, &self.key);

        // 3) + 4) Outer contours; the largest enclosed area wins (first on ties).
        let contours = vision::outer_contours(&foreground);
        let mut best: Option<(&Vec<Point>, f32)> = None;
        for c in &contours {
            let area = vision::polygon_area(c);
            if best.is_none_or(|(_, a)| area > a) {
                best = Some((c, area));
            }
        }
        let (contour, area) = best?;
        if area <= 0.0 {
            log::debug!("segment: only degenerate contours ({} found)", contours.len());
            return None;
        }

        // 5) Filled silhouette mask.
        let mask = vision::fill_contour(contour, w as usize, h as usize);

        // 6) Composite over the shared extent of frame and mask.
        let cw = w.min(mask.width as u32);
        let ch = h.min(mask.height as u32);
        let image = RgbaImage::from_fn(cw, ch, |x, y| {
            if mask.get(x as i32, y as i32) { *rgba.get_pixel(x, y) } else { Rgba([0, 0, 0, 0]) }
        });

        // 7) Hit polygon from the same contour, centered and flipped to y up.
        let outline = vision::simplify_closed(contour, self.tolerance);
        if outline.len() < 3 || vision::polygon_area(&outline) < MIN_SHAPE_AREA {
            return None;
        }
        let hit_polygon = to_local(&outline, cw, ch);

        Some(Cutout { image, mask, hit_polygon, texture_id: 0 })
    }
}

/// Pixel coordinates (y down, origin top-left) -> coordinates around the image
/// center with y up, the frame a sprite is positioned and rotated in.
pub fn to_local(outline: &[Point], width: u32, height: u32) -> Vec<Point> {
    let (hw, hh) = (width as f32 * 0.5, height as f32 * 0.5);
    outline
        .iter()
        .map(|p| Point::new(p.x + 0.5 - hw, hh - (p.y + 0.5)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const SCREEN: Rgb<u8> = Rgb([0, 255, 120]);
    const SKIN: Rgb<u8> = Rgb([200, 120, 90]);

    fn segmenter() -> FrameSegmenter {
        FrameSegmenter::new(320, 180, ChromaKey::default(), 1.5)
    }

    fn frame_with(rects: &[(u32, u32, u32, u32)]) -> RgbImage {
        RgbImage::from_fn(320, 180, |x, y| {
            let hit = rects.iter().any(|&(x0, y0, x1, y1)| x >= x0 && x <= x1 && y >= y0 && y <= y1);
            if hit { SKIN } else { SCREEN }
        })
    }

    #[test]
    fn all_key_color_yields_nothing() {
        let frame = RgbImage::from_pixel(320, 180, SCREEN);
        assert!(segmenter().segment(&frame).is_none());
    }

    #[test]
    fn empty_frame_yields_nothing() {
        assert!(segmenter().segment(&RgbImage::new(0, 0)).is_none());
    }

    #[test]
    fn polygon_has_three_points_and_stays_in_frame() {
        let cut = segmenter().segment(&frame_with(&[(100, 40, 180, 170)])).expect("cutout");
        assert!(cut.hit_polygon.len() >= 3);
        for p in &cut.hit_polygon {
            assert!(p.x.abs() <= 160.0 && p.y.abs() <= 90.0, "{p:?} outside frame");
        }
    }

    #[test]
    fn composite_is_transparent_outside_silhouette() {
        let cut = segmenter().segment(&frame_with(&[(100, 40, 180, 170)])).expect("cutout");
        assert_eq!(cut.image.dimensions(), (320, 180));
        assert_eq!(cut.image.get_pixel(5, 5), &Rgba([0, 0, 0, 0]));
        assert_eq!(cut.image.get_pixel(140, 100), &Rgba([200, 120, 90, 255]));
        assert!(cut.mask.get(140, 100));
        assert!(!cut.mask.get(20, 100));
    }

    #[test]
    fn largest_blob_wins() {
        let frame = frame_with(&[(10, 10, 20, 20), (200, 50, 290, 160)]);
        let cut = segmenter().segment(&frame).expect("cutout");
        assert!(!cut.mask.get(15, 15));
        assert!(cut.mask.get(250, 100));
        // Centered on the image: the big blob sits right of center.
        assert!(cut.hit_polygon.iter().all(|p| p.x > 0.0));
    }

    #[test]
    fn large_frames_are_shrunk_to_working_size() {
        let frame = RgbImage::from_fn(1280, 720, |x, y| {
            if (400..880).contains(&x) && (200..700).contains(&y) { SKIN } else { SCREEN }
        });
        let cut = segmenter().segment(&frame).expect("cutout");
        assert_eq!(cut.image.dimensions(), (320, 180));
        assert!(cut.mask.get(160, 110));
    }

    #[test]
    fn concave_silhouette_keeps_its_notch() {
        // Two legs joined at the top: a U turned upside down.
        let frame = frame_with(&[(100, 40, 200, 80), (100, 40, 130, 170), (170, 40, 200, 170)]);
        let cut = segmenter().segment(&frame).expect("cutout");
        assert!(!cut.mask.get(150, 150), "gap between legs must stay open");
        assert!(cut.hit_polygon.len() > 4);
    }
}

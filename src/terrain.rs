// The fixed ground everything lands on. Its opaque pixels define the
// collision shape, the same way a cutout's silhouette does.
use std::path::Path;

use image::RgbaImage;

use crate::config::MIN_SHAPE_AREA;
use crate::error::{Error, Result};
use crate::render::{self, Drawable, Viewport};
use crate::segment::to_local;
use crate::types::{FrameBuffer, Mask, Point, Pose};
use crate::vision;

pub struct Terrain {
    image: RgbaImage,
    hit_polygon: Vec<Point>,
    position: Point,
}

impl Terrain {
    /// Load the sprite and sit it on the bottom edge of the world, centered on `center_x`.
    pub fn load(path: &Path, center_x: f32, tolerance: f32) -> Result<Self> {
        if !path.exists() {
            return Err(Error::TerrainAsset(format!("{} not found", path.display())));
        }
        let image = image::open(path)?.into_rgba8();
        log::info!("terrain: {} ({}x{})", path.display(), image.width(), image.height());
        Self::from_image(image, center_x, tolerance)
    }

    pub fn from_image(image: RgbaImage, center_x: f32, tolerance: f32) -> Result<Self> {
        let (w, h) = image.dimensions();

        // Alpha > 0 is solid ground.
        let mut solid = Mask::new(w as usize, h as usize);
        for (x, y, px) in image.enumerate_pixels() {
            solid.set(x as i32, y as i32, px[3] > 0);
        }

        let outline = vision::outer_contours(&solid)
            .into_iter()
            .max_by(|a, b| vision::polygon_area(a).total_cmp(&vision::polygon_area(b)))
            .map(|c| vision::simplify_closed(&c, tolerance))
            .filter(|c| c.len() >= 3 && vision::polygon_area(c) >= MIN_SHAPE_AREA)
            .ok_or_else(|| Error::TerrainAsset("no opaque region to collide with".into()))?;

        Ok(Self {
            hit_polygon: to_local(&outline, w, h),
            position: Point::new(center_x, h as f32 * 0.5),
            image,
        })
    }

    pub fn hit_polygon(&self) -> &[Point] { &self.hit_polygon }

    /// Sprite center in world coordinates.
    pub fn position(&self) -> Point { self.position }

    fn pose(&self) -> Pose { Pose::new(self.position.x, self.position.y, 0.0) }
}

impl Drawable for Terrain {
    fn draw(&self, fb: &mut FrameBuffer, view: &Viewport) {
        render::blit_sprite(fb, view, &self.image, self.pose());
    }

    fn draw_hit_box(&self, fb: &mut FrameBuffer, view: &Viewport) {
        render::draw_polygon(fb, view, &self.hit_polygon, self.pose(), render::RED);
    }
}

// A dropped silhouette: the cutout it is drawn with plus the body that moves it.
use crate::physics::{BodyHandle, PhysicsWorld};
use crate::render::{self, Drawable, Viewport};
use crate::segment::Cutout;
use crate::types::{FrameBuffer, Player, Point, Pose};

/// Things the physics world simulates on our behalf.
pub trait Collidable {
    fn body(&self) -> BodyHandle;
    /// Collision outline around the body origin, y up.
    fn hit_polygon(&self) -> &[Point];
}

pub struct GameObject {
    cutout: Cutout,
    body: BodyHandle,
    pose: Pose,
    dropped_by: Player,
}

impl GameObject {
    pub fn new(cutout: Cutout, body: BodyHandle, pose: Pose, dropped_by: Player) -> Self {
        Self { cutout, body, pose, dropped_by }
    }

    /// Copy the body's position/rotation onto the sprite. The body is the only
    /// source of truth once dropped.
    pub fn sync(&mut self, world: &PhysicsWorld) {
        if let Some(pose) = world.pose(self.body) {
            self.pose = pose;
        }
    }

    pub fn pose(&self) -> Pose { self.pose }

    pub fn cutout(&self) -> &Cutout { &self.cutout }

    pub fn dropped_by(&self) -> Player { self.dropped_by }
}

impl Collidable for GameObject {
    fn body(&self) -> BodyHandle { self.body }

    fn hit_polygon(&self) -> &[Point] { &self.cutout.hit_polygon }
}

impl Drawable for GameObject {
    fn draw(&self, fb: &mut FrameBuffer, view: &Viewport) {
        render::blit_sprite(fb, view, &self.cutout.image, self.pose);
    }

    fn draw_hit_box(&self, fb: &mut FrameBuffer, view: &Viewport) {
        render::draw_polygon(fb, view, self.hit_polygon(), self.pose, render::RED);
    }
}

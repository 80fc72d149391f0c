// Tunables for the game. Constants are the defaults; `GameConfig` carries the
// values a session actually runs with, `Args` lets the command line override some.
use std::path::PathBuf;

use clap::Parser;

use crate::capture::RefreshPolicy;
use crate::types::{Point, Pose};

pub const SCREEN_WIDTH: usize = 1280;
pub const SCREEN_HEIGHT: usize = 720;
pub const SCREEN_TITLE: &str = "StackCam";

// What we ask the camera for; the device may pick something close.
pub const CAMERA_WIDTH: u32 = 640;
pub const CAMERA_HEIGHT: u32 = 480;
pub const CAMERA_FPS: u32 = 30;

// Camera frames are shrunk to this before segmentation (throughput).
pub const WORK_WIDTH: u32 = 320;
pub const WORK_HEIGHT: u32 = 180;

// Chroma key, OpenCV-style HSV: H in 0..180, S and V in 0..255.
pub const KEY_HUE: (u8, u8) = (62, 79);
pub const KEY_SAT: (u8, u8) = (100, 255);
pub const KEY_VAL: (u8, u8) = (0, 255);

pub const FIXED_TIME_STEP: f32 = 1.0 / 60.0;
pub const GRAVITY: Point = Point::new(0.0, -900.0);

pub const OBJECT_MASS: f32 = 0.5;
pub const OBJECT_FRICTION: f32 = 0.3;
pub const OBJECT_RESTITUTION: f32 = 0.1;
pub const TERRAIN_FRICTION: f32 = 10.0;
pub const TERRAIN_RESTITUTION: f32 = 0.0;

pub const PENDING_START: Pose = Pose::new(1050.0, 360.0, 0.0);
pub const DROP_LINE_MIN_Y: f32 = 360.0;
pub const PAN_SPEED: f32 = 300.0;    // px/sec while a pan key is held
pub const ROTATE_SPEED: f32 = 120.0; // deg/sec while a rotate key is held

// Gap kept between the settled stack and anything newly dropped.
pub const STACK_CLEARANCE: f32 = 20.0;
// Below these speeds a body counts as settled (px/s, rad/s).
pub const REST_LINEAR_SPEED: f32 = 5.0;
pub const REST_ANGULAR_SPEED: f32 = 0.1;
pub const FALL_LIMIT_Y: f32 = 0.0;

// Max distance (working pixels) between an outline and its simplified polygon.
pub const HIT_BOX_TOLERANCE: f32 = 1.5;
// Outlines enclosing less than this cannot become a collision shape.
pub const MIN_SHAPE_AREA: f32 = 1.0;

/// Chroma-key band, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChromaKey {
    pub hue: (u8, u8),
    pub sat: (u8, u8),
    pub val: (u8, u8),
}

impl Default for ChromaKey {
    fn default() -> Self {
        Self { hue: KEY_HUE, sat: KEY_SAT, val: KEY_VAL }
    }
}

/// Friction/restitution pair for one collision shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub camera_index: u32,
    pub terrain_path: PathBuf,
    pub screen_width: f32,
    pub screen_height: f32,
    pub work_width: u32,
    pub work_height: u32,
    pub chroma_key: ChromaKey,
    pub hit_box_tolerance: f32,
    pub refresh_policy: RefreshPolicy,
    pub fixed_dt: f32,
    pub gravity: Point,
    pub object_mass: f32,
    pub object_material: Material,
    pub terrain_material: Material,
    pub pending_start: Pose,
    pub drop_line_min_y: f32,
    pub pan_speed: f32,
    pub rotate_speed: f32,
    pub stack_clearance: f32,
    pub fall_limit_y: f32,
    pub debug_hitboxes: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            terrain_path: PathBuf::from("assets/terrain.png"),
            screen_width: SCREEN_WIDTH as f32,
            screen_height: SCREEN_HEIGHT as f32,
            work_width: WORK_WIDTH,
            work_height: WORK_HEIGHT,
            chroma_key: ChromaKey::default(),
            hit_box_tolerance: HIT_BOX_TOLERANCE,
            refresh_policy: RefreshPolicy::ShowNothing,
            fixed_dt: FIXED_TIME_STEP,
            gravity: GRAVITY,
            object_mass: OBJECT_MASS,
            object_material: Material { friction: OBJECT_FRICTION, restitution: OBJECT_RESTITUTION },
            terrain_material: Material { friction: TERRAIN_FRICTION, restitution: TERRAIN_RESTITUTION },
            pending_start: PENDING_START,
            drop_line_min_y: DROP_LINE_MIN_Y,
            pan_speed: PAN_SPEED,
            rotate_speed: ROTATE_SPEED,
            stack_clearance: STACK_CLEARANCE,
            fall_limit_y: FALL_LIMIT_Y,
            debug_hitboxes: false,
        }
    }
}

/// Turn-based stacking game played with your own webcam silhouette.
#[derive(Parser, Debug)]
#[command(name = "stackcam")]
pub struct Args {
    /// Index of the camera device to open
    #[arg(short, long, default_value_t = 0)]
    pub camera: u32,

    /// Terrain sprite; its opaque pixels become the ground collision shape
    #[arg(short, long, default_value = "assets/terrain.png")]
    pub terrain: PathBuf,

    /// Keep showing the last good silhouette when segmentation fails
    #[arg(long)]
    pub hold_last_good: bool,

    /// Start with hit-box outlines visible
    #[arg(long)]
    pub debug_hitboxes: bool,
}

impl Args {
    pub fn into_config(self) -> GameConfig {
        GameConfig {
            camera_index: self.camera,
            terrain_path: self.terrain,
            refresh_policy: if self.hold_last_good {
                RefreshPolicy::HoldLastGood
            } else {
                RefreshPolicy::ShowNothing
            },
            debug_hitboxes: self.debug_hitboxes,
            ..GameConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_first_camera_and_show_nothing() {
        let cfg = Args::parse_from(["stackcam"]).into_config();
        assert_eq!(cfg.camera_index, 0);
        assert_eq!(cfg.refresh_policy, RefreshPolicy::ShowNothing);
        assert_eq!(cfg.terrain_path, PathBuf::from("assets/terrain.png"));
        assert!(!cfg.debug_hitboxes);
    }

    #[test]
    fn args_override_camera_and_policy() {
        let cfg = Args::parse_from(["stackcam", "--camera", "2", "--hold-last-good"]).into_config();
        assert_eq!(cfg.camera_index, 2);
        assert_eq!(cfg.refresh_policy, RefreshPolicy::HoldLastGood);
        assert_eq!(cfg.work_width, WORK_WIDTH);
    }
}

// The pending silhouette: live camera cutout the current player steers before
// dropping it. Visual: your cut-out self hovering above the stack.
use image::RgbImage;

use crate::config::GameConfig;
use crate::error::Result;
use crate::segment::{Cutout, FrameSegmenter};
use crate::types::Pose;

/// Anything that can hand us one RGB frame per call (a webcam, a test script).
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<RgbImage>;
}

/// What `refresh` does with the previous cutout when segmentation fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Drop it: nothing is drawn and the drop action is disabled this tick.
    ShowNothing,
    /// Keep showing (and allow dropping) the last good cutout.
    HoldLastGood,
}

/// Frozen copy of the pending silhouette, handed to the physics world on drop.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub cutout: Cutout,
    pub pose: Pose,
}

pub struct SilhouetteCapture<S: FrameSource> {
    source: S,
    segmenter: FrameSegmenter,
    policy: RefreshPolicy,
    sequence: u64,
    pose: Pose,
    cutout: Option<Cutout>,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl<S: FrameSource> SilhouetteCapture<S> {
    pub fn new(source: S, cfg: &GameConfig) -> Self {
        Self {
            source,
            segmenter: FrameSegmenter::from_config(cfg),
            policy: cfg.refresh_policy,
            sequence: 0,
            pose: cfg.pending_start,
            cutout: None,
            min_y: cfg.drop_line_min_y,
            max_x: cfg.screen_width,
            max_y: cfg.screen_height,
        }
    }

    /// Pull one frame and re-segment it. Camera errors are transient: they
    /// count as "no cutout this tick".
    pub fn refresh(&mut self) {
        let next = match self.source.next_frame() {
            Ok(frame) => self.segmenter.segment(&frame),
            Err(e) => {
                log::warn!("capture: {e}");
                None
            }
        };

        match (next, self.policy) {
            (Some(mut cutout), _) => {
                cutout.texture_id = self.sequence;
                self.cutout = Some(cutout);
            }
            (None, RefreshPolicy::ShowNothing) => {
                if self.cutout.take().is_some() {
                    log::debug!("capture: silhouette lost");
                }
            }
            (None, RefreshPolicy::HoldLastGood) => {}
        }
    }

    /// Move the pending silhouette. It stays on screen and never goes below the drop line.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pose.x = (self.pose.x + dx).clamp(0.0, self.max_x);
        self.pose.y = (self.pose.y + dy).clamp(self.min_y, self.max_y.max(self.min_y));
    }

    /// Rotate by `degrees`; unbounded, trigonometry wraps it later.
    pub fn rotate(&mut self, degrees: f32) {
        self.pose.rotation += degrees;
    }

    /// Put the pending silhouette back at its starting pose.
    pub fn reset_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Freeze the current cutout and pose. `None` means there is nothing to drop.
    /// Changes nothing: the caller confirms with `commit_drop` once the
    /// snapshot has actually become a body.
    pub fn take_snapshot(&self) -> Option<Snapshot> {
        let cutout = self.cutout.clone()?;
        Some(Snapshot { cutout, pose: self.pose })
    }

    /// The last snapshot was dropped; later cutouts get a fresh texture identity.
    pub fn commit_drop(&mut self) {
        self.sequence += 1;
    }

    pub fn cutout(&self) -> Option<&Cutout> { self.cutout.as_ref() }

    pub fn pose(&self) -> Pose { self.pose }

    pub fn sequence(&self) -> u64 { self.sequence }
}

// Opens a webcam and hands out RGB frames for segmentation.
// Visual expectation: every `next_frame()` is one fresh picture of you in
// front of the green screen, at whatever resolution the device settled on.

use image::RgbImage;
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use stackcam::capture::FrameSource;
use stackcam::config::CAMERA_FPS;
use stackcam::error::{Error, Result};

// A small wrapper around nokhwa::Camera so the game loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index` near the requested resolution and start streaming.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            CAMERA_FPS,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera {index}: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The stream might choose a slightly different resolution.
        let actual = cam.resolution();
        log::info!("camera {index}: streaming {}x{}", actual.width(), actual.height());

        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for CameraCapture {
    /// Blocks until the device delivers a frame.
    fn next_frame(&mut self) -> Result<RgbImage> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let rgb = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(Error::EmptyFrame);
        }
        Ok(rgb)
    }
}

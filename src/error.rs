// Crate error type. Every variant states *where* things went wrong.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed

    #[error("Window update error: {0}")]
    WindowUpdate(String), // Pushing the frame buffer failed

    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed

    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed

    #[error("Camera delivered an empty frame")]
    EmptyFrame,

    #[error("Terrain asset error: {0}")]
    TerrainAsset(String), // Terrain image missing or without any opaque pixels

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Startup failures abort the program; everything else is retried next tick.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::WindowInit(_) | Error::CameraInit(_) | Error::TerrainAsset(_) | Error::Image(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_are_transient() {
        assert!(!Error::EmptyFrame.is_fatal());
        assert!(!Error::CameraFrame("timeout".into()).is_fatal());
        assert!(!Error::WindowUpdate("size mismatch".into()).is_fatal());
        assert!(Error::WindowInit("no display".into()).is_fatal());
        assert!(Error::CameraInit("no device".into()).is_fatal());
        assert!(Error::TerrainAsset("missing".into()).is_fatal());
    }

    #[test]
    fn messages_name_the_failure_site() {
        let e = Error::TerrainAsset("assets/terrain.png".into());
        assert_eq!(e.to_string(), "Terrain asset error: assets/terrain.png");
    }
}

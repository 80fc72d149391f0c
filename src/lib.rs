//! Turn-based stacking game played with webcam silhouettes: green-screen
//! segmentation, rigid-body physics and the game rules. Camera and window
//! hosting live in the binary.

pub mod capture;
pub mod config;
pub mod error;
pub mod input;
pub mod object;
pub mod physics;
pub mod render;
pub mod segment;
pub mod session;
pub mod terrain;
pub mod types;
pub mod vision;

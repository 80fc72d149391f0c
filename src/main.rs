// What you SEE:
// • Your green-screened silhouette floats at the top right of the window.
// • Arrows move it, A/D rotate it, Space or P drops it onto the stack.
// • Players take turns; whoever is up when something falls off wins.
// • R starts over after game over, H shows hit boxes, F fullscreen, ESC quits.

mod camera;
mod window;

use std::time::{Duration, Instant};

use clap::Parser;

use camera::CameraCapture;
use stackcam::config::{Args, CAMERA_HEIGHT, CAMERA_WIDTH, SCREEN_HEIGHT, SCREEN_TITLE, SCREEN_WIDTH};
use stackcam::error::Error;
use stackcam::session::{GameSession, HostCommand};
use stackcam::terrain::Terrain;
use stackcam::types::FrameBuffer;
use window::Drawer;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Args::parse().into_config();

    /* --- Assets, camera, window ---
       Any failure here is fatal: no terrain or no camera means no game. */
    let terrain = Terrain::load(&cfg.terrain_path, cfg.screen_width * 0.5, cfg.hit_box_tolerance)?;
    let cam = CameraCapture::new(cfg.camera_index, CAMERA_WIDTH, CAMERA_HEIGHT)?;
    let (cw, ch) = cam.resolution();
    log::info!("main: camera {cw}x{ch}, segmenting at {}x{}", cfg.work_width, cfg.work_height);

    let mut drawer = Drawer::new(SCREEN_TITLE, SCREEN_WIDTH, SCREEN_HEIGHT)?;
    let mut session = GameSession::new(cfg, cam, terrain)?;
    let mut screen = FrameBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);

    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut last_frame_time = Instant::now();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() {
        let now = Instant::now();
        let dt = (now - last_frame_time).as_secs_f32();
        last_frame_time = now;

        /* 1) Key edges from the previous present */
        for control in drawer.pressed() {
            if let Some(HostCommand::ToggleFullscreen) = session.on_key_press(control) {
                drawer.toggle_fullscreen()?;
            }
        }
        for control in drawer.released() {
            session.on_key_release(control);
        }

        /* 2) Camera -> physics -> viewport, then draw the result */
        session.tick(dt);
        session.draw(&mut screen);

        /* 3) Present (this is when the on-screen image updates).
           A dropped frame is not worth quitting over. */
        if let Err(e) = drawer.present(&screen) {
            if e.is_fatal() {
                return Err(e);
            }
            log::warn!("main: {e}");
        }

        /* 4) FPS, once per second */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            log::info!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    log::info!("main: window closed");
    Ok(())
}

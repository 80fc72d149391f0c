// The on-screen window: shows the game frame buffer and turns keyboard
// edges into game controls.

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use stackcam::error::{Error, Result};
use stackcam::input::Control;
use stackcam::types::FrameBuffer;

pub struct Drawer {
    window: Window,
    title: String,
    width: usize,
    height: usize,
    fullscreen: bool,
}

impl Drawer {
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = open(title, width, height, false)?;
        Ok(Self { window, title: title.to_owned(), width, height, fullscreen: false })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// False once the user closes the window or hits Escape.
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    /// Controls whose key went down since the last `present`.
    pub fn pressed(&self) -> Vec<Control> {
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(control_for)
            .collect()
    }

    /// Controls whose key came back up since the last `present`.
    pub fn released(&self) -> Vec<Control> {
        self.window.get_keys_released().into_iter().filter_map(control_for).collect()
    }

    /// minifb has no real fullscreen; reopen the window borderless instead.
    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        let fullscreen = !self.fullscreen;
        self.window = open(&self.title, self.width, self.height, fullscreen)?;
        self.fullscreen = fullscreen;
        log::info!("window: fullscreen {}", if fullscreen { "on" } else { "off" });
        Ok(())
    }
}

fn open(title: &str, width: usize, height: usize, borderless: bool) -> Result<Window> {
    let opts = WindowOptions { borderless, topmost: borderless, ..WindowOptions::default() };
    Window::new(title, width, height, opts).map_err(|e| Error::WindowInit(e.to_string()))
}

fn control_for(key: Key) -> Option<Control> {
    let control = match key {
        Key::Space | Key::P => Control::Drop,
        Key::Left => Control::PanLeft,
        Key::Right => Control::PanRight,
        Key::Up => Control::PanUp,
        Key::Down => Control::PanDown,
        Key::A => Control::RotateLeft,
        Key::D => Control::RotateRight,
        Key::R => Control::Reset,
        Key::H => Control::ToggleHitBoxes,
        Key::F => Control::ToggleFullscreen,
        _ => return None,
    };
    Some(control)
}

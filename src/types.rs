// Core value types shared by the vision, physics and drawing code.

/// Software screen buffer handed to the window each frame.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Fill the whole buffer with one color.
    pub fn clear(&mut self, color: u32) {
        for p in &mut self.pixels { *p = color; }
    }
}

/// 2D point. Image code uses pixel coordinates (y down); world and
/// hit-polygon code uses y up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self { Self { x, y } }

    /// Rotate around the origin by `radians` (counter-clockwise, y up).
    pub fn rotated(self, radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self { x: self.x * c - self.y * s, y: self.x * s + self.y * c }
    }
}

/// Position plus rotation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

impl Pose {
    pub const fn new(x: f32, y: f32, rotation: f32) -> Self { Self { x, y, rotation } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Playing,
    GameOver,
}

/// One bool per pixel; true = foreground. Reads outside the mask are background.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<bool>,   // length = width * height, row-major
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![false; width * height] }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.data[y as usize * self.width + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: bool) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.data[y as usize * self.width + x as usize] = value;
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

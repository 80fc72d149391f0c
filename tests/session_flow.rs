// Whole-game flows driven through the public API with a scripted camera and a
// narrow slab of ground, so silhouettes can be made to miss it.

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use stackcam::capture::{FrameSource, RefreshPolicy};
use stackcam::config::GameConfig;
use stackcam::error::{Error, Result};
use stackcam::input::Control;
use stackcam::object::Collidable;
use stackcam::session::GameSession;
use stackcam::terrain::Terrain;
use stackcam::types::{GameState, Player, Pose};

const DT: f32 = 1.0 / 60.0;
const SCREEN: Rgb<u8> = Rgb([0, 255, 120]);
const SKIN: Rgb<u8> = Rgb([200, 120, 90]);

/// Serves frames in order; `None` is a failed read. The last entry repeats forever.
struct Scripted {
    frames: Vec<Option<RgbImage>>,
    next: usize,
}

impl Scripted {
    fn new(frames: Vec<Option<RgbImage>>) -> Self {
        Self { frames, next: 0 }
    }

    fn always(frame: RgbImage) -> Self {
        Self::new(vec![Some(frame)])
    }
}

impl FrameSource for Scripted {
    fn next_frame(&mut self) -> Result<RgbImage> {
        let i = self.next.min(self.frames.len().saturating_sub(1));
        self.next += 1;
        self.frames
            .get(i)
            .cloned()
            .flatten()
            .ok_or_else(|| Error::CameraFrame("scripted failure".into()))
    }
}

fn person() -> RgbImage {
    RgbImage::from_fn(320, 180, |x, y| {
        if (140..180).contains(&x) && (60..120).contains(&y) { SKIN } else { SCREEN }
    })
}

/// 400 px wide slab centered on x = 640; anything dropped past x = 860 misses it.
fn slab() -> Terrain {
    let img = RgbaImage::from_pixel(400, 100, Rgba([90, 60, 30, 255]));
    Terrain::from_image(img, 640.0, 1.5).expect("terrain")
}

fn config_over_slab() -> GameConfig {
    GameConfig { pending_start: Pose::new(640.0, 360.0, 0.0), ..GameConfig::default() }
}

fn run_until_game_over<S: FrameSource>(s: &mut GameSession<S>, max_ticks: usize) -> bool {
    for _ in 0..max_ticks {
        s.tick(DT);
        if s.state() == GameState::GameOver {
            return true;
        }
    }
    false
}

#[test]
fn first_drop_off_the_edge_hands_the_win_to_player_two() {
    // Default start x = 1050 is well past the slab.
    let mut s = GameSession::new(GameConfig::default(), Scripted::always(person()), slab()).expect("session");
    s.tick(DT);
    assert!(s.drop_silhouette());
    assert_eq!(s.turn(), Player::Two);

    assert!(run_until_game_over(&mut s, 300), "silhouette never fell off");
    assert_eq!(s.winner(), Some(Player::Two));
    assert!(s.objects().is_empty());
    assert_eq!(s.world().body_count(), 1);
}

#[test]
fn game_over_is_sticky_and_reset_starts_fresh() {
    let cfg = config_over_slab();
    let start = cfg.pending_start;
    let mut s = GameSession::new(cfg, Scripted::always(person()), slab()).expect("session");

    // Player one stacks onto the slab.
    s.tick(DT);
    assert!(s.drop_silhouette());
    for _ in 0..120 {
        s.tick(DT);
    }
    assert_eq!(s.state(), GameState::Playing);
    assert_eq!(s.objects().len(), 1);
    let resting = s.objects()[0].body();
    assert_eq!(s.objects()[0].dropped_by(), Player::One);
    assert!(s.objects()[0].cutout().hit_polygon.len() >= 3);
    assert!(s.objects()[0].pose().y > 0.0);

    // Player two steers past the edge and drops.
    s.on_key_press(Control::PanRight);
    s.tick(2.0);
    s.on_key_release(Control::PanRight);
    assert_eq!(s.capture().pose().x, 1240.0);
    assert!(s.drop_silhouette());
    assert_eq!(s.turn(), Player::One);

    assert!(run_until_game_over(&mut s, 300), "silhouette never fell off");
    assert_eq!(s.winner(), Some(Player::One));
    assert_eq!(s.objects().len(), 1);

    for _ in 0..30 {
        s.tick(DT);
    }
    assert_eq!(s.state(), GameState::GameOver);
    assert!(!s.drop_silhouette());
    assert_eq!(s.objects().len(), 1);

    s.on_key_press(Control::Reset);
    assert_eq!(s.state(), GameState::Playing);
    assert_eq!(s.turn(), Player::One);
    assert_eq!(s.winner(), None);
    assert!(s.objects().is_empty());
    assert_eq!(s.world().body_count(), 1);
    assert!(!s.world().contains(resting));
    assert_eq!(s.capture().pose(), start);
    assert_eq!(s.viewport_offset(), 0.0);
}

#[test]
fn camera_dropouts_follow_the_refresh_policy() {
    let frames = || vec![Some(person()), None];

    let mut strict = GameSession::new(config_over_slab(), Scripted::new(frames()), slab()).expect("session");
    strict.tick(DT);
    strict.tick(DT);
    assert!(!strict.drop_silhouette());
    assert_eq!(strict.turn(), Player::One);

    let cfg = GameConfig { refresh_policy: RefreshPolicy::HoldLastGood, ..config_over_slab() };
    let mut lenient = GameSession::new(cfg, Scripted::new(frames()), slab()).expect("session");
    lenient.tick(DT);
    lenient.tick(DT);
    assert!(lenient.drop_silhouette());
    assert_eq!(lenient.turn(), Player::Two);
}

#[test]
fn repeated_drops_spawn_clear_of_the_stack() {
    // 80x100 silhouette, dropped four times at the default x onto full-width ground.
    let tall = RgbImage::from_fn(320, 180, |x, y| {
        if (120..200).contains(&x) && (40..140).contains(&y) { SKIN } else { SCREEN }
    });
    let ground = Terrain::from_image(RgbaImage::from_pixel(1280, 140, Rgba([90, 60, 30, 255])), 640.0, 1.5)
        .expect("terrain");
    let cfg = GameConfig::default();
    let clearance = cfg.stack_clearance;
    let drop_line = cfg.drop_line_min_y;
    let mut s = GameSession::new(cfg, Scripted::always(tall), ground).expect("session");

    for n in 1..=4 {
        s.tick(DT);
        let top_before = s
            .objects()
            .iter()
            .filter_map(|o| s.world().vertical_bounds(o.body()))
            .map(|(_, top)| top)
            .reduce(f32::max);

        assert!(s.drop_silhouette(), "drop {n} refused");
        let newest = s.objects().last().expect("dropped").body();
        let (bottom, _) = s.world().vertical_bounds(newest).expect("spawned");
        if let Some(top) = top_before {
            assert!(bottom > top, "drop {n}: spawned at {bottom}, stack top {top}");
        }

        for _ in 0..240 {
            s.tick(DT);
        }
        assert_eq!(s.state(), GameState::Playing, "drop {n} toppled the stack");
    }
    assert_eq!(s.objects().len(), 4);

    // The view now scrolls so the drop line sits a clearance above the settled top.
    let top = s
        .objects()
        .iter()
        .filter_map(|o| s.world().vertical_bounds(o.body()))
        .map(|(_, top)| top)
        .fold(f32::MIN, f32::max);
    assert!(top > drop_line);
    assert!((s.viewport_offset() - (top + clearance - drop_line)).abs() < 1.0);
}

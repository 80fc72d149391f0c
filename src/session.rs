// One game: turns, the stack of dropped silhouettes, game over and reset.
// Per tick: camera refresh -> input -> physics step -> body->sprite sync ->
// fall check -> viewport. Drawing reads the result afterwards.
use crate::capture::{FrameSource, SilhouetteCapture};
use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::input::{Control, ControlState};
use crate::object::{Collidable, GameObject};
use crate::physics::PhysicsWorld;
use crate::render::{self, Drawable, Viewport};
use crate::terrain::Terrain;
use crate::types::{FrameBuffer, GameState, Player, Point, Pose};

/// Requests the session cannot honor itself and passes up to the window host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostCommand {
    ToggleFullscreen,
}

pub struct GameSession<S: FrameSource> {
    cfg: GameConfig,
    capture: SilhouetteCapture<S>,
    terrain: Terrain,
    world: PhysicsWorld,
    objects: Vec<GameObject>,
    turn: Player,
    state: GameState,
    winner: Option<Player>,
    viewport_offset: f32,
    controls: ControlState,
    debug_hitboxes: bool,
}

impl<S: FrameSource> GameSession<S> {
    pub fn new(cfg: GameConfig, source: S, terrain: Terrain) -> Result<Self> {
        let world = build_world(&cfg, &terrain)?;
        let capture = SilhouetteCapture::new(source, &cfg);
        log::info!("session: ready, {} to play", player_label(Player::One));
        Ok(Self {
            debug_hitboxes: cfg.debug_hitboxes,
            cfg,
            capture,
            terrain,
            world,
            objects: Vec::new(),
            turn: Player::One,
            state: GameState::Playing,
            winner: None,
            viewport_offset: 0.0,
            controls: ControlState::default(),
        })
    }

    /// Advance one frame. `dt` (wall clock) only drives pan/rotate speed;
    /// physics always advances by the fixed step.
    pub fn tick(&mut self, dt: f32) {
        self.capture.refresh();

        if self.state == GameState::Playing {
            let (px, py) = self.controls.pan_axis();
            if px != 0.0 || py != 0.0 {
                self.capture.pan(px * self.cfg.pan_speed * dt, py * self.cfg.pan_speed * dt);
            }
            let r = self.controls.rotate_axis();
            if r != 0.0 {
                self.capture.rotate(r * self.cfg.rotate_speed * dt);
            }
        }

        self.world.step(self.cfg.fixed_dt);

        for obj in &mut self.objects {
            obj.sync(&self.world);
        }

        // Body and object leave together.
        let world = &mut self.world;
        let limit = self.cfg.fall_limit_y;
        let before = self.objects.len();
        self.objects.retain(|obj| {
            let gone = world.remove_if_below(obj.body(), limit);
            if gone {
                log::debug!("session: object from {} left the playfield", player_label(obj.dropped_by()));
            }
            !gone
        });
        let fallen = before - self.objects.len();
        if fallen > 0 && self.state == GameState::Playing {
            self.state = GameState::GameOver;
            self.winner = Some(self.turn);
            log::info!("session: {fallen} object(s) fell, {} wins", player_label(self.turn));
        }

        self.viewport_offset = self.compute_viewport_offset();
    }

    /// Commit the pending silhouette to the world. False (and no change to
    /// turn, objects or bodies) when there is nothing to drop or the game is over.
    pub fn drop_silhouette(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let Some(snapshot) = self.capture.take_snapshot() else {
            log::debug!("session: drop ignored, no silhouette");
            return false;
        };

        let pose = self.clear_of_stack(self.screen_to_world(snapshot.pose), &snapshot.cutout.hit_polygon);
        let Some(body) = self.world.spawn(
            &snapshot.cutout.hit_polygon,
            pose,
            self.cfg.object_mass,
            self.cfg.object_material,
        ) else {
            log::warn!("session: silhouette outline cannot form a body");
            return false;
        };

        self.capture.commit_drop();
        self.objects.push(GameObject::new(snapshot.cutout, body, pose, self.turn));
        log::info!(
            "session: {} dropped object #{} at ({:.0}, {:.0})",
            player_label(self.turn),
            self.objects.len(),
            pose.x,
            pose.y
        );
        self.turn = self.turn.other();
        true
    }

    /// Start over with a fresh world. Only honored after game over.
    pub fn reset(&mut self) -> bool {
        if self.state != GameState::GameOver {
            return false;
        }
        let world = match build_world(&self.cfg, &self.terrain) {
            Ok(world) => world,
            Err(e) => {
                log::error!("session: reset failed: {e}");
                return false;
            }
        };
        self.world = world;
        self.objects.clear();
        self.turn = Player::One;
        self.state = GameState::Playing;
        self.winner = None;
        self.viewport_offset = 0.0;
        self.capture.reset_pose(self.cfg.pending_start);
        log::info!("session: reset");
        true
    }

    pub fn on_key_press(&mut self, control: Control) -> Option<HostCommand> {
        match control {
            Control::Drop => { self.drop_silhouette(); }
            Control::Reset => { self.reset(); }
            Control::ToggleHitBoxes => self.debug_hitboxes = !self.debug_hitboxes,
            Control::ToggleFullscreen => {
                // The host reopens its window; key-ups for held keys are lost with it.
                self.controls.clear();
                return Some(HostCommand::ToggleFullscreen);
            }
            held => self.controls.press(held),
        }
        None
    }

    pub fn on_key_release(&mut self, control: Control) {
        self.controls.release(control);
    }

    /// Render the finished tick: terrain, dropped objects, pending silhouette, HUD.
    pub fn draw(&self, fb: &mut FrameBuffer) {
        fb.clear(render::BACKGROUND);
        let view = self.viewport();

        self.terrain.draw(fb, &view);
        for obj in &self.objects {
            obj.draw(fb, &view);
        }
        if self.state == GameState::Playing {
            if let Some(cutout) = self.capture.cutout() {
                let pose = self.screen_to_world(self.capture.pose());
                render::blit_sprite(fb, &view, &cutout.image, pose);
                if self.debug_hitboxes {
                    render::draw_polygon(fb, &view, &cutout.hit_polygon, pose, render::YELLOW);
                }
            }
        }
        if self.debug_hitboxes {
            self.terrain.draw_hit_box(fb, &view);
            for obj in &self.objects {
                obj.draw_hit_box(fb, &view);
            }
        }

        let line1 = format!("{} TURN", player_label(self.turn));
        render::draw_text_5x7(fb, 20, 20, &line1, render::WHITE, 3);
        if let Some(winner) = self.winner {
            let line2 = format!("{} WINS!  PRESS R", player_label(winner));
            render::draw_text_5x7(fb, 20, 56, &line2, render::WHITE, 3);
        }
    }

    pub fn state(&self) -> GameState { self.state }

    pub fn turn(&self) -> Player { self.turn }

    pub fn winner(&self) -> Option<Player> { self.winner }

    pub fn objects(&self) -> &[GameObject] { &self.objects }

    pub fn world(&self) -> &PhysicsWorld { &self.world }

    pub fn capture(&self) -> &SilhouetteCapture<S> { &self.capture }

    pub fn viewport_offset(&self) -> f32 { self.viewport_offset }

    pub fn debug_hitboxes(&self) -> bool { self.debug_hitboxes }

    pub fn viewport(&self) -> Viewport {
        Viewport { offset: self.viewport_offset, screen_height: self.cfg.screen_height }
    }

    /// Top edge of the highest dropped body. With `settled_only`, bodies still
    /// falling or tumbling are ignored.
    fn stack_top(&self, settled_only: bool) -> Option<f32> {
        self.objects
            .iter()
            .filter(|o| !settled_only || self.world.is_resting(o.body()))
            .filter_map(|o| self.world.vertical_bounds(o.body()))
            .map(|(_, top)| top)
            .reduce(f32::max)
    }

    /// Scroll just enough that the drop line stays a clearance above the
    /// settled stack; never below the start framing.
    fn compute_viewport_offset(&self) -> f32 {
        self.stack_top(true).map_or(0.0, |top| {
            (top + self.cfg.stack_clearance - self.cfg.drop_line_min_y).max(0.0)
        })
    }

    /// Raise a spawn pose until the outline's lowest point clears every live body.
    fn clear_of_stack(&self, pose: Pose, outline: &[Point]) -> Pose {
        let Some(top) = self.stack_top(false) else { return pose };
        let angle = pose.rotation.to_radians();
        let reach_down = outline.iter().map(|p| p.rotated(angle).y).reduce(f32::min).unwrap_or(0.0);
        let floor = top + self.cfg.stack_clearance - reach_down;
        if pose.y >= floor {
            return pose;
        }
        log::debug!("session: spawn lifted from {:.0} to {:.0} above the stack", pose.y, floor);
        Pose::new(pose.x, floor, pose.rotation)
    }

    /// The pending pose lives in screen space; the world is scrolled by the viewport.
    fn screen_to_world(&self, pose: Pose) -> Pose {
        Pose::new(pose.x, pose.y + self.viewport_offset, pose.rotation)
    }
}

fn build_world(cfg: &GameConfig, terrain: &Terrain) -> Result<PhysicsWorld> {
    let mut world = PhysicsWorld::new(cfg.gravity);
    world
        .add_static_terrain(terrain.hit_polygon(), terrain.position(), cfg.terrain_material)
        .ok_or_else(|| Error::TerrainAsset("terrain outline cannot form a collision shape".into()))?;
    Ok(world)
}

fn player_label(p: Player) -> String {
    format!("PLAYER {}", p.number())
}

//! Frame driver
//!
//! `GameEngine` owns the simulation, the HUD sprites and the render context.
//! The host calls the surface lifecycle methods and `draw_frame` from its
//! render thread; other threads talk to the engine through a
//! [`CommandSender`], whose commands are applied at the next frame boundary.

use std::sync::mpsc;

use glam::{Mat4, Vec2};

use crate::assets::{AssetKey, ImageSource};
use crate::error::{EngineError, InputError, RenderError};
use crate::input::TiltSource;
use crate::layout::{HudElement, Screen, ViewportLayout};
use crate::renderer::{GraphicsBackend, RenderContext, batch_draw, projection};
use crate::settings::Settings;
use crate::sim::entity::{Entity, EntityKind, LoadedTexture, SpriteAsset, SpriteTextures};
use crate::sim::motion::init_icon;
use crate::sim::{GameState, TickInput, tick};

const GAME_OVER_TEXT: &str = "Game Over";

/// Requests from outside the render thread
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a run (ignored while one is in progress)
    Start,
    /// New pixel rectangles for the HUD widgets
    SetViewportLocations(ViewportLayout),
    /// Tear down; the engine stops updating and releases the sensor
    Destroy,
}

/// Clonable handle for queueing [`Command`]s
#[derive(Debug, Clone)]
pub struct CommandSender(mpsc::Sender<Command>);

impl CommandSender {
    /// Queue a command; false if the engine is gone
    pub fn send(&self, command: Command) -> bool {
        self.0.send(command).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn set_viewport_locations(&self, layout: ViewportLayout) -> bool {
        self.send(Command::SetViewportLocations(layout))
    }

    pub fn destroy(&self) -> bool {
        self.send(Command::Destroy)
    }
}

pub struct GameEngine<T: TiltSource> {
    state: GameState,
    tilt: T,
    ctx: RenderContext,

    screen: Option<Screen>,
    mvp: Mat4,
    layout: ViewportLayout,

    // HUD
    icon: Entity,
    counter: Entity,
    counter_texture: LoadedTexture,
    game_over: Entity,
    game_over_texture: LoadedTexture,

    sender: mpsc::Sender<Command>,
    commands: mpsc::Receiver<Command>,

    tilt_warned: bool,
    destroyed: bool,
    frames_drawn: u64,
}

impl<T: TiltSource> GameEngine<T> {
    /// Build the engine and start the first run
    pub fn new(settings: Settings, tilt: T) -> Self {
        let (sender, commands) = mpsc::channel();

        let mut icon = Entity::new(EntityKind::Icon);
        icon.alive = false;
        let mut counter = Entity::new(EntityKind::Label);
        counter.alive = false;
        let game_over = Entity::new(EntityKind::Label);

        let mut engine = Self {
            state: GameState::new(settings),
            tilt,
            ctx: RenderContext::new(),
            screen: None,
            mvp: projection(1.0),
            layout: ViewportLayout::new(),
            icon,
            counter,
            counter_texture: LoadedTexture::MISSING,
            game_over,
            game_over_texture: LoadedTexture::MISSING,
            sender,
            commands,
            tilt_warned: false,
            destroyed: false,
            frames_drawn: 0,
        };
        engine.start();
        engine
    }

    pub fn command_sender(&self) -> CommandSender {
        CommandSender(self.sender.clone())
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn tilt(&self) -> &T {
        &self.tilt
    }

    pub fn tilt_mut(&mut self) -> &mut T {
        &mut self.tilt
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn icon(&self) -> &Entity {
        &self.icon
    }

    pub fn counter(&self) -> &Entity {
        &self.counter
    }

    pub fn game_over_label(&self) -> &Entity {
        &self.game_over
    }

    /// Background color the host clears each frame to
    pub fn clear_color(&self) -> [f32; 4] {
        self.state.settings.clear_color
    }

    /// Start a run unless one is already going
    pub fn start(&mut self) {
        if self.destroyed {
            return;
        }
        self.state.start();
    }

    /// (Re)build every graphics resource for a fresh surface
    ///
    /// Handles from a previous surface are dropped first. Sprite art that
    /// fails to load is logged and left untextured. Only failures to build
    /// the shared program or quad are returned.
    pub fn on_surface_created<G: GraphicsBackend + ?Sized>(
        &mut self,
        gfx: &mut G,
        images: &mut dyn ImageSource,
    ) -> Result<(), EngineError> {
        self.ctx.invalidate(gfx);
        self.ctx.init(gfx)?;

        let mut textures = SpriteTextures::default();
        for asset in SpriteAsset::ALL {
            match self.ctx.load_texture(gfx, images, &asset.key()) {
                Ok(texture) => textures.set(asset, texture),
                Err(err) => log::warn!("Sprite {} unavailable: {err}", asset.key()),
            }
        }
        self.state.apply_textures(textures);
        self.icon.texture = self.state.textures.handle_for(EntityKind::Icon);

        self.counter_texture = LoadedTexture::MISSING;
        self.refresh_counter(gfx, images);
        self.game_over_texture = self.load_label(gfx, images, GAME_OVER_TEXT);
        self.game_over.texture = self.game_over_texture.handle;
        self.layout_hud();

        log::info!("Surface created, {} textures loaded", self.ctx.texture_count());
        Ok(())
    }

    /// New surface size: recompute projection and re-pin ratio-bound sprites
    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        let screen = Screen::new(width, height);
        self.screen = Some(screen);
        self.mvp = projection(screen.ratio);
        self.state.set_ratio(screen.ratio);
        self.layout_hud();
        log::info!("Surface changed to {width}x{height} (ratio {:.3})", screen.ratio);
    }

    pub fn set_viewport_locations(&mut self, layout: ViewportLayout) {
        self.layout = layout;
        self.layout_hud();
    }

    /// Stop updating and release the tilt sensor; later calls do nothing
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.tilt.release();
        log::info!("Engine destroyed after {} frames", self.frames_drawn);
    }

    /// Apply queued commands, advance one frame and draw it
    ///
    /// Returns the number of sprites drawn.
    pub fn draw_frame<G: GraphicsBackend + ?Sized>(
        &mut self,
        gfx: &mut G,
        images: &mut dyn ImageSource,
    ) -> usize {
        self.apply_commands();
        if self.destroyed {
            return 0;
        }

        if self.state.targets.is_empty() {
            self.state.check_loss();
        } else {
            let input = TickInput {
                tilt: self.read_tilt(),
            };
            tick(&mut self.state, &input);
        }

        if self.ctx.is_ready() && self.state.score_changed {
            self.refresh_counter(gfx, images);
        }

        let draws = self.draw_scene(gfx);
        self.frames_drawn += 1;
        draws
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Start => self.start(),
                Command::SetViewportLocations(layout) => self.set_viewport_locations(layout),
                Command::Destroy => self.destroy(),
            }
        }
    }

    /// Draw everything back to front by z; ties keep collection order
    fn draw_scene<G: GraphicsBackend + ?Sized>(&self, gfx: &mut G) -> usize {
        let mut sprites: Vec<&Entity> = self
            .state
            .live_obstacles()
            .chain(self.state.live_debris())
            .chain(self.state.live_targets())
            .chain(std::iter::once(&self.state.player))
            .chain([&self.icon, &self.counter].into_iter().filter(|e| e.alive))
            .collect();
        if !self.state.playing {
            sprites.push(&self.game_over);
        }
        sprites.sort_by(|a, b| a.position.z.total_cmp(&b.position.z));

        batch_draw(&self.ctx, gfx, &self.mvp, sprites)
    }

    fn read_tilt(&mut self) -> f32 {
        match self.tilt.current_tilt() {
            Ok(tilt) if tilt.is_finite() => tilt,
            Ok(tilt) => {
                log::debug!("Ignoring non-finite tilt {tilt}");
                0.0
            }
            Err(InputError::Unavailable) => {
                if !self.tilt_warned {
                    log::warn!("Tilt sensor unavailable, holding the ship level");
                    self.tilt_warned = true;
                }
                0.0
            }
            Err(InputError::StaleSample) => {
                log::debug!("No tilt sample yet");
                0.0
            }
        }
    }

    fn load_label<G: GraphicsBackend + ?Sized>(
        &mut self,
        gfx: &mut G,
        images: &mut dyn ImageSource,
        text: &str,
    ) -> LoadedTexture {
        match self.ctx.load_texture(gfx, images, &AssetKey::Text(text.to_string())) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("Label {text:?} unavailable: {err}");
                LoadedTexture::MISSING
            }
        }
    }

    fn refresh_counter<G: GraphicsBackend + ?Sized>(
        &mut self,
        gfx: &mut G,
        images: &mut dyn ImageSource,
    ) {
        let key = AssetKey::Text(self.state.score.to_string());
        let texture = images
            .decode(&key)
            .map_err(RenderError::from)
            .and_then(|image| self.ctx.upload_uncached(gfx, &image))
            .unwrap_or_else(|err| {
                log::warn!("Counter {key} unavailable: {err}");
                LoadedTexture::MISSING
            });
        self.ctx.release(gfx, self.counter_texture);
        self.counter_texture = texture;
        self.counter.texture = self.counter_texture.handle;
        self.state.score_changed = false;
        self.layout_counter();
    }

    /// Place the HUD from the current screen and widget rectangles
    fn layout_hud(&mut self) {
        let Some(screen) = self.screen else {
            return;
        };

        if let Some(rect) = self.layout.get(&HudElement::ObstacleIcon) {
            let texture = self.icon.texture;
            init_icon(
                &mut self.icon,
                texture,
                screen.rect_center(rect),
                screen.rect_scale(rect),
            );
        }
        self.layout_counter();

        let scale = screen.pixel_scale(
            self.game_over_texture.width as f32,
            self.game_over_texture.height as f32,
        );
        let depth = self.game_over.profile().depth;
        self.game_over.scale = scale;
        self.game_over.position = Vec2::ZERO.extend(depth);
    }

    /// Counter text sits with its bottom-left corner on the widget's
    fn layout_counter(&mut self) {
        let (Some(screen), Some(rect)) = (self.screen, self.layout.get(&HudElement::ObstacleCounter))
        else {
            return;
        };
        let scale = screen.pixel_scale(
            self.counter_texture.width as f32,
            self.counter_texture.height as f32,
        );
        let anchor = screen.rect_anchor(rect);
        let depth = self.counter.profile().depth;
        self.counter.scale = scale;
        self.counter.position = (anchor + scale).extend(depth);
        self.counter.alive = true;
    }
}

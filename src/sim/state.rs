//! Game state: pools, active collections and run counters

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::entity::{Entity, EntityKind, SpriteAsset, SpriteTextures};
use super::motion::{init_player, init_target, place_target};
use super::pool::{ObjectPool, PoolSlot};
use crate::consts::PLAYER_SCALE;
use crate::renderer::TextureHandle;
use crate::settings::Settings;

/// Everything the per-frame update reads and writes
///
/// Pools own the entity memory. The `obstacles`, `debris` and `targets`
/// vectors are the active collections: an entity is in play (and drawn)
/// exactly while its slot is listed there.
#[derive(Debug)]
pub struct GameState {
    pub settings: Settings,
    pub rng: Pcg32,

    pub playing: bool,
    /// Obstacles smashed this run
    pub score: u32,
    pub frame_counter: u32,
    /// Frames between obstacle spawns
    pub spawn_interval: u32,
    /// Obstacles spawned since construction
    pub obstacles_spawned: u64,
    /// Screen height / width
    pub ratio: f32,

    pub obstacle_pool: ObjectPool<Entity>,
    pub debris_pool: ObjectPool<Entity>,
    pub target_pool: ObjectPool<Entity>,

    pub obstacles: Vec<PoolSlot>,
    pub debris: Vec<PoolSlot>,
    pub targets: Vec<PoolSlot>,

    pub player: Entity,
    pub textures: SpriteTextures,
    /// Score moved since the HUD last looked
    pub score_changed: bool,
}

impl GameState {
    /// Create an idle state (not playing) with pre-filled pools
    pub fn new(settings: Settings) -> Self {
        let settings = settings.validated();
        let seed = settings.effective_seed();
        log::debug!("Simulation seed {seed}");

        let mut player = Entity::new(EntityKind::Player);
        let ratio = 1.0;
        init_player(&mut player, TextureHandle::INVALID, 1.0, ratio);

        Self {
            rng: Pcg32::seed_from_u64(seed),
            playing: false,
            score: 0,
            frame_counter: 0,
            spawn_interval: settings.initial_spawn_interval,
            obstacles_spawned: 0,
            ratio,
            obstacle_pool: ObjectPool::new(settings.obstacle_pool_capacity, || {
                Entity::new(EntityKind::Obstacle)
            }),
            debris_pool: ObjectPool::new(settings.debris_pool_capacity, || {
                Entity::new(EntityKind::BrokenObstacle)
            }),
            target_pool: ObjectPool::new(settings.target_pool_capacity, || {
                Entity::new(EntityKind::Target)
            }),
            obstacles: Vec::new(),
            debris: Vec::new(),
            targets: Vec::new(),
            player,
            textures: SpriteTextures::default(),
            score_changed: true,
            settings,
        }
    }

    /// Begin a run; returns false (and changes nothing) when one is in progress
    pub fn start(&mut self) -> bool {
        if self.playing {
            return false;
        }
        self.score = 0;
        self.frame_counter = 0;
        self.spawn_interval = self.settings.initial_spawn_interval;
        self.score_changed = true;

        for slot in self.targets.drain(..) {
            self.target_pool.kill(slot);
        }
        for _ in 0..self.settings.initial_targets {
            self.spawn_target();
        }
        self.playing = true;
        log::info!("Run started with {} targets", self.targets.len());
        true
    }

    /// Switch to game over once every target is gone; true on the transition
    pub fn check_loss(&mut self) -> bool {
        if self.playing && self.targets.is_empty() {
            self.playing = false;
            log::info!("Game over, final score {}", self.score);
            return true;
        }
        false
    }

    pub fn spawn_target(&mut self) -> PoolSlot {
        let slot = self.target_pool.spawn();
        let texture = self.textures.handle_for(EntityKind::Target);
        init_target(&mut self.target_pool[slot], &mut self.rng, texture, self.ratio);
        self.targets.push(slot);
        slot
    }

    /// Adopt a new screen ratio without disturbing the simulation
    ///
    /// Ground-bound entities (player, every target slot) are re-pinned.
    /// Falling entities only pick up the new bottom edge.
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
        for target in self.target_pool.all_mut() {
            place_target(target, ratio);
        }
        for e in self
            .obstacle_pool
            .all_mut()
            .iter_mut()
            .chain(self.debris_pool.all_mut().iter_mut())
        {
            e.ratio = ratio;
        }
        self.fit_player();
    }

    /// Point every slot of every pool (and the player) at freshly uploaded textures
    pub fn apply_textures(&mut self, textures: SpriteTextures) {
        self.textures = textures;
        for pool in [
            &mut self.obstacle_pool,
            &mut self.debris_pool,
            &mut self.target_pool,
        ] {
            for e in pool.all_mut() {
                e.texture = self.textures.handle_for(e.kind);
            }
        }
        self.player.texture = self.textures.handle_for(EntityKind::Player);
        self.fit_player();
    }

    /// Recompute the player's height and ground line; x and eased tilt survive
    fn fit_player(&mut self) {
        let aspect = self.textures.get(SpriteAsset::Ship).aspect();
        let p = &mut self.player;
        p.ratio = self.ratio;
        p.scale.x = PLAYER_SCALE;
        p.scale.y = PLAYER_SCALE / aspect.max(f32::EPSILON);
        p.position.y = -self.ratio + 3.0 * p.scale.y;
    }

    pub fn live_obstacles(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.obstacles.iter().map(|&s| &self.obstacle_pool[s])
    }

    pub fn live_debris(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.debris.iter().map(|&s| &self.debris_pool[s])
    }

    pub fn live_targets(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.targets.iter().map(|&s| &self.target_pool[s])
    }
}

//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches the
//! graphics backend; randomness comes from the state's seeded RNG so runs
//! with the same seed and input replay identically.

pub mod collision;
pub mod entity;
pub mod motion;
pub mod pool;
pub mod state;
pub mod tick;

pub use collision::{collides_with, collision_circle};
pub use entity::{Entity, EntityKind, KindProfile, LoadedTexture, SpriteAsset, SpriteTextures};
pub use pool::{ObjectPool, PoolSlot, Poolable};
pub use state::GameState;
pub use tick::{TickInput, break_obstacle, spawn_obstacle, tick};

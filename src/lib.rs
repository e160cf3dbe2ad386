//! Tilt Arcade - falling asteroids, a tilt-steered ship, and chickens to protect
//!
//! Core modules:
//! - `sim`: Per-frame simulation (pooled entities, motion, collisions, game state)
//! - `renderer`: Batched textured-quad drawing over a pluggable graphics backend
//! - `engine`: Frame driver tying the simulation, HUD and renderer together
//! - `settings`: Data-driven tuning
//! - `assets`, `input`, `layout`: Boundaries to the host application

pub mod assets;
pub mod engine;
pub mod error;
pub mod input;
pub mod layout;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use engine::{Command, CommandSender, GameEngine};
pub use error::{AssetError, ConfigError, EngineError, InputError, RenderError};
pub use settings::Settings;

use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Obstacle scale range (x axis; y follows the texture aspect)
    pub const OBSTACLE_MIN_SCALE: f32 = 0.04;
    pub const OBSTACLE_MAX_SCALE: f32 = 0.25;
    /// Asteroid art is 408x384
    pub const OBSTACLE_IMAGE_RATIO: f32 = 408.0 / 384.0;
    /// Horizontal drift range for a fresh obstacle (per frame)
    pub const OBSTACLE_DRIFT: f32 = 0.002;
    /// Downward speed range for a fresh obstacle (per frame)
    pub const OBSTACLE_MIN_FALL: f32 = -0.03;
    pub const OBSTACLE_MAX_FALL: f32 = -0.02;
    /// Initial rotation range (degrees) and spin range (degrees/frame)
    pub const OBSTACLE_MAX_ROTATION: f32 = 90.0;
    pub const OBSTACLE_MAX_SPIN: f32 = 2.0;

    /// Pieces produced when the player smashes an obstacle
    pub const DEBRIS_PIECES: usize = 5;
    /// Vertical fan-out of the pieces, as a fraction of the parent's y scale
    pub const DEBRIS_OFFSETS: [f32; DEBRIS_PIECES] = [0.25, 0.5, 1.0, 0.5, 0.25];
    /// Maximum horizontal position jitter of the outer pieces
    pub const DEBRIS_JITTER: f32 = 0.06;
    /// Maximum horizontal speed of the outer pieces
    pub const DEBRIS_DRIFT: f32 = 0.01;
    /// Pieces keep 80-100% of the parent's fall speed
    pub const DEBRIS_MIN_SPEED_FACTOR: f32 = 0.8;
    /// Per-frame shrink applied to both scale axes
    pub const DEBRIS_SHRINK: f32 = 0.0005;

    /// Chicken art is 204x328
    pub const TARGET_IMAGE_RATIO: f32 = 204.0 / 328.0;
    pub const TARGET_SCALE: f32 = 0.07;
    /// Horizontal wander speed range (per frame)
    pub const TARGET_MAX_SPEED: f32 = 0.05;

    pub const PLAYER_SCALE: f32 = 0.15;
    /// Tilt is clamped to this many degrees either way after scaling
    pub const TILT_LIMIT: f32 = 25.0;
    pub const TILT_GAIN: f32 = 2.0;
    /// Changes smaller than this (degrees) are ignored
    pub const TILT_DEADZONE: f32 = 1.0;
    /// Fraction of the remaining tilt delta applied per frame
    pub const TILT_EASING: f32 = 1.0 / 5.0;

    /// Layering depth per kind
    pub const DEPTH_PLAYFIELD: f32 = 0.1;
    pub const DEPTH_OVERLAY: f32 = 0.2;
}

/// Uniform random float between two bounds (order-insensitive)
#[inline]
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, a: f32, b: f32) -> f32 {
    let (lower, upper) = if a > b { (b, a) } else { (a, b) };
    lower + rng.random::<f32>() * (upper - lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_between_swapped_bounds() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..1000 {
            let v = random_between(&mut rng, 0.03, -0.03);
            assert!((-0.03..=0.03).contains(&v));
        }
    }

    #[test]
    fn test_random_between_degenerate_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(random_between(&mut rng, 0.5, 0.5), 0.5);
    }
}

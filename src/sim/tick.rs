//! Per-frame simulation update
//!
//! One call advances the world by one frame: resolve obstacle collisions,
//! move everything, spawn on cadence and ramp the difficulty.

use glam::{Vec2, Vec3};

use super::collision::collides_with;
use super::entity::EntityKind;
use super::motion::{debris_burst, init_debris, init_obstacle, integrate};
use super::pool::PoolSlot;
use super::state::GameState;

/// Input sampled for a single frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Device tilt in degrees (0 when unavailable)
    pub tilt: f32,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    update_obstacles(state);
    update_debris(state);
    update_targets(state);

    let interval = state.spawn_interval.max(1);
    if state.frame_counter % interval == 0 {
        spawn_obstacle(state);
    }
    state.frame_counter = state.frame_counter.wrapping_add(1);

    if state.frame_counter % state.settings.difficulty_step_frames.max(1) == 0
        && state.spawn_interval > state.settings.min_spawn_interval
    {
        state.spawn_interval -= 1;
        log::debug!("Spawn interval down to {}", state.spawn_interval);
    }

    integrate(&mut state.player, input.tilt);
}

/// Collide, move and cull every active obstacle
///
/// A player hit takes priority and ends the obstacle's turn. Otherwise the
/// obstacle kills every target it overlaps and then moves.
fn update_obstacles(state: &mut GameState) {
    let mut i = 0;
    while i < state.obstacles.len() {
        let slot = state.obstacles[i];

        let obstacle = &state.obstacle_pool[slot];
        if collides_with(obstacle, &state.player) {
            let (position, velocity, scale) = (obstacle.position, obstacle.velocity, obstacle.scale);
            state.score += 1;
            state.score_changed = true;
            break_obstacle(state, position, velocity, scale);
            retire(state, slot);
            state.obstacles.remove(i);
            continue;
        }

        let mut t = 0;
        while t < state.targets.len() {
            let target = state.targets[t];
            if collides_with(&state.obstacle_pool[slot], &state.target_pool[target]) {
                state.target_pool[target].alive = false;
                state.target_pool.kill(target);
                state.targets.remove(t);
                log::debug!("Target lost, {} left", state.targets.len());
            } else {
                t += 1;
            }
        }

        if integrate(&mut state.obstacle_pool[slot], 0.0) {
            i += 1;
        } else {
            retire(state, slot);
            state.obstacles.remove(i);
        }
    }
}

fn retire(state: &mut GameState, slot: PoolSlot) {
    state.obstacle_pool[slot].alive = false;
    state.obstacle_pool.kill(slot);
}

fn update_debris(state: &mut GameState) {
    let pool = &mut state.debris_pool;
    state.debris.retain(|&slot| {
        let keep = integrate(&mut pool[slot], 0.0);
        if !keep {
            pool.kill(slot);
        }
        keep
    });
}

fn update_targets(state: &mut GameState) {
    let pool = &mut state.target_pool;
    state.targets.retain(|&slot| {
        let keep = integrate(&mut pool[slot], 0.0);
        if !keep {
            pool.kill(slot);
        }
        keep
    });
}

/// Replace a smashed obstacle with a fan of shrinking pieces
pub fn break_obstacle(state: &mut GameState, position: Vec3, velocity: Vec3, scale: Vec2) {
    let pieces = debris_burst(&mut state.rng, position, velocity, scale);
    let texture = state.textures.handle_for(EntityKind::BrokenObstacle);
    let piece_scale = scale.x / 4.0;
    for (piece_position, piece_velocity) in pieces {
        let slot = state.debris_pool.spawn();
        init_debris(
            &mut state.debris_pool[slot],
            &mut state.rng,
            texture,
            state.ratio,
            piece_position,
            piece_velocity,
            piece_scale,
        );
        state.debris.push(slot);
    }
}

/// Drop a fresh obstacle in from the top edge
pub fn spawn_obstacle(state: &mut GameState) -> PoolSlot {
    let slot = state.obstacle_pool.spawn();
    let texture = state.textures.handle_for(EntityKind::Obstacle);
    init_obstacle(&mut state.obstacle_pool[slot], &mut state.rng, texture, state.ratio);
    state.obstacles.push(slot);
    state.obstacles_spawned += 1;
    slot
}

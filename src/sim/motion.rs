//! Per-kind initialisation and motion rules
//!
//! Motion is constant-velocity integration with a bit of random spread at
//! spawn time. Each integrator returns whether the entity stays in its
//! collection; `false` means "remove me and return me to my pool".

use glam::{Vec2, Vec3};
use rand::Rng;

use super::entity::{Entity, EntityKind};
use crate::consts::*;
use crate::random_between;
use crate::renderer::TextureHandle;

/// Integration rule for one kind
pub type Integrator = fn(&mut Entity, f32) -> bool;

/// Integrator selected by kind
pub fn integrator(kind: EntityKind) -> Integrator {
    match kind {
        EntityKind::Obstacle => integrate_obstacle,
        EntityKind::BrokenObstacle => integrate_debris,
        EntityKind::Target => integrate_target,
        EntityKind::Player => integrate_player,
        EntityKind::Icon | EntityKind::Label => integrate_static,
    }
}

/// Advance one frame; `tilt` is the raw input reading in degrees
#[inline]
pub fn integrate(entity: &mut Entity, tilt: f32) -> bool {
    integrator(entity.kind)(entity, tilt)
}

/// Shared falling rule: move, and flag (but keep) once below the bottom edge
///
/// The entity is reported dead on the frame *after* it leaves the screen.
fn integrate_moving(e: &mut Entity) -> bool {
    if !e.alive {
        return false;
    }
    e.position.x += e.velocity.x;
    e.position.y += e.velocity.y;
    if e.position.y < -e.ratio {
        e.alive = false;
    }
    true
}

fn integrate_obstacle(e: &mut Entity, _tilt: f32) -> bool {
    e.rotation += e.rotation_delta;
    integrate_moving(e)
}

fn integrate_debris(e: &mut Entity, tilt: f32) -> bool {
    e.scale -= Vec2::splat(DEBRIS_SHRINK);
    if e.scale.x <= 0.0 || e.scale.y <= 0.0 {
        return false;
    }
    integrate_obstacle(e, tilt)
}

fn integrate_target(e: &mut Entity, _tilt: f32) -> bool {
    integrate_moving(e);
    if e.position.x < -1.0 || e.position.x > 1.0 {
        e.velocity.x = -e.velocity.x;
    }
    true
}

fn integrate_player(e: &mut Entity, tilt: f32) -> bool {
    let target = (tilt * TILT_GAIN).clamp(-TILT_LIMIT, TILT_LIMIT);
    let diff = (target - e.tilt).abs();
    if diff > TILT_DEADZONE {
        let step = diff * TILT_EASING;
        if target < e.tilt {
            e.tilt -= step;
        } else {
            e.tilt += step;
        }
        e.position.x = e.tilt / TILT_LIMIT;
    }
    true
}

fn integrate_static(_e: &mut Entity, _tilt: f32) -> bool {
    true
}

/// Fresh obstacle somewhere along the top edge
pub fn init_obstacle<R: Rng + ?Sized>(
    e: &mut Entity,
    rng: &mut R,
    texture: TextureHandle,
    ratio: f32,
) {
    e.kind = EntityKind::Obstacle;
    let image_ratio = e.profile().image_ratio.unwrap_or(OBSTACLE_IMAGE_RATIO);
    e.texture = texture;
    e.scale.x = random_between(rng, OBSTACLE_MIN_SCALE, OBSTACLE_MAX_SCALE);
    e.scale.y = e.scale.x / image_ratio;
    e.position = Vec3::new(random_between(rng, -1.0, 1.0), 0.0, e.profile().depth);
    e.velocity = Vec3::new(
        random_between(rng, -OBSTACLE_DRIFT, OBSTACLE_DRIFT),
        random_between(rng, OBSTACLE_MIN_FALL, OBSTACLE_MAX_FALL),
        0.0,
    );
    e.rotation = random_between(rng, -OBSTACLE_MAX_ROTATION, OBSTACLE_MAX_ROTATION);
    e.rotation_delta = random_between(rng, -OBSTACLE_MAX_SPIN, OBSTACLE_MAX_SPIN);
    e.reset_collision_shape();
    e.alive = true;
    place_obstacle(e, ratio);
}

/// Park an obstacle just above the top edge
pub fn place_obstacle(e: &mut Entity, ratio: f32) {
    e.ratio = ratio;
    e.position.y = ratio + e.scale.y;
}

/// One piece of a smashed obstacle
pub fn init_debris<R: Rng + ?Sized>(
    e: &mut Entity,
    rng: &mut R,
    texture: TextureHandle,
    ratio: f32,
    position: Vec3,
    velocity: Vec3,
    scale: f32,
) {
    e.kind = EntityKind::BrokenObstacle;
    let image_ratio = e.profile().image_ratio.unwrap_or(OBSTACLE_IMAGE_RATIO);
    e.texture = texture;
    e.ratio = ratio;
    e.scale = Vec2::new(scale, scale / image_ratio);
    e.position = position;
    e.velocity = velocity;
    e.rotation = random_between(rng, -OBSTACLE_MAX_ROTATION, OBSTACLE_MAX_ROTATION);
    e.rotation_delta = random_between(rng, -OBSTACLE_MAX_SPIN, OBSTACLE_MAX_SPIN);
    e.reset_collision_shape();
    e.alive = true;
}

/// Positions and velocities of the pieces an obstacle breaks into
///
/// Pieces fan out vertically by the fixed offset table. The two outer pieces
/// drift left, the two inner ones right, the middle one straight down.
pub fn debris_burst<R: Rng + ?Sized>(
    rng: &mut R,
    origin: Vec3,
    velocity: Vec3,
    scale: Vec2,
) -> [(Vec3, Vec3); DEBRIS_PIECES] {
    std::array::from_fn(|i| {
        let mut position = Vec3::new(origin.x, origin.y + DEBRIS_OFFSETS[i] * scale.y, 0.0);
        let speed_factor =
            DEBRIS_MIN_SPEED_FACTOR + (1.0 - DEBRIS_MIN_SPEED_FACTOR) * rng.random::<f32>();
        let mut piece_velocity = Vec3::new(0.0, velocity.y * speed_factor, 0.0);

        let middle = DEBRIS_PIECES / 2;
        if i < middle {
            position.x -= DEBRIS_JITTER * rng.random::<f32>();
            piece_velocity.x = -(rng.random::<f32>() * DEBRIS_DRIFT);
        } else if i > middle {
            position.x += DEBRIS_JITTER * rng.random::<f32>();
            piece_velocity.x = rng.random::<f32>() * DEBRIS_DRIFT;
        }
        (position, piece_velocity)
    })
}

/// Fresh chicken with a random heading
pub fn init_target<R: Rng + ?Sized>(
    e: &mut Entity,
    rng: &mut R,
    texture: TextureHandle,
    ratio: f32,
) {
    e.kind = EntityKind::Target;
    let image_ratio = e.profile().image_ratio.unwrap_or(TARGET_IMAGE_RATIO);
    e.texture = texture;
    e.scale = Vec2::new(TARGET_SCALE, TARGET_SCALE / image_ratio);
    e.position = Vec3::new(random_between(rng, -1.0, 1.0), 0.0, e.profile().depth);
    e.velocity = Vec3::new(random_between(rng, -TARGET_MAX_SPEED, TARGET_MAX_SPEED), 0.0, 0.0);
    e.rotation = 0.0;
    e.rotation_delta = 0.0;
    e.reset_collision_shape();
    e.alive = true;
    place_target(e, ratio);
}

/// Pin a chicken to the ground line for this screen ratio
pub fn place_target(e: &mut Entity, ratio: f32) {
    e.ratio = ratio;
    e.position.y = -ratio + 2.0 * e.scale.y;
}

/// Reset the ship to the center of the ground line
///
/// `image_aspect` is the loaded ship texture's width / height.
pub fn init_player(e: &mut Entity, texture: TextureHandle, image_aspect: f32, ratio: f32) {
    e.kind = EntityKind::Player;
    e.texture = texture;
    e.ratio = ratio;
    e.scale = Vec2::new(PLAYER_SCALE, PLAYER_SCALE / image_aspect.max(f32::EPSILON));
    e.position = Vec3::new(0.0, -ratio + e.scale.y * 3.0, e.profile().depth);
    e.velocity = Vec3::ZERO;
    e.rotation = 0.0;
    e.rotation_delta = 0.0;
    e.reset_collision_shape();
    e.alive = true;
    e.in_use = true;
}

/// Static HUD icon at a sprite-space position with explicit half-extents
pub fn init_icon(e: &mut Entity, texture: TextureHandle, position: Vec2, scale: Vec2) {
    e.kind = EntityKind::Icon;
    e.texture = texture;
    e.scale = scale;
    e.position = position.extend(e.profile().depth);
    e.velocity = Vec3::ZERO;
    e.rotation = 0.0;
    e.rotation_delta = 0.0;
    e.alive = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(1234)
    }

    #[test]
    fn test_obstacle_spawn_ranges() {
        let mut rng = rng();
        for _ in 0..200 {
            let mut e = Entity::new(EntityKind::Obstacle);
            init_obstacle(&mut e, &mut rng, TextureHandle(1), 1.7);
            assert!((OBSTACLE_MIN_SCALE..=OBSTACLE_MAX_SCALE).contains(&e.scale.x));
            assert!((e.scale.y - e.scale.x / OBSTACLE_IMAGE_RATIO).abs() < 1e-6);
            assert!((-1.0..=1.0).contains(&e.position.x));
            assert!((e.position.y - (1.7 + e.scale.y)).abs() < 1e-6);
            assert!((OBSTACLE_MIN_FALL..=OBSTACLE_MAX_FALL).contains(&e.velocity.y));
            assert!(e.velocity.x.abs() <= OBSTACLE_DRIFT);
            assert!(e.rotation.abs() <= OBSTACLE_MAX_ROTATION);
            assert!(e.rotation_delta.abs() <= OBSTACLE_MAX_SPIN);
            assert_eq!(e.position.z, DEPTH_PLAYFIELD);
            assert!(e.alive);
        }
    }

    #[test]
    fn test_obstacle_moves_and_spins() {
        let mut e = Entity::new(EntityKind::Obstacle);
        e.ratio = 1.0;
        e.velocity = Vec3::new(0.01, -0.02, 0.0);
        e.rotation_delta = 1.5;
        assert!(integrate(&mut e, 0.0));
        assert!((e.position.x - 0.01).abs() < 1e-6);
        assert!((e.position.y + 0.02).abs() < 1e-6);
        assert!((e.rotation - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_obstacle_culled_the_frame_after_leaving() {
        let mut e = Entity::new(EntityKind::Obstacle);
        e.ratio = 1.0;
        e.position.y = -0.99;
        e.velocity.y = -0.02;
        // Crosses the edge: flagged, but still reported alive this frame
        assert!(integrate(&mut e, 0.0));
        assert!(!e.alive);
        // Next frame it asks to be removed
        assert!(!integrate(&mut e, 0.0));
    }

    #[test]
    fn test_debris_shrinks_and_dies_at_zero_scale() {
        let mut e = Entity::new(EntityKind::BrokenObstacle);
        e.ratio = 2.0;
        e.scale = Vec2::new(0.0012, 0.0011);
        assert!(integrate(&mut e, 0.0));
        assert!((e.scale.x - 0.0007).abs() < 1e-6);
        assert!(integrate(&mut e, 0.0));
        assert!(!integrate(&mut e, 0.0));
    }

    #[test]
    fn test_debris_burst_pattern() {
        let mut rng = rng();
        let origin = Vec3::new(0.3, 0.5, 0.1);
        let velocity = Vec3::new(0.001, -0.025, 0.0);
        let scale = Vec2::new(0.2, 0.18);
        for _ in 0..50 {
            let pieces = debris_burst(&mut rng, origin, velocity, scale);
            assert_eq!(pieces.len(), 5);
            for (i, (pos, vel)) in pieces.iter().enumerate() {
                assert!((pos.y - (origin.y + DEBRIS_OFFSETS[i] * scale.y)).abs() < 1e-6);
                assert!(vel.y <= velocity.y * DEBRIS_MIN_SPEED_FACTOR + 1e-6);
                assert!(vel.y >= velocity.y - 1e-6);
                match i {
                    0 | 1 => {
                        assert!(pos.x <= origin.x && pos.x >= origin.x - DEBRIS_JITTER);
                        assert!(vel.x <= 0.0 && vel.x >= -DEBRIS_DRIFT);
                    }
                    2 => {
                        assert_eq!(pos.x, origin.x);
                        assert_eq!(vel.x, 0.0);
                    }
                    _ => {
                        assert!(pos.x >= origin.x && pos.x <= origin.x + DEBRIS_JITTER);
                        assert!(vel.x >= 0.0 && vel.x <= DEBRIS_DRIFT);
                    }
                }
            }
        }
    }

    #[test]
    fn test_target_placed_on_ground_and_bounces() {
        let mut rng = rng();
        let mut e = Entity::new(EntityKind::Target);
        init_target(&mut e, &mut rng, TextureHandle(2), 1.5);
        assert!((e.position.y - (-1.5 + 2.0 * e.scale.y)).abs() < 1e-6);
        assert!(e.velocity.x.abs() <= TARGET_MAX_SPEED);

        e.position.x = 0.99;
        e.velocity.x = 0.02;
        assert!(integrate(&mut e, 0.0));
        assert!(e.position.x > 1.0);
        assert!(e.velocity.x < 0.0);
        let y = e.position.y;
        assert!(integrate(&mut e, 0.0));
        assert!(e.position.x < 1.0);
        assert_eq!(e.position.y, y);
    }

    #[test]
    fn test_target_survives_ratio_change() {
        let mut rng = rng();
        let mut e = Entity::new(EntityKind::Target);
        init_target(&mut e, &mut rng, TextureHandle(2), 1.0);
        place_target(&mut e, 2.0);
        assert!((e.position.y - (-2.0 + 2.0 * e.scale.y)).abs() < 1e-6);
    }

    #[test]
    fn test_player_eases_toward_tilt() {
        let mut e = Entity::new(EntityKind::Player);
        init_player(&mut e, TextureHandle(3), 1.0, 1.5);
        // 10 degrees * gain 2 = 20; first step covers a fifth
        integrate(&mut e, 10.0);
        assert!((e.tilt - 4.0).abs() < 1e-5);
        assert!((e.position.x - 4.0 / TILT_LIMIT).abs() < 1e-5);
        integrate(&mut e, 10.0);
        assert!((e.tilt - 7.2).abs() < 1e-5);
    }

    #[test]
    fn test_player_tilt_clamped() {
        let mut e = Entity::new(EntityKind::Player);
        init_player(&mut e, TextureHandle(3), 1.0, 1.5);
        for _ in 0..200 {
            integrate(&mut e, -90.0);
        }
        assert!(e.tilt >= -TILT_LIMIT);
        assert!(e.position.x >= -1.0 && e.position.x < -0.9);
    }

    #[test]
    fn test_player_deadzone() {
        let mut e = Entity::new(EntityKind::Player);
        init_player(&mut e, TextureHandle(3), 1.0, 1.5);
        // 0.4 * 2 = 0.8 degrees: inside the deadzone
        integrate(&mut e, 0.4);
        assert_eq!(e.tilt, 0.0);
        assert_eq!(e.position.x, 0.0);
    }

    #[test]
    fn test_player_scale_follows_texture_aspect() {
        let mut e = Entity::new(EntityKind::Player);
        init_player(&mut e, TextureHandle(3), 2.0, 1.5);
        assert!((e.scale.y - PLAYER_SCALE / 2.0).abs() < 1e-6);
        assert!((e.position.y - (-1.5 + 3.0 * e.scale.y)).abs() < 1e-6);
    }

    #[test]
    fn test_static_kinds_never_move() {
        let mut e = Entity::new(EntityKind::Icon);
        init_icon(&mut e, TextureHandle(1), Vec2::new(0.5, 1.0), Vec2::splat(0.05));
        e.velocity = Vec3::new(1.0, 1.0, 0.0);
        assert!(integrate(&mut e, 20.0));
        assert_eq!(e.position, Vec3::new(0.5, 1.0, DEPTH_OVERLAY));
    }
}

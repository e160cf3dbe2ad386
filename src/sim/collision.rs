//! Circle-circle overlap test
//!
//! Every sprite is treated as a circle. The circle's offset and radius are
//! both scaled by the sprite's x scale, so collision circles stay round even
//! for stretched sprites. Broad phase is exhaustive: entity counts are tens.

use glam::Vec2;

use super::entity::Entity;

/// World-space collision circle of an entity: (center, radius)
#[inline]
pub fn collision_circle(entity: &Entity) -> (Vec2, f32) {
    let sx = entity.scale.x;
    let center = entity.position.truncate() + entity.collision_center * sx;
    (center, entity.collision_radius * sx)
}

/// True when the two collision circles overlap (touching does not count)
///
/// Kinds that opt out of collision (HUD) never collide.
pub fn collides_with(a: &Entity, b: &Entity) -> bool {
    if !a.profile().collidable || !b.profile().collidable {
        return false;
    }
    let (ca, ra) = collision_circle(a);
    let (cb, rb) = collision_circle(b);
    ca.distance(cb) < ra + rb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityKind;
    use glam::Vec3;
    use proptest::prelude::*;

    fn at(kind: EntityKind, x: f32, y: f32, scale: f32) -> Entity {
        let mut e = Entity::new(kind);
        e.position = Vec3::new(x, y, 0.1);
        e.scale = Vec2::new(scale, scale * 0.5);
        e
    }

    #[test]
    fn test_exact_touch_is_not_a_collision() {
        let a = at(EntityKind::Obstacle, 0.0, 0.0, 0.25);
        let b = at(EntityKind::Player, 0.5, 0.0, 0.25);
        assert!(!collides_with(&a, &b));

        let b = at(EntityKind::Player, 0.5 - 1e-4, 0.0, 0.25);
        assert!(collides_with(&a, &b));
    }

    #[test]
    fn test_y_offset_uses_x_scale() {
        let mut a = at(EntityKind::Obstacle, 0.0, 0.0, 0.2);
        a.collision_center = Vec2::new(0.0, 1.0);
        a.collision_radius = 0.5;
        let (center, radius) = collision_circle(&a);
        // scale.y is 0.1 but the offset follows scale.x
        assert!((center.y - 0.2).abs() < 1e-6);
        assert!((radius - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_hud_never_collides() {
        let a = at(EntityKind::Obstacle, 0.0, 0.0, 0.2);
        let icon = at(EntityKind::Icon, 0.0, 0.0, 0.2);
        assert!(!collides_with(&a, &icon));
        assert!(!collides_with(&icon, &a));
    }

    #[test]
    fn test_far_apart_miss() {
        let a = at(EntityKind::Obstacle, -0.9, 1.5, 0.04);
        let b = at(EntityKind::Target, 0.9, -1.5, 0.07);
        assert!(!collides_with(&a, &b));
    }

    proptest! {
        #[test]
        fn prop_collision_is_symmetric(
            ax in -1.5f32..1.5, ay in -2.0f32..2.0, asx in 0.01f32..0.3,
            bx in -1.5f32..1.5, by in -2.0f32..2.0, bsx in 0.01f32..0.3,
            acx in -1.0f32..1.0, acy in -1.0f32..1.0, ar in 0.1f32..1.0,
            bcx in -1.0f32..1.0, bcy in -1.0f32..1.0, br in 0.1f32..1.0,
        ) {
            let mut a = at(EntityKind::Obstacle, ax, ay, asx);
            a.collision_center = Vec2::new(acx, acy);
            a.collision_radius = ar;
            let mut b = at(EntityKind::Target, bx, by, bsx);
            b.collision_center = Vec2::new(bcx, bcy);
            b.collision_radius = br;
            prop_assert_eq!(collides_with(&a, &b), collides_with(&b, &a));
        }
    }
}

use shared::{GameConfiguration, PlayerId, ProjectileSnapshot, Vector2, PROJECTILE_RADIUS};

/// A straight-line hazard. Velocity is fixed at spawn and the owner never
/// changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u32,
    pub owner_id: PlayerId,
    pub absolute_position: Vector2,
    pub velocity: Vector2,
}

impl Projectile {
    pub fn new(owner_id: PlayerId, absolute_position: Vector2, velocity: Vector2) -> Self {
        Self {
            id: 0,
            owner_id,
            absolute_position,
            velocity,
        }
    }

    pub fn radius(&self) -> f32 {
        PROJECTILE_RADIUS
    }

    /// Advances one frame along the fixed velocity.
    pub fn update(&mut self) {
        self.absolute_position = self.absolute_position.add(&self.velocity);
    }

    pub fn is_out_of_bounds(&self, config: &GameConfiguration) -> bool {
        config.is_outside(self.absolute_position, PROJECTILE_RADIUS)
    }

    pub fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            owner_id: self.owner_id,
            absolute_position: self.absolute_position,
            velocity: self.velocity,
            radius: PROJECTILE_RADIUS,
        }
    }
}

use shared::{
    normalize_angle, PlayerId, RadarSnapshot, Vector2, LINEAR_ACCELERATION, RADAR_RANGE,
    SHIP_RADIUS,
};

const DEGENERATE_DENOMINATOR: f32 = 1e-3;

/// Read-only view of another ship, handed to the radar by the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: PlayerId,
    pub position: Vector2,
    pub velocity: Vector2,
    pub rotation: f32,
    pub accelerating: bool,
}

impl Contact {
    fn acceleration(&self) -> Vector2 {
        if self.accelerating {
            Vector2::from_angle(self.rotation).scale(LINEAR_ACCELERATION)
        } else {
            Vector2::ZERO
        }
    }
}

/// True when the ray along `heading` (unit) from the origin meets a circle
/// of `radius` centred at `relative`.
///
/// Substituting the ray into the circle equation gives
/// `s² - 2s(h·r) + |r|² - R² = 0`; the line hits when the discriminant is
/// non-negative.
pub fn heading_intersects(heading: Vector2, relative: Vector2, radius: f32) -> bool {
    let b = heading.dot(&relative);
    let c = relative.dot(&relative) - radius * radius;
    b * b - c >= 0.0
}

/// Aim angle that puts a projectile on the target's predicted position.
///
/// Flight time is estimated once along the x axis from the current heading;
/// when that denominator vanishes the y axis is used instead. The target is
/// extrapolated with its velocity and, while thrusting, its acceleration.
pub fn lead_angle(
    position: Vector2,
    velocity: Vector2,
    rotation: f32,
    target: &Contact,
    projectile_speed: f32,
) -> f32 {
    let offset = target.position.sub(&position);
    let heading = Vector2::from_angle(rotation);

    let denominator_x = heading.x * projectile_speed + velocity.x;
    let denominator_y = heading.y * projectile_speed + velocity.y;
    let time = if denominator_x.abs() >= DEGENERATE_DENOMINATOR {
        offset.x / denominator_x
    } else if denominator_y.abs() >= DEGENERATE_DENOMINATOR {
        offset.y / denominator_y
    } else {
        0.0
    };
    let time = if time.is_finite() && time > 0.0 {
        time
    } else {
        0.0
    };

    let drift = target
        .velocity
        .scale(time)
        .add(&target.acceleration().scale(0.5 * time * time));
    let aim = offset.add(&drift);
    normalize_angle(aim.y.atan2(aim.x))
}

/// Target-lock state carried by each ship.
#[derive(Debug, Clone, PartialEq)]
pub struct Radar {
    pub active: bool,
    pub target_id: Option<PlayerId>,
    pub range: f32,
}

impl Default for Radar {
    fn default() -> Self {
        Self {
            active: false,
            target_id: None,
            range: RADAR_RANGE,
        }
    }
}

impl Radar {
    /// Closest contact in range that lies ahead of the ship and on its
    /// heading line. Equal distances go to the lower id.
    pub fn acquire(&self, position: Vector2, rotation: f32, contacts: &[Contact]) -> Option<PlayerId> {
        let heading = Vector2::from_angle(rotation);
        contacts
            .iter()
            .filter_map(|contact| {
                let relative = contact.position.sub(&position);
                let distance = relative.magnitude();
                let qualifies = distance <= self.range
                    && heading.dot(&relative) > 0.0
                    && heading_intersects(heading, relative, SHIP_RADIUS);
                qualifies.then_some((contact.id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    /// Returns the locked contact, dropping the lock when the target has
    /// left or flown out of range.
    pub fn tracked<'a>(&mut self, position: Vector2, contacts: &'a [Contact]) -> Option<&'a Contact> {
        let target_id = self.target_id?;
        let target = contacts
            .iter()
            .find(|c| c.id == target_id)
            .filter(|c| c.position.sub(&position).magnitude() <= self.range);
        if target.is_none() {
            self.target_id = None;
        }
        target
    }

    pub fn release(&mut self) {
        self.active = false;
        self.target_id = None;
    }

    pub fn snapshot(&self) -> RadarSnapshot {
        RadarSnapshot {
            active: self.active,
            target_id: self.target_id,
            range: self.range,
        }
    }
}

use crate::projectile::Projectile;
use crate::radar::{lead_angle, Contact, Radar};
use crate::rcs::{rotational_correction, Rcs, ThrusterAllocator};
use shared::{
    normalize_angle, ControlState, GameConfiguration, KeyState, PlayerId, PlayerSnapshot,
    TurnDirection, Vector2, FULL_AMMO, LINEAR_ACCELERATION, MUZZLE_OFFSET, RCS_TURN_RATE,
    ROTATIONAL_ACCELERATION, SHIP_RADIUS,
};

/// Everything a ship needs from the world to run one frame, besides its
/// own state. Other ships are visible only as read-only contacts.
pub struct FrameContext<'a> {
    pub config: &'a GameConfiguration,
    pub contacts: &'a [Contact],
    pub allocator: &'a dyn ThrusterAllocator,
}

/// A connected player's ship.
///
/// Identity fields are fixed at creation. All other state is written only
/// by the frame handler of the owning connection.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub color: String,

    /// Where the ship sits in the client's window. Cosmetic only.
    pub view_position: Vector2,
    pub absolute_position: Vector2,
    pub velocity: Vector2,
    pub rotation: f32,
    pub rotation_velocity: f32,

    pub accelerating: bool,
    pub braking: bool,
    pub turn_direction: TurnDirection,

    pub ammo: u32,
    pub coins: i64,

    pub rcs: Rcs,
    pub radar: Radar,

    trigger_latched: bool,
}

impl Player {
    pub fn new(id: PlayerId, username: String, color: String, spawn: Vector2) -> Self {
        Self {
            id,
            username,
            color,
            view_position: Vector2::ZERO,
            absolute_position: spawn,
            velocity: Vector2::ZERO,
            rotation: 0.0,
            rotation_velocity: 0.0,
            accelerating: false,
            braking: false,
            turn_direction: TurnDirection::None,
            ammo: FULL_AMMO,
            coins: 0,
            rcs: Rcs::default(),
            radar: Radar::default(),
            trigger_latched: false,
        }
    }

    pub fn radius(&self) -> f32 {
        SHIP_RADIUS
    }

    pub fn heading(&self) -> Vector2 {
        Vector2::from_angle(self.rotation)
    }

    /// Advances the ship by one input frame.
    pub fn update(&mut self, controls: &ControlState, ctx: &FrameContext) {
        self.accelerating = controls.thrust_forward.pressed;
        self.braking = controls.thrust_reverse.pressed && !self.accelerating;
        self.turn_direction = if controls.turn_right.pressed {
            TurnDirection::Right
        } else if controls.turn_left.pressed {
            TurnDirection::Left
        } else {
            TurnDirection::None
        };
        self.rcs.active = controls.precision_mode.toggled;
        self.radar.active = controls.radar_lock.toggled;

        if self.accelerating {
            self.velocity = self
                .velocity
                .add(&self.heading().scale(LINEAR_ACCELERATION));
        } else if self.braking {
            self.velocity = self.velocity.scale(ctx.config.friction);
        }

        self.apply_turn(ctx.config);

        if self.rcs.active {
            let force = self.rcs.engage(
                self.velocity,
                self.rotation,
                self.accelerating,
                ctx.allocator,
            );
            self.velocity = self.velocity.add(&force);

            let spin = rotational_correction(self.rotation_velocity, self.turn_direction);
            self.rcs.rotational_thrust = spin;
            self.rotation_velocity += spin;
        } else {
            self.rcs.disengage();
        }

        self.steer_by_radar(ctx);

        self.absolute_position = self.absolute_position.add(&self.velocity);
        self.rotation = normalize_angle(self.rotation + self.rotation_velocity);
    }

    fn apply_turn(&mut self, config: &GameConfiguration) {
        let sign = self.turn_direction.sign();
        match (self.turn_direction, self.rcs.active) {
            (TurnDirection::None, true) => self.rotation_velocity *= config.rcs_friction,
            (TurnDirection::None, false) => self.rotation_velocity *= config.rotational_friction,
            (_, true) => self.rotation_velocity = sign * RCS_TURN_RATE,
            (_, false) => self.rotation_velocity += sign * ROTATIONAL_ACCELERATION,
        }
    }

    fn steer_by_radar(&mut self, ctx: &FrameContext) {
        if !self.radar.active {
            self.radar.release();
            return;
        }

        if self.radar.target_id.is_none() {
            self.radar.target_id =
                self.radar
                    .acquire(self.absolute_position, self.rotation, ctx.contacts);
            if self.radar.target_id.is_some() {
                self.rotation_velocity = 0.0;
            }
        }

        if let Some(target) = self.radar.tracked(self.absolute_position, ctx.contacts) {
            self.rotation = lead_angle(
                self.absolute_position,
                self.velocity,
                self.rotation,
                target,
                ctx.config.projectile_speed,
            );
            self.rotation_velocity = 0.0;
        }
    }

    /// Edge detector for the fire key: true exactly once per press.
    pub fn trigger(&mut self, fire: &KeyState) -> bool {
        if !fire.pressed {
            self.trigger_latched = false;
            return false;
        }
        if !fire.fresh_press() || self.trigger_latched {
            return false;
        }
        self.trigger_latched = true;
        true
    }

    /// Fires one round from the nose. Does nothing when the magazine is empty.
    pub fn shoot(&mut self, projectile_speed: f32) -> Option<Projectile> {
        if self.ammo == 0 {
            return None;
        }
        self.ammo -= 1;

        let heading = self.heading();
        let position = self
            .absolute_position
            .add(&heading.scale(MUZZLE_OFFSET));
        let velocity = heading.scale(projectile_speed).add(&self.velocity);
        Some(Projectile::new(self.id, position, velocity))
    }

    pub fn reload(&mut self) {
        self.ammo = FULL_AMMO;
    }

    /// Puts the ship back at `spawn`, at rest.
    pub fn respawn(&mut self, spawn: Vector2) {
        self.absolute_position = spawn;
        self.velocity = Vector2::ZERO;
        self.rotation_velocity = 0.0;
        self.radar.target_id = None;
    }

    pub fn contact(&self) -> Contact {
        Contact {
            id: self.id,
            position: self.absolute_position,
            velocity: self.velocity,
            rotation: self.rotation,
            accelerating: self.accelerating,
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            username: self.username.clone(),
            color: self.color.clone(),
            view_position: self.view_position,
            absolute_position: self.absolute_position,
            velocity: self.velocity,
            rotation: self.rotation,
            rotation_velocity: self.rotation_velocity,
            accelerating: self.accelerating,
            braking: self.braking,
            turn_direction: self.turn_direction,
            radius: SHIP_RADIUS,
            ammo: self.ammo,
            full_ammo: FULL_AMMO,
            coins: self.coins,
            rcs: self.rcs.snapshot(),
            radar: self.radar.snapshot(),
        }
    }
}

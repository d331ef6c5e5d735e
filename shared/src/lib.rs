use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

pub const SHIP_RADIUS: f32 = 16.0;
pub const LINEAR_ACCELERATION: f32 = 0.1;
pub const ROTATIONAL_ACCELERATION: f32 = 0.002;
pub const RCS_TURN_RATE: f32 = 0.05;
pub const RCS_MAX_THRUST: f32 = 0.05;
pub const RCS_MAX_ROTATIONAL_THRUST: f32 = 0.004;
pub const FULL_AMMO: u32 = 20;
pub const MUZZLE_OFFSET: f32 = 30.0;
pub const RADAR_RANGE: f32 = 300.0;
pub const PROJECTILE_RADIUS: f32 = 5.0;
pub const AMMO_BOOST_RADIUS: f32 = 20.0;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_CHAT_LENGTH: usize = 256;

pub type PlayerId = u32;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` radians.
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2::new(self.x * scalar, self.y * scalar)
    }

    pub fn dot(&self, other: &Vector2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn magnitude(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2::ZERO
        } else {
            self.scale(1.0 / mag)
        }
    }
}

/// Wraps an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Axis-aligned overlap test between two circles approximated by their
/// bounding boxes. Touching edges count as overlap.
pub fn aabb_overlap(a: Vector2, radius_a: f32, b: Vector2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    (a.x - b.x).abs() <= reach && (a.y - b.y).abs() <= reach
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MiniMapScale {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewardMode {
    /// Victim pays now, the shooter is credited on its own next frame.
    #[default]
    Ledger,
    /// Shooter is credited immediately and the victim respawns.
    Hardcore,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameConfiguration {
    pub width: f32,
    pub height: f32,
    pub friction: f32,
    pub rcs_friction: f32,
    pub rotational_friction: f32,
    pub projectile_speed: f32,
    pub bounty: i64,
    pub ammo_boost_count: usize,
    pub mini_map_scales: Vec<MiniMapScale>,
    pub reward_mode: RewardMode,
}

impl Default for GameConfiguration {
    fn default() -> Self {
        let width = 4000.0;
        let height = 4000.0;
        Self {
            width,
            height,
            friction: 0.97,
            rcs_friction: 0.85,
            rotational_friction: 0.98,
            projectile_speed: 25.0,
            bounty: 20,
            ammo_boost_count: 20,
            mini_map_scales: vec![
                MiniMapScale {
                    x: width / 2.0,
                    y: height / 2.0,
                },
                MiniMapScale {
                    x: width,
                    y: height,
                },
            ],
            reward_mode: RewardMode::Ledger,
        }
    }
}

impl GameConfiguration {
    pub fn spawn_point(&self) -> Vector2 {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }

    /// True once a circle of `radius` at `position` is entirely past any edge.
    pub fn is_outside(&self, position: Vector2, radius: f32) -> bool {
        position.x + radius < 0.0
            || position.x - radius > self.width
            || position.y + radius < 0.0
            || position.y - radius > self.height
    }
}

/// A held key.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub pressed: bool,
    /// Set by the client once the press has been consumed.
    #[serde(default)]
    pub used: bool,
}

impl KeyState {
    pub fn fresh_press(&self) -> bool {
        self.pressed && !self.used
    }
}

/// A key that flips a mode on and off.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggle {
    pub toggled: bool,
}

/// Control state sent by a client once per rendered frame.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub thrust_forward: KeyState,
    pub thrust_reverse: KeyState,
    pub turn_left: KeyState,
    pub turn_right: KeyState,
    pub fire: KeyState,
    pub precision_mode: Toggle,
    pub radar_lock: Toggle,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
    #[default]
    None,
}

impl TurnDirection {
    /// Sign applied to angular velocity: right is positive.
    pub fn sign(&self) -> f32 {
        match self {
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
            TurnDirection::None => 0.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct RcsSnapshot {
    pub active: bool,
    pub thrusts: [f32; 4],
    pub rotational_thrust: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct RadarSnapshot {
    pub active: bool,
    pub target_id: Option<PlayerId>,
    pub range: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub username: String,
    pub color: String,
    pub view_position: Vector2,
    pub absolute_position: Vector2,
    pub velocity: Vector2,
    pub rotation: f32,
    pub rotation_velocity: f32,
    pub accelerating: bool,
    pub braking: bool,
    pub turn_direction: TurnDirection,
    pub radius: f32,
    pub ammo: u32,
    pub full_ammo: u32,
    pub coins: i64,
    pub rcs: RcsSnapshot,
    pub radar: RadarSnapshot,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectileSnapshot {
    pub id: u32,
    pub owner_id: PlayerId,
    pub absolute_position: Vector2,
    pub velocity: Vector2,
    pub radius: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AmmoBoostSnapshot {
    pub id: u32,
    pub absolute_position: Vector2,
    pub radius: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Joined,
    Left,
    Chat,
    Kill,
}

/// Chat-style line shown in the client's message feed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub content: String,
    pub username: String,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    ClientSpecs {
        window_width: f32,
        window_height: f32,
    },
    Frame {
        sequence: u32,
        controls: ControlState,
    },
    Chat {
        content: String,
    },
    Disconnect,

    Config {
        player_id: PlayerId,
        configuration: GameConfiguration,
        players: Vec<PlayerSnapshot>,
    },
    Sprites {
        sequence: u32,
        players: Vec<PlayerSnapshot>,
        ammo_boosts: Vec<AmmoBoostSnapshot>,
        projectiles: Vec<ProjectileSnapshot>,
    },
    Message(Notice),
    Disconnected {
        reason: String,
    },
}

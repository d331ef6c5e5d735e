//! Authoritative arena state and per-frame simulation
//!
//! The arena owns every player, projectile and ammo boost, keyed by stable
//! ids. It never talks to the network directly: each handler returns the
//! packets it wants delivered as [`Dispatch`] values and the transport layer
//! routes them.
//!
//! There is no global physics tick. Each connection advances the world when
//! its own input frame arrives: its ship moves, its own projectiles move, and
//! only then are foreign projectiles checked against its hull. Rewards for
//! hits are parked in a ledger and paid out on the shooter's next frame.

use crate::ammo_boost::AmmoBoost;
use crate::error::ArenaError;
use crate::names::{NameGenerator, RandomNames};
use crate::player::{FrameContext, Player};
use crate::projectile::Projectile;
use crate::radar::Contact;
use crate::rcs::{LinearProgramAllocator, ThrusterAllocator};
use crate::reward::RewardLedger;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    aabb_overlap, ControlState, GameConfiguration, Notice, NoticeKind, Packet, PlayerId,
    PlayerSnapshot, RewardMode, Vector2, MAX_CHAT_LENGTH,
};
use std::collections::BTreeMap;

/// Who should receive an outbound packet, relative to the connection whose
/// event produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Origin,
    Others,
    Everyone,
}

#[derive(Debug, Clone)]
pub struct Dispatch {
    pub recipient: Recipient,
    pub packet: Packet,
}

impl Dispatch {
    pub fn new(recipient: Recipient, packet: Packet) -> Self {
        Self { recipient, packet }
    }
}

/// Rejects configurations the simulation cannot run meaningfully: a world
/// without positive finite extent, or non-finite speeds and friction.
pub fn validate_configuration(config: &GameConfiguration) -> Result<(), ArenaError> {
    let invalid = |reason: String| -> Result<(), ArenaError> {
        Err(ArenaError::InvalidConfiguration { reason })
    };

    if !(config.width.is_finite() && config.width > 0.0) {
        return invalid(format!("width {}", config.width));
    }
    if !(config.height.is_finite() && config.height > 0.0) {
        return invalid(format!("height {}", config.height));
    }
    if !config.projectile_speed.is_finite() {
        return invalid(format!("projectile speed {}", config.projectile_speed));
    }
    for (name, value) in [
        ("friction", config.friction),
        ("rcs friction", config.rcs_friction),
        ("rotational friction", config.rotational_friction),
    ] {
        if !value.is_finite() {
            return invalid(format!("{} {}", name, value));
        }
    }
    if config.bounty < 0 {
        return invalid(format!("bounty {}", config.bounty));
    }
    Ok(())
}

pub struct Arena {
    config: GameConfiguration,
    players: BTreeMap<PlayerId, Player>,
    ammo_boosts: BTreeMap<u32, AmmoBoost>,
    projectiles: BTreeMap<u32, Projectile>,
    ledger: RewardLedger,
    allocator: Box<dyn ThrusterAllocator>,
    names: Box<dyn NameGenerator>,
    next_boost_id: u32,
    next_projectile_id: u32,
}

impl Arena {
    pub fn new(config: GameConfiguration) -> Self {
        Self::with_parts(
            config,
            &mut StdRng::from_entropy(),
            Box::new(RandomNames::new()),
            Box::new(LinearProgramAllocator),
        )
    }

    /// Same as [`Arena::new`] but with reproducible boost placement and names.
    pub fn with_seed(config: GameConfiguration, seed: u64) -> Self {
        Self::with_parts(
            config,
            &mut StdRng::seed_from_u64(seed),
            Box::new(RandomNames::seeded(seed)),
            Box::new(LinearProgramAllocator),
        )
    }

    pub fn with_parts<R: Rng>(
        config: GameConfiguration,
        rng: &mut R,
        names: Box<dyn NameGenerator>,
        allocator: Box<dyn ThrusterAllocator>,
    ) -> Self {
        let mut arena = Self {
            config,
            players: BTreeMap::new(),
            ammo_boosts: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            ledger: RewardLedger::new(),
            allocator,
            names,
            next_boost_id: 0,
            next_projectile_id: 1,
        };

        for _ in 0..arena.config.ammo_boost_count {
            let id = arena.next_boost_id;
            arena.next_boost_id += 1;
            let boost = AmmoBoost::scattered(id, &arena.config, rng);
            arena.ammo_boosts.insert(id, boost);
        }
        info!(
            "Arena {}x{} ready with {} ammo boosts ({:?} rewards)",
            arena.config.width,
            arena.config.height,
            arena.ammo_boosts.len(),
            arena.config.reward_mode
        );
        arena
    }

    pub fn config(&self) -> &GameConfiguration {
        &self.config
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Direct access for tooling and tests. In play, a ship is only written
    /// by its own frame handler.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    pub fn ammo_boosts(&self) -> impl Iterator<Item = &AmmoBoost> {
        self.ammo_boosts.values()
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn add_ammo_boost(&mut self, position: Vector2) -> u32 {
        let id = self.next_boost_id;
        self.next_boost_id += 1;
        self.ammo_boosts.insert(id, AmmoBoost::new(id, position));
        id
    }

    pub fn add_projectile(&mut self, mut projectile: Projectile) -> u32 {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        projectile.id = id;
        self.projectiles.insert(id, projectile);
        id
    }

    pub fn roster(&self) -> Vec<PlayerSnapshot> {
        self.players.values().map(Player::snapshot).collect()
    }

    fn sprites(&self, sequence: u32) -> Packet {
        Packet::Sprites {
            sequence,
            players: self.roster(),
            ammo_boosts: self.ammo_boosts.values().map(AmmoBoost::snapshot).collect(),
            projectiles: self.projectiles.values().map(Projectile::snapshot).collect(),
        }
    }

    /// Spawns a ship for a new connection, replies with the configuration
    /// and roster, and announces the arrival to everyone.
    pub fn handle_connection(&mut self, id: PlayerId) -> Vec<Dispatch> {
        if self.players.contains_key(&id) {
            warn!("Player {} connected twice, replacing ship", id);
        }

        let username = self.names.username();
        let color = self.names.color();
        let player = Player::new(id, username.clone(), color.clone(), self.config.spawn_point());
        info!(
            "Player {} ({}) spawned at ({}, {})",
            id, username, player.absolute_position.x, player.absolute_position.y
        );
        self.players.insert(id, player);

        vec![
            Dispatch::new(
                Recipient::Origin,
                Packet::Config {
                    player_id: id,
                    configuration: self.config.clone(),
                    players: self.roster(),
                },
            ),
            Dispatch::new(
                Recipient::Everyone,
                Packet::Message(Notice {
                    kind: NoticeKind::Joined,
                    content: "joined!".to_string(),
                    username,
                    color,
                }),
            ),
        ]
    }

    /// Centres the ship in the client's window.
    pub fn client_specs(
        &mut self,
        id: PlayerId,
        window_width: f32,
        window_height: f32,
    ) -> Result<(), ArenaError> {
        if !(window_width.is_finite() && window_height.is_finite())
            || window_width < 0.0
            || window_height < 0.0
        {
            return Err(ArenaError::InvalidInputFrame {
                reason: format!("window size {}x{}", window_width, window_height),
            });
        }
        let player = self
            .players
            .get_mut(&id)
            .ok_or(ArenaError::UnknownPlayer(id))?;
        player.view_position = Vector2::new(window_width / 2.0, window_height / 2.0);
        Ok(())
    }

    /// One authoritative step for the connection that sent `controls`.
    pub fn on_frame(
        &mut self,
        id: PlayerId,
        sequence: u32,
        controls: &ControlState,
    ) -> Result<Vec<Dispatch>, ArenaError> {
        if !self.players.contains_key(&id) {
            return Err(ArenaError::UnknownPlayer(id));
        }
        let mut dispatches = Vec::new();

        self.settle_rewards(id);

        let contacts: Vec<Contact> = self
            .players
            .values()
            .filter(|p| p.id != id)
            .map(Player::contact)
            .collect();
        let ctx = FrameContext {
            config: &self.config,
            contacts: &contacts,
            allocator: self.allocator.as_ref(),
        };
        if let Some(player) = self.players.get_mut(&id) {
            player.update(controls, &ctx);
        }

        self.collect_boosts(id);
        self.resolve_projectiles(id, &mut dispatches);

        let projectile_speed = self.config.projectile_speed;
        let fired = self.players.get_mut(&id).and_then(|player| {
            if !player.trigger(&controls.fire) {
                return None;
            }
            let shot = player.shoot(projectile_speed);
            if shot.is_none() {
                debug!("Player {} dry fire", id);
            }
            shot
        });
        if let Some(projectile) = fired {
            self.add_projectile(projectile);
        }

        dispatches.push(Dispatch::new(Recipient::Origin, self.sprites(sequence)));
        Ok(dispatches)
    }

    fn settle_rewards(&mut self, id: PlayerId) {
        let players = &self.players;
        let pruned = self.ledger.prune(|shooter| players.contains_key(&shooter));
        if pruned > 0 {
            debug!("Pruned {} rewards owed to departed players", pruned);
        }

        let credits = self.ledger.settle(id);
        if credits > 0 {
            if let Some(player) = self.players.get_mut(&id) {
                let payout = self.config.bounty.saturating_mul(credits as i64);
                player.coins = player.coins.saturating_add(payout);
                debug!("Player {} collected {} bounties", id, credits);
            }
        }
    }

    fn collect_boosts(&mut self, id: PlayerId) {
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        let touched: Vec<u32> = self
            .ammo_boosts
            .values()
            .rev()
            .filter(|boost| {
                aabb_overlap(
                    player.absolute_position,
                    player.radius(),
                    boost.absolute_position,
                    boost.radius(),
                )
            })
            .map(|boost| boost.id)
            .collect();

        for boost_id in touched {
            if self.ammo_boosts.remove(&boost_id).is_some() {
                player.reload();
                debug!("Player {} picked up ammo boost {}", id, boost_id);
            }
        }
    }

    /// Advances the player's own projectiles and applies hits from everyone
    /// else's.
    fn resolve_projectiles(&mut self, id: PlayerId, dispatches: &mut Vec<Dispatch>) {
        let spawn = self.config.spawn_point();
        let bounty = self.config.bounty;
        let mode = self.config.reward_mode;

        let Some(victim) = self.players.get(&id) else {
            return;
        };
        let victim_position = victim.absolute_position;
        let victim_radius = victim.radius();

        let mut removed = Vec::new();
        let mut hits = Vec::new();
        let mut respawned = false;

        for projectile in self.projectiles.values_mut().rev() {
            if projectile.owner_id == id {
                projectile.update();
                if projectile.is_out_of_bounds(&self.config) {
                    removed.push(projectile.id);
                }
            } else if !respawned
                && aabb_overlap(
                    victim_position,
                    victim_radius,
                    projectile.absolute_position,
                    projectile.radius(),
                )
            {
                removed.push(projectile.id);
                hits.push(projectile.owner_id);
                if mode == RewardMode::Hardcore {
                    respawned = true;
                }
            }
        }

        for projectile_id in removed {
            self.projectiles.remove(&projectile_id);
        }

        for shooter in hits {
            self.apply_hit(id, shooter, bounty, mode, spawn, dispatches);
        }
    }

    fn apply_hit(
        &mut self,
        victim_id: PlayerId,
        shooter_id: PlayerId,
        bounty: i64,
        mode: RewardMode,
        spawn: Vector2,
        dispatches: &mut Vec<Dispatch>,
    ) {
        let Some(victim) = self.players.get_mut(&victim_id) else {
            return;
        };
        victim.coins = victim.coins.saturating_sub(bounty);
        info!("Player {} hit by player {}", victim_id, shooter_id);

        match mode {
            RewardMode::Ledger => self.ledger.enqueue(shooter_id),
            RewardMode::Hardcore => {
                victim.respawn(spawn);
                let victim_name = victim.username.clone();
                if let Some(shooter) = self.players.get_mut(&shooter_id) {
                    shooter.coins = shooter.coins.saturating_add(bounty);
                    dispatches.push(Dispatch::new(
                        Recipient::Everyone,
                        Packet::Message(Notice {
                            kind: NoticeKind::Kill,
                            content: format!("destroyed {}!", victim_name),
                            username: shooter.username.clone(),
                            color: shooter.color.clone(),
                        }),
                    ));
                }
            }
        }
    }

    /// Relays a chat line from `id` to everyone.
    pub fn chat(&mut self, id: PlayerId, content: &str) -> Result<Vec<Dispatch>, ArenaError> {
        let player = self.players.get(&id).ok_or(ArenaError::UnknownPlayer(id))?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ArenaError::InvalidInputFrame {
                reason: "empty chat message".to_string(),
            });
        }
        let content: String = content.chars().take(MAX_CHAT_LENGTH).collect();

        Ok(vec![Dispatch::new(
            Recipient::Everyone,
            Packet::Message(Notice {
                kind: NoticeKind::Chat,
                content,
                username: player.username.clone(),
                color: player.color.clone(),
            }),
        )])
    }

    /// Removes the player's ship and tells everyone else.
    pub fn disconnect(&mut self, id: PlayerId) -> Result<Vec<Dispatch>, ArenaError> {
        let player = self
            .players
            .remove(&id)
            .ok_or(ArenaError::UnknownPlayer(id))?;
        let pruned = self.ledger.settle(id);
        info!(
            "Player {} ({}) left, {} unclaimed bounties dropped",
            id, player.username, pruned
        );

        Ok(vec![Dispatch::new(
            Recipient::Others,
            Packet::Message(Notice {
                kind: NoticeKind::Left,
                content: "left...".to_string(),
                username: player.username,
                color: player.color,
            }),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{KeyState, Toggle, FULL_AMMO};

    fn empty_config() -> GameConfiguration {
        GameConfiguration {
            ammo_boost_count: 0,
            ..Default::default()
        }
    }

    fn fire() -> ControlState {
        ControlState {
            fire: KeyState {
                pressed: true,
                used: false,
            },
            ..Default::default()
        }
    }

    fn sprites_of(dispatches: &[Dispatch]) -> (usize, usize, usize) {
        for dispatch in dispatches {
            if let Packet::Sprites {
                players,
                ammo_boosts,
                projectiles,
                ..
            } = &dispatch.packet
            {
                assert_eq!(dispatch.recipient, Recipient::Origin);
                return (players.len(), ammo_boosts.len(), projectiles.len());
            }
        }
        panic!("no sprites reply");
    }

    #[test]
    fn test_arena_spawns_configured_boosts() {
        let arena = Arena::with_seed(GameConfiguration::default(), 5);
        assert_eq!(arena.ammo_boosts().count(), 20);
        assert_eq!(arena.player_count(), 0);
    }

    #[test]
    fn test_connection_replies_config_and_announces() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        let dispatches = arena.handle_connection(7);

        assert_eq!(dispatches.len(), 2);
        match &dispatches[0] {
            Dispatch {
                recipient: Recipient::Origin,
                packet: Packet::Config {
                    player_id, players, ..
                },
            } => {
                assert_eq!(*player_id, 7);
                assert_eq!(players.len(), 1);
            }
            other => panic!("unexpected dispatch {:?}", other),
        }
        match &dispatches[1] {
            Dispatch {
                recipient: Recipient::Everyone,
                packet: Packet::Message(notice),
            } => assert_eq!(notice.kind, NoticeKind::Joined),
            other => panic!("unexpected dispatch {:?}", other),
        }

        let player = arena.player(7).unwrap();
        assert_eq!(player.absolute_position, arena.config().spawn_point());
    }

    #[test]
    fn test_frame_for_unknown_player() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        let result = arena.on_frame(3, 1, &ControlState::default());
        assert_eq!(result.unwrap_err(), ArenaError::UnknownPlayer(3));
    }

    #[test]
    fn test_frame_replies_snapshot_to_origin_only() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        let dispatches = arena.on_frame(1, 1, &ControlState::default()).unwrap();
        assert_eq!(dispatches.len(), 1);
        assert_eq!(sprites_of(&dispatches), (2, 0, 0));
    }

    #[test]
    fn test_boost_pickup_reloads_and_removes() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        let boost_id = arena.add_ammo_boost(Vector2::new(100.0, 100.0));
        {
            let player = arena.player_mut(1).unwrap();
            player.absolute_position = Vector2::new(130.0, 70.0);
            player.ammo = 3;
        }

        arena.on_frame(1, 1, &ControlState::default()).unwrap();

        assert_eq!(arena.player(1).unwrap().ammo, FULL_AMMO);
        assert!(arena.ammo_boosts().all(|b| b.id != boost_id));
    }

    #[test]
    fn test_boost_out_of_reach_stays() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.add_ammo_boost(Vector2::new(100.0, 100.0));
        {
            let player = arena.player_mut(1).unwrap();
            player.absolute_position = Vector2::new(137.0, 100.0);
            player.ammo = 3;
        }
        arena.on_frame(1, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(1).unwrap().ammo, 3);
        assert_eq!(arena.ammo_boosts().count(), 1);
    }

    #[test]
    fn test_fire_is_edge_triggered() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);

        arena.on_frame(1, 1, &fire()).unwrap();
        arena.on_frame(1, 2, &fire()).unwrap();
        assert_eq!(arena.projectiles().count(), 1);
        assert_eq!(arena.player(1).unwrap().ammo, FULL_AMMO - 1);

        arena.on_frame(1, 3, &ControlState::default()).unwrap();
        arena.on_frame(1, 4, &fire()).unwrap();
        assert_eq!(arena.projectiles().count(), 2);
    }

    #[test]
    fn test_new_projectile_not_advanced_on_spawn_frame() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.on_frame(1, 1, &fire()).unwrap();
        let projectile = arena.projectiles().next().unwrap();
        assert_eq!(projectile.absolute_position, Vector2::new(2030.0, 2000.0));
        assert_eq!(projectile.velocity, Vector2::new(25.0, 0.0));
    }

    #[test]
    fn test_own_projectile_never_hits_owner() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        let position = arena.player(1).unwrap().absolute_position;
        arena.add_projectile(Projectile::new(1, position, Vector2::ZERO));
        arena.on_frame(1, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(1).unwrap().coins, 0);
        assert_eq!(arena.projectiles().count(), 1);
    }

    #[test]
    fn test_projectile_removed_only_on_owner_tick() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        arena.add_projectile(Projectile::new(
            1,
            Vector2::new(2.0, 500.0),
            Vector2::new(-10.0, 0.0),
        ));

        arena.on_frame(2, 1, &ControlState::default()).unwrap();
        let projectile = arena.projectiles().next().unwrap();
        assert_eq!(projectile.absolute_position.x, 2.0);

        arena.on_frame(1, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.projectiles().count(), 0);
    }

    #[test]
    fn test_ledger_hit_and_deferred_credit() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        let target = arena.player(2).unwrap().absolute_position;
        arena.add_projectile(Projectile::new(1, target, Vector2::ZERO));

        arena.on_frame(2, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(2).unwrap().coins, -20);
        assert_eq!(arena.player(1).unwrap().coins, 0);
        assert_eq!(arena.ledger().pending_for(1), 1);
        assert_eq!(arena.projectiles().count(), 0);

        arena.on_frame(1, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(1).unwrap().coins, 20);
        assert!(arena.ledger().is_empty());

        arena.on_frame(1, 2, &ControlState::default()).unwrap();
        assert_eq!(arena.player(1).unwrap().coins, 20);
    }

    #[test]
    fn test_multiple_hits_yield_multiple_credits() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        let target = arena.player(2).unwrap().absolute_position;
        for _ in 0..3 {
            arena.add_projectile(Projectile::new(1, target, Vector2::ZERO));
        }

        arena.on_frame(2, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(2).unwrap().coins, -60);
        assert_eq!(arena.ledger().len(), 3);

        arena.on_frame(1, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(1).unwrap().coins, 60);
        assert!(arena.ledger().is_empty());
    }

    #[test]
    fn test_disconnect_drops_owed_rewards() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        let target = arena.player(2).unwrap().absolute_position;
        arena.add_projectile(Projectile::new(1, target, Vector2::ZERO));
        arena.on_frame(2, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.ledger().len(), 1);

        let dispatches = arena.disconnect(1).unwrap();
        assert!(arena.ledger().is_empty());
        assert_eq!(dispatches.len(), 1);
        assert_eq!(dispatches[0].recipient, Recipient::Others);
        assert!(arena.player(1).is_none());
        assert_eq!(arena.disconnect(1).unwrap_err(), ArenaError::UnknownPlayer(1));
    }

    #[test]
    fn test_hardcore_credits_immediately_and_respawns() {
        let config = GameConfiguration {
            reward_mode: RewardMode::Hardcore,
            ..empty_config()
        };
        let mut arena = Arena::with_seed(config, 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        {
            let victim = arena.player_mut(2).unwrap();
            victim.absolute_position = Vector2::new(500.0, 500.0);
            victim.velocity = Vector2::ZERO;
        }
        arena.add_projectile(Projectile::new(1, Vector2::new(500.0, 500.0), Vector2::ZERO));

        let dispatches = arena.on_frame(2, 1, &ControlState::default()).unwrap();

        assert_eq!(arena.player(2).unwrap().coins, -20);
        assert_eq!(arena.player(1).unwrap().coins, 20);
        assert_eq!(
            arena.player(2).unwrap().absolute_position,
            arena.config().spawn_point()
        );
        assert!(arena.ledger().is_empty());
        assert!(dispatches.iter().any(|d| matches!(
            &d.packet,
            Packet::Message(Notice { kind: NoticeKind::Kill, .. })
        ) && d.recipient == Recipient::Everyone));
    }

    #[test]
    fn test_radar_lock_through_arena() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        arena.player_mut(2).unwrap().absolute_position = Vector2::new(2100.0, 2000.0);

        let controls = ControlState {
            radar_lock: Toggle { toggled: true },
            ..Default::default()
        };
        arena.on_frame(1, 1, &controls).unwrap();
        assert_eq!(arena.player(1).unwrap().radar.target_id, Some(2));

        arena.disconnect(2).unwrap();
        arena.on_frame(1, 2, &controls).unwrap();
        assert_eq!(arena.player(1).unwrap().radar.target_id, None);
    }

    #[test]
    fn test_client_specs_centres_view() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.client_specs(1, 1280.0, 720.0).unwrap();
        assert_eq!(
            arena.player(1).unwrap().view_position,
            Vector2::new(640.0, 360.0)
        );
        assert!(arena.client_specs(1, f32::NAN, 720.0).is_err());
        assert_eq!(
            arena.client_specs(9, 10.0, 10.0).unwrap_err(),
            ArenaError::UnknownPlayer(9)
        );
    }

    #[test]
    fn test_chat_relay() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        let dispatches = arena.chat(1, "  gg  ").unwrap();
        match &dispatches[0].packet {
            Packet::Message(notice) => {
                assert_eq!(notice.kind, NoticeKind::Chat);
                assert_eq!(notice.content, "gg");
                assert_eq!(notice.username, arena.player(1).unwrap().username);
            }
            other => panic!("unexpected packet {:?}", other),
        }
        assert_eq!(dispatches[0].recipient, Recipient::Everyone);
        assert!(arena.chat(1, "   ").is_err());

        let long = "x".repeat(1000);
        match &arena.chat(1, &long).unwrap()[0].packet {
            Packet::Message(notice) => assert_eq!(notice.content.len(), MAX_CHAT_LENGTH),
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_orphaned_hit_prunes_departed_shooter() {
        let mut arena = Arena::with_seed(empty_config(), 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        let target = arena.player(2).unwrap().absolute_position;
        arena.add_projectile(Projectile::new(1, target, Vector2::ZERO));
        arena.disconnect(1).unwrap();

        arena.on_frame(2, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(2).unwrap().coins, -20);
        assert_eq!(arena.ledger().pending_for(1), 1);

        arena.on_frame(2, 2, &ControlState::default()).unwrap();
        assert!(arena.ledger().is_empty());
        assert_eq!(arena.player(2).unwrap().coins, -20);
    }

    #[test]
    fn test_hardcore_hit_from_departed_shooter() {
        let config = GameConfiguration {
            reward_mode: RewardMode::Hardcore,
            ..empty_config()
        };
        let mut arena = Arena::with_seed(config, 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        arena.player_mut(2).unwrap().absolute_position = Vector2::new(500.0, 500.0);
        arena.add_projectile(Projectile::new(1, Vector2::new(500.0, 500.0), Vector2::ZERO));
        arena.disconnect(1).unwrap();

        let dispatches = arena.on_frame(2, 1, &ControlState::default()).unwrap();

        let victim = arena.player(2).unwrap();
        assert_eq!(victim.coins, -20);
        assert_eq!(victim.absolute_position, arena.config().spawn_point());
        assert!(arena.ledger().is_empty());
        assert_eq!(dispatches.len(), 1);
        assert!(!dispatches
            .iter()
            .any(|d| matches!(&d.packet, Packet::Message(_))));
    }

    #[test]
    fn test_huge_bounty_saturates() {
        let config = GameConfiguration {
            bounty: i64::MAX,
            ..empty_config()
        };
        let mut arena = Arena::with_seed(config, 1);
        arena.handle_connection(1);
        arena.handle_connection(2);
        let target = arena.player(2).unwrap().absolute_position;
        for _ in 0..3 {
            arena.add_projectile(Projectile::new(1, target, Vector2::ZERO));
        }

        arena.on_frame(2, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(2).unwrap().coins, i64::MIN);

        arena.on_frame(1, 1, &ControlState::default()).unwrap();
        assert_eq!(arena.player(1).unwrap().coins, i64::MAX);
    }

    #[test]
    fn test_validate_configuration() {
        assert!(validate_configuration(&GameConfiguration::default()).is_ok());

        let bad = [
            GameConfiguration {
                width: 0.0,
                ..Default::default()
            },
            GameConfiguration {
                height: -10.0,
                ..Default::default()
            },
            GameConfiguration {
                width: f32::NAN,
                ..Default::default()
            },
            GameConfiguration {
                projectile_speed: f32::INFINITY,
                ..Default::default()
            },
            GameConfiguration {
                bounty: -1,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                validate_configuration(&config),
                Err(ArenaError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn test_zero_width_arena_does_not_panic() {
        let config = GameConfiguration {
            width: 0.0,
            ..Default::default()
        };
        let arena = Arena::with_seed(config, 1);
        assert_eq!(arena.ammo_boosts().count(), 20);
        assert!(arena.ammo_boosts().all(|b| b.absolute_position.x == 0.0));
    }
}

//! # Arena Server Library
//!
//! This library provides the authoritative server for a multiplayer
//! asteroids-style arena. Ships fly with inertia, shoot projectiles, pick up
//! ammo boosts, and earn or lose coins when projectiles connect.
//!
//! ## Core Responsibilities
//!
//! ### Frame-Driven Simulation
//! There is no global tick. Every input frame a client sends advances that
//! client's own ship and projectiles by one step, resolves collisions that
//! concern it, and is answered with a full snapshot of the arena. A client
//! that sends frames faster simply lives faster.
//!
//! ### Ship Physics
//! Each ship integrates linear and rotational velocity with friction. An
//! optional reaction control system splits a correction vector across four
//! fixed thrusters by solving a small linear program, and an optional radar
//! locks onto the nearest ship ahead and swings the nose to a lead angle.
//!
//! ### Deferred Rewards
//! A hit is detected on the victim's frame but paid out on the shooter's
//! next frame, through a ledger of pending bounties. An opt-in hardcore mode
//! pays immediately and respawns the victim.
//!
//! ### Client Management
//! Handles the lifecycle of UDP peers:
//! - Connection establishment and player id assignment
//! - Stale frame rejection by sequence number
//! - Disconnection and timeout cleanup
//!
//! ## Module Organization
//!
//! - `arena`: authoritative world state and the per-frame pipeline
//! - `player`, `rcs`, `radar`: ship physics and flight assists
//! - `projectile`, `ammo_boost`: the other entities in the arena
//! - `reward`: pending bounty ledger
//! - `names`: display names and colours for new players
//! - `client_manager`: connection registry and frame sequencing
//! - `network`: UDP transport, routing arena dispatches to peers
//! - `error`: error type shared by the handlers
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::arena::Arena;
//! use server::network::Server;
//! use shared::GameConfiguration;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let arena = Arena::new(GameConfiguration::default());
//!     let mut server = Server::new("127.0.0.1:8080", arena, 32, Duration::from_secs(5)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The server runs three background tasks next to the main loop:
//! - **Network Receiver**: decodes incoming datagrams
//! - **Network Sender**: delivers replies and broadcasts
//! - **Timeout Checker**: drops peers that went silent

pub mod ammo_boost;
pub mod arena;
pub mod client_manager;
pub mod error;
pub mod names;
pub mod network;
pub mod player;
pub mod projectile;
pub mod radar;
pub mod rcs;
pub mod reward;

//! Connection bookkeeping for the arena server
//!
//! This module tracks which UDP peers are currently playing:
//! - Peer lifecycle (connect, disconnect, timeout)
//! - Frame sequencing so stale or duplicated frames are never simulated
//! - Capacity limits and address lookup for routing replies
//!
//! It knows nothing about ships or projectiles. The arena owns game state;
//! the client manager only decides whether a datagram belongs to a live
//! connection and whether its frame is still worth simulating.

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected peer
///
/// Each client carries:
/// - Its player id and the address replies are routed to
/// - The last time any datagram arrived from it
/// - The highest frame sequence already simulated
#[derive(Debug)]
pub struct Client {
    /// Player id assigned by the server, shared with the arena
    pub id: PlayerId,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
    /// Highest frame sequence we've simulated
    pub last_processed_frame: u32,
}

impl Client {
    /// Creates a client that has not sent any frames yet.
    pub fn new(id: PlayerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            last_processed_frame: 0,
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Accepts a frame sequence if it is newer than anything simulated so far
    ///
    /// Frames travel over UDP and may arrive late or twice. Running an old
    /// frame would replay thrust and trigger edges the ship already acted on,
    /// so anything at or below the high-water mark is rejected.
    pub fn accept_frame(&mut self, sequence: u32) -> bool {
        self.touch();
        if sequence <= self.last_processed_frame {
            return false;
        }
        self.last_processed_frame = sequence;
        true
    }

    /// Returns true if no packets have arrived within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Registry of live connections
///
/// The ClientManager hands out player ids, enforces the server's capacity,
/// and expires peers that go silent. Ids start at 1 and are never reused
/// while the process runs, so a late datagram from a departed peer can never
/// be mistaken for a newcomer's.
pub struct ClientManager {
    /// Connected clients indexed by their player id
    clients: HashMap<PlayerId, Client>,
    /// Next id handed to a new connection
    next_client_id: PlayerId,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
    /// Silence after which a client is dropped
    timeout: Duration,
}

impl ClientManager {
    /// Creates a manager with the default 5 second timeout.
    pub fn new(max_clients: usize) -> Self {
        Self::with_timeout(max_clients, Duration::from_secs(5))
    }

    pub fn with_timeout(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Registers a new peer
    ///
    /// Returns the assigned player id, or None if the server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<PlayerId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Removes a client. Returns false if it was already gone.
    pub fn remove_client(&mut self, client_id: &PlayerId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Finds the player id bound to a network address.
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn addr_of(&self, client_id: PlayerId) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Refreshes the activity timestamp for a client.
    pub fn touch(&mut self, client_id: PlayerId) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.touch();
        }
    }

    /// Decides whether a frame from `client_id` should be simulated
    ///
    /// Returns false for unknown clients and for frames whose sequence is not
    /// newer than the last one simulated.
    pub fn accept_frame(&mut self, client_id: PlayerId, sequence: u32) -> bool {
        self.clients
            .get_mut(&client_id)
            .map(|client| client.accept_frame(sequence))
            .unwrap_or(false)
    }

    pub fn last_processed_frame(&self, client_id: PlayerId) -> Option<u32> {
        self.clients
            .get(&client_id)
            .map(|client| client.last_processed_frame)
    }

    /// Checks for and removes timed-out clients
    ///
    /// Returns the removed ids so the arena can drop their ships.
    pub fn check_timeouts(&mut self) -> Vec<PlayerId> {
        let timeout = self.timeout;
        let timed_out: Vec<PlayerId> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    /// All client ids and addresses, for broadcasting.
    pub fn get_client_addrs(&self) -> Vec<(PlayerId, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

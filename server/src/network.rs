//! Server network layer handling UDP communications and frame dispatch

use crate::arena::{Arena, Dispatch, Recipient};
use crate::client_manager::ClientManager;
use crate::error::ArenaError;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PlayerId, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Largest datagram the receiver will accept.
pub const MAX_DATAGRAM: usize = 65_507;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: PlayerId },
}

/// Messages sent from the arena loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<PlayerId>,
    },
}

/// Translates an arena dispatch into a transport instruction.
///
/// `origin_addr` is None when the originating client has already been
/// removed, in which case packets addressed to it are dropped.
pub fn route_dispatch(
    dispatch: Dispatch,
    origin: PlayerId,
    origin_addr: Option<SocketAddr>,
) -> Option<GameMessage> {
    match dispatch.recipient {
        Recipient::Origin => origin_addr.map(|addr| GameMessage::SendPacket {
            packet: dispatch.packet,
            addr,
        }),
        Recipient::Others => Some(GameMessage::BroadcastPacket {
            packet: dispatch.packet,
            exclude: Some(origin),
        }),
        Recipient::Everyone => Some(GameMessage::BroadcastPacket {
            packet: dispatch.packet,
            exclude: None,
        }),
    }
}

/// Main server coordinating networking and the arena
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    arena: Arena,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        arena: Arena,
        max_clients: usize,
        client_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::with_timeout(
                max_clients,
                client_timeout,
            ))),
            arena,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Hands every arena dispatch to the sender task.
    async fn route(&self, origin: PlayerId, dispatches: Vec<Dispatch>) {
        if dispatches.is_empty() {
            return;
        }
        let origin_addr = {
            let clients = self.clients.read().await;
            clients.addr_of(origin)
        };

        for dispatch in dispatches {
            if let Some(message) = route_dispatch(dispatch, origin, origin_addr) {
                if let Err(e) = self.game_tx.send(message) {
                    error!("Failed to queue packet for sending: {}", e);
                }
            }
        }
    }

    async fn client_at(&self, addr: SocketAddr) -> Option<PlayerId> {
        let clients = self.clients.read().await;
        clients.find_client_by_addr(addr)
    }

    /// Removes a client from both the registry and the arena, notifying
    /// the remaining players.
    async fn drop_client(&mut self, client_id: PlayerId) {
        {
            let mut clients = self.clients.write().await;
            clients.remove_client(&client_id);
        }
        match self.arena.disconnect(client_id) {
            Ok(dispatches) => self.route(client_id, dispatches).await,
            Err(e) => debug!("Disconnect of {}: {}", client_id, e),
        }
    }

    /// Processes incoming packets and advances the arena
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    self.send_packet(
                        Packet::Disconnected {
                            reason: format!(
                                "protocol version {} not supported (expected {})",
                                client_version, PROTOCOL_VERSION
                            ),
                        },
                        addr,
                    );
                    return;
                }

                // Remove existing connection if present
                if let Some(existing_id) = self.client_at(addr).await {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    self.drop_client(existing_id).await;
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                match client_id {
                    Some(client_id) => {
                        let dispatches = self.arena.handle_connection(client_id);
                        self.route(client_id, dispatches).await;
                    }
                    None => {
                        warn!("Rejecting {}: server full", addr);
                        self.send_packet(
                            Packet::Disconnected {
                                reason: ArenaError::ServerFull.to_string(),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::ClientSpecs {
                window_width,
                window_height,
            } => {
                let Some(client_id) = self.client_at(addr).await else {
                    debug!("Client specs from unknown address {}", addr);
                    return;
                };
                self.clients.write().await.touch(client_id);
                if let Err(e) = self
                    .arena
                    .client_specs(client_id, window_width, window_height)
                {
                    warn!("Ignoring client specs from {}: {}", client_id, e);
                }
            }

            Packet::Frame { sequence, controls } => {
                let Some(client_id) = self.client_at(addr).await else {
                    debug!("Frame from unknown address {}", addr);
                    return;
                };

                let fresh = {
                    let mut clients = self.clients.write().await;
                    clients.accept_frame(client_id, sequence)
                };
                if !fresh {
                    debug!("Dropping stale frame {} from {}", sequence, client_id);
                    return;
                }

                match self.arena.on_frame(client_id, sequence, &controls) {
                    Ok(dispatches) => self.route(client_id, dispatches).await,
                    Err(e) => warn!("Frame {} from {} rejected: {}", sequence, client_id, e),
                }
            }

            Packet::Chat { content } => {
                let Some(client_id) = self.client_at(addr).await else {
                    return;
                };
                self.clients.write().await.touch(client_id);
                match self.arena.chat(client_id, &content) {
                    Ok(dispatches) => self.route(client_id, dispatches).await,
                    Err(e) => debug!("Chat from {} ignored: {}", client_id, e),
                }
            }

            Packet::Disconnect => {
                if let Some(client_id) = self.client_at(addr).await {
                    self.drop_client(client_id).await;
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Main server loop. Every frame is simulated as soon as it arrives.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::ClientTimeout { client_id } => {
                    info!("Client {} timed out", client_id);
                    match self.arena.disconnect(client_id) {
                        Ok(dispatches) => self.route(client_id, dispatches).await,
                        Err(e) => debug!("Timeout of {}: {}", client_id, e),
                    }
                }
            }
        }

        info!("Server shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ControlState, Notice, NoticeKind};
    use std::net::{IpAddr, Ipv4Addr};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), port)
    }

    fn notice() -> Packet {
        Packet::Message(Notice {
            kind: NoticeKind::Chat,
            content: "hi".to_string(),
            username: "SwiftOtter".to_string(),
            color: "#112233".to_string(),
        })
    }

    #[test]
    fn test_route_origin_goes_to_sender_address() {
        let dispatch = Dispatch::new(Recipient::Origin, notice());
        match route_dispatch(dispatch, 3, Some(addr(9000))) {
            Some(GameMessage::SendPacket { addr: a, .. }) => assert_eq!(a, addr(9000)),
            other => panic!("unexpected routing {:?}", other),
        }
    }

    #[test]
    fn test_route_origin_without_address_is_dropped() {
        let dispatch = Dispatch::new(Recipient::Origin, notice());
        assert!(route_dispatch(dispatch, 3, None).is_none());
    }

    #[test]
    fn test_route_others_excludes_origin() {
        let dispatch = Dispatch::new(Recipient::Others, notice());
        match route_dispatch(dispatch, 3, None) {
            Some(GameMessage::BroadcastPacket { exclude, .. }) => assert_eq!(exclude, Some(3)),
            other => panic!("unexpected routing {:?}", other),
        }
    }

    #[test]
    fn test_route_everyone() {
        let dispatch = Dispatch::new(Recipient::Everyone, notice());
        match route_dispatch(dispatch, 3, Some(addr(9000))) {
            Some(GameMessage::BroadcastPacket { exclude, .. }) => assert_eq!(exclude, None),
            other => panic!("unexpected routing {:?}", other),
        }
    }

    #[test]
    fn test_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

        let msg = ServerMessage::PacketReceived {
            packet: Packet::Frame {
                sequence: 9,
                controls: ControlState::default(),
            },
            addr: addr(8080),
        };
        assert!(tx.send(msg).is_ok());

        match rx.try_recv().unwrap() {
            ServerMessage::PacketReceived {
                packet: Packet::Frame { sequence, .. },
                addr: a,
            } => {
                assert_eq!(sequence, 9);
                assert_eq!(a, addr(8080));
            }
            other => panic!("Unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let arena = Arena::with_seed(shared::GameConfiguration::default(), 1);
        let server = Server::new("127.0.0.1:0", arena, 4, Duration::from_secs(5))
            .await
            .unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }
}

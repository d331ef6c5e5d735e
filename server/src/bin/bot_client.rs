use bincode::{deserialize, serialize};
use clap::Parser;
use rand::Rng;
use shared::{ControlState, KeyState, Packet, Toggle, TurnDirection, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout};

/// Headless bot that flies around a running arena server
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,

    /// Number of frames to send before disconnecting
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Frames per second
    #[arg(long, default_value_t = 60)]
    rate: u64,
}

fn controls_for(frame: u32, rng: &mut impl Rng) -> ControlState {
    let turn_left = (frame / 90) % 3 == 1;
    let turn_right = (frame / 90) % 3 == 2;
    ControlState {
        thrust_forward: KeyState {
            pressed: frame % 120 < 40,
            used: false,
        },
        turn_left: KeyState {
            pressed: turn_left,
            used: false,
        },
        turn_right: KeyState {
            pressed: turn_right,
            used: false,
        },
        fire: KeyState {
            pressed: rng.gen_bool(0.1),
            used: false,
        },
        precision_mode: Toggle {
            toggled: frame % 600 >= 300,
        },
        radar_lock: Toggle { toggled: true },
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Bot socket bound to {}", socket.local_addr()?);

    socket
        .send_to(
            &serialize(&Packet::Connect {
                client_version: PROTOCOL_VERSION,
            })?,
            args.server,
        )
        .await?;

    let mut buf = vec![0u8; 65_507];
    let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf)).await??;
    let player_id = match deserialize::<Packet>(&buf[..len])? {
        Packet::Config { player_id, .. } => player_id,
        Packet::Disconnected { reason } => {
            println!("Server refused connection: {}", reason);
            return Ok(());
        }
        other => {
            println!("Expected Config but got: {:?}", other);
            return Ok(());
        }
    };
    println!("Connected as player {}", player_id);

    socket
        .send_to(
            &serialize(&Packet::ClientSpecs {
                window_width: 1280.0,
                window_height: 720.0,
            })?,
            args.server,
        )
        .await?;

    let mut rng = rand::thread_rng();
    let mut ticker = interval(Duration::from_millis(1000 / args.rate.max(1)));

    for sequence in 1..=args.frames {
        ticker.tick().await;
        let controls = controls_for(sequence, &mut rng);
        let frame = Packet::Frame { sequence, controls };
        socket.send_to(&serialize(&frame)?, args.server).await?;

        // Drain whatever arrived since the last frame
        while let Ok(Ok((len, _))) =
            timeout(Duration::from_millis(1), socket.recv_from(&mut buf)).await
        {
            match deserialize::<Packet>(&buf[..len]) {
                Ok(Packet::Sprites {
                    sequence,
                    players,
                    projectiles,
                    ..
                }) if sequence % 60 == 0 => {
                    if let Some(me) = players.iter().find(|p| p.id == player_id) {
                        let turning = me.turn_direction != TurnDirection::None;
                        println!(
                            "frame {}: pos=({:.0}, {:.0}) ammo={} coins={} turning={} radar={:?} projectiles={}",
                            sequence,
                            me.absolute_position.x,
                            me.absolute_position.y,
                            me.ammo,
                            me.coins,
                            turning,
                            me.radar.target_id,
                            projectiles.len()
                        );
                    }
                }
                Ok(Packet::Message(notice)) => {
                    println!("[{}] {}: {}", notice.color, notice.username, notice.content);
                }
                Ok(_) => {}
                Err(e) => println!("Failed to deserialize packet: {}", e),
            }
        }
    }

    socket
        .send_to(&serialize(&Packet::Disconnect)?, args.server)
        .await?;
    println!("Bot finished");
    Ok(())
}

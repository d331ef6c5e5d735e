use clap::Parser;
use log::info;
use server::arena::{validate_configuration, Arena};
use server::error::ArenaError;
use server::network::Server;
use shared::{GameConfiguration, RewardMode};
use std::time::Duration;

/// Authoritative server for the multiplayer asteroids arena
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Maximum number of concurrent players
    #[arg(short, long, default_value_t = 32)]
    max_clients: usize,

    /// Arena width in world units
    #[arg(long, default_value_t = 4000.0)]
    width: f32,

    /// Arena height in world units
    #[arg(long, default_value_t = 4000.0)]
    height: f32,

    /// Coins moved from victim to shooter per hit
    #[arg(long, default_value_t = 20)]
    bounty: i64,

    /// Ammo boosts scattered at startup
    #[arg(long, default_value_t = 20)]
    ammo_boosts: usize,

    /// Projectile muzzle speed in units per frame
    #[arg(long, default_value_t = 25.0)]
    projectile_speed: f32,

    /// Pay bounties immediately and respawn the victim
    #[arg(long)]
    hardcore: bool,

    /// Seed for boost placement and player names
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

impl Args {
    fn configuration(&self) -> Result<GameConfiguration, ArenaError> {
        let config = GameConfiguration {
            width: self.width,
            height: self.height,
            bounty: self.bounty,
            ammo_boost_count: self.ammo_boosts,
            projectile_speed: self.projectile_speed,
            reward_mode: if self.hardcore {
                RewardMode::Hardcore
            } else {
                RewardMode::Ledger
            },
            ..GameConfiguration::default()
        };
        validate_configuration(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.configuration()?;
    let arena = match args.seed {
        Some(seed) => Arena::with_seed(config, seed),
        None => Arena::new(config),
    };

    let address = format!("{}:{}", args.host, args.port);
    info!(
        "Starting arena server on {} (max {} players)",
        address, args.max_clients
    );

    let mut server = Server::new(
        &address,
        arena,
        args.max_clients,
        Duration::from_secs(args.timeout_secs),
    )
    .await?;
    server.run().await?;

    Ok(())
}

use clap::Parser;
use client::input::InputSampler;
use client::network::Client;
use client::rendering::{Scene, UiConfig};
use log::{error, info};
use macroquad::prelude::*;
use shared::transport::tcp::TcpClientTransport;
use shared::MOVE_SPEED;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: i32,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Cube Sync".to_owned(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    if let Err(e) = run(Args::parse()).await {
        error!("{}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Socket tasks live on their own runtime; the frame loop only polls.
    let runtime = tokio::runtime::Runtime::new()?;

    info!("Connecting to: {}", args.server);
    info!("Controls: WASD or arrow keys to move, Escape to quit");

    let transport = TcpClientTransport::connect(args.server, runtime.handle());
    let mut client = Client::new(transport);
    let mut scene = Scene::new();
    let input = InputSampler::new(MOVE_SPEED);

    loop {
        if input.quit_requested() {
            client.disconnect();
            break;
        }

        let delta = input.movement_delta(get_frame_time());
        client.move_local(delta, &mut scene);
        client.tick(Instant::now(), &mut scene);

        let world = client.game_state();
        scene.render(&UiConfig {
            local_id: world.local_id().cloned(),
            state: client.state(),
            player_count: world.player_count(),
        });

        next_frame().await;
    }

    runtime.shutdown_timeout(Duration::from_millis(200));
    Ok(())
}

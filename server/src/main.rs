use clap::Parser;
use log::{error, info};
use server::network::Server;
use shared::transport::tcp::TcpServerTransport;
use std::time::Instant;
use tokio::time::{interval, Duration, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host frame rate driving the connection loop (ticks per second)
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let transport = match TcpServerTransport::bind(&address).await {
        Ok(transport) => transport,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let mut server = Server::new(transport);

    let tick_rate = args.tick_rate.max(1);
    let mut frame = interval(Duration::from_secs_f64(1.0 / tick_rate as f64));
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Server started at {} ticks per second", tick_rate);

    loop {
        tokio::select! {
            _ = frame.tick() => {
                server.tick(Instant::now());
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                server.shutdown();
                break;
            },
        }
    }

    // Give writer tasks a moment to flush the closing frames.
    tokio::time::sleep(Duration::from_millis(100)).await;

    Ok(())
}

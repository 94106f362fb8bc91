//! vconn Client - sends counters to a server over a lossy link
//!
//! Each loop iteration either handles one reply or idles, then sends the next
//! counter. The acks carried by the replies settle which of our datagrams
//! arrived. After the configured count the client sends a shutdown message,
//! bypassing the loss simulator, and exits.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use vconn::{DatagramSocket, DatagramTransport, Endpoint, LossyTransport};
use vconn_cli::config::DEFAULT_PORT;
use vconn_cli::{
    format_bitfield, init_logging, summary_line, ClientConfig, Config, DeliveryTracker,
    DemoMessage, LinkStats,
};
use vconn_protocol::MAX_DATAGRAM_SIZE;

#[derive(Parser, Debug)]
#[command(name = "vconn-client")]
#[command(about = "Virtual connection demo client", long_about = None)]
struct Args {
    /// Server address
    #[arg(short, long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    server: SocketAddr,

    /// Local bind address
    #[arg(short, long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,

    /// Configuration file (TOML); its [client] table overrides the flags
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of counter messages to send
    #[arg(short = 'n', long, default_value_t = 10)]
    count: u32,

    /// Probability of dropping each outgoing datagram
    #[arg(long, default_value_t = 0.5)]
    loss: f64,

    /// Seed for the loss simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Pause when nothing was received, in milliseconds
    #[arg(long, default_value_t = 1000)]
    idle_ms: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let client = match config.client {
        Some(client) => client,
        None => ClientConfig {
            server: args.server,
            bind: Some(args.bind),
            packet_count: args.count,
            loss_rate: args.loss,
            idle_interval_ms: args.idle_ms,
        },
    };
    client.validate()?;
    let protocol = config.protocol.to_protocol_config()?;

    let bind = client
        .bind
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 0)));
    let socket = DatagramSocket::bind(bind)?;
    tracing::info!("Bound to: {}", socket.local_addr()?);
    tracing::info!("Server: {}", client.server);

    let transport = match args.seed {
        Some(seed) => LossyTransport::with_seed(socket, client.loss_rate, seed),
        None => LossyTransport::new(socket, client.loss_rate),
    };
    let mut endpoint = Endpoint::client(transport, client.server, protocol)?;
    let mut tracker = DeliveryTracker::new(protocol.space(), protocol.ack_bits());

    let start_time = Instant::now();
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut value: i32 = 0;

    let header = endpoint.send(client.server, &DemoMessage::Counter(0).to_bytes())?;
    tracker.on_sent(header.sequence);
    tracing::info!(sequence = header.sequence, "sending");

    loop {
        match endpoint.poll(&mut buf)? {
            Some(received) => {
                let header = received.header;
                tracing::info!(
                    sequence = header.sequence,
                    ack = header.ack,
                    bits = %format_bitfield(header.ack_bitfield, protocol.ack_bits()),
                    "received"
                );
                if let Ok(DemoMessage::Counter(echo)) = DemoMessage::from_bytes(&received.payload) {
                    tracing::debug!(echo, "server counter");
                }
                for seq in tracker.on_ack(&header) {
                    tracing::warn!(sequence = seq, "lost");
                }
            }
            None => thread::sleep(client.idle_interval()),
        }

        if u32::try_from(value)? >= client.packet_count {
            break;
        }
        value += 1;

        let header = endpoint.send(client.server, &DemoMessage::Counter(value).to_bytes())?;
        tracker.on_sent(header.sequence);
        tracing::info!(sequence = header.sequence, value, "sending");
    }

    // The shutdown message must arrive, so skip the simulator
    endpoint.transport().set_enabled(false);
    let header = endpoint.send(client.server, &DemoMessage::Shutdown.to_bytes())?;
    tracing::info!(sequence = header.sequence, "sending shutdown");

    let stats = LinkStats {
        endpoint: endpoint.stats(),
        delivery: tracker.stats(),
        simulated_drops: endpoint.transport().dropped(),
        peers: endpoint.peers().len(),
    };
    tracing::info!("{}", summary_line(&stats, start_time.elapsed()));
    tracing::info!("exiting...");

    Ok(())
}

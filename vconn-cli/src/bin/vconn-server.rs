//! vconn Server - echoes counters back to any number of clients
//!
//! Creates a virtual connection for every new sender, logs the ack signal it
//! carries and answers with the counter incremented. Outgoing datagrams pass
//! through the loss simulator.

use clap::Parser;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use vconn::io::AcceptPolicy;
use vconn::{DatagramSocket, DatagramTransport, Endpoint, LossyTransport};
use vconn_cli::config::DEFAULT_PORT;
use vconn_cli::{
    format_bitfield, init_logging, summary_line, Config, DemoMessage, LinkStats, ServerConfig,
};
use vconn_protocol::MAX_DATAGRAM_SIZE;

#[derive(Parser, Debug)]
#[command(name = "vconn-server")]
#[command(about = "Virtual connection demo server", long_about = None)]
struct Args {
    /// Listen port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    listen: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Configuration file (TOML); its [server] table overrides the flags
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Probability of dropping each outgoing datagram
    #[arg(long, default_value_t = 0.5)]
    loss: f64,

    /// Seed for the loss simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of peers
    #[arg(long, default_value_t = 256)]
    max_peers: usize,

    /// Statistics interval in seconds (0 disables)
    #[arg(long, default_value_t = 5)]
    stats: u64,

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
    let server = match config.server {
        Some(server) => server,
        None => ServerConfig {
            listen: format!("{}:{}", args.bind, args.listen).parse()?,
            max_peers: args.max_peers,
            loss_rate: args.loss,
            stats_interval_secs: args.stats,
        },
    };
    server.validate()?;
    let protocol = config.protocol.to_protocol_config()?;

    tracing::info!("vconn server starting...");

    let socket = DatagramSocket::bind(server.listen)?;
    tracing::info!("Listening on: {}", socket.local_addr()?);

    let transport = match args.seed {
        Some(seed) => LossyTransport::with_seed(socket, server.loss_rate, seed),
        None => LossyTransport::new(socket, server.loss_rate),
    };
    let mut endpoint = Endpoint::new(transport, protocol, AcceptPolicy::AnyPeer, server.max_peers);

    let shared = Arc::new(Mutex::new(LinkStats::default()));
    let start_time = Instant::now();
    if server.stats_interval_secs > 0 {
        let shared = shared.clone();
        let interval = server.stats_interval();
        thread::spawn(move || loop {
            thread::sleep(interval);
            let snapshot = *shared.lock();
            tracing::info!("{}", summary_line(&snapshot, start_time.elapsed()));
        });
    }

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        let Some(received) = endpoint.poll(&mut buf)? else {
            thread::sleep(Duration::from_millis(10));
            continue;
        };

        let peer: SocketAddr = received.peer;
        let header = received.header;
        tracing::info!(
            %peer,
            sequence = header.sequence,
            ack = header.ack,
            bits = %format_bitfield(header.ack_bitfield, protocol.ack_bits()),
            "received"
        );

        match DemoMessage::from_bytes(&received.payload) {
            Ok(DemoMessage::Shutdown) => {
                tracing::info!(%peer, "shutdown requested, exiting...");
                break;
            }
            Ok(DemoMessage::Counter(value)) => {
                let reply = DemoMessage::Counter(value.wrapping_add(1)).to_bytes();
                let sent = endpoint.send(peer, &reply)?;
                tracing::info!(%peer, sequence = sent.sequence, value = value.wrapping_add(1), "sending");
            }
            Err(e) => tracing::warn!(%peer, error = %e, "ignoring payload"),
        }

        let mut stats = shared.lock();
        stats.endpoint = endpoint.stats();
        stats.simulated_drops = endpoint.transport().dropped();
        stats.peers = endpoint.peers().len();
    }

    let final_stats = LinkStats {
        endpoint: endpoint.stats(),
        simulated_drops: endpoint.transport().dropped(),
        peers: endpoint.peers().len(),
        ..LinkStats::default()
    };
    tracing::info!("{}", summary_line(&final_stats, start_time.elapsed()));

    Ok(())
}

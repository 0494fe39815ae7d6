use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use bounce_peer::media::{Blackhole, FrameSink, Mp4FileSink};
use bounce_peer::{
    BallServer, ClientConfig, ConnectMode, Endpoint, LineSignaling, ServerConfig, TrackingClient,
};

#[derive(Parser)]
#[command(name = "bounce")]
#[command(about = "Streams a bouncing ball over WebRTC and tracks it on the other end")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream the ball and score the centroids reported back.
    Server {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Receive the ball, locate it and report its position.
    Client {
        #[command(flatten)]
        common: CommonArgs,

        /// Write the received video to this file as H.264 in MP4.
        #[arg(long)]
        record_to: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, value_enum, default_value_t = SignalingKind::CopyAndPaste)]
    signaling: SignalingKind,

    #[arg(long, default_value = "127.0.0.1")]
    signaling_host: String,

    #[arg(long, default_value_t = 1234)]
    signaling_port: u16,

    #[arg(long, default_value = "aiortc-signaling.sock")]
    signaling_path: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum SignalingKind {
    TcpSocket,
    UnixSocket,
    CopyAndPaste,
}

impl CommonArgs {
    fn signaling(&self, mode: ConnectMode) -> LineSignaling {
        let endpoint = match self.signaling {
            SignalingKind::TcpSocket => Endpoint::Tcp {
                host: self.signaling_host.clone(),
                port: self.signaling_port,
            },
            SignalingKind::UnixSocket => Endpoint::Unix {
                path: self.signaling_path.clone(),
            },
            SignalingKind::CopyAndPaste => Endpoint::Stdio,
        };
        LineSignaling::new(endpoint, mode)
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    // stdout carries the copy-and-paste signaling lines
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server { common } => {
            init_tracing(common.verbose);

            let report = BallServer::new(ServerConfig::default())
                .run(common.signaling(ConnectMode::Listen), interrupted())
                .await
                .context("Server stopped with an error")?;

            eprintln!(
                "{} {} reports, mean error {:.3} px, max {:.3} px",
                "Done:".green().bold(),
                report.errors.reports,
                report.errors.mean,
                report.errors.max
            );
        }
        Commands::Client { common, record_to } => {
            init_tracing(common.verbose);

            let config = ClientConfig::default();
            let sink: Box<dyn FrameSink> = match record_to {
                Some(path) => Box::new(
                    Mp4FileSink::create(&path, config.media.fps)
                        .await
                        .with_context(|| format!("Cannot record to {}", path.display()))?,
                ),
                None => Box::new(Blackhole::default()),
            };

            let report = TrackingClient::new(config, sink)
                .run(common.signaling(ConnectMode::Dial), interrupted())
                .await
                .context("Client stopped with an error")?;

            eprintln!(
                "{} {} frames received, {} centroids sent",
                "Done:".green().bold(),
                report.frames,
                report.centroids_sent
            );
        }
    }

    Ok(())
}

//! Hello RPC server.
//!
//! Serves `handler/HelloService.Hello` (MsgPack strings) and `Echo.Say`
//! (raw bytes) until Ctrl-C.

use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use clap::Parser;
use namedrpc::hello::{hello_service, HelloServer};
use namedrpc::transport::TcpTransport;
use namedrpc::{Server, Service, WireCodec};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hello-server")]
#[command(about = "Name-registered RPC server with the hello service")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "NAMEDRPC_ADDR", default_value = "127.0.0.1:1234")]
    addr: String,

    /// Close connections idle for this many seconds (0 = never)
    #[arg(long, env = "NAMEDRPC_IDLE_TIMEOUT_SECS", default_value = "0")]
    idle_timeout_secs: u64,

    /// Largest accepted call frame, in bytes
    #[arg(long, env = "NAMEDRPC_MAX_FRAME_SIZE", default_value_t = namedrpc::protocol::DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: u32,

    /// Use JSON frames instead of MsgPack (must match the other side)
    #[arg(long, env = "NAMEDRPC_JSON")]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_target(false)
        .compact()
        .init();
}

fn echo_service() -> namedrpc::Result<Service> {
    Service::builder("Echo")
        .handle("Say", |payload: Bytes| async move {
            let mut out = b"hello, ".to_vec();
            out.extend_from_slice(&payload);
            Ok(Bytes::from(out))
        })
        .build()
}

fn wire_codec(json: bool) -> WireCodec {
    if json {
        WireCodec::Json
    } else {
        WireCodec::MsgPack
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut builder = Server::builder()
        .service(hello_service(HelloServer)?)?
        .service(echo_service()?)?
        .max_frame_size(args.max_frame_size)
        .codec(wire_codec(args.json));
    if args.idle_timeout_secs > 0 {
        builder = builder.idle_timeout(Duration::from_secs(args.idle_timeout_secs));
    }
    let server = builder.build();

    info!(services = ?server.registry().service_names(), "Starting hello server");

    let listener = TcpTransport::bind(args.addr.as_str()).await?;
    info!("Hello server running on {}", listener.local_addr()?);

    server
        .serve_with_shutdown(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Shutdown complete");
    Ok(())
}

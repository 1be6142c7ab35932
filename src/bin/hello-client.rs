//! Hello RPC client.
//!
//! Without `--method`, calls `handler/HelloService.Hello` through the typed
//! stub. With `--method`, sends NAME as raw bytes to that method and prints
//! the reply as text.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use namedrpc::hello::HelloServiceStub;
use namedrpc::{Client, WireCodec};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hello-client")]
#[command(about = "Call a name-registered RPC server")]
struct Args {
    /// Name to greet
    #[arg(default_value = "world")]
    name: String,

    /// Server address
    #[arg(long, env = "NAMEDRPC_ADDR", default_value = "127.0.0.1:1234")]
    addr: String,

    /// Raw-bytes method to call instead of the hello service (e.g. Echo.Say)
    #[arg(short, long)]
    method: Option<String>,

    /// Give up on a call after this many seconds (0 = wait forever)
    #[arg(long, env = "NAMEDRPC_CALL_TIMEOUT_SECS", default_value = "10")]
    call_timeout_secs: u64,

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
        .with_writer(std::io::stderr)
        .compact()
        .init();
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

    let mut builder = Client::builder(args.addr.as_str())
        .connect_timeout(Duration::from_secs(5))
        .codec(wire_codec(args.json));
    if args.call_timeout_secs > 0 {
        builder = builder.call_timeout(Duration::from_secs(args.call_timeout_secs));
    }
    let client = builder.connect().await?;

    let reply = match args.method {
        Some(method) => {
            let bytes = client.call(&method, args.name.into_bytes()).await?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        None => HelloServiceStub::new(client).hello(&args.name).await?,
    };

    println!("{}", reply);
    Ok(())
}

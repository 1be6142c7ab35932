//! Echo demo - server and client in one process.
//!
//! This example demonstrates:
//! - Building a service with a raw-bytes handler and a typed handler
//! - Serving it on an ephemeral TCP port
//! - Calling it through the client stub, including an error reply
//!
//! ```text
//! cargo run --example echo
//! ```

use bytes::Bytes;
use namedrpc::hello::{hello_service, HelloServer, HelloServiceStub};
use namedrpc::transport::TcpTransport;
use namedrpc::{Client, HandlerError, Server, Service};
use serde::{Deserialize, Serialize};

/// Input structure for the typed method.
#[derive(Serialize, Deserialize, Debug)]
struct EchoInput {
    message: String,
}

/// Output structure for the typed method.
#[derive(Serialize, Deserialize, Debug)]
struct EchoOutput {
    echo: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let echo = Service::builder("Echo")
        .handle("Say", |payload: Bytes| async move {
            let mut out = b"hello, ".to_vec();
            out.extend_from_slice(&payload);
            Ok(Bytes::from(out))
        })
        .handle_typed("Struct", |input: EchoInput| async move {
            if input.message.is_empty() {
                return Err(HandlerError::new("message must not be empty"));
            }
            Ok(EchoOutput {
                echo: input.message,
            })
        })
        .build()?;

    let server = Server::builder()
        .service(echo)?
        .service(hello_service(HelloServer)?)?
        .build();

    let listener = TcpTransport::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { server.serve(listener).await });

    let client = Client::connect(addr.to_string()).await?;

    let reply = client.call("Echo.Say", b"world".to_vec()).await?;
    println!("Echo.Say -> {}", String::from_utf8_lossy(&reply));

    let output: EchoOutput = client
        .call_typed(
            "Echo.Struct",
            &EchoInput {
                message: "typed".to_string(),
            },
        )
        .await?;
    println!("Echo.Struct -> {:?}", output);

    match client.call("Missing.Say", Vec::<u8>::new()).await {
        Err(e) if e.is_not_found() => println!("Missing.Say -> {}", e),
        other => println!("Missing.Say -> unexpected {:?}", other),
    }

    let stub = HelloServiceStub::connect(addr.to_string()).await?;
    println!("HelloService.Hello -> {}", stub.hello("cc").await?);

    Ok(())
}

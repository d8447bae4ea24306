//! Echo demonstration harness for the quay service registry.
//!
//! Without `--target`, starts the fixed demonstration set: two datagram
//! and two stream echo services on ports 9100–9103, two on the generic
//! capability shapes and two on the protocol-specific ones, then blocks
//! until the process is killed. With `--target`, dials the address over
//! `--network`, sends `--message`, prints the reply and exits.

use std::io::{Read, Write};
use std::net::{TcpStream, UdpSocket};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use quay::{Host, ServiceHandler, ServiceKind, StderrLogger};

const READ_BUFFER: usize = 512;

#[derive(Parser)]
#[command(name = "quay-echo", about = "Echo services on one host, or a one-shot echo client")]
struct Args {
    /// Address to dial (host:port); runs the echo services when omitted
    #[arg(long)]
    target: Option<String>,

    /// Transport for client mode: tcp or udp
    #[arg(long, default_value = "tcp")]
    network: String,

    /// Message sent in client mode
    #[arg(long, default_value = "Hello World!")]
    message: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    match args.target {
        Some(target) => dial(&target, &args.network, &args.message),
        None => serve(),
    }
}

fn serve() -> anyhow::Result<()> {
    let host = Host::with_logger("127.0.0.1", Arc::new(StderrLogger))?;

    host.new_service(
        ServiceKind::Datagram,
        "echoUDP",
        "9100",
        ServiceHandler::packet(|source| {
            let mut payload = [0u8; READ_BUFFER];
            let (n, peer) = source.recv_from(&mut payload)?;
            println!("Received: {} Doing echo", String::from_utf8_lossy(&payload[..n]));
            source.send_to(&payload[..n], peer)?;
            Ok(())
        }),
    )?;

    host.new_service(
        ServiceKind::Stream,
        "echoTCP",
        "9101",
        ServiceHandler::conn(|mut conn| {
            let mut payload = [0u8; READ_BUFFER];
            let n = conn.read(&mut payload)?;
            println!("Received: {} Doing echo", String::from_utf8_lossy(&payload[..n]));
            conn.write_all(&payload[..n])?;
            Ok(())
        }),
    )?;

    host.new_service(
        ServiceKind::Datagram,
        "echoUDPSock",
        "9102",
        ServiceHandler::udp(|socket| {
            let mut payload = [0u8; READ_BUFFER];
            let (n, peer) = socket.recv_from(&mut payload)?;
            println!("Received: {} Doing echo", String::from_utf8_lossy(&payload[..n]));
            socket.send_to(&payload[..n], peer)?;
            Ok(())
        }),
    )?;

    host.new_service(
        ServiceKind::Stream,
        "echoTCPConn",
        "9103",
        ServiceHandler::tcp(|mut stream| {
            let mut payload = [0u8; READ_BUFFER];
            let n = stream.read(&mut payload)?;
            println!("Received: {} Doing echo", String::from_utf8_lossy(&payload[..n]));
            stream.write_all(&payload[..n])?;
            Ok(())
        }),
    )?;

    // Runs until killed; a ShutdownHandle could release this instead.
    host.wait();
    Ok(())
}

fn dial(target: &str, network: &str, message: &str) -> anyhow::Result<()> {
    let mut response = [0u8; READ_BUFFER];
    let n = match network {
        "tcp" => {
            let mut conn = TcpStream::connect(target)
                .with_context(|| format!("connecting to {target}"))?;
            conn.write_all(message.as_bytes())?;
            conn.read(&mut response)?
        }
        "udp" => {
            let socket = UdpSocket::bind("0.0.0.0:0")?;
            socket
                .send_to(message.as_bytes(), target)
                .with_context(|| format!("sending to {target}"))?;
            let (n, _) = socket.recv_from(&mut response)?;
            n
        }
        other => anyhow::bail!("unknown network {other:?} (expected tcp or udp)"),
    };

    println!("Response: {}", String::from_utf8_lossy(&response[..n]));
    Ok(())
}

//! Serve the calculator tools.

#[macro_use]
extern crate tracing;

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use llm_chat_calculator::{Dispatcher, tools, transport};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// One message per line on stdin and stdout.
    Stdio,
    /// `POST /mcp`, one message per request.
    Http,
}

#[derive(Debug, Parser)]
#[command(
    name = "calculator",
    version,
    about = "Serve arithmetic tools over JSON-RPC"
)]
struct Args {
    #[arg(
        long,
        value_enum,
        env = "CALCULATOR_TRANSPORT",
        default_value_t = Transport::Http
    )]
    transport: Transport,

    /// Address to listen on (HTTP only).
    #[arg(
        long,
        env = "CALCULATOR_HOST",
        default_value_t = transport::DEFAULT_HOST
    )]
    host: IpAddr,

    /// Port to listen on (HTTP only).
    #[arg(
        long,
        env = "CALCULATOR_PORT",
        default_value_t = transport::DEFAULT_PORT
    )]
    port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Stdout carries the protocol in stdio mode.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let dispatcher = Dispatcher::new(tools::catalog());
    let result = match args.transport {
        Transport::Stdio => {
            let input = BufReader::new(tokio::io::stdin());
            let output = tokio::io::stdout();
            transport::serve_stdio(&dispatcher, input, output).await
        }
        Transport::Http => {
            let addr = SocketAddr::new(args.host, args.port);
            transport::serve_http(dispatcher, addr).await
        }
    };
    if let Err(err) = result {
        error!("server failed: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

//! hmtl-send entry point.
//!
//! Sends one command to a module through an `hmtl-server` relay and prints
//! any reply.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ RemoteClient::connect()
//!  └─ send_and_ack(message, expects_response)
//!       └─ decode_response()  -- poll table / configuration / raw messages
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hmtl_client::application::build_message::{decode_response, parse_rgb, ModuleCommand, Response};
use hmtl_client::infrastructure::remote::{ClientConfig, RemoteClient};
use hmtl_core::protocol::{PollResponse, Rgb, ALL_OUTPUTS, BROADCAST_ADDRESS};

#[derive(Debug, Parser)]
#[command(name = "hmtl-send", version, about = "Send a command to HMTL modules via hmtl-server")]
struct Cli {
    /// Relay address.
    #[arg(short, long, env = "HMTL_SERVER", default_value = "127.0.0.1:6000")]
    server: SocketAddr,

    /// Module address; defaults to broadcast.
    #[arg(short = 'A', long, default_value_t = BROADCAST_ADDRESS)]
    address: u16,

    /// Output index; defaults to every output.
    #[arg(short, long, default_value_t = ALL_OUTPUTS)]
    output: u8,

    /// Seconds to wait for the relay's acknowledgement.
    #[arg(long, default_value_t = 15)]
    ack_timeout: u64,

    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Set an output to a value.
    Value {
        #[arg(allow_hyphen_values = true)]
        value: i16,
    },
    /// Set an output to a colour, given as r,g,b.
    Rgb {
        #[arg(value_parser = parse_rgb)]
        color: Rgb,
    },
    /// Blink between two colours.
    Blink {
        #[arg(long, default_value_t = 500)]
        on_period: u16,
        #[arg(long, value_parser = parse_rgb, default_value = "255,255,255")]
        on: Rgb,
        #[arg(long, default_value_t = 500)]
        off_period: u16,
        #[arg(long, value_parser = parse_rgb, default_value = "0,0,0")]
        off: Rgb,
    },
    /// Change colour once after a period.
    TimedChange {
        #[arg(long, default_value_t = 1000)]
        period: u32,
        #[arg(long, value_parser = parse_rgb)]
        start: Rgb,
        #[arg(long, value_parser = parse_rgb)]
        stop: Rgb,
    },
    /// Fade between two colours.
    Fade {
        #[arg(long, default_value_t = 1000)]
        period: u32,
        #[arg(long, value_parser = parse_rgb)]
        start: Rgb,
        #[arg(long, value_parser = parse_rgb)]
        stop: Rgb,
        #[arg(long, default_value_t = 0)]
        flags: u8,
    },
    /// Stop any running program.
    None,
    /// Ask modules to identify themselves.
    Poll,
    /// Give the module with `device_id` a new address.
    SetAddress { device_id: u16, new_address: u16 },
    /// Ask a module for its stored configuration.
    DumpConfig,
    /// Shut the relay down.
    Exit,
}

impl Action {
    fn into_command(self, output: u8) -> Option<ModuleCommand> {
        let command = match self {
            Action::Value { value } => ModuleCommand::Value { output, value },
            Action::Rgb { color } => ModuleCommand::Rgb { output, rgb: color },
            Action::Blink {
                on_period,
                on,
                off_period,
                off,
            } => ModuleCommand::Blink {
                output,
                on_period,
                on,
                off_period,
                off,
            },
            Action::TimedChange {
                period,
                start,
                stop,
            } => ModuleCommand::TimedChange {
                output,
                period,
                start,
                stop,
            },
            Action::Fade {
                period,
                start,
                stop,
                flags,
            } => ModuleCommand::Fade {
                output,
                period,
                start,
                stop,
                flags,
            },
            Action::None => ModuleCommand::NoProgram { output },
            Action::Poll => ModuleCommand::Poll,
            Action::SetAddress {
                device_id,
                new_address,
            } => ModuleCommand::SetAddress {
                device_id,
                new_address,
            },
            Action::DumpConfig => ModuleCommand::DumpConfig,
            Action::Exit => return None,
        };
        Some(command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig {
        server_addr: cli.server,
        ack_timeout: Duration::from_secs(cli.ack_timeout),
        ..ClientConfig::default()
    };
    let mut client = RemoteClient::connect(config).await?;

    let Some(command) = cli.command.into_command(cli.output) else {
        client.send_exit().await.context("relay did not acknowledge exit")?;
        info!("relay shut down");
        return Ok(());
    };

    let msg = command.to_message(cli.address);
    info!("sending {} to {}", msg.message_type(), cli.address);
    let fragments = client
        .send_and_ack(&msg, command.expects_response())
        .await
        .context("command was not acknowledged")?;

    if !command.expects_response() {
        return Ok(());
    }
    match decode_response(&fragments).context("could not decode response")? {
        Response::Modules(modules) => print_modules(&modules),
        Response::Config(config) => {
            println!("{:#?}", config.header());
            for output in config.outputs() {
                println!("{output:?}");
            }
        }
        Response::Other(messages) if messages.is_empty() => println!("no response"),
        Response::Other(messages) => {
            for message in messages {
                println!("{message:?}");
            }
        }
    }
    Ok(())
}

fn print_modules(modules: &[PollResponse]) {
    println!("{}", PollResponse::table_header());
    for module in modules {
        println!("{module}");
    }
}

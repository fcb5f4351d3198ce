//! hmtl-server entry point.
//!
//! Opens the serial link to a module and then either relays network clients
//! to it (the default) or runs one configuration command against it.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ open_session()           -- serial port + wait for "ready"
//!  └─ relay (default)
//!       ├─ DeviceScanner       (optional Tokio task)
//!       └─ RelayServer::run()  (until "exit", link failure or Ctrl-C)
//! ```

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hmtl_core::config::{BaudRate, ModuleConfigInput};
use hmtl_server::application::configure_module::ModuleConfigurator;
use hmtl_server::application::scan_devices::DeviceScanner;
use hmtl_server::infrastructure::relay::RelayServer;
use hmtl_server::infrastructure::serial::open_session;
use hmtl_server::infrastructure::storage::config::{load_config, save_config, ServerFileConfig};
use hmtl_server::infrastructure::transport::{shared, TransportError, TransportSession};

#[derive(Debug, Parser)]
#[command(name = "hmtl-server", version, about = "Relay and configure HMTL modules over serial")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "HMTL_CONFIG", default_value = "hmtl-server.toml")]
    config: PathBuf,

    /// Serial device the module is attached to.
    #[arg(short, long, env = "HMTL_DEVICE")]
    device: Option<String>,

    /// Serial baud rate.
    #[arg(short, long, env = "HMTL_BAUD")]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Relay network clients to the module (default).
    Relay {
        /// Address to listen on.
        #[arg(short, long)]
        address: Option<IpAddr>,
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
        /// Poll the scanner address range in the background.
        #[arg(long)]
        scan: bool,
    },
    /// Upload a JSON module configuration.
    Configure {
        file: PathBuf,
        /// Override the address in the file.
        #[arg(long)]
        address: Option<u16>,
        /// Persist to the module's EEPROM afterwards.
        #[arg(short, long)]
        write: bool,
    },
    /// Change only the module's address.
    SetAddress {
        address: u16,
        #[arg(short, long)]
        write: bool,
    },
    /// Change only the module's device id.
    SetDeviceId {
        device_id: u16,
        #[arg(short, long)]
        write: bool,
    },
    /// Change only the module's baud rate.
    SetBaud {
        baud: u32,
        #[arg(short, long)]
        write: bool,
    },
    /// Have the module print its stored configuration.
    PrintConfig,
    /// Write a configuration file holding the effective settings.
    InitConfig { path: PathBuf },
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
    let mut file = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(device) = cli.device {
        file.serial.device = Some(device);
    }
    if let Some(baud) = cli.baud {
        file.serial.baud = baud;
    }

    match cli.command.unwrap_or(Command::Relay {
        address: None,
        port: None,
        scan: false,
    }) {
        Command::Relay {
            address,
            port,
            scan,
        } => {
            if let Some(address) = address {
                file.relay.address = address.to_string();
            }
            if let Some(port) = port {
                file.relay.port = port;
            }
            file.scanner.enabled |= scan;
            run_relay(file).await
        }
        Command::Configure {
            file: path,
            address,
            write,
        } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut input: ModuleConfigInput = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            if let Some(address) = address {
                info!("overriding address with {address}");
                input.header.address = address;
            }
            let config = input.validate().context("invalid module configuration")?;
            configure(file, move |c| c.upload(&config, write)).await
        }
        Command::SetAddress { address, write } => {
            configure(file, move |c| {
                c.set_address(address)?;
                persist_if(c, write)
            })
            .await
        }
        Command::SetDeviceId { device_id, write } => {
            configure(file, move |c| {
                c.set_device_id(device_id)?;
                persist_if(c, write)
            })
            .await
        }
        Command::SetBaud { baud, write } => {
            let baud = BaudRate::from_bps(baud)?;
            configure(file, move |c| {
                c.set_baud(baud)?;
                persist_if(c, write)
            })
            .await
        }
        Command::PrintConfig => {
            configure(file, |c| {
                c.read()?;
                c.print_config()
            })
            .await
        }
        Command::InitConfig { path } => {
            save_config(&path, &file).with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {}", path.display());
            Ok(())
        }
    }
}

fn persist_if(c: &mut ModuleConfigurator<'_>, write: bool) -> Result<(), TransportError> {
    if write {
        c.persist()
    } else {
        info!("configuration not persisted; pass --write to store it");
        Ok(())
    }
}

/// Opens the configured serial device on the blocking pool.
async fn connect(file: &ServerFileConfig) -> anyhow::Result<TransportSession> {
    let device = file
        .serial
        .device
        .clone()
        .ok_or_else(|| anyhow!("no serial device given; use --device or [serial] device"))?;
    let baud = file.serial.baud;
    let config = file.session_config();

    tokio::task::spawn_blocking(move || open_session(&device, baud, config))
        .await
        .context("serial open task failed")?
        .context("could not connect to module")
}

async fn configure<F>(file: ServerFileConfig, f: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut ModuleConfigurator<'_>) -> Result<(), TransportError> + Send + 'static,
{
    let mut session = connect(&file).await?;
    tokio::task::spawn_blocking(move || {
        let result = f(&mut ModuleConfigurator::new(&mut session));
        session.close();
        result
    })
    .await
    .context("configuration task failed")?
    .context("configuration failed")
}

async fn run_relay(file: ServerFileConfig) -> anyhow::Result<()> {
    let relay_config = file.relay_config()?;
    let scanner_config = if file.scanner.enabled {
        Some(file.scanner_config()?)
    } else {
        None
    };

    info!("hmtl-server starting");
    let session = shared(connect(&file).await?);

    let scanner = scanner_config.map(|config| {
        info!("device scanner enabled for {:?}", config.addresses);
        DeviceScanner::new(config, session.clone()).spawn()
    });

    let relay = RelayServer::bind(relay_config, session).await?;
    info!("hmtl-server ready.  Press Ctrl-C to exit.");

    let result = tokio::select! {
        result = relay.run() => result.map_err(anyhow::Error::from),
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => warn!("could not listen for Ctrl-C: {e}"),
            }
            Ok(())
        }
    };

    if let Some(handle) = scanner {
        handle.abort();
    }
    info!("hmtl-server stopped");
    result
}

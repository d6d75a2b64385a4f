mod config;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;

use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use broadlink_lib::{Device, DeviceCharacteristics, DeviceConfig, MacAddress, SensorReading};

use crate::config::Config;

/// Control a Broadlink RM IR/RF remote over the local network.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file with the device address and named codes.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Device IP address, overrides the config file.
    #[arg(long)]
    ip: Option<IpAddr>,
    /// Device hardware address (e.g. ec:0b:ae:23:f2:78), overrides the config file.
    #[arg(long)]
    mac: Option<MacAddress>,
    /// Device type id, decimal or 0x-prefixed hex, overrides the config file.
    #[arg(long = "type", value_parser = parse_device_type)]
    device_type: Option<u16>,
    /// Per-request reply deadline in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read temperature and humidity.
    Sensors {
        /// Keep polling every N seconds until Ctrl+C is pressed.
        #[arg(short, long)]
        interval: Option<u64>,
        /// Print readings as JSON lines.
        #[arg(long)]
        json: bool,
    },
    /// Send an IR/RF code.
    Send {
        /// Name of a code from the config file.
        #[arg(required_unless_present = "hex")]
        name: Option<String>,
        /// Raw code as hex.
        #[arg(long, conflicts_with = "name")]
        hex: Option<String>,
    },
    /// List supported device types.
    Devices,
}

fn parse_device_type(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid device type '{s}': {e}"))
}

fn setup_logging(
    log_file_path: Option<PathBuf>,
    verbosity: &Verbosity<InfoLevel>,
) -> Result<Option<WorkerGuard>> {
    // stdout is reserved for command output
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time();

    let (file_layer, guard) = if let Some(ref path) = log_file_path {
        let log_file = File::create(path)
            .with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // INFO by default, -v for DEBUG, -vv for TRACE; RUST_LOG overrides
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }

    Ok(guard)
}

async fn connect(cli: &Cli, config: &Config) -> Result<Device> {
    let ip = cli
        .ip
        .or(config.ip)
        .context("Device IP address not set (use --ip or the config file)")?;
    let mac = cli
        .mac
        .or(config.mac)
        .context("Device MAC address not set (use --mac or the config file)")?;
    let device_type = cli
        .device_type
        .or(config.device_type)
        .context("Device type not set (use --type or the config file)")?;

    let mut device_config = DeviceConfig::default();
    if let Some(timeout) = cli.timeout_secs.map(Duration::from_secs).or(config.timeout()) {
        device_config = device_config.with_timeout(timeout);
    }

    let device = Device::with_config(ip, mac, device_type, device_config)
        .await
        .with_context(|| format!("Failed to connect to {ip} ({mac})"))?;
    info!(model = device.model(), state = %device.state(), "Device ready");
    Ok(device)
}

fn print_reading(reading: &SensorReading, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(reading)?);
    } else {
        println!("{reading}");
    }
    Ok(())
}

async fn poll_sensors(device: &mut Device, every: Duration, json: bool) -> Result<()> {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match device.check_sensors().await {
            Ok(reading) => print_reading(&reading, json)?,
            // A missed reading is not fatal while polling
            Err(e) => warn!(error = %e, "Sensor read failed"),
        }
    }
}

fn list_devices() {
    println!("{:<8} {:<24} {:<10} {:<10}", "TYPE", "MODEL", "REQUEST", "CODE");
    for d in DeviceCharacteristics::known() {
        println!(
            "{:<8} {:<24} {:<10} {:<10}",
            format!("{:#06x}", d.device_type),
            d.model,
            hex::encode(d.request_header),
            hex::encode(d.code_sending_header)
        );
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match &cli.command {
        Command::Devices => list_devices(),
        Command::Send { name, hex: raw } => {
            let code = match (name, raw) {
                (_, Some(encoded)) => hex::decode(encoded).context("--hex is not valid hex")?,
                (Some(name), None) => config.code(name)?,
                (None, None) => bail!("Give a code name or --hex"),
            };
            let mut device = connect(&cli, &config).await?;
            device.send_data(&code).await.context("Failed to send code")?;
            info!(bytes = code.len(), "Code sent");
        }
        Command::Sensors { interval, json } => {
            let mut device = connect(&cli, &config).await?;
            match interval {
                Some(secs) if *secs > 0 => {
                    poll_sensors(&mut device, Duration::from_secs(*secs), *json).await?
                }
                _ => {
                    let reading = device.check_sensors().await.context("Failed to read sensors")?;
                    print_reading(&reading, *json)?;
                }
            }
        }
    }

    Ok(())
}

/// Log a failed command and hand the error back so `main` sets the exit code
/// after the log file has been flushed.
fn finish(res: Result<()>) -> Result<()> {
    if let Err(e) = &res {
        error!("Command failed: {:#}", e);
    }
    res
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    tokio::select! {
        res = run(cli) => finish(res),
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down.");
            Ok(())
        }
    }
}

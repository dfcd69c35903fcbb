use std::path::PathBuf;

use clap::{Args, Subcommand};
use twibc_client::Connection;

use crate::exit::{client_error, CliResult};
use crate::output::OutputFormat;

pub mod devices;
pub mod identify;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List devices connected to twibd.
    Devices(DevicesArgs),
    /// Print a device's identification record.
    Identify(IdentifyArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Devices(args) => devices::run(args, format),
        Command::Identify(args) => identify::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Socket path to twibd.
    #[arg(
        long,
        value_name = "PATH",
        env = "TWIB_SOCKET",
        default_value = twibc_transport::DEFAULT_SOCKET_PATH
    )]
    pub socket: PathBuf,

    /// Connect to twibd's TCP frontend instead (host:port).
    #[arg(long, value_name = "ADDR", env = "TWIB_TCP", conflicts_with = "socket")]
    pub tcp: Option<String>,
}

impl ConnectArgs {
    pub fn connect(&self) -> CliResult<Connection> {
        let connection = if let Some(addr) = &self.tcp {
            Connection::connect_tcp(addr.as_str())
        } else {
            Connection::connect_unix_at(&self.socket)
        };
        connection.map_err(|err| client_error("failed to connect to twibd", err))
    }
}

#[derive(Args, Debug)]
pub struct DevicesArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct IdentifyArgs {
    /// Device id, decimal or 0x-prefixed hex.
    #[arg(value_parser = parse_device_id)]
    pub device_id: u32,

    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Include build and target details.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_device_id(input: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        input.parse()
    };
    parsed.map_err(|_| format!("invalid device id: {input}"))
}

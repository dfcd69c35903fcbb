mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "twibc", version, about = "Twili bridge daemon client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devices_subcommand() {
        let cli = Cli::try_parse_from(["twibc", "devices"]).expect("devices args should parse");
        assert!(matches!(cli.command, Command::Devices(_)));
    }

    #[test]
    fn parses_identify_with_hex_device_id() {
        let cli = Cli::try_parse_from(["twibc", "identify", "0x1e45306e"])
            .expect("identify args should parse");
        match cli.command {
            Command::Identify(args) => assert_eq!(args.device_id, 0x1e45306e),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_socket_and_tcp_together() {
        let err = Cli::try_parse_from([
            "twibc",
            "devices",
            "--socket",
            "/tmp/test.sock",
            "--tcp",
            "127.0.0.1:15151",
        ])
        .expect_err("conflicting transports should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn global_format_flag_parses_anywhere() {
        let cli = Cli::try_parse_from(["twibc", "devices", "--format", "json"])
            .expect("global format flag should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}

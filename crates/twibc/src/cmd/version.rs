use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.extended {
        match format {
            OutputFormat::Json => {
                println!(
                    "{{\"name\":\"twibc\",\"version\":\"{}\"}}",
                    env!("CARGO_PKG_VERSION")
                );
            }
            OutputFormat::Table | OutputFormat::Pretty => {
                println!("twibc {}", env!("CARGO_PKG_VERSION"));
            }
        }
        return Ok(SUCCESS);
    }

    println!("name: twibc");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));

    Ok(SUCCESS)
}

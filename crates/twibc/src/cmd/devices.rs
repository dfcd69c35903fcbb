use crate::cmd::DevicesArgs;
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_devices, OutputFormat};

pub fn run(args: DevicesArgs, format: OutputFormat) -> CliResult<i32> {
    let connection = args.connect.connect()?;
    let devices = connection
        .list_devices()
        .map_err(|err| client_error("failed to list devices", err))?;

    print_devices(&devices, format);
    Ok(SUCCESS)
}

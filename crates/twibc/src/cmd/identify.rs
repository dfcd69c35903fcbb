use crate::cmd::IdentifyArgs;
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_identification, OutputFormat};

pub fn run(args: IdentifyArgs, format: OutputFormat) -> CliResult<i32> {
    let connection = args.connect.connect()?;
    let device = connection.open_device(args.device_id);
    let identification = device
        .identify()
        .map_err(|err| client_error("failed to identify device", err))?;

    print_identification(&identification, format);
    Ok(SUCCESS)
}

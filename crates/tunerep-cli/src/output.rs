use std::io::{self, Write};

use crate::commands::Output;
use crate::error::CliError;

pub fn render(output: &Output, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match output {
        Output::Json(value) => {
            let payload = if pretty {
                serde_json::to_string_pretty(value)?
            } else {
                serde_json::to_string(value)?
            };
            writeln!(handle, "{payload}")?;
        }
        Output::Text(body) => {
            handle.write_all(body.as_bytes())?;
            if !body.ends_with('\n') {
                writeln!(handle)?;
            }
        }
    }

    handle.flush()?;
    Ok(())
}

use std::path::Path;

use anyhow::{Context, Result};
use dts::process::{ProbeOptions, probe};
use dts::structs::header::StreamHeader;

use crate::input::InputReader;
use command::Cli;

pub mod command;
pub mod extract;
pub mod info;
pub mod progress;
pub mod url;
pub mod wrap;

/// Opens `input` and recognizes the DTS stream at its start.
pub fn open_stream(
    input: &Path,
    cli: &Cli,
    preview_size: usize,
) -> Result<(InputReader, StreamHeader)> {
    let mut reader = InputReader::new(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    if reader.is_pipe() {
        log::debug!("Reading stream from stdin");
    }

    let opts = ProbeOptions {
        preview_size,
        fail_level: cli.fail_level(),
    };
    let preview = reader.read_preview(opts.preview_size)?;
    let header = probe(&preview, &opts)
        .with_context(|| format!("{} is not a recognized DTS stream", input.display()))?;

    Ok((reader, header))
}

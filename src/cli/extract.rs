use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use dts::process::PREVIEW_SIZE;
use dts::process::demux::FrameReader;
use dts::utils::timing::Timing;
use indicatif::MultiProgress;

use super::command::{Cli, ExtractArgs};
use super::open_stream;
use super::progress::{create_progress_bar, tick};
use crate::timestamp::pts_str;

fn output_path(args: &ExtractArgs) -> Result<Option<PathBuf>> {
    match &args.output_path {
        Some(path) if path.as_os_str() == "-" => Ok(None),
        Some(path) => Ok(Some(path.clone())),
        None if args.input.as_os_str() == "-" => {
            bail!("--output-path is required when reading from stdin")
        }
        None => Ok(Some(args.input.with_extension("dts"))),
    }
}

pub fn cmd_extract(args: &ExtractArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let (input, header) = open_stream(&args.input, cli, PREVIEW_SIZE)?;
    let output = output_path(args)?;

    if output.as_deref() == Some(args.input.as_path()) {
        bail!("Output path must differ from the input path");
    }

    let mut writer: Box<dyn Write> = match &output {
        Some(path) => {
            log::info!("Extracting {} to {}", args.input.display(), path.display());
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut frames = FrameReader::new(input.into_source(), header)?;
    let total = frames.header().frame_count(frames.stream_length());

    if let Some(fraction) = args.start {
        let target = frames.seek_fraction(fraction)?;
        log::info!(
            "Starting at frame {} ({})",
            target.frame_index,
            pts_str(frames.header().pts(target.frame_index))
        );
    }

    let pb = multi
        .map(|m| create_progress_bar(m, Some(total), "Extracting..."))
        .transpose()?;

    let mut count = 0u64;
    let mut bytes = 0u64;
    for frame in frames.by_ref() {
        let frame = frame?;
        writer.write_all(&frame.data)?;

        count += 1;
        bytes += frame.data.len() as u64;
        tick(pb.as_ref(), frame.index + 1);
    }
    writer.flush()?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    log::info!(
        "Wrote {count} frames ({bytes} bytes), ending at {}",
        pts_str(frames.header().pts(frames.position()))
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str, output: Option<&str>) -> ExtractArgs {
        ExtractArgs {
            input: input.into(),
            output_path: output.map(Into::into),
            start: None,
        }
    }

    #[test]
    fn output_defaults_next_to_input() -> Result<()> {
        assert_eq!(
            output_path(&args("track.wav", None))?,
            Some(PathBuf::from("track.dts"))
        );
        assert_eq!(output_path(&args("track.wav", Some("-")))?, None);
        assert_eq!(
            output_path(&args("-", Some("out.dts")))?,
            Some(PathBuf::from("out.dts"))
        );
        assert!(output_path(&args("-", None)).is_err());

        Ok(())
    }
}

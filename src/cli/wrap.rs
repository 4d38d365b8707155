use std::borrow::Cow;
use std::fs::File;

use anyhow::{Result, bail};
use dts::log_or_err;
use dts::process::container::CD_SAMPLE_RATE;
use dts::process::demux::FrameReader;
use dts::process::{PREVIEW_SIZE, ProbeOptions};
use dts::structs::header::BitstreamFormat;
use dts::utils::bitstream_io::swap_16bit_words;
use indicatif::MultiProgress;
use log::Level;

use super::command::{Cli, WrapArgs};
use super::open_stream;
use super::progress::{create_progress_bar, tick};
use crate::wav::WAVWriter;

/// Stores frame bytes in the 14-bit little-endian layout of DTS audio CDs.
fn to_cd_layout(format: BitstreamFormat, data: &[u8]) -> Result<Cow<'_, [u8]>> {
    match format {
        BitstreamFormat::Le14 => Ok(Cow::Borrowed(data)),
        BitstreamFormat::Be14 => Ok(Cow::Owned(swap_16bit_words(data))),
        BitstreamFormat::Be16 | BitstreamFormat::Le16 => {
            bail!("{format} streams cannot be stored as CD audio, a 14-bit stream is required")
        }
    }
}

pub fn cmd_wrap(args: &WrapArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    if args.output_path == args.input {
        bail!("Output path must differ from the input path");
    }

    let (input, header) = open_stream(&args.input, cli, PREVIEW_SIZE)?;
    to_cd_layout(header.format, &[])?;

    let state = ProbeOptions {
        fail_level: cli.fail_level(),
        ..Default::default()
    };
    if header.sample_rate != CD_SAMPLE_RATE {
        log_or_err!(
            state,
            Level::Warn,
            anyhow::anyhow!(
                "Stream is sampled at {} Hz, CD players expect {CD_SAMPLE_RATE} Hz",
                header.sample_rate
            )
        );
    }
    if header.data_start > 0 {
        log::warn!("Skipping {} bytes before the first frame", header.data_start);
    }

    log::info!(
        "Wrapping {} into {}",
        args.input.display(),
        args.output_path.display()
    );

    let format = header.format;
    let mut frames = FrameReader::new(input.into_source(), header)?;
    let total = frames.header().frame_count(frames.stream_length());

    let pb = multi
        .map(|m| create_progress_bar(m, Some(total), "Wrapping..."))
        .transpose()?;

    let mut writer = WAVWriter::new(File::create(&args.output_path)?);
    writer.write_header()?;

    for frame in frames.by_ref() {
        let frame = frame?;
        writer.write_data(&to_cd_layout(format, &frame.data)?)?;
        tick(pb.as_ref(), frame.index + 1);
    }
    writer.finish()?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    log::info!(
        "Wrote {} frames ({} bytes of audio data)",
        frames.position(),
        writer.data_written()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cd_layout_is_little_endian_14bit() -> Result<()> {
        let be14 = [0x1F, 0xFF, 0xE8, 0x00, 0x07, 0xF0];
        assert_eq!(
            to_cd_layout(BitstreamFormat::Be14, &be14)?.as_ref(),
            &[0xFF, 0x1F, 0x00, 0xE8, 0xF0, 0x07]
        );
        assert!(matches!(
            to_cd_layout(BitstreamFormat::Le14, &be14)?,
            Cow::Borrowed(_)
        ));
        assert!(to_cd_layout(BitstreamFormat::Be16, &be14).is_err());

        Ok(())
    }
}

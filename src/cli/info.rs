use anyhow::Result;
use dts::log_or_err;
use dts::process::demux::FrameReader;
use dts::process::seek::{SeekTarget, seek_to_fraction, seek_to_time};
use dts::process::sync::sync_format_at;
use dts::structs::header::StreamHeader;
use dts::utils::timing::Timing;
use indicatif::{MultiProgress, ProgressBar};
use log::Level;
use serde::Serialize;

use super::command::{Cli, InfoArgs, OutputFormat};
use super::open_stream;
use super::progress::{create_progress_bar, tick};
use crate::timestamp::{ms_str, pts_str};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing DTS stream: {}", args.input.display());

    let (mut input, header) = open_stream(&args.input, cli, args.preview_size)?;
    let stream_length = input.stream_length()?;

    let mut info = StreamInfo::new(&header, stream_length);
    if let Some(fraction) = args.seek {
        let target = seek_to_fraction(fraction, &header, stream_length);
        info.seeks
            .push(SeekInfo::new(format!("fraction {fraction}"), target, &header));
    }
    if let Some(time_ms) = args.seek_time {
        let target = seek_to_time(time_ms, &header, stream_length);
        info.seeks
            .push(SeekInfo::new(format!("time {}", ms_str(time_ms)), target, &header));
    }

    let pb = multi
        .map(|m| create_progress_bar(m, Some(info.frames), "Checking frames..."))
        .transpose()?;

    let frames = FrameReader::new(input.into_source(), header.clone())?;
    info.scan = scan_frames(frames, cli, pb.as_ref())?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match args.format {
        OutputFormat::Text => display_stream_info(&info),
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&info)?),
    }

    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct ScanSummary {
    frames_read: u64,
    lost_sync: u64,
    short_final_frame: bool,
}

/// Reads every frame and checks that it starts with a sync word.
fn scan_frames<R: std::io::Read + std::io::Seek>(
    frames: FrameReader<R>,
    cli: &Cli,
    pb: Option<&ProgressBar>,
) -> Result<ScanSummary> {
    let format = frames.header().format;
    let frame_size = frames.header().frame_size as usize;
    let state = dts::process::ProbeOptions {
        fail_level: cli.fail_level(),
        ..Default::default()
    };

    let mut summary = ScanSummary::default();
    for frame in frames {
        let frame = frame?;
        summary.frames_read += 1;
        tick(pb, summary.frames_read);

        if frame.data.len() < frame_size {
            summary.short_final_frame = true;
        }
        if frame.data.len() < 6 {
            continue;
        }

        if sync_format_at(&frame.data, 0) != Some(format) {
            summary.lost_sync += 1;
            log_or_err!(
                state,
                Level::Warn,
                anyhow::anyhow!(
                    "Frame {} at {} does not start with a sync word",
                    frame.index,
                    pts_str(frame.pts)
                )
            );
        }
    }

    Ok(summary)
}

#[derive(Debug, Serialize)]
struct StreamInfo {
    format: String,
    sample_rate: u32,
    frame_size: u32,
    samples_per_frame: u32,
    data_start: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<u8>,
    lfe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    bit_rate: Option<u32>,
    stream_length: u64,
    frames: u64,
    frame_duration: u64,
    duration_ms: u64,
    duration: String,
    scan: ScanSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    seeks: Vec<SeekInfo>,
}

impl StreamInfo {
    fn new(header: &StreamHeader, stream_length: u64) -> Self {
        let duration_ms = header.duration_ms(stream_length);
        Self {
            format: header.format.to_string(),
            sample_rate: header.sample_rate,
            frame_size: header.frame_size,
            samples_per_frame: header.samples_per_frame,
            data_start: header.data_start,
            channels: header.channels,
            lfe: header.lfe,
            bit_rate: header.bit_rate,
            stream_length,
            frames: header.frame_count(stream_length),
            frame_duration: header.frame_duration(),
            duration_ms,
            duration: ms_str(duration_ms),
            scan: ScanSummary::default(),
            seeks: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SeekInfo {
    request: String,
    frame: u64,
    offset: u64,
    pts: u64,
    time: String,
}

impl SeekInfo {
    fn new(request: String, target: SeekTarget, header: &StreamHeader) -> Self {
        let pts = header.pts(target.frame_index);
        Self {
            request,
            frame: target.frame_index,
            offset: target.offset,
            pts,
            time: pts_str(pts),
        }
    }
}

fn display_stream_info(info: &StreamInfo) {
    println!();
    println!("DTS Stream Information");
    println!("======================");
    println!();

    println!("Stream Information");
    println!("  Packing                   {}", info.format);
    println!("  Sampling rate             {} Hz", info.sample_rate);
    println!("  Frame size                {} bytes", info.frame_size);
    println!("  Samples per frame         {}", info.samples_per_frame);
    if let Some(channels) = info.channels {
        let lfe = if info.lfe { " + LFE" } else { "" };
        println!("  Channels                  {channels}{lfe}");
    }
    if let Some(bit_rate) = info.bit_rate {
        println!("  Bit rate                  {} kbps", bit_rate / 1000);
    }
    println!("  Data start                {}", info.data_start);
    println!();

    println!("Analysis Summary");
    println!("  Frames                    {}", info.frames);
    println!("  Frames read               {}", info.scan.frames_read);
    if info.scan.lost_sync > 0 {
        println!("  Frames without sync       {}", info.scan.lost_sync);
    }
    if info.scan.short_final_frame {
        println!("  Final frame               truncated");
    }
    let size_mb = info.stream_length as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        info.stream_length
    );
    println!("  Duration                  {}", info.duration);
    println!();

    for seek in &info.seeks {
        println!("Seek to {}", seek.request);
        println!("  Frame                     {}", seek.frame);
        println!("  Offset                    {}", seek.offset);
        println!("  Timestamp                 {} ({})", seek.time, seek.pts);
        println!();
    }
}
